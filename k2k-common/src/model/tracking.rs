//! Tracking poll results

use super::skeleton::Skeleton;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One tracked body as seen from a perspective
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Person {
    /// One skeleton per contributing camera, keyed by camera client name
    #[serde(default)]
    pub skeletons: BTreeMap<String, Skeleton>,
    /// Server-side fusion of the per-camera skeletons
    pub average_skeleton: Skeleton,
}

/// People seen from one named camera, in server order
///
/// Position in this sequence is the only identity a person has; it drives
/// color assignment and resets with every poll.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Perspective {
    pub people: Vec<Person>,
}

impl Perspective {
    pub fn new(people: Vec<Person>) -> Self {
        Self { people }
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }
}

/// Result of one tracking poll
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackingResult {
    /// Server timestamp of the fused frame
    pub timestamp: u64,
    /// Perspective name -> people seen from that camera
    #[serde(default)]
    pub perspectives: HashMap<String, Perspective>,
}

impl TrackingResult {
    /// Look up a perspective by name
    pub fn perspective(&self, name: &str) -> Option<&Perspective> {
        self.perspectives.get(name)
    }

    /// Perspective names, sorted for stable display
    pub fn perspective_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.perspectives.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{JointType, TrackingState};

    const SAMPLE: &str = r#"{
        "timestamp": 1700000000123,
        "perspectives": {
            "kinect-left": [
                {
                    "skeletons": {
                        "kinect-left": {
                            "Head": {"position": {"x": 0.0, "y": 0.6, "z": 2.1}, "tracking_state": "Tracked"}
                        },
                        "kinect-right": {
                            "Head": {"position": {"x": 0.1, "y": 0.6, "z": 2.3}, "tracking_state": "Inferred"}
                        }
                    },
                    "average_skeleton": {
                        "Head": {"position": {"x": 0.05, "y": 0.6, "z": 2.2}, "tracking_state": "Tracked"}
                    }
                }
            ],
            "kinect-right": []
        }
    }"#;

    #[test]
    fn test_parse_tracking_result() {
        let result: TrackingResult = serde_json::from_str(SAMPLE).unwrap();

        assert_eq!(result.timestamp, 1700000000123);
        assert_eq!(result.perspective_names(), vec!["kinect-left", "kinect-right"]);

        let left = result.perspective("kinect-left").unwrap();
        assert_eq!(left.people.len(), 1);
        let person = &left.people[0];
        assert_eq!(person.skeletons.len(), 2);
        assert_eq!(
            person.average_skeleton.get(JointType::Head).unwrap().tracking_state,
            TrackingState::Tracked
        );

        assert!(result.perspective("kinect-right").unwrap().is_empty());
        assert!(result.perspective("kinect-center").is_none());
    }

    #[test]
    fn test_person_requires_average_skeleton() {
        let json = r#"{"skeletons": {}}"#;
        assert!(serde_json::from_str::<Person>(json).is_err());
    }
}
