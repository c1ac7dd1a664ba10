//! Camera clients described by a setup file

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A configured camera client
///
/// `name` doubles as the perspective name in tracking results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDescriptor {
    pub name: String,
    /// Everything else the setup file says about the client (address, serial, ...)
    #[serde(flatten)]
    pub metadata: BTreeMap<String, String>,
}

impl ClientDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Ordered list of configured clients
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientList {
    clients: Vec<ClientDescriptor>,
}

impl ClientList {
    pub fn new(clients: Vec<ClientDescriptor>) -> Self {
        Self { clients }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClientDescriptor> {
        self.clients.iter()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn first(&self) -> Option<&ClientDescriptor> {
        self.clients.first()
    }

    /// True if `name` is an advertised perspective
    pub fn contains(&self, name: &str) -> bool {
        self.clients.iter().any(|c| c.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.clients.iter().map(|c| c.name.as_str()).collect()
    }
}

impl From<Vec<ClientDescriptor>> for ClientList {
    fn from(clients: Vec<ClientDescriptor>) -> Self {
        Self::new(clients)
    }
}
