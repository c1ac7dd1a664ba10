//! Setup file loading
//!
//! A setup file lists the camera clients the server owns:
//!
//! ```toml
//! [[clients]]
//! name = "kinect-left"
//! address = "192.168.1.20"
//! ```
//!
//! Every key other than `name` is kept as string metadata.

use k2k_common::model::{ClientDescriptor, ClientList};
use k2k_common::{Error, Result};
use std::collections::HashSet;
use std::path::Path;

/// Read and parse a setup file
pub async fn load_setup_file(path: &Path) -> Result<ClientList> {
    let content = tokio::fs::read_to_string(path).await?;
    parse_setup(&content)
        .map_err(|e| Error::Config(format!("Setup file {}: {}", path.display(), e)))
}

/// Parse setup text into the client list
pub fn parse_setup(content: &str) -> Result<ClientList> {
    let table: toml::Table = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;

    let entries = match table.get("clients") {
        Some(toml::Value::Array(entries)) => entries,
        Some(_) => return Err(Error::Config("'clients' must be an array of tables".to_string())),
        None => return Err(Error::Config("no [[clients]] defined".to_string())),
    };

    let mut clients = Vec::with_capacity(entries.len());
    let mut seen = HashSet::new();

    for (index, entry) in entries.iter().enumerate() {
        let entry = entry
            .as_table()
            .ok_or_else(|| Error::Config(format!("client #{} is not a table", index + 1)))?;

        let name = entry
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::Config(format!("client #{} has no name", index + 1)))?;

        if !seen.insert(name.to_string()) {
            return Err(Error::Config(format!("duplicate client name '{}'", name)));
        }

        let mut client = ClientDescriptor::new(name);
        for (key, value) in entry.iter().filter(|(k, _)| k.as_str() != "name") {
            let text = match value {
                toml::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            client = client.with_metadata(key.clone(), text);
        }
        clients.push(client);
    }

    if clients.is_empty() {
        return Err(Error::Config("no [[clients]] defined".to_string()));
    }

    tracing::debug!(clients = clients.len(), "Parsed setup");
    Ok(ClientList::new(clients))
}
