use std::{fs, io, path::Path};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseConfig {
    /// The project this base serves. Connections for any other project are
    /// turned away.
    pub project: String,
    pub listen_addr: String,
    /// Directory holding the table files.
    pub data_path: String,
    /// Shared secret that connection tokens must be signed with.
    pub secret: String,
}

impl BaseConfig {
    pub fn from_file(path: &Path) -> Result<Self, io::Error> {
        let data = fs::read_to_string(path)?;
        let config = serde_json::from_str(&data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(config)
    }
}
