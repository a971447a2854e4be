use std::{fs, io, path::Path};

use serde::{Deserialize, Serialize};

/// Everything a client needs to reach a base: the project it belongs to,
/// the base's host:port, and optionally the shared signing secret and the
/// credential to present at connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub project: String,
    pub host: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub token: Option<String>,
}

impl ClientConfig {
    pub fn new<P, H>(project: P, host: H) -> Self
    where
        P: Into<String>,
        H: Into<String>,
    {
        Self {
            project: project.into(),
            host: host.into(),
            secret: None,
            token: None,
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }

    pub fn from_file(path: &Path) -> Result<Self, io::Error> {
        let data = fs::read_to_string(path)?;
        let config = serde_json::from_str(&data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(config)
    }

    pub fn to_file(&self, path: &Path) -> Result<(), io::Error> {
        let data = serde_json::to_string(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, data)
    }
}
