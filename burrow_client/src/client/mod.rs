use std::{
    fs, io,
    path::{Path, PathBuf},
};

use burrow_link::TokenIssuer;
use tracing::warn;

use crate::config::ClientConfig;

use self::processor::ClientProcessor;

mod channel;
pub use channel::{ClientChannel, ClientError};

mod message;
pub(crate) use message::ClientControl;

mod processor;

/// ClientBuilder holds a client configuration that can be loaded from a
/// file, modified, saved back to a file, or used to connect to a base.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    config_path: Option<PathBuf>,
    config: ClientConfig,
}

impl ClientBuilder {
    /// Create a new ClientBuilder around an explicit configuration.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config_path: None,
            config,
        }
    }

    /// Use the given path as the path for this builder, and load the
    /// configuration from that file.
    pub fn load(path: &Path) -> Result<Self, io::Error> {
        let config = ClientConfig::from_file(path)?;
        Ok(Self {
            config_path: Some(path.to_path_buf()),
            config,
        })
    }

    /// Use the given path as the path for this builder, and load the
    /// configuration from that file if it exists. If it does not, build a
    /// fresh configuration with the callback and save it afterward.
    pub fn load_or_set<F>(path: &Path, default: ClientConfig, func: F) -> Self
    where
        F: FnOnce(&mut ClientBuilder),
    {
        match fs::read_to_string(path).and_then(|data| {
            ClientConfig::from_string(&data).ok_or(io::ErrorKind::InvalidData.into())
        }) {
            Ok(config) => Self {
                config_path: Some(path.to_owned()),
                config,
            },
            Err(_) => {
                let mut client = Self {
                    config_path: Some(path.to_owned()),
                    config: default,
                };
                func(&mut client);
                client.save();
                client
            }
        }
    }

    /// Write the current configuration out to the path used to create it.
    pub fn save(&self) {
        if let Some(path) = &self.config_path {
            if let Err(e) = self.config.to_file(path) {
                warn!("failed to save client config to {:?}: {}", path, e);
            }
        }
    }

    /// Set or update the path where the configuration will be saved.
    pub fn set_config_path(&mut self, path: &Path) {
        self.config_path = Some(path.to_path_buf());
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Attach the credential that will be presented when connecting.
    pub fn set_token<T: Into<String>>(&mut self, token: T) {
        self.config.token = Some(token.into());
    }

    /// A token issuer over the configured signing secret, for minting the
    /// credential explicitly before connecting. None if the configuration
    /// carries no secret.
    pub fn token_issuer(&self) -> Option<TokenIssuer> {
        self.config
            .secret
            .as_ref()
            .map(|secret| TokenIssuer::new(secret.as_bytes()))
    }

    /// Use the configuration to start a client and connect to the base.
    pub fn start(self) -> ClientChannel {
        let (channel, _) = ClientProcessor::start(self.config);
        channel
    }
}
