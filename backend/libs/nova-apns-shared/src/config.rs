use serde::Deserialize;

use crate::errors::ApnsError;

pub const PRODUCTION_HOST: &str = "https://api.push.apple.com";
pub const SANDBOX_HOST: &str = "https://api.sandbox.push.apple.com";

/// APNs Configuration
///
/// The `.p8` signing key can be given inline (`p8_key`) or as a file path
/// (`p8_key_location`). When both are set the file wins.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApnsConfig {
    #[serde(default)]
    pub p8_key_location: Option<String>,
    #[serde(default)]
    pub p8_key: Option<String>,
    pub key_id: String,
    pub team_id: String,
    /// Bundle id sent as `apns-topic`
    pub topic: String,
    #[serde(default)]
    pub sandbox: bool,
}

impl ApnsConfig {
    /// Create new APNs configuration with an inline key
    pub fn new(p8_key: String, key_id: String, team_id: String, topic: String) -> Self {
        Self {
            p8_key_location: None,
            p8_key: Some(p8_key),
            key_id,
            team_id,
            topic,
            sandbox: false,
        }
    }

    /// Load the key from a file instead of inline text
    pub fn with_key_location(mut self, location: impl Into<String>) -> Self {
        self.p8_key_location = Some(location.into());
        self
    }

    /// Target the sandbox gateway
    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    /// Whether any key material is configured
    pub fn has_key(&self) -> bool {
        self.p8_key_location.is_some() || self.p8_key.is_some()
    }

    /// Resolve the PEM text of the signing key
    pub fn load_private_key(&self) -> Result<String, ApnsError> {
        if let Some(location) = &self.p8_key_location {
            return std::fs::read_to_string(location).map_err(|source| ApnsError::KeyFile {
                path: location.clone(),
                source,
            });
        }

        self.p8_key
            .clone()
            .ok_or_else(|| ApnsError::Config("no p8 key or key location configured".to_string()))
    }

    /// Get APNs base URL based on environment
    pub fn host(&self) -> &'static str {
        if self.sandbox {
            SANDBOX_HOST
        } else {
            PRODUCTION_HOST
        }
    }
}
