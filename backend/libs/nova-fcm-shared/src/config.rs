use serde::Deserialize;

use crate::errors::FCMError;
use crate::models::ServiceAccountKey;

/// Firebase configuration: an inline service account or the path of its
/// JSON file. When both are set the file wins.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FirebaseConfig {
    #[serde(default)]
    pub credential_location: Option<String>,
    #[serde(default)]
    pub credential: Option<ServiceAccountKey>,
}

impl FirebaseConfig {
    pub fn from_location(location: impl Into<String>) -> Self {
        Self {
            credential_location: Some(location.into()),
            credential: None,
        }
    }

    pub fn from_credential(credential: ServiceAccountKey) -> Self {
        Self {
            credential_location: None,
            credential: Some(credential),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.credential_location.is_some() || self.credential.is_some()
    }

    pub fn load_credential(&self) -> Result<ServiceAccountKey, FCMError> {
        if let Some(location) = &self.credential_location {
            let raw = std::fs::read_to_string(location).map_err(|e| FCMError::CredentialFile {
                path: location.clone(),
                message: e.to_string(),
            })?;

            return serde_json::from_str(&raw).map_err(|e| FCMError::CredentialParse(e.to_string()));
        }

        self.credential.clone().ok_or(FCMError::MissingCredential)
    }
}
