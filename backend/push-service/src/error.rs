use nova_apns_shared::ApnsError;
use nova_fcm_shared::FCMError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DispatchError>;

/// Failures that make `prepare()` unusable
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Push notifications already prepared")]
    AlreadyPrepared,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Firebase initialization failed: {0}")]
    Firebase(#[from] FCMError),

    #[error("APNs initialization failed: {0}")]
    Apns(#[from] ApnsError),
}

/// Per-recipient delivery failure, same shape for both platforms
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct DeliveryError {
    pub code: String,
    pub message: String,
}

impl DeliveryError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&FCMError> for DeliveryError {
    fn from(err: &FCMError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

impl From<&ApnsError> for DeliveryError {
    fn from(err: &ApnsError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}
