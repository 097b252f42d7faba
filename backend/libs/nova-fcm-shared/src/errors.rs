use thiserror::Error;

/// FCM Client Error Types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FCMError {
    #[error("Failed to read service account file {path}: {message}")]
    CredentialFile { path: String, message: String },

    #[error("Failed to parse service account credential: {0}")]
    CredentialParse(String),

    #[error("No Firebase credential or credential location configured")]
    MissingCredential,

    #[error("Failed to parse private key: {0}")]
    KeyParseError(String),

    #[error("Failed to encode JWT: {0}")]
    JwtEncodeError(String),

    #[error("Token request failed with status: {0}")]
    TokenRequestFailed(String),

    #[error("Failed to parse token response: {0}")]
    TokenParseError(String),

    #[error("FCM send request failed: {0}")]
    SendRequestError(String),

    #[error("Failed to parse FCM response: {0}")]
    ResponseParseError(String),

    #[error("FCM API error {code}: {message}")]
    ApiError { code: String, message: String },
}

impl FCMError {
    /// Machine-readable code; for API errors the FCM error code
    /// (e.g. `UNREGISTERED`, `INVALID_ARGUMENT`).
    pub fn code(&self) -> &str {
        match self {
            FCMError::CredentialFile { .. } => "CredentialFileError",
            FCMError::CredentialParse(_) => "CredentialParseError",
            FCMError::MissingCredential => "MissingCredential",
            FCMError::KeyParseError(_) => "KeyParseError",
            FCMError::JwtEncodeError(_) => "JwtEncodeError",
            FCMError::TokenRequestFailed(_) => "TokenRequestFailed",
            FCMError::TokenParseError(_) => "TokenParseError",
            FCMError::SendRequestError(_) => "TransportError",
            FCMError::ResponseParseError(_) => "ResponseParseError",
            FCMError::ApiError { code, .. } => code,
        }
    }
}
