use thiserror::Error;

/// APNs Error Types
#[derive(Error, Debug)]
pub enum ApnsError {
    #[error("APNs configuration error: {0}")]
    Config(String),

    #[error("Failed to read APNs key file {path}: {source}")]
    KeyFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse APNs private key: {0}")]
    KeyParse(#[source] jsonwebtoken::errors::Error),

    #[error("Failed to sign APNs provider token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("APNs token rotation requires a running tokio runtime")]
    NoRuntime,

    #[error("No APNs provider token available")]
    CredentialUnavailable,

    #[error("APNs request failed: {0}")]
    Transport(String),

    #[error("APNs rejected notification with status {status}: {reason}")]
    Rejected { status: u16, reason: String },
}

impl ApnsError {
    /// Short machine-readable code. For rejections this is the APNs `reason`
    /// (e.g. `BadDeviceToken`).
    pub fn code(&self) -> &str {
        match self {
            ApnsError::Config(_) => "ConfigError",
            ApnsError::KeyFile { .. } => "KeyFileError",
            ApnsError::KeyParse(_) => "KeyParseError",
            ApnsError::Signing(_) => "SigningError",
            ApnsError::NoRuntime => "NoRuntime",
            ApnsError::CredentialUnavailable => "CredentialUnavailable",
            ApnsError::Transport(_) => "TransportError",
            ApnsError::Rejected { reason, .. } => reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_code_is_reason() {
        let err = ApnsError::Rejected {
            status: 400,
            reason: "BadDeviceToken".to_string(),
        };
        assert_eq!(err.code(), "BadDeviceToken");
        assert!(err.to_string().contains("400"));
    }

    #[test]
    fn test_transport_code() {
        let err = ApnsError::Transport("connection reset".to_string());
        assert_eq!(err.code(), "TransportError");
    }
}
