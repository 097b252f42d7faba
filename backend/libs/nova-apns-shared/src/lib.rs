/// Nova APNs Shared Library
///
/// This library provides the Apple Push Notification Service (APNs) side of
/// the Nova push pipeline for iOS and macOS devices.
///
/// It handles:
/// - Provider token (ES256 JWT) signing and periodic rotation
/// - APNs payload construction (alert, sound, badge, custom data)
/// - One HTTP/2 request per device token against production or sandbox
/// - Mapping APNs rejections into structured errors
pub mod client;
pub mod config;
pub mod errors;
pub mod payload;
pub mod token;
pub mod transport;

pub use client::{ApnsClient, ApnsSendResult};
pub use config::ApnsConfig;
pub use errors::ApnsError;
pub use payload::build_payload;
pub use token::{
    ApnsTokenSigner, CredentialSigner, CredentialSlot, SignedCredential, TokenRotation,
    APNS_TOKEN_REFRESH_INTERVAL,
};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
