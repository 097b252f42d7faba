/// Nova FCM Shared Library
///
/// This library provides the Firebase Cloud Messaging (FCM) side of the Nova
/// push pipeline for Android and Web devices.
///
/// It handles:
/// - Loading Google service-account credentials (inline or from a JSON file)
/// - OAuth2 token generation using the service account, with caching
/// - Batch delivery (`send_each`) with one ordered result per message

pub mod client;
pub mod config;
pub mod errors;
pub mod models;

pub use client::{BatchTransport, FCMClient, SendResponse, FCM_MAX_CONCURRENT_SENDS};
pub use config::FirebaseConfig;
pub use errors::FCMError;
pub use models::{stringify_data, FcmMessageContent, FcmNotification, ServiceAccountKey};
