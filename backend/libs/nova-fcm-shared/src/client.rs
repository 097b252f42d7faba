use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use futures::stream::{self, StreamExt};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::errors::FCMError;
use crate::models::*;

const FCM_ENDPOINT: &str = "https://fcm.googleapis.com";
const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

/// Default cap on concurrent sends within one batch
pub const FCM_MAX_CONCURRENT_SENDS: usize = 100;

/// Per-message result: the provider message id or the error for that message
pub type SendResponse = Result<String, FCMError>;

/// Batch transport: one call, many recipients.
///
/// Implementations return exactly one response per input message, in the
/// same order.
#[async_trait]
pub trait BatchTransport: Send + Sync {
    async fn send_each(&self, messages: &[FcmMessageContent]) -> Vec<SendResponse>;
}

/// Firebase Cloud Messaging Client
///
/// Handles Firebase Cloud Messaging (FCM) HTTP v1 delivery for Android and Web
/// push notifications. Manages OAuth2 token generation and caching.
pub struct FCMClient {
    pub project_id: String,
    pub credentials: Arc<ServiceAccountKey>,
    endpoint: String,
    token_cache: Arc<Mutex<Option<TokenCache>>>,
    http_client: reqwest::Client,
    max_concurrency: usize,
}

impl FCMClient {
    /// Create new FCM client
    ///
    /// # Arguments
    /// * `credentials` - Service account key with OAuth2 credentials
    pub fn new(credentials: ServiceAccountKey) -> Self {
        Self {
            project_id: credentials.project_id.clone(),
            credentials: Arc::new(credentials),
            endpoint: FCM_ENDPOINT.to_string(),
            token_cache: Arc::new(Mutex::new(None)),
            http_client: reqwest::Client::new(),
            max_concurrency: FCM_MAX_CONCURRENT_SENDS,
        }
    }

    /// Override the FCM base URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Cap the number of in-flight sends per batch (at least 1)
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit.max(1);
        self
    }

    fn send_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.endpoint.trim_end_matches('/'),
            self.project_id
        )
    }

    /// Send a single message, returning the FCM message name
    pub async fn send(&self, message: &FcmMessageContent, access_token: &str) -> SendResponse {
        let token_prefix = message.token.chars().take(8).collect::<String>();

        let response = self
            .http_client
            .post(self.send_url())
            .bearer_auth(access_token)
            .json(&FcmMessage { message })
            .send()
            .await
            .map_err(|e| FCMError::SendRequestError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let fcm_response: FcmApiResponse = response
                .json()
                .await
                .map_err(|e| FCMError::ResponseParseError(e.to_string()))?;

            debug!("FCM accepted message for token {}", token_prefix);
            return fcm_response
                .name
                .ok_or_else(|| FCMError::ResponseParseError("missing message name".to_string()));
        }

        let error_text = response.text().await.unwrap_or_default();
        let error = match serde_json::from_str::<FcmErrorEnvelope>(&error_text) {
            Ok(envelope) => FCMError::ApiError {
                code: envelope.error.error_code(),
                message: envelope.error.message.unwrap_or_default(),
            },
            Err(_) => FCMError::ApiError {
                code: status.as_u16().to_string(),
                message: error_text,
            },
        };

        warn!("FCM rejected message for token {}: {}", token_prefix, error);
        Err(error)
    }

    /// Get access token from service account (with caching)
    pub async fn get_access_token(&self) -> Result<String, FCMError> {
        // Check if we have a cached token that's still valid
        {
            let cache = self.token_cache.lock();
            if let Some(cached) = cache.as_ref() {
                let now = Utc::now().timestamp();
                if cached.expires_at > now + 60 {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let now = Utc::now();
        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            sub: self.credentials.client_email.clone(),
            scope: FCM_SCOPE.to_string(),
            aud: self.credentials.token_uri.clone(),
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        };

        let encoding_key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| FCMError::KeyParseError(e.to_string()))?;

        let mut header = Header::new(Algorithm::RS256);
        if !self.credentials.private_key_id.is_empty() {
            header.kid = Some(self.credentials.private_key_id.clone());
        }

        let assertion = encode(&header, &claims, &encoding_key)
            .map_err(|e| FCMError::JwtEncodeError(e.to_string()))?;

        // Exchange JWT for access token
        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.credentials.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| FCMError::TokenRequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FCMError::TokenRequestFailed(response.status().to_string()));
        }

        let token_response: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| FCMError::TokenParseError(e.to_string()))?;

        let expires_at = Utc::now().timestamp() + token_response.expires_in;
        *self.token_cache.lock() = Some(TokenCache {
            access_token: token_response.access_token.clone(),
            expires_at,
        });

        Ok(token_response.access_token)
    }
}

#[async_trait]
impl BatchTransport for FCMClient {
    async fn send_each(&self, messages: &[FcmMessageContent]) -> Vec<SendResponse> {
        let access_token = match self.get_access_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!("FCM access token unavailable, failing {} messages: {}", messages.len(), e);
                return messages.iter().map(|_| Err(e.clone())).collect();
            }
        };

        let sends: Vec<_> = messages
            .iter()
            .map(|m| self.send(m, &access_token))
            .collect();

        stream::iter(sends)
            .buffered(self.max_concurrency)
            .collect()
            .await
    }
}
