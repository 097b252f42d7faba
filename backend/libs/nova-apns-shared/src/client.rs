use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::ApnsConfig;
use crate::errors::ApnsError;
use crate::payload::build_payload;
use crate::token::CredentialSlot;
use crate::transport::{HttpRequest, HttpTransport};

#[derive(Debug, Deserialize)]
struct ApnsErrorBody {
    reason: Option<String>,
}

/// Outcome of a single APNs request
#[derive(Debug)]
pub struct ApnsSendResult {
    /// `apns-id` response header, present on success and on most rejections
    pub apns_id: Option<String>,
    pub result: Result<(), ApnsError>,
}

/// Apple Push Notification Service client.
///
/// One POST per device token to `{host}/3/device/{token}`, authenticated
/// with the bearer token currently held in the shared [`CredentialSlot`].
#[derive(Clone)]
pub struct ApnsClient {
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<CredentialSlot>,
    topic: String,
    host: &'static str,
}

impl ApnsClient {
    pub fn new(
        cfg: &ApnsConfig,
        transport: Arc<dyn HttpTransport>,
        credentials: Arc<CredentialSlot>,
    ) -> Self {
        Self {
            transport,
            credentials,
            topic: cfg.topic.clone(),
            host: cfg.host(),
        }
    }

    pub fn host(&self) -> &str {
        self.host
    }

    pub fn device_url(&self, device_token: &str) -> String {
        format!("{}/3/device/{}", self.host, device_token)
    }

    /// Send one alert notification to one device
    pub async fn send(
        &self,
        device_token: &str,
        title: &str,
        body: &str,
        data: Option<&Map<String, Value>>,
    ) -> ApnsSendResult {
        let device_token_prefix = device_token.chars().take(8).collect::<String>();

        let Some(bearer) = self.credentials.bearer() else {
            warn!("No APNs provider token for token {}", device_token_prefix);
            return ApnsSendResult {
                apns_id: None,
                result: Err(ApnsError::CredentialUnavailable),
            };
        };

        let request = HttpRequest {
            url: self.device_url(device_token),
            headers: vec![
                ("apns-topic".to_string(), self.topic.clone()),
                ("authorization".to_string(), format!("bearer {}", bearer)),
            ],
            body: build_payload(title, body, data).to_string(),
        };

        let response = match self.transport.post(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("APNs request failed for token {}: {}", device_token_prefix, e);
                return ApnsSendResult {
                    apns_id: None,
                    result: Err(e),
                };
            }
        };

        let apns_id = response.header("apns-id").map(str::to_string);

        if response.status == 200 {
            debug!(
                "APNs notification accepted for token {} (apns_id: {:?})",
                device_token_prefix, apns_id
            );
            return ApnsSendResult {
                apns_id,
                result: Ok(()),
            };
        }

        let reason = serde_json::from_str::<ApnsErrorBody>(&response.body)
            .ok()
            .and_then(|b| b.reason)
            .unwrap_or_else(|| "Unknown".to_string());

        warn!(
            "APNs rejected token {} with status {}: {}",
            device_token_prefix, response.status, reason
        );

        ApnsSendResult {
            apns_id,
            result: Err(ApnsError::Rejected {
                status: response.status,
                reason,
            }),
        }
    }
}
