use std::sync::Arc;

use nova_apns_shared::ApnsClient;
use tracing::info;

use super::DispatchContext;
use crate::error::DeliveryError;
use crate::models::{Capability, DispatchOutcome, Notification};

/// APNs sender: one request per token.
///
/// Requests go out one after another, never concurrently, so a large token
/// list holds at most one APNs stream open at a time.
pub(crate) struct IosSender {
    client: ApnsClient,
}

impl IosSender {
    pub fn new(client: ApnsClient) -> Self {
        Self { client }
    }

    /// Returns every `apns-id` APNs sent back, accepted or not
    pub async fn push(
        &self,
        ctx: &DispatchContext<'_>,
        tokens: &[&str],
        notification: &Arc<Notification>,
    ) -> Vec<String> {
        if ctx.dry_run {
            for token in tokens {
                ctx.record_dry_run(Capability::Ios, token, notification);
            }
            return Vec::new();
        }

        let mut apns_ids = Vec::new();
        let mut delivered = 0usize;

        for token in tokens {
            let outcome = self
                .client
                .send(
                    token,
                    &notification.title,
                    &notification.body,
                    notification.data.as_ref(),
                )
                .await;

            if outcome.result.is_ok() {
                delivered += 1;
            }

            ctx.report(DispatchOutcome {
                capability: Capability::Ios,
                token: token.to_string(),
                notification: notification.clone(),
                result: outcome.result.map_err(|e| DeliveryError::from(&e)),
            });

            if let Some(apns_id) = outcome.apns_id {
                apns_ids.push(apns_id);
            }
        }

        info!("APNs sends complete: {} of {} accepted", delivered, tokens.len());

        apns_ids
    }
}
