use std::sync::Arc;

use nova_fcm_shared::{stringify_data, BatchTransport, FcmMessageContent, FcmNotification};
use tracing::{info, warn};

use super::DispatchContext;
use crate::error::DeliveryError;
use crate::models::{Capability, DispatchOutcome, Notification};

/// FCM sender: one batch call for all tokens, results matched by index.
pub(crate) struct AndroidSender {
    transport: Arc<dyn BatchTransport>,
}

impl AndroidSender {
    pub fn new(transport: Arc<dyn BatchTransport>) -> Self {
        Self { transport }
    }

    /// Returns the message ids FCM accepted
    pub async fn push(
        &self,
        ctx: &DispatchContext<'_>,
        tokens: &[&str],
        notification: &Arc<Notification>,
    ) -> Vec<String> {
        if ctx.dry_run {
            for token in tokens {
                ctx.record_dry_run(Capability::Android, token, notification);
            }
            return Vec::new();
        }

        let data = notification.data.as_ref().map(stringify_data);
        let messages: Vec<FcmMessageContent> = tokens
            .iter()
            .map(|token| FcmMessageContent {
                token: token.to_string(),
                notification: FcmNotification {
                    title: notification.title.clone(),
                    body: notification.body.clone(),
                },
                data: data.clone(),
            })
            .collect();

        let responses = self.transport.send_each(&messages).await;
        if responses.len() != messages.len() {
            warn!(
                "FCM returned {} responses for {} messages",
                responses.len(),
                messages.len()
            );
        }

        let mut message_ids = Vec::new();
        let mut responses = responses.into_iter();

        for message in messages {
            let result = match responses.next() {
                Some(Ok(message_id)) => {
                    message_ids.push(message_id);
                    Ok(())
                }
                Some(Err(e)) => Err(DeliveryError::from(&e)),
                None => Err(DeliveryError::new(
                    "MissingResponse",
                    "FCM returned no result for this message",
                )),
            };

            ctx.report(DispatchOutcome {
                capability: Capability::Android,
                token: message.token,
                notification: notification.clone(),
                result,
            });
        }

        info!(
            "FCM batch complete: {} of {} accepted",
            message_ids.len(),
            tokens.len()
        );

        message_ids
    }
}
