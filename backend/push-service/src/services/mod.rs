pub mod android;
pub mod ios;
pub mod push_notifications;

pub use push_notifications::{BatchTransportFactory, CredentialSignerFactory, PushNotifications};

use std::sync::Arc;

use tracing::{debug, error};
use uuid::Uuid;

use crate::events::{EventBus, EventPayload, PushEvent};
use crate::models::{Capability, DispatchOutcome, DryRunLog, DryRunRecord, Notification};

/// Per-call view of the engine shared by both platform senders
pub(crate) struct DispatchContext<'a> {
    pub engine_id: Uuid,
    pub dry_run: bool,
    pub events: &'a EventBus,
    pub dry_run_log: &'a DryRunLog,
}

impl DispatchContext<'_> {
    /// Record a would-be send and report it as delivered
    pub fn record_dry_run(
        &self,
        capability: Capability,
        token: &str,
        notification: &Arc<Notification>,
    ) {
        self.dry_run_log.record(DryRunRecord {
            engine_id: self.engine_id,
            token: token.to_string(),
            notification: notification.clone(),
            capability,
        });

        self.report(DispatchOutcome {
            capability,
            token: token.to_string(),
            notification: notification.clone(),
            result: Ok(()),
        });
    }

    /// Turn one outcome into a `push` or `error` event
    pub fn report(&self, outcome: DispatchOutcome) {
        let token_prefix = outcome.token.chars().take(8).collect::<String>();
        let payload = EventPayload {
            capability: outcome.capability,
            token: outcome.token,
            notification: outcome.notification,
        };

        match outcome.result {
            Ok(()) => {
                debug!(
                    capability = %payload.capability,
                    dry_run = self.dry_run,
                    "Push delivered to token {}",
                    token_prefix
                );
                self.events.publish(PushEvent::Push { payload });
            }
            Err(error) => {
                error!(
                    capability = %payload.capability,
                    code = %error.code,
                    "Push failed for token {}: {}",
                    token_prefix,
                    error.message
                );
                self.events.publish(PushEvent::Error { error, payload });
            }
        }
    }
}
