use std::collections::BTreeSet;
use std::sync::Arc;

use nova_apns_shared::{
    ApnsClient, ApnsConfig, ApnsError, ApnsTokenSigner, CredentialSigner, CredentialSlot,
    HttpTransport, ReqwestTransport, TokenRotation, APNS_TOKEN_REFRESH_INTERVAL,
};
use nova_fcm_shared::{BatchTransport, FCMClient, FCMError, ServiceAccountKey};
use tracing::{info, warn};
use uuid::Uuid;

use super::android::AndroidSender;
use super::ios::IosSender;
use super::DispatchContext;
use crate::classifier::{partition, SeparatorClassifier, TokenClassifier};
use crate::config::PushConfig;
use crate::error::{DispatchError, Result};
use crate::events::{EventBus, EventKind, PushEvent, SubscriptionId};
use crate::models::{Capability, DryRunLog, Notification};

/// Builds the FCM batch transport from the loaded service account
pub type BatchTransportFactory = Arc<
    dyn Fn(ServiceAccountKey) -> std::result::Result<Arc<dyn BatchTransport>, FCMError>
        + Send
        + Sync,
>;

fn default_batch_factory() -> BatchTransportFactory {
    Arc::new(
        |key: ServiceAccountKey| -> std::result::Result<Arc<dyn BatchTransport>, FCMError> {
            Ok(Arc::new(FCMClient::new(key)) as Arc<dyn BatchTransport>)
        },
    )
}

/// Builds the APNs provider token signer from the config and its PEM key
pub type CredentialSignerFactory = Arc<
    dyn Fn(&ApnsConfig, &str) -> std::result::Result<Arc<dyn CredentialSigner>, ApnsError>
        + Send
        + Sync,
>;

fn default_signer_factory() -> CredentialSignerFactory {
    Arc::new(
        |apns: &ApnsConfig,
         pem: &str|
         -> std::result::Result<Arc<dyn CredentialSigner>, ApnsError> {
            let signer = ApnsTokenSigner::new(apns.team_id.clone(), apns.key_id.clone(), pem)?;
            Ok(Arc::new(signer) as Arc<dyn CredentialSigner>)
        },
    )
}

const NO_CAPABILITIES: &str = "No capabilities were found. Please check your configuration.";

/// Push notification engine for FCM (Android) and APNs (iOS).
///
/// Call `prepare()` once to activate the configured platforms, then
/// `push_notification()` as often as needed (concurrently if shared behind
/// an `Arc`). Outcomes are published on the [`EventBus`]; `release()` stops
/// the APNs token rotation.
pub struct PushNotifications {
    id: Uuid,
    config: PushConfig,
    events: EventBus,
    dry_run_log: DryRunLog,
    classifier: Arc<dyn TokenClassifier>,
    batch_factory: BatchTransportFactory,
    signer_factory: CredentialSignerFactory,
    http_transport: Arc<dyn HttpTransport>,
    prepared: bool,
    capabilities: BTreeSet<Capability>,
    android: Option<AndroidSender>,
    ios: Option<IosSender>,
    credentials: Arc<CredentialSlot>,
    rotation: Option<TokenRotation>,
}

impl PushNotifications {
    pub fn new(config: PushConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            events: EventBus::new(),
            dry_run_log: DryRunLog::new(),
            classifier: Arc::new(SeparatorClassifier::default()),
            batch_factory: default_batch_factory(),
            signer_factory: default_signer_factory(),
            http_transport: Arc::new(ReqwestTransport::new()),
            prepared: false,
            capabilities: BTreeSet::new(),
            android: None,
            ios: None,
            credentials: Arc::new(CredentialSlot::new()),
            rotation: None,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn TokenClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_batch_transport_factory(mut self, factory: BatchTransportFactory) -> Self {
        self.batch_factory = factory;
        self
    }

    pub fn with_credential_signer_factory(mut self, factory: CredentialSignerFactory) -> Self {
        self.signer_factory = factory;
        self
    }

    pub fn with_http_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.http_transport = transport;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &PushConfig {
        &self.config
    }

    pub fn is_dry_run(&self) -> bool {
        self.config.dry_run
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&PushEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(kind, handler)
    }

    pub fn dry_run_log(&self) -> &DryRunLog {
        &self.dry_run_log
    }

    /// Snapshot of the active platforms
    pub fn capabilities(&self) -> BTreeSet<Capability> {
        self.capabilities.clone()
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Shared APNs provider token holder
    pub fn credentials(&self) -> &Arc<CredentialSlot> {
        &self.credentials
    }

    pub fn is_rotating(&self) -> bool {
        self.rotation.as_ref().is_some_and(TokenRotation::is_running)
    }

    /// Activate every configured platform.
    ///
    /// Nothing is committed unless all configured platforms initialize. A
    /// second successful call is rejected. With APNs configured this must run
    /// inside a tokio runtime.
    pub fn prepare(&mut self) -> Result<()> {
        if self.prepared {
            return Err(DispatchError::AlreadyPrepared);
        }

        let android = match &self.config.firebase {
            Some(firebase) if firebase.has_credential() => {
                let credential = firebase.load_credential()?;
                info!(project_id = %credential.project_id, "Initializing FCM");
                Some(AndroidSender::new((self.batch_factory)(credential)?))
            }
            _ => None,
        };

        let apns = match &self.config.apns {
            Some(apns) if apns.has_key() => {
                let pem = apns.load_private_key()?;
                let signer = (self.signer_factory)(apns, &pem)?;
                let credential = signer.sign()?;

                let events = self.events.clone();
                let rotation = TokenRotation::spawn(
                    signer,
                    self.credentials.clone(),
                    APNS_TOKEN_REFRESH_INTERVAL,
                    move |e| {
                        events.warn(format!(
                            "APNs token rotation stopped, iOS sends will fail until restart: {}",
                            e
                        ))
                    },
                )?;

                info!(
                    topic = %apns.topic,
                    sandbox = apns.sandbox,
                    "Initializing APNs"
                );
                let client = ApnsClient::new(
                    apns,
                    self.http_transport.clone(),
                    self.credentials.clone(),
                );
                Some((IosSender::new(client), rotation, credential))
            }
            _ => None,
        };

        self.prepared = true;

        if let Some(sender) = android {
            self.android = Some(sender);
            self.capabilities.insert(Capability::Android);
        }
        if let Some((sender, rotation, credential)) = apns {
            self.credentials.replace(credential);
            self.ios = Some(sender);
            self.rotation = Some(rotation);
            self.capabilities.insert(Capability::Ios);
        }

        if self.capabilities.is_empty() {
            warn!("{}", NO_CAPABILITIES);
            self.events.warn(NO_CAPABILITIES);
        } else {
            info!(
                dry_run = self.config.dry_run,
                "Push notifications prepared with capabilities {:?}",
                self.capabilities
            );
        }

        Ok(())
    }

    /// Stop APNs token rotation. Safe to call repeatedly.
    pub fn release(&mut self) {
        if let Some(mut rotation) = self.rotation.take() {
            rotation.stop();
        }
    }

    /// Send `notification` to every token, routed by platform.
    ///
    /// Never fails as a whole: per-token failures are published as `error`
    /// events and a missing platform as a `warning`. Returns the provider
    /// message ids collected across both platforms.
    pub async fn push_notification<S: AsRef<str>>(
        &self,
        tokens: &[S],
        notification: &Notification,
    ) -> Vec<String> {
        let buckets = partition(self.classifier.as_ref(), tokens);
        let notification = Arc::new(notification.clone());
        let ctx = DispatchContext {
            engine_id: self.id,
            dry_run: self.config.dry_run,
            events: &self.events,
            dry_run_log: &self.dry_run_log,
        };

        let mut message_ids = Vec::new();

        if !buckets.android.is_empty() {
            match &self.android {
                Some(sender) => {
                    message_ids.extend(sender.push(&ctx, &buckets.android, &notification).await)
                }
                None => self.warn_missing(Capability::Android, buckets.android.len()),
            }
        }

        if !buckets.ios.is_empty() {
            match &self.ios {
                Some(sender) => {
                    message_ids.extend(sender.push(&ctx, &buckets.ios, &notification).await)
                }
                None => self.warn_missing(Capability::Ios, buckets.ios.len()),
            }
        }

        message_ids
    }

    fn warn_missing(&self, capability: Capability, skipped: usize) {
        let platform = match capability {
            Capability::Android => "Android",
            Capability::Ios => "iOS",
        };
        let message = format!(
            "Trying to send an {} notification, but no {} capabilities were found.",
            platform, platform
        );
        warn!(skipped, "{}", message);
        self.events.warn(message);
    }
}

impl Drop for PushNotifications {
    fn drop(&mut self) {
        self.release();
    }
}
