#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use nova_apns_shared::{ApnsConfig, ApnsError, HttpRequest, HttpResponse, HttpTransport};
use nova_fcm_shared::{
    BatchTransport, FCMError, FcmMessageContent, FirebaseConfig, SendResponse, ServiceAccountKey,
};
use parking_lot::Mutex;
use push_service::{
    BatchTransportFactory, EventKind, PushConfig, PushEvent, PushNotifications,
};

pub const P8_KEY: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/AuthKey_TEST.p8");
pub const SERVICE_ACCOUNT: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/service-account.json");

/// FCM stand-in: tokens starting with `bad` are rejected as UNREGISTERED
#[derive(Default)]
pub struct ScriptedBatch {
    pub calls: Mutex<Vec<Vec<FcmMessageContent>>>,
}

#[async_trait]
impl BatchTransport for ScriptedBatch {
    async fn send_each(&self, messages: &[FcmMessageContent]) -> Vec<SendResponse> {
        self.calls.lock().push(messages.to_vec());
        messages
            .iter()
            .map(|m| {
                if m.token.starts_with("bad") {
                    Err(FCMError::ApiError {
                        code: "UNREGISTERED".to_string(),
                        message: "Requested entity was not found.".to_string(),
                    })
                } else {
                    Ok(format!("projects/nova-test/messages/{}", m.token))
                }
            })
            .collect()
    }
}

/// APNs stand-in: `*bad` → 400 BadDeviceToken, `*down` → transport error
#[derive(Default)]
pub struct RecordingHttp {
    pub requests: Mutex<Vec<HttpRequest>>,
}

#[async_trait]
impl HttpTransport for RecordingHttp {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, ApnsError> {
        self.requests.lock().push(request.clone());
        let token = request.url.rsplit('/').next().unwrap_or_default().to_string();

        if token.ends_with("down") {
            return Err(ApnsError::Transport("connection reset".to_string()));
        }

        let mut headers = HashMap::new();
        headers.insert("apns-id".to_string(), format!("apns-{}", token));

        if token.ends_with("bad") {
            Ok(HttpResponse {
                status: 400,
                headers,
                body: r#"{"reason":"BadDeviceToken"}"#.to_string(),
            })
        } else {
            Ok(HttpResponse {
                status: 200,
                headers,
                body: String::new(),
            })
        }
    }
}

pub fn firebase_config() -> FirebaseConfig {
    FirebaseConfig::from_location(SERVICE_ACCOUNT)
}

pub fn apns_config(sandbox: bool) -> ApnsConfig {
    ApnsConfig {
        p8_key_location: Some(P8_KEY.to_string()),
        p8_key: None,
        key_id: "KEY123".to_string(),
        team_id: "TEAM123".to_string(),
        topic: "com.nova.app".to_string(),
        sandbox,
    }
}

pub fn config(android: bool, ios: bool, dry_run: bool) -> PushConfig {
    PushConfig {
        dry_run,
        firebase: android.then(firebase_config),
        apns: ios.then(|| apns_config(false)),
    }
}

pub struct Harness {
    pub push: PushNotifications,
    pub batch: Arc<ScriptedBatch>,
    pub http: Arc<RecordingHttp>,
    pub events: Arc<Mutex<Vec<PushEvent>>>,
    pub credentials_seen: Arc<Mutex<Vec<ServiceAccountKey>>>,
}

impl Harness {
    pub fn new(config: PushConfig) -> Self {
        Self::with_push(config, |push| push)
    }

    /// Like `new`, with extra builder steps applied to the engine
    pub fn with_push<F>(config: PushConfig, customize: F) -> Self
    where
        F: FnOnce(PushNotifications) -> PushNotifications,
    {
        let batch = Arc::new(ScriptedBatch::default());
        let http = Arc::new(RecordingHttp::default());
        let credentials_seen = Arc::new(Mutex::new(Vec::new()));

        let factory_batch = batch.clone();
        let seen = credentials_seen.clone();
        let factory: BatchTransportFactory = Arc::new(
            move |key: ServiceAccountKey| -> Result<Arc<dyn BatchTransport>, FCMError> {
                seen.lock().push(key);
                Ok(factory_batch.clone() as Arc<dyn BatchTransport>)
            },
        );

        let push = PushNotifications::new(config)
            .with_batch_transport_factory(factory)
            .with_http_transport(http.clone());
        let push = customize(push);

        let events = Arc::new(Mutex::new(Vec::new()));
        for kind in [EventKind::Warning, EventKind::Push, EventKind::Error] {
            let sink = events.clone();
            push.subscribe(kind, move |event| sink.lock().push(event.clone()));
        }

        Self {
            push,
            batch,
            http,
            events,
            credentials_seen,
        }
    }

    pub fn prepared(config: PushConfig) -> Self {
        let mut harness = Self::new(config);
        harness.push.prepare().expect("prepare");
        harness
    }

    pub fn events(&self) -> Vec<PushEvent> {
        self.events.lock().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PushEvent::Warning { message } => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn clear_events(&self) {
        self.events.lock().clear();
    }
}
