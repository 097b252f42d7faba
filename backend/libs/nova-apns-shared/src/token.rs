use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, error, info};

use crate::errors::ApnsError;

/// APNs rejects provider tokens older than one hour
pub const APNS_TOKEN_REFRESH_INTERVAL: Duration = Duration::from_secs(50 * 60);

/// Provider token claims
#[derive(Debug, Serialize)]
struct ProviderClaims<'a> {
    iss: &'a str,
    iat: i64,
}

/// A signed provider token and the time it was issued
#[derive(Debug, Clone)]
pub struct SignedCredential {
    pub token: String,
    pub issued_at: DateTime<Utc>,
}

/// Signs APNs provider tokens with an ES256 `.p8` key
pub struct ApnsTokenSigner {
    team_id: String,
    key_id: String,
    encoding_key: EncodingKey,
}

/// Anything that can mint provider tokens for the rotation task
pub trait CredentialSigner: Send + Sync {
    fn key_id(&self) -> &str;
    fn sign(&self) -> Result<SignedCredential, ApnsError>;
}

impl ApnsTokenSigner {
    /// Parse the PEM key once; signing reuses it
    pub fn new(team_id: String, key_id: String, p8_pem: &str) -> Result<Self, ApnsError> {
        let encoding_key =
            EncodingKey::from_ec_pem(p8_pem.as_bytes()).map_err(ApnsError::KeyParse)?;

        Ok(Self {
            team_id,
            key_id,
            encoding_key,
        })
    }

}

impl CredentialSigner for ApnsTokenSigner {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Produce a token asserting issuance now
    fn sign(&self) -> Result<SignedCredential, ApnsError> {
        let issued_at = Utc::now();

        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.key_id.clone());

        let claims = ProviderClaims {
            iss: &self.team_id,
            iat: issued_at.timestamp(),
        };

        let token = encode(&header, &claims, &self.encoding_key).map_err(ApnsError::Signing)?;

        Ok(SignedCredential { token, issued_at })
    }
}

/// Single-slot holder for the live provider token.
///
/// Senders only read; rotation replaces the value in place.
#[derive(Debug, Default)]
pub struct CredentialSlot {
    current: RwLock<Option<SignedCredential>>,
    generation: AtomicU64,
}

impl CredentialSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, credential: SignedCredential) {
        *self.current.write() = Some(credential);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        *self.current.write() = None;
    }

    /// Bearer token to send, if one is live
    pub fn bearer(&self) -> Option<String> {
        self.current.read().as_ref().map(|c| c.token.clone())
    }

    pub fn current(&self) -> Option<SignedCredential> {
        self.current.read().clone()
    }

    /// Number of tokens stored so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

/// Background task re-signing the provider token on a fixed period.
///
/// Stops on `stop()` or drop; once `stop()` returns the slot is never
/// written again. A signing failure clears the slot, calls `on_failure` and
/// ends the task; it is never retried.
pub struct TokenRotation {
    handle: Option<JoinHandle<()>>,
    stopped: Arc<Mutex<bool>>,
}

impl TokenRotation {
    pub fn spawn<F>(
        signer: Arc<dyn CredentialSigner>,
        slot: Arc<CredentialSlot>,
        period: Duration,
        on_failure: F,
    ) -> Result<Self, ApnsError>
    where
        F: Fn(&ApnsError) + Send + Sync + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ApnsError::NoRuntime)?;

        let stopped = Arc::new(Mutex::new(false));
        let task_stopped = stopped.clone();

        let handle = runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);

            loop {
                ticker.tick().await;

                let signed = signer.sign();

                // Held across the write so stop() cannot interleave with it
                let stopped = task_stopped.lock();
                if *stopped {
                    break;
                }

                match signed {
                    Ok(credential) => {
                        debug!(
                            key_id = signer.key_id(),
                            issued_at = %credential.issued_at,
                            "Rotated APNs provider token"
                        );
                        slot.replace(credential);
                    }
                    Err(e) => {
                        error!(
                            key_id = signer.key_id(),
                            "APNs provider token rotation failed, stopping rotation: {}", e
                        );
                        slot.clear();
                        on_failure(&e);
                        break;
                    }
                }
            }
        });

        info!("APNs provider token rotation scheduled every {:?}", period);

        Ok(Self {
            handle: Some(handle),
            stopped,
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Idempotent
    pub fn stop(&mut self) {
        *self.stopped.lock() = true;
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("APNs provider token rotation stopped");
        }
    }
}

impl Drop for TokenRotation {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
    use serde::Deserialize;
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    const P8: &str = include_str!("../tests/fixtures/AuthKey_TEST.p8");
    const PUBLIC: &str = include_str!("../tests/fixtures/AuthKey_TEST.pub.pem");

    #[derive(Debug, Deserialize)]
    struct Claims {
        iss: String,
        iat: i64,
    }

    fn signer() -> Arc<ApnsTokenSigner> {
        Arc::new(ApnsTokenSigner::new("TEAM123".to_string(), "KEY123".to_string(), P8).unwrap())
    }

    #[test]
    fn test_sign_header_and_claims() {
        let credential = signer().sign().unwrap();

        let header = decode_header(&credential.token).unwrap();
        assert_eq!(header.alg, Algorithm::ES256);
        assert_eq!(header.kid.as_deref(), Some("KEY123"));

        let mut validation = Validation::new(Algorithm::ES256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        let key = DecodingKey::from_ec_pem(PUBLIC.as_bytes()).unwrap();
        let data = decode::<Claims>(&credential.token, &key, &validation).unwrap();

        assert_eq!(data.claims.iss, "TEAM123");
        assert_eq!(data.claims.iat, credential.issued_at.timestamp());
    }

    #[test]
    fn test_invalid_key_rejected() {
        let result = ApnsTokenSigner::new("T".to_string(), "K".to_string(), "not a key");
        assert!(matches!(result, Err(ApnsError::KeyParse(_))));
    }

    #[test]
    fn test_slot_replace_and_clear() {
        let slot = CredentialSlot::new();
        assert!(slot.bearer().is_none());

        slot.replace(signer().sign().unwrap());
        assert_eq!(slot.generation(), 1);
        assert!(slot.bearer().is_some());

        slot.clear();
        assert!(slot.bearer().is_none());
        assert_eq!(slot.generation(), 1);
    }

    #[test]
    fn test_spawn_without_runtime() {
        let result = TokenRotation::spawn(
            signer(),
            Arc::new(CredentialSlot::new()),
            APNS_TOKEN_REFRESH_INTERVAL,
            |_| {},
        );
        assert!(matches!(result, Err(ApnsError::NoRuntime)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rotation_period_and_stop() {
        let slot = Arc::new(CredentialSlot::new());
        let mut rotation = TokenRotation::spawn(
            signer(),
            slot.clone(),
            APNS_TOKEN_REFRESH_INTERVAL,
            |_| {},
        )
        .unwrap();

        tokio::time::sleep(Duration::from_secs(49 * 60)).await;
        assert_eq!(slot.generation(), 0);

        tokio::time::sleep(Duration::from_secs(2 * 60)).await;
        assert_eq!(slot.generation(), 1);

        tokio::time::sleep(APNS_TOKEN_REFRESH_INTERVAL).await;
        assert_eq!(slot.generation(), 2);
        assert!(rotation.is_running());

        rotation.stop();
        rotation.stop();
        tokio::time::sleep(APNS_TOKEN_REFRESH_INTERVAL * 3).await;
        assert_eq!(slot.generation(), 2);
        assert!(!rotation.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_rotation() {
        let slot = Arc::new(CredentialSlot::new());
        let rotation = TokenRotation::spawn(
            signer(),
            slot.clone(),
            APNS_TOKEN_REFRESH_INTERVAL,
            |_| {},
        )
        .unwrap();
        drop(rotation);

        tokio::time::sleep(APNS_TOKEN_REFRESH_INTERVAL * 2).await;
        assert_eq!(slot.generation(), 0);
    }

    #[tokio::test]
    async fn test_failure_callback_not_called_on_success() {
        let failures = Arc::new(AtomicUsize::new(0));
        let counter = failures.clone();
        let mut rotation = TokenRotation::spawn(
            signer(),
            Arc::new(CredentialSlot::new()),
            Duration::from_millis(5),
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        )
        .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        rotation.stop();
        assert_eq!(failures.load(Ordering::SeqCst), 0);
    }

    struct RevokedKey;

    impl CredentialSigner for RevokedKey {
        fn key_id(&self) -> &str {
            "REVOKED"
        }

        fn sign(&self) -> Result<SignedCredential, ApnsError> {
            Err(ApnsError::Config("key revoked".to_string()))
        }
    }

    /// Signs with the fixture key after blocking the worker thread
    struct SlowSigner {
        inner: Arc<ApnsTokenSigner>,
        entered: Arc<AtomicBool>,
    }

    impl CredentialSigner for SlowSigner {
        fn key_id(&self) -> &str {
            self.inner.key_id()
        }

        fn sign(&self) -> Result<SignedCredential, ApnsError> {
            self.entered.store(true, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(200));
            self.inner.sign()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rotation_failure_clears_slot_and_stops() {
        let slot = Arc::new(CredentialSlot::new());
        slot.replace(signer().sign().unwrap());

        let failures = Arc::new(AtomicUsize::new(0));
        let counter = failures.clone();
        let rotation = TokenRotation::spawn(
            Arc::new(RevokedKey),
            slot.clone(),
            APNS_TOKEN_REFRESH_INTERVAL,
            move |e| {
                assert_eq!(e.code(), "ConfigError");
                counter.fetch_add(1, Ordering::SeqCst);
            },
        )
        .unwrap();

        tokio::time::sleep(APNS_TOKEN_REFRESH_INTERVAL + Duration::from_secs(1)).await;
        assert!(slot.bearer().is_none());
        assert_eq!(failures.load(Ordering::SeqCst), 1);
        assert!(!rotation.is_running());

        tokio::time::sleep(APNS_TOKEN_REFRESH_INTERVAL * 3).await;
        assert_eq!(failures.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_no_write_after_stop_returns() {
        let slot = Arc::new(CredentialSlot::new());
        let entered = Arc::new(AtomicBool::new(false));
        let mut rotation = TokenRotation::spawn(
            Arc::new(SlowSigner {
                inner: signer(),
                entered: entered.clone(),
            }),
            slot.clone(),
            Duration::from_millis(10),
            |_| {},
        )
        .unwrap();

        while !entered.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        // signing is in flight on another worker
        rotation.stop();
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(slot.generation(), 0);
        assert!(slot.bearer().is_none());
    }
}
