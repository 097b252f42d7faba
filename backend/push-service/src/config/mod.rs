use nova_apns_shared::ApnsConfig;
use nova_fcm_shared::FirebaseConfig;
use serde::Deserialize;

use crate::error::{DispatchError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    /// Record sends instead of performing them
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,
    #[serde(default)]
    pub firebase: Option<FirebaseConfig>,
    #[serde(default)]
    pub apns: Option<ApnsConfig>,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            dry_run: default_dry_run(),
            firebase: None,
            apns: None,
        }
    }
}

/// Dry run by default in test and development environments
fn default_dry_run() -> bool {
    dry_run_for_env(std::env::var("APP_ENV").ok().as_deref())
}

fn dry_run_for_env(app_env: Option<&str>) -> bool {
    matches!(app_env, Some("test") | Some("development"))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(DispatchError::Config(format!(
            "{} must be a boolean, got {:?}",
            name, other
        ))),
    }
}

impl PushConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. A platform section exists only when
    /// its key material variable is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dry_run = match lookup("PUSH_DRY_RUN") {
            Some(value) => parse_bool("PUSH_DRY_RUN", &value)?,
            None => dry_run_for_env(lookup("APP_ENV").as_deref()),
        };

        let firebase = lookup("FCM_CREDENTIAL_LOCATION").map(FirebaseConfig::from_location);

        let p8_key_location = lookup("APNS_P8_KEY_LOCATION");
        let p8_key = lookup("APNS_P8_KEY");
        let apns = if p8_key_location.is_some() || p8_key.is_some() {
            let required = |name: &str| {
                lookup(name).ok_or_else(|| {
                    DispatchError::Config(format!("{} is required when an APNs key is set", name))
                })
            };

            Some(ApnsConfig {
                p8_key_location,
                p8_key,
                key_id: required("APNS_KEY_ID")?,
                team_id: required("APNS_TEAM_ID")?,
                topic: required("APNS_TOPIC")?,
                sandbox: match lookup("APNS_SANDBOX") {
                    Some(value) => parse_bool("APNS_SANDBOX", &value)?,
                    None => false,
                },
            })
        } else {
            None
        };

        Ok(Self {
            dry_run,
            firebase,
            apns,
        })
    }
}
