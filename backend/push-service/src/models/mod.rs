use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::DeliveryError;

/// Platform an engine can deliver to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// FCM, batch delivery
    Android,
    /// APNs, one request per device
    Ios,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Android => "android",
            Capability::Ios => "ios",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification content shared by every recipient of a send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = Some(data);
        self
    }
}

/// Result of delivering one notification to one token
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub capability: Capability,
    pub token: String,
    pub notification: Arc<Notification>,
    pub result: std::result::Result<(), DeliveryError>,
}

/// A send that would have happened outside dry-run mode
#[derive(Debug, Clone)]
pub struct DryRunRecord {
    pub engine_id: Uuid,
    pub token: String,
    pub notification: Arc<Notification>,
    pub capability: Capability,
}

/// Append-only record of dry-run sends, owned by one engine
#[derive(Debug, Clone, Default)]
pub struct DryRunLog {
    records: Arc<Mutex<Vec<DryRunRecord>>>,
}

impl DryRunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, record: DryRunRecord) {
        self.records.lock().push(record);
    }

    /// Snapshot in insertion order
    pub fn records(&self) -> Vec<DryRunRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_capability_serialization() {
        assert_eq!(serde_json::to_string(&Capability::Android).unwrap(), "\"android\"");
        assert_eq!(serde_json::to_string(&Capability::Ios).unwrap(), "\"ios\"");
        assert_eq!(Capability::Ios.to_string(), "ios");
    }

    #[test]
    fn test_notification_data_is_optional() {
        let n: Notification = serde_json::from_value(json!({ "title": "t", "body": "b" })).unwrap();
        assert!(n.data.is_none());

        let json = serde_json::to_value(&n).unwrap();
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_dry_run_log_concurrent_append() {
        let log = DryRunLog::new();
        let notification = Arc::new(Notification::new("t", "b"));
        let engine_id = Uuid::new_v4();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let log = log.clone();
                let notification = notification.clone();
                std::thread::spawn(move || {
                    for j in 0..50 {
                        log.record(DryRunRecord {
                            engine_id,
                            token: format!("{}-{}", i, j),
                            notification: notification.clone(),
                            capability: Capability::Ios,
                        });
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(log.len(), 400);
        log.clear();
        assert!(log.is_empty());
    }
}
