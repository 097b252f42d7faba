pub mod classifier;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod services;

pub use classifier::{partition, Partitioned, SeparatorClassifier, TokenClassifier};
pub use config::PushConfig;
pub use error::{DeliveryError, DispatchError, Result};
pub use events::{EventBus, EventKind, EventPayload, PushEvent, SubscriptionId};
pub use models::{Capability, DispatchOutcome, DryRunLog, DryRunRecord, Notification};
pub use services::{BatchTransportFactory, CredentialSignerFactory, PushNotifications};
