//! Durable snapshot shapes exchanged with the state store

use crate::ids::NotificationKey;
use crate::notification::NotificationHandle;
use crate::person::Person;
use serde::{Deserialize, Serialize};

/// Every known person with their selections and onboarding flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub persons: Vec<Person>,
}

/// One registry entry with its composite key spelled out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    #[serde(flatten)]
    pub key: NotificationKey,
    pub handle: NotificationHandle,
}

/// Every outstanding notification handle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    #[serde(default)]
    pub entries: Vec<RegistryEntry>,
}
