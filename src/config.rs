//! Sync configuration, loaded from JSON.
//!
//! Every key is optional; missing keys take the defaults below.
//!
//! ```json
//! {
//!   "batch_per_tick": 20,
//!   "max_attempts": 8,
//!   "backoff_minutes": [0, 1, 2, 5, 10, 20, 40, 80],
//!   "lock_timeout_ms": 30000,
//!   "tick_interval_secs": 300,
//!   "link_base_url": "https://tribu.example/app",
//!   "stale_edit_secs": 600,
//!   "field_keys": { "packed_key": "Tribu ROI" },
//!   "groups": { "01♥️": "contactGroups/abc", "05🟡": "contactGroups/def" }
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::outbox::BackoffSchedule;

/// Upper bound for `lock_timeout_ms`: five minutes.
pub const MAX_LOCK_TIMEOUT_MS: u64 = 300_000;

/// Names of the remote custom-field keys and event type the merger manages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldKeys {
    /// Keys starting with this prefix belong to the legacy per-field scheme.
    pub legacy_prefix: String,
    /// Packed-value key of the previous scheme.
    pub legacy_packed_key: String,
    pub packed_key: String,
    pub link_key: String,
    /// Event type holding the next-contact date.
    pub next_contact_event: String,
}

impl Default for FieldKeys {
    fn default() -> Self {
        Self {
            legacy_prefix: "tr_".into(),
            legacy_packed_key: "Tribu".into(),
            packed_key: "Tribu ROI".into(),
            link_key: "Tribu Link".into(),
            next_contact_event: "Próx. Contacto".into(),
        }
    }
}

impl FieldKeys {
    fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("legacy_prefix", &self.legacy_prefix),
            ("legacy_packed_key", &self.legacy_packed_key),
            ("packed_key", &self.packed_key),
            ("link_key", &self.link_key),
            ("next_contact_event", &self.next_contact_event),
        ];
        for (name, value) in named {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("field_keys.{} is empty", name)));
            }
        }
        Ok(())
    }
}

/// Remote group ids by group name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupDirectory(BTreeMap<String, String>);

impl GroupDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, group_id: impl Into<String>) -> Self {
        self.0.insert(name.into(), group_id.into());
        self
    }

    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    batch_per_tick: usize,
    max_attempts: u32,
    backoff_minutes: Vec<u64>,
    lock_timeout_ms: u64,
    tick_interval_secs: u64,
    link_base_url: Option<String>,
    stale_edit_secs: u64,
    field_keys: FieldKeys,
    groups: GroupDirectory,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            batch_per_tick: 20,
            max_attempts: 8,
            backoff_minutes: BackoffSchedule::DEFAULT_MINUTES.to_vec(),
            lock_timeout_ms: 30_000,
            tick_interval_secs: 300,
            link_base_url: None,
            stale_edit_secs: 600,
            field_keys: FieldKeys::default(),
            groups: GroupDirectory::default(),
        }
    }
}

/// Validated engine configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct SyncConfig {
    /// Max entries processed per tick.
    pub batch_per_tick: usize,
    /// Failed attempts after which an entry is given up (SKIPPED).
    pub max_attempts: u32,
    pub backoff: BackoffSchedule,
    /// Bounded wait for the ledger write lock.
    pub lock_timeout: Duration,
    /// Scheduler cadence.
    pub tick_interval: Duration,
    /// Base URL of the deep link written to remote records. `None` writes no
    /// link.
    pub link_base_url: Option<String>,
    /// Dirty edits loaded longer ago than this are refused.
    pub stale_edit: Duration,
    pub field_keys: FieldKeys,
    pub groups: GroupDirectory,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_per_tick: 20,
            max_attempts: 8,
            backoff: BackoffSchedule::default(),
            lock_timeout: Duration::from_millis(30_000),
            tick_interval: Duration::from_secs(300),
            link_base_url: None,
            stale_edit: Duration::from_secs(600),
            field_keys: FieldKeys::default(),
            groups: GroupDirectory::default(),
        }
    }
}

impl SyncConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::try_from(raw)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn with_link_base_url(mut self, url: impl Into<String>) -> Self {
        self.link_base_url = normalize_url(Some(url.into()));
        self
    }

    pub fn with_groups(mut self, groups: GroupDirectory) -> Self {
        self.groups = groups;
        self
    }
}

fn normalize_url(url: Option<String>) -> Option<String> {
    url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())
}

impl TryFrom<RawConfig> for SyncConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        if raw.batch_per_tick == 0 {
            return Err(ConfigError::Invalid("batch_per_tick must be at least 1".into()));
        }
        if raw.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be at least 1".into()));
        }
        if raw.tick_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "tick_interval_secs must be at least 1".into(),
            ));
        }
        if raw.lock_timeout_ms > MAX_LOCK_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "lock_timeout_ms must be at most {}",
                MAX_LOCK_TIMEOUT_MS
            )));
        }
        raw.field_keys.validate()?;

        Ok(Self {
            batch_per_tick: raw.batch_per_tick,
            max_attempts: raw.max_attempts,
            backoff: BackoffSchedule::from_minutes(&raw.backoff_minutes)?,
            lock_timeout: Duration::from_millis(raw.lock_timeout_ms),
            tick_interval: Duration::from_secs(raw.tick_interval_secs),
            link_base_url: normalize_url(raw.link_base_url),
            stale_edit: Duration::from_secs(raw.stale_edit_secs),
            field_keys: raw.field_keys,
            groups: raw.groups,
        })
    }
}

/// Error type for configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "failed to read config: {}", msg),
            ConfigError::Parse(msg) => write!(f, "failed to parse config: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
