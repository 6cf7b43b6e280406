// Gate types and configuration

use serde::{Deserialize, Serialize};

/// Gate configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Secret a candidate must match exactly (case-sensitive, no trimming)
    pub secret: String,
    /// Inactivity timeout in milliseconds; 0 disables auto-lock entirely
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Storage key holding the authenticated flag
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Interval between background staleness checks in milliseconds
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
}

fn default_timeout_ms() -> u64 {
    // 20 minutes
    20 * 60 * 1000
}

fn default_storage_key() -> String {
    "authenticated".to_string()
}

fn default_check_interval_ms() -> u64 {
    60_000
}

impl GateConfig {
    /// Create a configuration with the given secret and default timeouts
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            timeout_ms: default_timeout_ms(),
            storage_key: default_storage_key(),
            check_interval_ms: default_check_interval_ms(),
        }
    }

    /// Set the inactivity timeout in milliseconds (0 disables auto-lock)
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the inactivity timeout in minutes (0 disables auto-lock)
    pub fn with_timeout_minutes(mut self, minutes: u64) -> Self {
        self.timeout_ms = minutes * 60 * 1000;
        self
    }

    /// Set the storage key for the authenticated flag
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Set the staleness check interval in milliseconds
    pub fn with_check_interval_ms(mut self, interval_ms: u64) -> Self {
        self.check_interval_ms = interval_ms;
        self
    }

    /// Whether inactivity can ever lock the gate
    pub fn auto_lock_enabled(&self) -> bool {
        self.timeout_ms > 0
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.secret.is_empty() {
            return Err("Gate secret must not be empty".to_string());
        }

        if self.storage_key.is_empty() {
            return Err("Storage key must not be empty".to_string());
        }

        if self.check_interval_ms == 0 {
            return Err("Check interval must be greater than zero".to_string());
        }

        Ok(())
    }
}

/// Gate state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    /// Initial state, before the first storage check has resolved
    Unknown,
    /// No valid session; the gate blocks access
    Locked,
    /// A valid session exists; access is granted
    Unlocked,
}

/// The persisted session pair, as read back from a [`SessionStore`]
///
/// [`SessionStore`]: crate::session::SessionStore
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionRecord {
    /// Whether an unlock has succeeded and not yet been invalidated
    pub authenticated: bool,
    /// Epoch milliseconds of the most recent qualifying activity or
    /// successful unlock; 0 when absent
    pub last_activity_ms: i64,
}

impl SessionRecord {
    /// The record an empty store reads as: unauthenticated, no activity
    pub fn absent() -> Self {
        Self {
            authenticated: false,
            last_activity_ms: 0,
        }
    }
}

/// Qualifying user interactions that refresh the inactivity timer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Pointer click anywhere in the gated surface
    PointerClick,
    /// Key press
    KeyPress,
    /// Scroll
    Scroll,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = GateConfig::new("hunter2");

        assert_eq!(config.secret, "hunter2");
        assert_eq!(config.timeout_ms, 20 * 60 * 1000);
        assert_eq!(config.storage_key, "authenticated");
        assert_eq!(config.check_interval_ms, 60_000);
        assert!(config.auto_lock_enabled());
    }

    #[test]
    fn test_config_builders() {
        let config = GateConfig::new("s")
            .with_timeout_minutes(5)
            .with_storage_key("gate")
            .with_check_interval_ms(1_000);

        assert_eq!(config.timeout_ms, 5 * 60 * 1000);
        assert_eq!(config.storage_key, "gate");
        assert_eq!(config.check_interval_ms, 1_000);
    }

    #[test]
    fn test_zero_timeout_disables_auto_lock() {
        let config = GateConfig::new("s").with_timeout_ms(0);
        assert!(!config.auto_lock_enabled());
    }

    #[test]
    fn test_config_validation() {
        assert!(GateConfig::new("s").validate().is_ok());

        let result = GateConfig::new("").validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("secret"));

        let result = GateConfig::new("s").with_storage_key("").validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Storage key"));

        let result = GateConfig::new("s").with_check_interval_ms(0).validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Check interval"));
    }

    #[test]
    fn test_absent_record_reads_as_unauthenticated() {
        let record = SessionRecord::absent();
        assert!(!record.authenticated);
        assert_eq!(record.last_activity_ms, 0);
    }
}
