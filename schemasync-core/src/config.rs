//! Shared configuration for synchronization runs.
//!
//! The engine takes its dependencies explicitly: the credentials and
//! settings below are constructed once by the caller and handed to the
//! scheduler and fetcher, never read from process-global state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Shared remote account used against every registered instance.
///
/// Constant for the duration of a run. `Debug` and `Display` never reveal
/// the password.
#[derive(Clone, Serialize, Deserialize)]
pub struct RemoteCredentials {
    pub username: String,
    pub password: String,
}

impl RemoteCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for RemoteCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCredentials")
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

impl fmt::Display for RemoteCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:****", self.username)
    }
}

/// Tunables for one synchronization pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Deadline for a single metadata query, connection setup included.
    pub query_timeout: Duration,
    /// Fixed capacity of the concurrency gate: how many instances may be
    /// in flight at once.
    pub max_concurrency: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            query_timeout: Duration::from_secs(10),
            max_concurrency: 4,
        }
    }
}

impl SyncSettings {
    /// Validates settings before a run.
    ///
    /// # Errors
    /// Returns a configuration error if a value is out of range.
    pub fn validate(&self) -> crate::Result<()> {
        if self.query_timeout.is_zero() {
            return Err(crate::error::SyncError::configuration(
                "query_timeout must be greater than 0",
            ));
        }

        if self.max_concurrency == 0 {
            return Err(crate::error::SyncError::configuration(
                "max_concurrency must be greater than 0",
            ));
        }

        if self.max_concurrency > 64 {
            return Err(crate::error::SyncError::configuration(
                "max_concurrency should not exceed 64",
            ));
        }

        Ok(())
    }

    /// Builder method to set the query deadline.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Builder method to set the concurrency gate capacity.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_settings_default() {
        let settings = SyncSettings::default();
        assert_eq!(settings.query_timeout, Duration::from_secs(10));
        assert_eq!(settings.max_concurrency, 4);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_sync_settings_validation() {
        let settings = SyncSettings::default().with_query_timeout(Duration::ZERO);
        assert!(settings.validate().is_err());

        let settings = SyncSettings::default().with_max_concurrency(0);
        assert!(settings.validate().is_err());

        let settings = SyncSettings::default().with_max_concurrency(65);
        assert!(settings.validate().is_err());

        let settings = SyncSettings::default()
            .with_query_timeout(Duration::from_secs(30))
            .with_max_concurrency(8);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_credentials_never_printed() {
        let credentials = RemoteCredentials::new("sync_ro", "hunter2");

        let debug = format!("{:?}", credentials);
        assert!(debug.contains("sync_ro"));
        assert!(!debug.contains("hunter2"));

        let display = format!("{}", credentials);
        assert!(!display.contains("hunter2"));
    }
}
