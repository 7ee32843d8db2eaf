// Application Configuration
//
// Loaded once at startup and reloadable on demand. Reload builds a complete
// new snapshot and swaps it in atomically, so a racing authorization check
// sees either the old or the new configuration, never a mix.

use std::sync::{Arc, RwLock};

use serde::Deserialize;
use tracing::info;

use crate::error::{AppError, Result};

/// Default maximum entry age in seconds.
pub const DEFAULT_MAX_ENTRY_AGE_SECS: i64 = 3600;

/// Default interval between scheduled cleanup runs, in seconds.
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300;

/// One immutable configuration snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Admin username for management operations.
    #[serde(default)]
    pub admin_user: String,

    /// Salted hash of the admin password ({SSHA256} framed).
    #[serde(default)]
    pub admin_pass_hash: String,

    /// Salt used for hashing bearer tokens. When absent, token lookups
    /// degrade to comparing raw secrets against stored hashes (and fail).
    #[serde(default)]
    pub token_salt: Option<String>,

    /// Entries older than this are removed by cleanup.
    #[serde(default = "default_max_entry_age")]
    pub max_entry_age_secs: i64,

    /// How often the scheduled cleanup runs.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,

    /// sqlx connection string for the backing store.
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

fn default_max_entry_age() -> i64 {
    DEFAULT_MAX_ENTRY_AGE_SECS
}

fn default_cleanup_interval() -> u64 {
    DEFAULT_CLEANUP_INTERVAL_SECS
}

fn default_database_url() -> String {
    "sqlite://qgate.db".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            admin_user: String::new(),
            admin_pass_hash: String::new(),
            token_salt: None,
            max_entry_age_secs: DEFAULT_MAX_ENTRY_AGE_SECS,
            cleanup_interval_secs: DEFAULT_CLEANUP_INTERVAL_SECS,
            database_url: default_database_url(),
        }
    }
}

impl AppConfig {
    /// Load a snapshot from an optional config file plus `QGATE_`-prefixed
    /// environment variables (environment wins).
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        builder
            .add_source(config::Environment::with_prefix("QGATE"))
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| AppError::Config(e.to_string()))
    }
}

/// Shared handle to the current configuration snapshot.
///
/// Read-mostly: authorization checks take a snapshot per call; `reload`
/// replaces the whole snapshot under the write lock.
pub struct ConfigHandle {
    path: Option<String>,
    current: RwLock<Arc<AppConfig>>,
}

impl ConfigHandle {
    /// Load the initial snapshot.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config = AppConfig::load(path)?;
        Ok(Self {
            path: path.map(String::from),
            current: RwLock::new(Arc::new(config)),
        })
    }

    /// Wrap an already-built config (used by tests and embedded setups).
    pub fn from_config(config: AppConfig) -> Self {
        Self {
            path: None,
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// The current snapshot. Cheap: clones an Arc.
    pub fn snapshot(&self) -> Arc<AppConfig> {
        let guard = match self.current.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(&guard)
    }

    /// Rebuild the snapshot from the original sources and swap it in.
    pub fn reload(&self) -> Result<()> {
        let fresh = Arc::new(AppConfig::load(self.path.as_deref())?);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = fresh;
        info!("configuration reloaded");
        Ok(())
    }

    /// Swap in a pre-built snapshot (test hook).
    pub fn replace(&self, config: AppConfig) {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Arc::new(config);
    }
}
