//! Cookie Context - startup and teardown wiring for the cookie jar.
//!
//! Builds the suffix database once, hands it to the store, loads the
//! persisted jar and writes it back when the application is done.

use crate::base::jarerror::JarError;
use crate::cookies::persistence;
use crate::cookies::psl::{SuffixRuleDatabase, DEFAULT_CACHE_CAPACITY};
use crate::cookies::store::CookieStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name used for the cookie jar inside a data directory.
pub const DEFAULT_COOKIE_FILE_NAME: &str = "cookies.dat";

/// Configuration options for [`CookieContext`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieContextConfig {
    /// Public suffix list file (`public_suffix_list.dat` format).
    /// None means an empty rule set.
    pub rules_path: Option<PathBuf>,

    /// Cookie jar file. None keeps cookies in memory only.
    pub cookie_path: Option<PathBuf>,

    /// Bound of the registrable-domain memo cache (0 disables it).
    pub registrable_cache_capacity: usize,

    /// Persist the jar when the context is dropped.
    pub persist_on_drop: bool,
}

impl Default for CookieContextConfig {
    fn default() -> Self {
        Self {
            rules_path: None,
            cookie_path: None,
            registrable_cache_capacity: DEFAULT_CACHE_CAPACITY,
            persist_on_drop: true,
        }
    }
}

impl std::fmt::Debug for CookieContextConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieContextConfig")
            .field("rules_path", &self.rules_path)
            .field("cookie_path", &self.cookie_path)
            .field("registrable_cache_capacity", &self.registrable_cache_capacity)
            .field("persist_on_drop", &self.persist_on_drop)
            .finish()
    }
}

impl CookieContextConfig {
    /// Parse configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, JarError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Keep the cookie jar as [`DEFAULT_COOKIE_FILE_NAME`] inside `dir`.
    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cookie_path = Some(dir.as_ref().join(DEFAULT_COOKIE_FILE_NAME));
        self
    }

    pub fn with_rules_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.rules_path = Some(path.into());
        self
    }
}

/// Owner of the suffix database and the cookie store for one application.
///
/// The database is built once here and shared with the store through an
/// `Arc`; nothing is global.
pub struct CookieContext {
    psl: Arc<SuffixRuleDatabase>,
    cookie_store: Arc<CookieStore>,
    config: CookieContextConfig,
    /// The cookie file existed but could not be read; persisting on drop
    /// would replace it with whatever is in memory.
    load_failed: bool,
}

impl CookieContext {
    /// Create a context with an empty rule set and no persistence.
    pub fn new() -> Self {
        Self::with_config(CookieContextConfig::default())
    }

    /// Build the database from the configured rule file and load the
    /// configured cookie file. Unreadable files are logged, never fatal.
    pub fn with_config(config: CookieContextConfig) -> Self {
        let psl = match &config.rules_path {
            Some(path) => SuffixRuleDatabase::from_path(path),
            None => SuffixRuleDatabase::empty(),
        };
        Self::with_database(psl, config)
    }

    /// Use an already-built rule database.
    pub fn with_database(psl: SuffixRuleDatabase, config: CookieContextConfig) -> Self {
        let psl = Arc::new(psl.with_cache_capacity(config.registrable_cache_capacity));
        let cookie_store = Arc::new(CookieStore::new(Arc::clone(&psl)));

        let mut load_failed = false;
        if let Some(path) = &config.cookie_path {
            if let Err(e) = persistence::load_cookies(&cookie_store, path) {
                tracing::warn!(error = %e, path = %path.display(), "unable to load cookies");
                load_failed = true;
            }
        }

        Self {
            psl,
            cookie_store,
            config,
            load_failed,
        }
    }

    /// Get the suffix rule database.
    pub fn suffix_database(&self) -> &Arc<SuffixRuleDatabase> {
        &self.psl
    }

    /// Get the cookie store.
    pub fn cookie_store(&self) -> &Arc<CookieStore> {
        &self.cookie_store
    }

    /// Get the configuration.
    pub fn config(&self) -> &CookieContextConfig {
        &self.config
    }

    /// Whether the configured cookie file was present but unreadable at
    /// startup. Such a context does not persist on drop; an explicit
    /// [`persist`](Self::persist) still overwrites the file.
    pub fn load_failed(&self) -> bool {
        self.load_failed
    }

    /// Write the jar to the configured cookie file. Returns the number of
    /// cookies written, 0 when no file is configured.
    pub fn persist(&self) -> Result<usize, JarError> {
        match &self.config.cookie_path {
            Some(path) => persistence::save_cookies(&self.cookie_store, path),
            None => Ok(0),
        }
    }

    /// Drop every cookie, in memory only; the file follows on the next
    /// [`persist`](Self::persist).
    pub fn clear_cookies(&self) {
        self.cookie_store.clear();
    }
}

impl Default for CookieContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CookieContext {
    fn drop(&mut self) {
        if !self.config.persist_on_drop {
            return;
        }
        if self.load_failed {
            tracing::warn!("cookie file was unreadable at startup, not overwriting it");
            return;
        }
        if let Err(e) = self.persist() {
            tracing::warn!(error = %e, "unable to persist cookies");
        }
    }
}
