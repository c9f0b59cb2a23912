//! Ergonomic error context helpers.
//!
//! Provides extension traits for adding context to `Result` types,
//! converting IO errors into context-rich `JarError` variants.

use crate::base::jarerror::JarError;
use std::io;
use std::path::Path;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Add cookie persistence context to an IO error.
    ///
    /// # Example
    /// ```ignore
    /// use suffixjar::base::context::IoResultExt;
    ///
    /// let file = File::open(path).persist_context("load")?;
    /// // Error: "Cookie store load failed: No such file or directory"
    /// ```
    fn persist_context(self, operation: &'static str) -> Result<T, JarError>;

    /// Add rule list context to an IO error.
    fn rules_context(self, path: &Path) -> Result<T, JarError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn persist_context(self, operation: &'static str) -> Result<T, JarError> {
        self.map_err(|e| JarError::cookie_store_io(operation, e))
    }

    fn rules_context(self, path: &Path) -> Result<T, JarError> {
        self.map_err(|e| JarError::rule_list_unreadable(path.display().to_string(), e))
    }
}
