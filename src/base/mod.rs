//! Base types and error handling.
//!
//! - [`JarError`](jarerror::JarError): error type shared by every module
//! - [`IoResultExt`](context::IoResultExt): IO error context helpers

pub mod context;
pub mod jarerror;
