//! # suffixjar
//!
//! A persistent cookie jar whose every read and write is scoped by the
//! Public Suffix List.
//!
//! `suffixjar` decides, for any hostname, which part of it is the
//! registrable domain (`example.co.uk`, not `co.uk`) and uses that to stop
//! a host from reading or setting cookies that belong to an unrelated
//! domain or to a public suffix itself.
//!
//! ## Features
//!
//! - **PSL resolution**: wildcard and exception rules, longest match wins
//! - **Scoped cookie jar**: host-only and registrable-domain cookies, validated inserts
//! - **Persistence**: compact length-prefixed format over any `Read`/`Write`
//! - **Context**: build the rule database once, load on start, persist on close
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use suffixjar::context::{CookieContext, CookieContextConfig};
//! use url::Url;
//!
//! let config = CookieContextConfig::default()
//!     .with_rules_path("/usr/share/publicsuffix/public_suffix_list.dat")
//!     .with_data_dir("/var/lib/myapp");
//! let context = CookieContext::with_config(config);
//!
//! let url = Url::parse("https://www.example.co.uk/login").unwrap();
//! context.cookie_store().parse_and_save_cookie(&url, "sid=abc; Domain=example.co.uk");
//! let cookies = context.cookie_store().cookies_for_url(&url);
//! println!("{} cookies", cookies.len());
//! // Persisted again when `context` is dropped.
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error type and IO error context
//! - [`cookies`] - Suffix rules, registrable-domain lookup, cookie store, persistence
//! - [`context`] - Startup/teardown wiring and configuration

pub mod base;
pub mod context;
pub mod cookies;

pub use base::jarerror::JarError;
pub use context::{CookieContext, CookieContextConfig};
pub use cookies::canonicalcookie::CanonicalCookie;
pub use cookies::psl::SuffixRuleDatabase;
pub use cookies::store::CookieStore;
pub use cookies::suffixrule::SuffixRule;
