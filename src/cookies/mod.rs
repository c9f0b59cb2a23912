//! Cookie storage scoped by the Public Suffix List.
//!
//! - **Rules**: one parsed PSL line ([`SuffixRule`](suffixrule::SuffixRule))
//! - **Resolution**: registrable-domain lookup ([`SuffixRuleDatabase`](psl::SuffixRuleDatabase))
//! - **Storage**: validated, domain-keyed jar ([`CookieStore`](store::CookieStore))
//! - **Persistence**: length-prefixed cookie text over any `Read`/`Write`
//!
//! # Architecture
//!
//! | Type | Responsibility |
//! |------|----------------|
//! | [`SuffixRuleDatabase`](psl::SuffixRuleDatabase) | Index of rules by top-level label, eTLD+1 lookup |
//! | [`CanonicalCookie`](canonicalcookie::CanonicalCookie) | Single cookie + text form |
//! | [`CookieStore`](store::CookieStore) | Domain-keyed jar, validated inserts |
//! | [`persistence`] | Byte format and file helpers |
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use suffixjar::cookies::canonicalcookie::CanonicalCookie;
//! use suffixjar::cookies::psl::SuffixRuleDatabase;
//! use suffixjar::cookies::store::CookieStore;
//! use url::Url;
//!
//! let psl = Arc::new(SuffixRuleDatabase::parse("uk\nco.uk\n"));
//! assert_eq!(psl.registrable_domain("www.example.co.uk").as_deref(), Some("example.co.uk"));
//!
//! let store = CookieStore::new(Arc::clone(&psl));
//! let from = Url::parse("https://a.example.co.uk/").unwrap();
//! let cookie = CanonicalCookie::new("sid", "1").with_domain(".example.co.uk");
//! assert!(store.set_cookies_from_url(vec![cookie], &from));
//!
//! let sibling = Url::parse("https://b.example.co.uk/").unwrap();
//! assert_eq!(store.cookies_for_url(&sibling).len(), 1);
//! ```

pub mod canonicalcookie;
pub mod persistence;
pub mod psl;
pub mod store;
pub mod suffixrule;
