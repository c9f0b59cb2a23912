//! Public Suffix List (PSL) resolution for cookie domain security.
//!
//! Prevents supercookie attacks by resolving every hostname to its
//! registrable domain (`example.co.uk`, never `co.uk`) before a cookie is
//! read or written.
//!
//! The rule list is supplied as text (Mozilla's `public_suffix_list.dat`
//! format) and indexed by top-level label. Resolution follows the PSL
//! algorithm:
//!
//! 1. Every rule whose labels match the hostname label-for-label is a
//!    candidate (`*` matches any one label).
//! 2. If any candidate is an exception rule, only exception rules remain.
//! 3. The candidate with the most labels prevails.
//! 4. With no candidate at all, the hostname's top-level label is the suffix.

use crate::base::context::IoResultExt;
use crate::base::jarerror::JarError;
use crate::cookies::suffixrule::{label_matches, SuffixRule};
use dashmap::DashMap;
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

/// Default bound for the registrable-domain memo cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// Indexed, read-only set of public suffix rules.
///
/// Built once at startup and shared by reference (usually behind an `Arc`)
/// with every cookie store. Lookups take `&self` and are safe from any
/// number of threads.
#[derive(Debug)]
pub struct SuffixRuleDatabase {
    // Top-level label -> rules sharing it, in load order.
    index: HashMap<String, Vec<SuffixRule>>,
    rule_count: usize,
    cache: DashMap<String, Option<String>>,
    cache_capacity: usize,
}

impl Default for SuffixRuleDatabase {
    fn default() -> Self {
        Self::empty()
    }
}

impl SuffixRuleDatabase {
    /// A database without rules. Every hostname falls back to its top-level
    /// label as the public suffix.
    pub fn empty() -> Self {
        Self {
            index: HashMap::new(),
            rule_count: 0,
            cache: DashMap::new(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }

    /// Parse a rule list.
    ///
    /// `//` comment lines and blank lines are skipped. Only the text before
    /// the first whitespace of a line is the rule.
    pub fn parse(text: &str) -> Self {
        let mut db = Self::empty();

        for line in text.lines() {
            if line.starts_with("//") {
                continue;
            }
            let Some(rule_text) = line.split_whitespace().next() else {
                continue;
            };

            let rule = SuffixRule::parse(rule_text);
            let bucket = db.index.entry(rule.key().to_string()).or_default();
            if !bucket.contains(&rule) {
                bucket.push(rule);
                db.rule_count += 1;
            }
        }

        tracing::debug!(
            rules = db.rule_count,
            buckets = db.index.len(),
            "public suffix list loaded"
        );
        db
    }

    /// Load the rule list from a file.
    pub fn try_from_path(path: impl AsRef<Path>) -> Result<Self, JarError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).rules_context(path)?;
        Ok(Self::parse(&text))
    }

    /// Load the rule list from a file, falling back to an empty database if
    /// it cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match Self::try_from_path(path) {
            Ok(db) => db,
            Err(e) => {
                tracing::warn!(error = %e, "using empty public suffix list");
                Self::empty()
            }
        }
    }

    /// Set the bound of the registrable-domain memo cache. 0 disables it.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self.cache.clear();
        self
    }

    /// Number of distinct rules loaded.
    pub fn rule_count(&self) -> usize {
        self.rule_count
    }

    pub fn is_empty(&self) -> bool {
        self.rule_count == 0
    }

    /// The rule that governs `host`.
    ///
    /// Should two non-exception candidates tie on label count (a malformed
    /// list), the earliest-loaded one is returned and the tie is logged;
    /// use [`try_matching_rule`](Self::try_matching_rule) to surface it.
    pub fn matching_rule(&self, host: &str) -> Cow<'_, SuffixRule> {
        let labels = host_labels(host);
        match self.prevailing_rule(&labels) {
            Prevailing::Rule(rule) => Cow::Borrowed(rule),
            Prevailing::Implicit => Cow::Owned(SuffixRule::implicit(labels[0])),
            Prevailing::Tie(first, other) => {
                tracing::warn!(
                    host = %host,
                    kept = %first,
                    other = %other,
                    "suffix rules tie on label count"
                );
                Cow::Borrowed(first)
            }
        }
    }

    /// Like [`matching_rule`](Self::matching_rule), but a label-count tie is
    /// an error.
    pub fn try_matching_rule(&self, host: &str) -> Result<Cow<'_, SuffixRule>, JarError> {
        let labels = host_labels(host);
        match self.prevailing_rule(&labels) {
            Prevailing::Rule(rule) => Ok(Cow::Borrowed(rule)),
            Prevailing::Implicit => Ok(Cow::Owned(SuffixRule::implicit(labels[0]))),
            Prevailing::Tie(first, other) => Err(JarError::AmbiguousSuffixRule {
                host: host.to_string(),
                labels: vec![first.to_string(), other.to_string()],
            }),
        }
    }

    fn prevailing_rule<'a>(&'a self, labels: &[&str]) -> Prevailing<'a> {
        let Some(bucket) = self.index.get(labels[0]) else {
            return Prevailing::Implicit;
        };

        let candidates: Vec<&SuffixRule> = bucket.iter().filter(|r| r.matches(labels)).collect();
        if candidates.is_empty() {
            return Prevailing::Implicit;
        }

        let has_exception = candidates.iter().any(|r| r.is_exception());
        let mut best: Option<&SuffixRule> = None;
        let mut tie: Option<&SuffixRule> = None;

        for rule in candidates
            .into_iter()
            .filter(|r| !has_exception || r.is_exception())
        {
            match best {
                Some(current) if rule.num_labels() > current.num_labels() => {
                    best = Some(rule);
                    tie = None;
                }
                Some(current) if rule.num_labels() == current.num_labels() => {
                    tie.get_or_insert(rule);
                }
                Some(_) => {}
                None => best = Some(rule),
            }
        }

        match (best, tie) {
            (Some(rule), Some(other)) => Prevailing::Tie(rule, other),
            (Some(rule), None) => Prevailing::Rule(rule),
            (None, _) => Prevailing::Implicit,
        }
    }

    /// The registrable domain of `host`: its public suffix plus one label.
    ///
    /// Returns `None` when `host` is itself a public suffix, or is not a
    /// well-formed dotted name (empty labels). Callers must treat `None` as
    /// "reject".
    pub fn registrable_domain(&self, host: &str) -> Option<String> {
        if self.cache_capacity > 0 {
            if let Some(hit) = self.cache.get(host) {
                tracing::trace!(host = %host, "registrable domain cache hit");
                return hit.value().clone();
            }
        }

        let result = self.compute_registrable_domain(host);

        if self.cache_capacity > 0 {
            if self.cache.len() >= self.cache_capacity {
                self.cache.clear();
            }
            self.cache.insert(host.to_string(), result.clone());
        }

        result
    }

    fn compute_registrable_domain(&self, host: &str) -> Option<String> {
        let labels = host_labels(host);
        if labels.iter().any(|l| l.is_empty()) {
            return None;
        }

        let rule = self.matching_rule(host);
        let suffix = &rule.labels()[..rule.suffix_len()];

        let mut parts: Vec<&str> = Vec::with_capacity(suffix.len() + 1);
        for (i, &label) in labels.iter().enumerate() {
            if i == suffix.len() {
                parts.push(label);
                break;
            }
            if !label_matches(&suffix[i], label) {
                break;
            }
            parts.push(label);
        }

        if parts.len() < suffix.len() + 1 {
            return None;
        }

        parts.reverse();
        Some(parts.join("."))
    }

    /// Whether `host` is exactly a public suffix (e.g. `com`, `co.uk`).
    pub fn is_public_suffix(&self, host: &str) -> bool {
        !host.is_empty() && self.registrable_domain(host).is_none()
    }
}

enum Prevailing<'a> {
    Rule(&'a SuffixRule),
    Tie(&'a SuffixRule, &'a SuffixRule),
    Implicit,
}

/// Hostname labels in reverse-DNS order. Never empty.
fn host_labels(host: &str) -> Vec<&str> {
    host.rsplit('.').collect()
}

/// Whether `host` equals `domain` or is a subdomain of it.
pub fn is_domain_or_subdomain(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Whether `host` is a plain hostname usable as a cookie domain key:
/// non-empty dot-separated labels of `[a-z0-9-_]` or non-ASCII letters.
/// Upper case, whitespace, control characters and cookie delimiters
/// (`;`, `,`, `=`) are refused.
pub fn is_valid_hostname(host: &str) -> bool {
    !host.is_empty()
        && host.split('.').all(|label| {
            !label.is_empty()
                && label.chars().all(|c| {
                    c.is_ascii_lowercase()
                        || c.is_ascii_digit()
                        || c == '-'
                        || c == '_'
                        || (!c.is_ascii() && !c.is_whitespace() && !c.is_control())
                })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = "\
// ===BEGIN ICANN DOMAINS===
com
uk
co.uk
jp
*.kawasaki.jp
!city.kawasaki.jp
*.ck
!www.ck

// ===BEGIN PRIVATE DOMAINS===
io
github.io
";

    fn db() -> SuffixRuleDatabase {
        SuffixRuleDatabase::parse(RULES)
    }

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        assert_eq!(db().rule_count(), 10);
        assert!(SuffixRuleDatabase::parse("// only\n\n   \n").is_empty());
    }

    #[test]
    fn test_parse_ignores_trailing_text_and_duplicates() {
        let db = SuffixRuleDatabase::parse("co.uk   some note\nco.uk\nuk\n");
        assert_eq!(db.rule_count(), 2);
        assert_eq!(db.matching_rule("example.co.uk").to_string(), "co.uk");
    }

    #[test]
    fn test_implicit_rule_for_unknown_tld() {
        let db = db();
        let rule = db.matching_rule("www.example.zz");
        assert_eq!(rule.labels(), ["zz"]);
        assert!(!rule.is_exception());
    }

    #[test]
    fn test_implicit_rule_when_bucket_has_no_match() {
        let db = SuffixRuleDatabase::parse("co.uk\n");
        assert_eq!(db.matching_rule("example.uk").labels(), ["uk"]);
    }

    #[test]
    fn test_longest_rule_prevails() {
        assert_eq!(db().matching_rule("www.example.co.uk").to_string(), "co.uk");
    }

    #[test]
    fn test_exception_prevails_over_wildcard() {
        let db = db();
        let rule = db.matching_rule("city.kawasaki.jp");
        assert!(rule.is_exception());
        assert_eq!(rule.to_string(), "!city.kawasaki.jp");
    }

    #[test]
    fn test_registrable_domain() {
        let db = db();
        assert_eq!(
            db.registrable_domain("www.example.co.uk").as_deref(),
            Some("example.co.uk")
        );
        assert_eq!(db.registrable_domain("example.com").as_deref(), Some("example.com"));
        assert_eq!(db.registrable_domain("a.b.example.com").as_deref(), Some("example.com"));
    }

    #[test]
    fn test_public_suffix_has_no_registrable_domain() {
        let db = db();
        assert_eq!(db.registrable_domain("co.uk"), None);
        assert_eq!(db.registrable_domain("com"), None);
        assert_eq!(db.registrable_domain("foo.kawasaki.jp"), None);
        assert!(db.is_public_suffix("github.io"));
        assert!(!db.is_public_suffix("user.github.io"));
    }

    #[test]
    fn test_wildcard_and_exception_registrable() {
        let db = db();
        assert_eq!(
            db.registrable_domain("www.example.foo.kawasaki.jp").as_deref(),
            Some("example.foo.kawasaki.jp")
        );
        assert_eq!(
            db.registrable_domain("www.city.kawasaki.jp").as_deref(),
            Some("city.kawasaki.jp")
        );
        assert_eq!(db.registrable_domain("www.ck").as_deref(), Some("www.ck"));
        assert_eq!(db.registrable_domain("other.ck"), None);
    }

    #[test]
    fn test_malformed_hosts() {
        let db = db();
        assert_eq!(db.registrable_domain(""), None);
        assert_eq!(db.registrable_domain("example.com."), None);
        assert_eq!(db.registrable_domain("a..example.com"), None);
        assert!(!db.is_public_suffix(""));
    }

    #[test]
    fn test_empty_database_falls_back_to_tld() {
        let db = SuffixRuleDatabase::empty();
        assert_eq!(db.registrable_domain("www.example.co.uk").as_deref(), Some("co.uk"));
        assert_eq!(db.registrable_domain("uk"), None);
    }

    #[test]
    fn test_tie_is_reported() {
        let db = SuffixRuleDatabase::parse("com\n*.example.com\nfoo.example.com\n");
        let err = db.try_matching_rule("x.foo.example.com").unwrap_err();
        assert!(matches!(err, JarError::AmbiguousSuffixRule { .. }));

        // Deterministic pick keeps the earliest-loaded rule.
        assert_eq!(db.matching_rule("x.foo.example.com").to_string(), "*.example.com");
        assert_eq!(
            db.registrable_domain("x.foo.example.com").as_deref(),
            Some("x.foo.example.com")
        );
    }

    #[test]
    fn test_cache_is_bounded() {
        let db = db().with_cache_capacity(2);
        for host in ["a.com", "b.com", "c.com", "d.com"] {
            assert!(db.registrable_domain(host).is_some());
        }
        assert!(db.cache.len() <= 2);
        assert_eq!(db.registrable_domain("b.com").as_deref(), Some("b.com"));
    }

    #[test]
    fn test_cache_disabled() {
        let db = db().with_cache_capacity(0);
        assert_eq!(db.registrable_domain("x.example.com").as_deref(), Some("example.com"));
        assert!(db.cache.is_empty());
    }

    #[test]
    fn test_is_domain_or_subdomain() {
        assert!(is_domain_or_subdomain("example.com", "example.com"));
        assert!(is_domain_or_subdomain("a.example.com", "example.com"));
        assert!(!is_domain_or_subdomain("notexample.com", "example.com"));
        assert!(!is_domain_or_subdomain("example.com", "a.example.com"));
    }

    #[test]
    fn test_is_valid_hostname() {
        assert!(is_valid_hostname("www.example.co.uk"));
        assert!(is_valid_hostname("xn--bcher-kva.example"));
        assert!(is_valid_hostname("bücher.example"));
        assert!(is_valid_hostname("_dmarc.example.com"));

        assert!(!is_valid_hostname(""));
        assert!(!is_valid_hostname(".example.com"));
        assert!(!is_valid_hostname("example..com"));
        assert!(!is_valid_hostname("Example.com"));
        assert!(!is_valid_hostname("evil.com\nz.example.com"));
        assert!(!is_valid_hostname("x;y.example.com"));
        assert!(!is_valid_hostname("a b.example.com"));
        assert!(!is_valid_hostname("a=b.example.com"));
        assert!(!is_valid_hostname("a,b.example.com"));
        assert!(!is_valid_hostname("a\u{a0}b.example.com"));
    }
}
