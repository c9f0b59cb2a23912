//! A single parsed line of the Public Suffix List.
//!
//! Labels are kept in reverse-DNS order, so `co.uk` becomes `["uk", "co"]`
//! and index 0 is always the top-level label.

use std::fmt;

/// Label that matches any single hostname label.
pub const WILDCARD_LABEL: &str = "*";

/// One public suffix rule, e.g. `co.uk`, `*.ck` or `!www.ck`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SuffixRule {
    labels: Vec<String>,
    exception: bool,
    wildcard: bool,
}

impl SuffixRule {
    /// Parse one rule line.
    ///
    /// The line must already be trimmed, non-empty and not a comment; the
    /// database loader filters everything else out before calling this.
    pub fn parse(rule: &str) -> Self {
        let (exception, body) = match rule.strip_prefix('!') {
            // With several `!`, only the text after the last one is the rule.
            Some(_) => (true, rule.rsplit('!').next().unwrap_or_default()),
            None => (false, rule),
        };

        let labels: Vec<String> = body.rsplit('.').map(str::to_string).collect();
        let wildcard = labels.last().is_some_and(|l| l == WILDCARD_LABEL);

        Self {
            labels,
            exception,
            wildcard,
        }
    }

    /// The implicit rule used when no rule in the list matches: the host's
    /// top-level label on its own.
    pub fn implicit(top_label: &str) -> Self {
        Self {
            labels: vec![top_label.to_string()],
            exception: false,
            wildcard: false,
        }
    }

    /// Labels in reverse-DNS order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Index key: the top-level label.
    pub fn key(&self) -> &str {
        self.labels.first().map(String::as_str).unwrap_or_default()
    }

    pub fn is_exception(&self) -> bool {
        self.exception
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }

    /// Number of labels that form the public suffix.
    ///
    /// An exception rule names a registrable domain, so its suffix is its
    /// parent: one label shorter than the rule itself.
    pub fn suffix_len(&self) -> usize {
        if self.exception {
            self.labels.len().saturating_sub(1)
        } else {
            self.labels.len()
        }
    }

    /// Whether every rule label matches the hostname label at the same
    /// position. `host_labels` must be in reverse-DNS order.
    pub fn matches(&self, host_labels: &[&str]) -> bool {
        host_labels.len() >= self.labels.len()
            && self
                .labels
                .iter()
                .zip(host_labels)
                .all(|(rule, host)| label_matches(rule, host))
    }
}

/// `*` matches any label, everything else must be equal.
pub(crate) fn label_matches(rule_label: &str, host_label: &str) -> bool {
    rule_label == WILDCARD_LABEL || rule_label == host_label
}

impl fmt::Display for SuffixRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exception {
            f.write_str("!")?;
        }
        for (i, label) in self.labels.iter().rev().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(label)?;
        }
        Ok(())
    }
}
