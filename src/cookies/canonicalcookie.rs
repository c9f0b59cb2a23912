use crate::base::jarerror::JarError;
use cookie::{Cookie, SameSite};
use time::OffsetDateTime;

/// One stored cookie.
///
/// `domain` is kept exactly as assigned: empty when unset, dot-prefixed
/// (`.example.com`) for a cookie valid on the domain and all subdomains,
/// bare (`www.example.com`) for a host-only cookie. Everything besides
/// name, value and domain is carried through persistence untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: Option<String>,
    pub expiration_time: Option<OffsetDateTime>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl CanonicalCookie {
    /// A session cookie with no domain; the store assigns the request host.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            path: None,
            expiration_time: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Whether the cookie applies to subdomains of its domain too.
    pub fn is_domain_cookie(&self) -> bool {
        self.domain.starts_with('.')
    }

    /// Parse one `Set-Cookie` header value as sent by a server.
    ///
    /// An explicit `Domain` attribute is lower-cased and always gets a
    /// leading dot; without one the cookie is host-only and its domain is
    /// left empty for the store to fill in.
    pub fn parse_set_cookie(line: &str) -> Option<Self> {
        let parsed = Cookie::parse(line.trim())
            .map_err(|e| tracing::debug!(error = %e, "unparseable Set-Cookie header"))
            .ok()?;

        let domain = match domain_attribute(line) {
            Some(d) => format!(".{}", d.trim_start_matches('.').to_ascii_lowercase()),
            None => String::new(),
        };

        Some(Self::from_parsed(&parsed, domain))
    }

    /// Parse every cookie in a block of persisted cookie text, one per line.
    ///
    /// A block may legally yield zero, one or several cookies; lines that do
    /// not parse are skipped.
    pub fn parse_cookies(block: &str) -> Vec<Self> {
        block
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(Self::from_raw_form)
            .collect()
    }

    /// Parse one line written by [`to_raw_form`](Self::to_raw_form). The
    /// domain is restored verbatim, dot or no dot.
    pub fn from_raw_form(line: &str) -> Option<Self> {
        let parsed = Cookie::parse_encoded(line.trim())
            .map_err(|e| tracing::debug!(error = %e, "unparseable persisted cookie"))
            .ok()?;
        let domain = domain_attribute(line).unwrap_or_default().to_string();
        Some(Self::from_parsed(&parsed, domain))
    }

    fn from_parsed(parsed: &Cookie<'_>, domain: String) -> Self {
        Self {
            name: parsed.name().to_string(),
            value: parsed.value().to_string(),
            domain,
            path: parsed.path().map(str::to_string),
            expiration_time: parsed.expires().and_then(|e| e.datetime()),
            secure: parsed.secure().unwrap_or(false),
            http_only: parsed.http_only().unwrap_or(false),
            same_site: parsed.same_site(),
        }
    }

    /// Full attribute form used for persistence:
    /// `name=value; HttpOnly; Secure; Path=/; Expires=...; Domain=.example.com`.
    ///
    /// Name and value are percent-encoded so the line stays parseable. A
    /// domain or path holding `;` or a line break cannot be written without
    /// changing what a later load reads back, and is refused.
    pub fn to_raw_form(&self) -> Result<String, JarError> {
        for (attr, text) in [("domain", Some(self.domain.as_str())), ("path", self.path.as_deref())] {
            if text.is_some_and(|t| t.contains([';', '\r', '\n'])) {
                return Err(JarError::cookie_invalid_data(format!(
                    "cookie {:?} has a {} that cannot be persisted",
                    self.name, attr
                )));
            }
        }

        let mut builder = Cookie::build((self.name.clone(), self.value.clone()))
            .secure(self.secure)
            .http_only(self.http_only);
        if let Some(path) = &self.path {
            builder = builder.path(path.clone());
        }
        if let Some(expires) = self.expiration_time {
            builder = builder.expires(expires);
        }
        if let Some(same_site) = self.same_site {
            builder = builder.same_site(same_site);
        }

        let cookie = builder.build();
        let mut raw = cookie.encoded().to_string();
        if !self.domain.is_empty() {
            raw.push_str("; Domain=");
            raw.push_str(&self.domain);
        }
        Ok(raw)
    }
}

/// The raw value of the last `Domain` attribute in a cookie line, with any
/// leading dot intact. `cookie::Cookie::domain` strips the dot, which would
/// lose the host-only/domain distinction.
fn domain_attribute(line: &str) -> Option<&str> {
    line.split(';')
        .skip(1)
        .filter_map(|attr| attr.split_once('='))
        .filter(|(key, _)| key.trim().eq_ignore_ascii_case("domain"))
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty() && *value != ".")
        .last()
}
