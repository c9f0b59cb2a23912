use crate::base::jarerror::JarError;
use crate::cookies::canonicalcookie::CanonicalCookie;
use crate::cookies::psl::{is_domain_or_subdomain, is_valid_hostname, SuffixRuleDatabase};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use url::{Host, Url};

/// Domain key -> cookies, name-unique within each key.
type Storage = HashMap<String, Vec<CanonicalCookie>>;

/// Cookie jar scoped by registrable domain.
///
/// Cookies live under a domain key: either an exact host (`www.example.com`)
/// or a dot-prefixed registrable domain (`.example.com`) meaning "this
/// domain and every subdomain". Reads and writes resolve the request host
/// through the shared [`SuffixRuleDatabase`], so a host can only ever see or
/// set cookies belonging to its own registrable domain.
///
/// All access goes through one `RwLock`; the read-modify-write merge in
/// [`set_cookies_from_url`](Self::set_cookies_from_url) holds the write lock
/// for the whole batch.
pub struct CookieStore {
    psl: Arc<SuffixRuleDatabase>,
    storage: RwLock<Storage>,
}

impl CookieStore {
    pub fn new(psl: Arc<SuffixRuleDatabase>) -> Self {
        Self {
            psl,
            storage: RwLock::new(HashMap::new()),
        }
    }

    /// The suffix database this store validates against.
    pub fn suffix_database(&self) -> &Arc<SuffixRuleDatabase> {
        &self.psl
    }

    fn read(&self) -> RwLockReadGuard<'_, Storage> {
        self.storage.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Storage> {
        self.storage.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve the URL's host and its registrable domain, failing closed.
    fn scope<'u>(&self, url: &'u Url) -> Result<(&'u str, String), JarError> {
        let host = match url.host() {
            Some(Host::Domain(host)) => host,
            _ => {
                return Err(JarError::CookieHostNotDomain {
                    url: url.to_string(),
                })
            }
        };

        let registrable =
            self.psl
                .registrable_domain(host)
                .ok_or_else(|| JarError::CookiePublicSuffix {
                    host: host.to_string(),
                })?;

        if !is_domain_or_subdomain(host, &registrable) {
            return Err(JarError::CookieHostMismatch {
                host: host.to_string(),
                registrable,
            });
        }

        Ok((host, registrable))
    }

    /// Cookies visible to `url`: host-only cookies stored under its exact
    /// host, plus domain cookies stored under `.` + its registrable domain.
    ///
    /// Returns nothing if the host has no registrable domain.
    pub fn cookies_for_url(&self, url: &Url) -> Vec<CanonicalCookie> {
        let (host, registrable) = match self.scope(url) {
            Ok(scope) => scope,
            Err(e) => {
                tracing::debug!(error = %e, "no cookies for URL");
                return Vec::new();
            }
        };

        let domain_key = format!(".{}", registrable);
        let storage = self.read();

        let mut result = Vec::new();
        for key in [host, domain_key.as_str()] {
            if let Some(bucket) = storage.get(key) {
                result.extend(bucket.iter().cloned());
            }
        }
        result
    }

    /// Store a batch of cookies received from `url`.
    ///
    /// Returns `false`, storing nothing, when the URL's host has no
    /// registrable domain. Otherwise individual cookies whose domain falls
    /// outside the registrable domain are dropped and the rest are merged.
    pub fn set_cookies_from_url(&self, cookies: Vec<CanonicalCookie>, url: &Url) -> bool {
        match self.try_set_cookies_from_url(cookies, url) {
            Ok(_) => true,
            Err(e) if e.is_validation_rejection() => {
                tracing::debug!(error = %e, "cookie batch rejected");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "unable to store cookie batch");
                false
            }
        }
    }

    /// Like [`set_cookies_from_url`](Self::set_cookies_from_url), returning
    /// the number of accepted cookies or the reason the batch was rejected.
    pub fn try_set_cookies_from_url(
        &self,
        cookies: Vec<CanonicalCookie>,
        url: &Url,
    ) -> Result<usize, JarError> {
        let (host, registrable) = self.scope(url)?;
        let domain_key = format!(".{}", registrable);

        let mut by_domain: HashMap<String, Vec<CanonicalCookie>> = HashMap::new();
        for mut cookie in cookies {
            if cookie.domain.is_empty() {
                cookie.domain = host.to_string();
            }

            let accepted = if cookie.is_domain_cookie() {
                cookie.domain == domain_key
            } else {
                is_valid_hostname(&cookie.domain)
                    && is_domain_or_subdomain(&cookie.domain, &registrable)
            };

            if !accepted {
                tracing::debug!(
                    host = %host,
                    domain = %cookie.domain,
                    name = %cookie.name,
                    "cookie domain outside registrable domain, dropped"
                );
                continue;
            }

            by_domain.entry(cookie.domain.clone()).or_default().push(cookie);
        }

        let accepted: usize = by_domain.values().map(Vec::len).sum();
        let mut storage = self.write();
        for (domain, incoming) in by_domain {
            let merged = merge_by_name(storage.remove(&domain).unwrap_or_default(), incoming);
            storage.insert(domain, merged);
        }

        Ok(accepted)
    }

    /// Parse a `Set-Cookie` header value received from `url` and store it.
    pub fn parse_and_save_cookie(&self, url: &Url, set_cookie: &str) -> bool {
        match CanonicalCookie::parse_set_cookie(set_cookie) {
            Some(cookie) => self.set_cookies_from_url(vec![cookie], url),
            None => false,
        }
    }

    /// Every stored cookie, in no particular order.
    pub fn all_cookies(&self) -> Vec<CanonicalCookie> {
        self.read().values().flatten().cloned().collect()
    }

    /// Replace the entire contents with `cookies`, bucketed by domain.
    ///
    /// Cookies whose domain is not a well-formed hostname are dropped, as are
    /// domain cookies whose domain is not exactly `.` + a registrable domain. Later cookies with
    /// the same domain and name replace earlier ones.
    pub fn set_all_cookies(&self, cookies: Vec<CanonicalCookie>) {
        let mut fresh = Storage::new();
        let mut dropped = 0usize;

        for cookie in cookies {
            if !self.is_storable_key(&cookie.domain) {
                dropped += 1;
                continue;
            }
            let bucket = fresh.entry(cookie.domain.clone()).or_default();
            match bucket.iter_mut().find(|c| c.name == cookie.name) {
                Some(existing) => *existing = cookie,
                None => bucket.push(cookie),
            }
        }

        if dropped > 0 {
            tracing::debug!(dropped, "skipped cookies with unusable domain keys");
        }
        *self.write() = fresh;
    }

    fn is_storable_key(&self, domain: &str) -> bool {
        match domain.strip_prefix('.') {
            Some(base) => {
                is_valid_hostname(base)
                    && self.psl.registrable_domain(base).as_deref() == Some(base)
            }
            None => is_valid_hostname(domain),
        }
    }

    /// Remove every cookie.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Total number of stored cookies.
    pub fn total_cookie_count(&self) -> usize {
        self.read().values().map(Vec::len).sum()
    }

    /// Cookies stored under exactly `domain_key`.
    pub fn cookies_for_domain_key(&self, domain_key: &str) -> Vec<CanonicalCookie> {
        self.read().get(domain_key).cloned().unwrap_or_default()
    }

    /// Write every cookie to `writer` in the length-prefixed format.
    pub fn save_to<W: Write>(&self, writer: W) -> Result<usize, JarError> {
        let cookies = self.all_cookies();
        crate::cookies::persistence::write_cookies(writer, &cookies)?;
        Ok(cookies.len())
    }

    /// Replace the store with the cookies read from `reader`.
    ///
    /// On any read or format error the store is left untouched.
    pub fn load_from<R: Read>(&self, reader: R) -> Result<usize, JarError> {
        let cookies = crate::cookies::persistence::read_cookies(reader)?;
        self.set_all_cookies(cookies);
        Ok(self.total_cookie_count())
    }
}

/// Overlay `incoming` onto `existing` by name, keeping existing order.
fn merge_by_name(
    mut existing: Vec<CanonicalCookie>,
    incoming: Vec<CanonicalCookie>,
) -> Vec<CanonicalCookie> {
    for cookie in incoming {
        match existing.iter_mut().find(|c| c.name == cookie.name) {
            Some(slot) => *slot = cookie,
            None => existing.push(cookie),
        }
    }
    existing
}

impl std::fmt::Debug for CookieStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieStore")
            .field("rules", &self.psl.rule_count())
            .field("cookies", &self.total_cookie_count())
            .finish()
    }
}
