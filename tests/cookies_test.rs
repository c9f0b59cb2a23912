use std::sync::Arc;
use suffixjar::cookies::canonicalcookie::CanonicalCookie;
use suffixjar::cookies::psl::SuffixRuleDatabase;
use suffixjar::cookies::store::CookieStore;
use url::Url;

fn store() -> CookieStore {
    let psl = SuffixRuleDatabase::parse("com\nuk\nco.uk\nio\n*.pages.io\n!example.pages.io\n");
    CookieStore::new(Arc::new(psl))
}

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

#[test]
fn test_parse_and_save() {
    let store = store();
    let url = url("https://example.com/foo");
    assert!(store.parse_and_save_cookie(&url, "foo=bar; Path=/"));

    let cookies = store.cookies_for_url(&url);
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].name, "foo");
    assert_eq!(cookies[0].value, "bar");
    assert_eq!(cookies[0].domain, "example.com");
    assert_eq!(cookies[0].path.as_deref(), Some("/"));
}

#[test]
fn test_domain_cookie_shared_with_siblings() {
    let store = store();
    let from = url("https://a.example.co.uk/");
    let cookie = CanonicalCookie::new("sid", "1").with_domain(".example.co.uk");
    assert!(store.set_cookies_from_url(vec![cookie], &from));

    let sibling = store.cookies_for_url(&url("https://b.example.co.uk/"));
    assert_eq!(sibling.len(), 1);
    assert_eq!(sibling[0].name, "sid");

    assert_eq!(store.cookies_for_url(&url("https://example.co.uk/")).len(), 1);
    assert!(store.cookies_for_url(&url("https://other.co.uk/")).is_empty());
}

#[test]
fn test_foreign_domain_rejected() {
    let store = store();
    let from = url("https://sub.example.com/");
    let evil = CanonicalCookie::new("track", "1").with_domain(".evil.com");

    // The batch precondition holds, the cookie itself is dropped.
    assert_eq!(store.try_set_cookies_from_url(vec![evil], &from), Ok(0));
    assert_eq!(store.total_cookie_count(), 0);
    assert!(store.cookies_for_url(&url("https://evil.com/")).is_empty());
}

#[test]
fn test_subdomain_cannot_mint_wider_or_narrower_domain_cookie() {
    let store = store();
    let from = url("https://a.b.example.com/");
    let cookies = vec![
        CanonicalCookie::new("tld", "1").with_domain(".com"),
        CanonicalCookie::new("mid", "1").with_domain(".b.example.com"),
        CanonicalCookie::new("ok", "1").with_domain(".example.com"),
    ];
    assert!(store.set_cookies_from_url(cookies, &from));

    let seen = store.cookies_for_url(&from);
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].name, "ok");
}

#[test]
fn test_public_suffix_host_rejected_whole_batch() {
    let store = store();
    let cookies = vec![
        CanonicalCookie::new("a", "1"),
        CanonicalCookie::new("b", "1").with_domain(".co.uk"),
    ];
    assert!(!store.set_cookies_from_url(cookies, &url("https://co.uk/")));
    assert!(!store.parse_and_save_cookie(&url("https://other.pages.io/"), "a=1"));
    assert_eq!(store.total_cookie_count(), 0);
}

#[test]
fn test_exception_domain_accepts_cookies() {
    let store = store();
    let from = url("https://www.example.pages.io/");
    assert!(store.parse_and_save_cookie(&from, "a=1; Domain=example.pages.io"));

    let seen = store.cookies_for_url(&url("https://example.pages.io/"));
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].domain, ".example.pages.io");
}

#[test]
fn test_host_only_not_shared() {
    let store = store();
    store.parse_and_save_cookie(&url("https://a.example.com/"), "host=val");
    store.parse_and_save_cookie(&url("https://a.example.com/"), "domain=val; Domain=example.com");

    let a = store.cookies_for_url(&url("https://a.example.com/"));
    assert!(a.iter().any(|c| c.name == "host"));
    assert!(a.iter().any(|c| c.name == "domain"));

    let b = store.cookies_for_url(&url("https://b.example.com/"));
    assert_eq!(b.len(), 1);
    assert_eq!(b[0].name, "domain");
}

#[test]
fn test_reset_replaces_value() {
    let store = store();
    let from = url("https://example.com/");
    store.parse_and_save_cookie(&from, "theme=light");
    store.parse_and_save_cookie(&from, "theme=dark");
    store.parse_and_save_cookie(&from, "theme=dark");

    let stored = store.cookies_for_domain_key("example.com");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].value, "dark");
}

#[test]
fn test_same_name_on_different_keys_coexists() {
    let store = store();
    let from = url("https://www.example.com/");
    store.parse_and_save_cookie(&from, "id=host");
    store.parse_and_save_cookie(&from, "id=domain; Domain=example.com");

    assert_eq!(store.total_cookie_count(), 2);
    let values: Vec<String> = store.cookies_for_url(&from).into_iter().map(|c| c.value).collect();
    assert_eq!(values, ["host", "domain"]);
}

#[test]
fn test_concurrent_writers() {
    let store = Arc::new(store());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                let from = Url::parse("https://example.com/").unwrap();
                for j in 0..50 {
                    store.parse_and_save_cookie(&from, &format!("c{}={}", j % 10, i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.cookies_for_domain_key("example.com").len(), 10);
}
