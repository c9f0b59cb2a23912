use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use suffixjar::cookies::psl::SuffixRuleDatabase;
use suffixjar::cookies::store::CookieStore;
use url::Url;

const RULES: &str = include_str!("../tests/data/public_suffix_list.dat");

fn new_store() -> CookieStore {
    CookieStore::new(Arc::new(SuffixRuleDatabase::parse(RULES)))
}

fn benchmark_cookie_insert(c: &mut Criterion) {
    let store = new_store();
    let url = Url::parse("https://www.example.co.uk").unwrap();

    c.bench_function("cookie_parse_and_save", |b| {
        b.iter(|| {
            store.parse_and_save_cookie(
                black_box(&url),
                black_box("foo=bar; Path=/; Domain=example.co.uk"),
            );
        })
    });
}

fn benchmark_cookie_get(c: &mut Criterion) {
    let store = new_store();
    let url = Url::parse("https://www.example.co.uk/foo/bar").unwrap();
    // Pre-populate
    for i in 0..100 {
        store.parse_and_save_cookie(&url, &format!("cookie{}=val; Domain=example.co.uk", i));
    }

    c.bench_function("cookie_get_for_url", |b| {
        b.iter(|| {
            black_box(store.cookies_for_url(black_box(&url)));
        })
    });
}

fn benchmark_save(c: &mut Criterion) {
    let store = new_store();
    let url = Url::parse("https://www.example.co.uk").unwrap();
    for i in 0..100 {
        store.parse_and_save_cookie(&url, &format!("cookie{}=val", i));
    }

    c.bench_function("cookie_save_100", |b| {
        b.iter(|| {
            let mut buf = Vec::with_capacity(4096);
            store.save_to(&mut buf).unwrap();
            black_box(buf);
        })
    });
}

criterion_group!(benches, benchmark_cookie_insert, benchmark_cookie_get, benchmark_save);
criterion_main!(benches);
