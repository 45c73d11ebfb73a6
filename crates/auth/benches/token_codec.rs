use std::sync::Arc;

use chrono::Duration;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{Map, Value};

use quantumsave_auth::{SigningKey, SystemClock, TokenCodec};

fn codec() -> TokenCodec {
    let key = SigningKey::from_bytes(vec![0x5a; 32]).expect("32-byte key");
    TokenCodec::new(&key, Arc::new(SystemClock), Duration::hours(24))
}

fn bench_issue(c: &mut Criterion) {
    let codec = codec();
    let mut extra = Map::new();
    extra.insert("plan".to_string(), Value::from("pro"));

    c.bench_function("token_issue", |b| {
        b.iter(|| {
            codec
                .issue(black_box("alice@example.com"), extra.clone(), Duration::hours(1))
                .unwrap()
        })
    });
}

fn bench_verify(c: &mut Criterion) {
    let codec = codec();
    let token = codec.issue_default("alice@example.com").unwrap();
    let mut tampered = token.clone();
    let last = tampered.pop();
    tampered.push(if last == Some('A') { 'B' } else { 'A' });

    let mut group = c.benchmark_group("token_verify");
    group.bench_function("valid", |b| b.iter(|| codec.verify(black_box(&token))));
    group.bench_function("bad_signature", |b| b.iter(|| codec.verify(black_box(&tampered))));
    group.bench_function("malformed", |b| b.iter(|| codec.verify(black_box("not.a.token"))));
    group.finish();
}

criterion_group!(benches, bench_issue, bench_verify);
criterion_main!(benches);
