// Performance benchmarks for credential operations

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use events_api::core::crypto::{PasswordHashing, TokenSigner};
use events_api::core::models::UserId;
use secrecy::Secret;
use std::time::Duration;

fn bench_password_hashing(c: &mut Criterion) {
    // Production parameters; this is the cost every register and login pays
    let hashing = PasswordHashing::new(19_456, 2).unwrap();
    let hash = hashing.hash("correct horse battery").unwrap();

    c.bench_function("password_hash", |b| {
        b.iter(|| {
            hashing.hash(black_box("correct horse battery")).unwrap();
        });
    });

    c.bench_function("password_verify", |b| {
        b.iter(|| {
            PasswordHashing::verify(black_box("correct horse battery"), black_box(&hash)).unwrap();
        });
    });
}

fn bench_token_roundtrip(c: &mut Criterion) {
    let signer = TokenSigner::new(
        &Secret::new("bench-secret".to_string()),
        Duration::from_secs(3600),
    );
    let user_id = UserId::generate();
    let token = signer.issue_token(user_id).unwrap();

    c.bench_function("token_issue", |b| {
        b.iter(|| {
            signer.issue_token(black_box(user_id)).unwrap();
        });
    });

    c.bench_function("token_verify", |b| {
        b.iter(|| {
            signer.verify_token(black_box(&token)).unwrap();
        });
    });
}

criterion_group!(benches, bench_password_hashing, bench_token_roundtrip);
criterion_main!(benches);
