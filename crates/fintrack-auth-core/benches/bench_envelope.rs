//! Benchmarks for envelope opening

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fintrack_auth_core::envelope::seal;
use fintrack_auth_core::{
    compute_signature, EnvelopeConfig, EnvelopeOpener, ManualClock, PrivateKey,
};

const NOW: i64 = 1_700_000_000;

fn opener() -> EnvelopeOpener {
    let key = PrivateKey::from_pem(include_str!("../tests/fixtures/private_pkcs8.pem")).unwrap();
    EnvelopeOpener::new(
        key,
        EnvelopeConfig::default(),
        Arc::new(ManualClock::at_timestamp(NOW)),
    )
}

fn bench_open(c: &mut Criterion) {
    let opener = opener();
    let sizes = [64, 1024, 16 * 1024];

    let mut group = c.benchmark_group("envelope_open");

    for size in sizes {
        let plaintext: Vec<u8> = (0..size).map(|i| b'a' + (i % 26) as u8).collect();
        let envelope = seal(&opener.public_key(), &plaintext, NOW).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &envelope, |b, envelope| {
            b.iter(|| opener.open(black_box(envelope)).unwrap());
        });
    }

    group.finish();
}

fn bench_signature(c: &mut Criterion) {
    c.bench_function("envelope_signature", |b| {
        b.iter(|| {
            compute_signature(
                black_box(b"AAECAwQFBgcICQoLDA0ODw=="),
                black_box(b"EBESExQVFhcYGRobHB0eHw=="),
                black_box(NOW),
            )
        });
    });
}

criterion_group!(benches, bench_open, bench_signature);
criterion_main!(benches);
