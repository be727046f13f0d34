use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use wellplated_core::{validate_position, BoundaryKey, ContainerCode};

fn bench_codec(c: &mut Criterion) {
    let key = BoundaryKey::derive('P', 24, "PLATE").expect("valid boundary key");

    c.bench_function("codec/encode", |b| {
        let mut sequence = 0u64;
        b.iter(|| {
            sequence = (sequence + 1) % key.capacity();
            let code = ContainerCode::encode(black_box(&key), black_box(sequence)).expect("encode");
            black_box(code);
        });
    });

    c.bench_function("codec/decode", |b| {
        b.iter(|| {
            let decoded = ContainerCode::decode(black_box("P24PLATE0012345")).expect("decode");
            black_box(decoded.sequence);
        });
    });

    let code = ContainerCode::parse("P24PLATE0012345").expect("parse");
    c.bench_function("position/validate", |b| {
        b.iter(|| {
            let ok = validate_position(black_box(&code), black_box('H'), black_box(12)).is_ok();
            black_box(ok);
        });
    });
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
