//! Throughput benchmarks

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use hwlink_core::{decode_frame, encode_frame_line, encode_hue, HueCommand, SensorFrame};
use std::hint::black_box;

fn codec_benchmark(c: &mut Criterion) {
    let line = encode_frame_line(&SensorFrame::new(512, 223, 47));

    let mut group = c.benchmark_group("codec");
    group.throughput(Throughput::Bytes(line.len() as u64));

    group.bench_function("decode_frame", |b| {
        b.iter(|| {
            let frame = decode_frame(black_box(&line));
            black_box(frame)
        })
    });

    group.bench_function("decode_malformed", |b| {
        let junk = b":512,abc,47$\r\n".to_vec();
        b.iter(|| {
            let frame = decode_frame(black_box(&junk));
            black_box(frame)
        })
    });

    group.bench_function("encode_hue", |b| {
        b.iter(|| black_box(encode_hue(black_box(HueCommand::new(200).value))))
    });

    group.finish();
}

criterion_group!(benches, codec_benchmark);
criterion_main!(benches);
