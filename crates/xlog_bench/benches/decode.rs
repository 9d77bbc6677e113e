//! Whole-file decoding benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use xlog_bench::sample_log;
use xlog_core::{decode_bytes, DecoderConfig, FileDriver, RecordSink};

struct CountingSink(usize);

impl RecordSink for CountingSink {
    fn record(&mut self, _header: &xlog_core::RecordHeader<'_>) -> std::io::Result<()> {
        self.0 += 1;
        Ok(())
    }
}

/// Benchmark raw and compressed files.
fn bench_files(c: &mut Criterion) {
    let mut group = c.benchmark_group("file");
    let config = DecoderConfig::default();

    for compressed in [false, true] {
        let data = sample_log(64, 32, compressed);
        let label = if compressed { "zrow" } else { "row" };
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("decode", label), &data, |b, data| {
            b.iter(|| {
                let mut sink = CountingSink(0);
                decode_bytes(black_box(data), &config, &mut sink).unwrap();
                black_box(sink.0)
            })
        });
    }

    group.finish();
}

/// Benchmark checksum verification and driver reuse.
fn bench_options(c: &mut Criterion) {
    let mut group = c.benchmark_group("options");
    let data = sample_log(64, 32, true);
    group.throughput(Throughput::Bytes(data.len() as u64));

    let verify = DecoderConfig::default().verify_checksums(true);
    group.bench_function("verify_checksums", |b| {
        b.iter(|| decode_bytes(black_box(&data), &verify, &mut CountingSink(0)).unwrap())
    });

    let mut driver = FileDriver::new(DecoderConfig::default());
    group.bench_function("reused_driver", |b| {
        b.iter(|| driver.decode(black_box(&data), &mut CountingSink(0)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_files, bench_options);
criterion_main!(benches);
