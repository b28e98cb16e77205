use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use record_spectrum::spectrum::{AnalyzerConfig, RealtimeAnalyzer};
use std::f64::consts::PI;
use std::hint::black_box;

fn stereo_frame(len: usize, rate: f64) -> Vec<Vec<f64>> {
    let left = (0..len)
        .map(|i| (2.0 * PI * 440.0 * i as f64 / rate).sin() * 0.5)
        .collect();
    let right = (0..len)
        .map(|i| (2.0 * PI * 3000.0 * i as f64 / rate).sin() * 0.25)
        .collect();
    vec![left, right]
}

fn bench_analyse(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyse");

    for fft_size in [1024usize, 2048, 4096] {
        group.bench_with_input(BenchmarkId::new("stereo", fft_size), &fft_size, |b, &n| {
            let config = AnalyzerConfig {
                fft_size: n,
                ..AnalyzerConfig::default()
            };
            let mut analyzer = RealtimeAnalyzer::new(config).unwrap();
            let frame = stereo_frame(n, 44100.0);

            b.iter(|| {
                let spectra = analyzer.analyse(black_box(&frame), 44100.0);
                black_box(spectra);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_analyse);
criterion_main!(benches);
