//! Benchmarks for distance field generation

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use lumina_font::{Font, FontId, SdfConfig, SdfGenerator, SdfMode, color_edges, outline_to_shape};
use lumina_test_utils::fixtures::{self, gid};

fn bench_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("sdf_modes");

    let mut font = Font::from_bytes(FontId(0), fixtures::basic_font()).unwrap();
    let outline = font.glyph_outline(gid::RING).unwrap();

    for mode in [SdfMode::Sdf, SdfMode::Msdf, SdfMode::Mtsdf] {
        let generator = SdfGenerator::new(SdfConfig::default().with_mode(mode));
        group.bench_function(format!("{:?}", mode), |b| {
            b.iter(|| black_box(generator.generate(&outline, 48.0, 1000)));
        });
    }

    group.finish();
}

fn bench_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("sdf_sizes");

    let mut font = Font::from_bytes(FontId(0), fixtures::basic_font()).unwrap();
    let outline = font.glyph_outline(gid::CURVE).unwrap();
    let generator = SdfGenerator::new(SdfConfig::default());

    for size in [16.0f32, 32.0, 48.0, 64.0, 96.0] {
        let pixels = (size * 0.4 + 8.0).powi(2) as u64;
        group.throughput(Throughput::Elements(pixels));
        group.bench_with_input(BenchmarkId::from_parameter(size as u32), &size, |b, &size| {
            b.iter(|| black_box(generator.generate(&outline, size, 1000)));
        });
    }

    group.finish();
}

fn bench_shape_preparation(c: &mut Criterion) {
    let mut group = c.benchmark_group("shape_preparation");

    let mut font = Font::from_bytes(FontId(0), fixtures::basic_font()).unwrap();
    let outline = font.glyph_outline(gid::COMPOSITE).unwrap();

    group.bench_function("outline_to_shape", |b| {
        b.iter(|| black_box(outline_to_shape(&outline, 0.048)));
    });
    group.bench_function("color_edges", |b| {
        b.iter_batched(
            || outline_to_shape(&outline, 0.048),
            |mut shape| {
                color_edges(&mut shape, 3.0);
                black_box(shape)
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_modes, bench_sizes, bench_shape_preparation);
criterion_main!(benches);
