use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, Rgba, RgbaImage};
use linkpage::theme::{average_pixels, theme_for_image, SAMPLE_GRID};

fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
    })
}

/// Bench: full derivation from a wallpaper-sized background
fn bench_theme_for_image(c: &mut Criterion) {
    let img = DynamicImage::ImageRgba8(gradient(1920, 1080));
    c.bench_function("theme_for_image_1080p", |b| {
        b.iter(|| theme_for_image(black_box(&img)))
    });
}

/// Bench: averaging an already-sampled grid
fn bench_average_pixels(c: &mut Criterion) {
    let grid = gradient(SAMPLE_GRID, SAMPLE_GRID);
    c.bench_function("average_pixels_grid", |b| {
        b.iter(|| average_pixels(black_box(&grid)))
    });
}

criterion_group!(benches, bench_theme_for_image, bench_average_pixels);
criterion_main!(benches);
