//! Pipeline benchmarks
//!
//! Covers the per-page hot paths: the row-scan band detector over a full
//! 300 DPI A4 raster, the crop that wraps it, and the cheap metadata and
//! layout steps for scale.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, GrayImage, Luma};

use reportdeck::{
    BoundaryOptions, ContentBandDetector, LayoutCompositor, MetadataExtractor, SlideCanvas,
};

/// A4 page at 300 DPI with separators and a content block
fn synthetic_page(width: u32, height: u32) -> GrayImage {
    let mut gray = GrayImage::from_pixel(width, height, Luma([255]));
    let upper = height / 5;
    let lower = height * 4 / 5;
    for band in [upper, lower] {
        for y in band..band + 4 {
            for x in 0..width {
                gray.put_pixel(x, y, Luma([0]));
            }
        }
    }
    for y in upper + 40..lower - 40 {
        for x in (20..width - 20).step_by(3) {
            gray.put_pixel(x, y, Luma([120]));
        }
    }
    gray
}

fn bench_band_detection(c: &mut Criterion) {
    let page = synthetic_page(2480, 3508);
    let options = BoundaryOptions::untrimmed();

    c.bench_function("detect_band_a4_300dpi", |b| {
        b.iter(|| ContentBandDetector::detect(black_box(&page), black_box(&options)))
    });
}

fn bench_crop_page(c: &mut Criterion) {
    let page = DynamicImage::ImageLuma8(synthetic_page(2480, 3508));
    let options = BoundaryOptions::default();

    c.bench_function("crop_page_a4_300dpi", |b| {
        b.iter(|| ContentBandDetector::crop_page(black_box(&page), black_box(&options)))
    });
}

fn bench_worst_case_all_white(c: &mut Criterion) {
    // No separator ever matches: both scans walk the full image.
    let page = GrayImage::from_pixel(2480, 3508, Luma([255]));
    let options = BoundaryOptions::untrimmed();

    c.bench_function("detect_band_all_white", |b| {
        b.iter(|| ContentBandDetector::detect(black_box(&page), black_box(&options)))
    });
}

fn bench_metadata_extraction(c: &mut Criterion) {
    let extractor = MetadataExtractor::default();
    let text = "报告单\n采集时间: 2024-03-15 08:30\n检验项目：血常规\n结果见下表\n".repeat(20);

    c.bench_function("extract_metadata", |b| {
        b.iter(|| extractor.extract(black_box(&text)))
    });
}

fn bench_layout_placement(c: &mut Criterion) {
    let canvas = SlideCanvas::default();

    c.bench_function("layout_place", |b| {
        b.iter(|| LayoutCompositor::place(black_box(2480), black_box(2100), black_box(&canvas)))
    });
}

criterion_group!(
    benches,
    bench_band_detection,
    bench_crop_page,
    bench_worst_case_all_white,
    bench_metadata_extraction,
    bench_layout_placement
);
criterion_main!(benches);
