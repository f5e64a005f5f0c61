//! # Lane Detection Benchmark

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

use lane_lib::{
    frame::Frame,
    lane_det::{self, Params},
    pipeline,
};

fn lane_det_benchmark(c: &mut Criterion) {
    // ---- Build a synthetic frame with two lane markings ----

    let mut img = RgbImage::from_pixel(640, 480, Rgb([60, 60, 60]));
    draw_line_segment_mut(&mut img, (40.0, 470.0), (280.0, 290.0), Rgb([0, 0, 255]));
    draw_line_segment_mut(&mut img, (599.0, 470.0), (359.0, 290.0), Rgb([0, 0, 255]));

    let frame = Frame::new(img, Utc::now()).unwrap();
    let params = Params::default();

    // Bench the estimator alone
    c.bench_function("lane_det::estimate", |b| {
        b.iter(|| lane_det::estimate(black_box(&frame), &params))
    });

    // Bench the individual stages
    let mask = lane_det::apply_roi(lane_det::segment_colour(&frame, &params), &params);

    c.bench_function("lane_det::segment_colour", |b| {
        b.iter(|| lane_det::segment_colour(black_box(&frame), &params))
    });
    c.bench_function("lane_det::detect_segments", |b| {
        b.iter(|| lane_det::detect_segments(black_box(&mask), &params))
    });

    // Bench the whole perception pipeline
    c.bench_function("pipeline::perceive", |b| {
        b.iter(|| pipeline::perceive(Some(black_box(&frame)), &params))
    });
}

criterion_group!(benches, lane_det_benchmark);
criterion_main!(benches);
