#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::PathObject;
use crate::loader::DecodedImage;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

fn identity_view(width: u32, height: u32) -> RasterView {
    RasterView::from_viewport(&ViewportTransform::default(), f64::from(width), f64::from(height), 1.0).unwrap()
}

fn solid(width: u32, height: u32, color: Rgba<u8>) -> DecodedImage {
    DecodedImage::new(RgbaImage::from_pixel(width, height, color)).unwrap()
}

/// 2x2 image with a distinct color per pixel.
fn quad() -> DecodedImage {
    let mut img = RgbaImage::new(2, 2);
    img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
    img.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
    img.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
    img.put_pixel(1, 1, Rgba([255, 255, 255, 255]));
    DecodedImage::new(img).unwrap()
}

// --- RasterView ---

#[test]
fn viewport_view_scales_by_dpr() {
    let vt = ViewportTransform { scale_x: 2.0, scale_y: 2.0, translate_x: 5.0, translate_y: -3.0 };
    let view = RasterView::from_viewport(&vt, 100.0, 50.0, 2.0).unwrap();
    assert_eq!((view.width, view.height), (200, 100));
    assert_eq!(view.scale, 4.0);
    assert_eq!(view.to_pixel(Point::new(1.0, 1.0)), Point::new(14.0, -2.0));
}

#[test]
fn viewport_view_rejects_empty_size() {
    assert!(RasterView::from_viewport(&ViewportTransform::default(), 0.0, 50.0, 1.0).is_none());
    assert!(RasterView::from_viewport(&ViewportTransform::default(), f64::NAN, 50.0, 1.0).is_none());
}

#[test]
fn viewport_view_rejects_oversized_raster() {
    let vt = ViewportTransform::default();
    // 8192 x 8192 is exactly the cap; one more row is past it.
    assert!(RasterView::from_viewport(&vt, 4096.0, 4096.0, 2.0).is_some());
    assert!(RasterView::from_viewport(&vt, 8192.0, 8193.0, 1.0).is_none());
    assert!(RasterView::from_viewport(&vt, 1e6, 1e6, 1.0).is_none());
    assert!(RasterView::from_viewport(&vt, 1000.0, 1000.0, 1e4).is_none());
}

#[test]
fn invalid_dpr_falls_back_to_one() {
    let view = RasterView::from_viewport(&ViewportTransform::default(), 10.0, 10.0, 0.0).unwrap();
    assert_eq!(view.dpr, 1.0);
    assert_eq!(view.width, 10);
}

#[test]
fn cropped_view_uses_native_size() {
    let mut bg = BackgroundImage::new("bg.png", solid(1200, 800, RED));
    bg.scale = 0.5;
    bg.left = 200.0;
    bg.top = 10.0;
    let view = RasterView::cropped_to(&bg).unwrap();
    assert_eq!((view.width, view.height), (1200, 800));
    assert_eq!(view.scale, 2.0);
    assert_eq!(view.to_pixel(Point::new(200.0, 10.0)), Point::new(0.0, 0.0));
    assert_eq!(view.to_pixel(Point::new(800.0, 410.0)), Point::new(1200.0, 800.0));
}

#[test]
fn cropped_view_rejects_bad_scale() {
    let mut bg = BackgroundImage::new("bg.png", solid(4, 4, RED));
    bg.scale = 0.0;
    assert!(RasterView::cropped_to(&bg).is_none());
}

// --- Images ---

#[test]
fn identity_blit_reproduces_pixels() {
    let mut doc = DocStore::new();
    doc.add(CanvasObject::Background(BackgroundImage::new("bg.png", quad())));
    let view = identity_view(2, 2);
    let mut out = view.blank();
    draw_objects(&mut out, &doc, &view);
    assert_eq!(&out, quad().pixels());
}

#[test]
fn upscaled_blit_repeats_texels() {
    let mut doc = DocStore::new();
    let mut bg = BackgroundImage::new("bg.png", quad());
    bg.scale = 2.0;
    doc.add(CanvasObject::Background(bg));
    let view = identity_view(4, 4);
    let mut out = view.blank();
    draw_objects(&mut out, &doc, &view);
    assert_eq!(out.get_pixel(1, 1), &Rgba([255, 0, 0, 255]));
    assert_eq!(out.get_pixel(2, 1), &Rgba([0, 255, 0, 255]));
    assert_eq!(out.get_pixel(3, 3), &Rgba([255, 255, 255, 255]));
}

#[test]
fn images_are_clipped_to_target() {
    let mut doc = DocStore::new();
    let mut bg = BackgroundImage::new("bg.png", solid(10, 10, BLUE));
    bg.left = -5.0;
    bg.top = 8.0;
    doc.add(CanvasObject::Background(bg));
    let view = identity_view(10, 10);
    let mut out = view.blank();
    draw_objects(&mut out, &doc, &view);
    assert_eq!(out.get_pixel(4, 9), &BLUE);
    assert_eq!(out.get_pixel(5, 9)[3], 0);
    assert_eq!(out.get_pixel(0, 7)[3], 0);
}

#[test]
fn dropped_images_draw_over_background() {
    let mut doc = DocStore::new();
    doc.add(CanvasObject::Background(BackgroundImage::new("bg.png", solid(10, 10, BLUE))));
    doc.add(CanvasObject::Image(DroppedImage::centered_at("a", "a.png", solid(4, 4, RED), Point::new(5.0, 5.0), 1.0)));
    let view = identity_view(10, 10);
    let mut out = view.blank();
    draw_objects(&mut out, &doc, &view);
    assert_eq!(out.get_pixel(5, 5), &RED);
    assert_eq!(out.get_pixel(0, 0), &BLUE);
}

#[test]
fn translucent_source_blends() {
    let mut dst = Rgba([0, 0, 255, 255]);
    blend(&mut dst, Rgba([255, 0, 0, 128]), 1.0);
    assert_eq!(dst[3], 255);
    assert!(dst[0] > 120 && dst[0] < 135);
    assert!(dst[2] > 120 && dst[2] < 135);
}

#[test]
fn blend_over_transparent_keeps_source_color() {
    let mut dst = Rgba([0, 0, 0, 0]);
    blend(&mut dst, Rgba([10, 20, 30, 100]), 1.0);
    assert_eq!(dst, Rgba([10, 20, 30, 100]));
}

// --- Paths ---

fn path_doc(points: &[(f64, f64)], closed: bool) -> DocStore {
    let mut path = PathObject::preview(Point::new(points[0].0, points[0].1));
    for &(x, y) in &points[1..] {
        path.data.line_to(Point::new(x, y));
    }
    if closed {
        path.data.close();
    }
    path.committed = true;
    let mut doc = DocStore::new();
    doc.add(CanvasObject::Path(path));
    doc
}

#[test]
fn path_strokes_red_line() {
    let doc = path_doc(&[(2.0, 5.0), (8.0, 5.0)], false);
    let view = identity_view(10, 10);
    let mut out = view.blank();
    draw_objects(&mut out, &doc, &view);
    assert_eq!(out.get_pixel(5, 4), &RED);
    assert_eq!(out.get_pixel(5, 5), &RED);
    assert_eq!(out.get_pixel(5, 7)[3], 0);
}

#[test]
fn closed_path_strokes_closing_segment() {
    let doc = path_doc(&[(2.0, 2.0), (18.0, 2.0), (18.0, 18.0)], true);
    let view = identity_view(20, 20);
    let mut out = view.blank();
    draw_objects(&mut out, &doc, &view);
    // (10, 10) lies on the diagonal back to the start.
    assert!(out.get_pixel(10, 10)[3] > 0);
    // The interior is not filled.
    assert_eq!(out.get_pixel(15, 6)[3], 0);
}

#[test]
fn stroke_width_scales_with_view() {
    let doc = path_doc(&[(0.0, 5.0), (10.0, 5.0)], false);
    let vt = ViewportTransform { scale_x: 4.0, scale_y: 4.0, translate_x: 0.0, translate_y: 0.0 };
    let view = RasterView::from_viewport(&vt, 40.0, 40.0, 1.0).unwrap();
    let mut out = view.blank();
    draw_objects(&mut out, &doc, &view);
    // Width 2 logical is 8 device pixels around y = 20.
    assert_eq!(out.get_pixel(20, 17), &RED);
    assert_eq!(out.get_pixel(20, 22), &RED);
    assert_eq!(out.get_pixel(20, 26)[3], 0);
}

#[test]
fn stroke_cost_follows_length_not_area() {
    // A 400-point outline of radius 700 spanning a 2000x1500 raster.
    let pts: Vec<Point> = (0..400)
        .map(|i| {
            let t = f64::from(i) / 400.0 * std::f64::consts::TAU;
            Point::new(1000.0 + 700.0 * t.cos(), 750.0 + 700.0 * t.sin())
        })
        .collect();
    let mut segments: Vec<(Point, Point)> = pts.windows(2).map(|w| (w[0], w[1])).collect();
    segments.push((pts[399], pts[0]));
    let mask = CoverageMask::build(&segments, 1.0, 2000, 1500).unwrap();
    // Perimeter is about 4400px; sampling every segment over the full box
    // would take hundreds of millions of evaluations.
    assert!(mask.samples < 200_000, "samples = {}", mask.samples);
}

#[test]
fn large_outline_renders_quickly() {
    let pts: Vec<(f64, f64)> = (0..400)
        .map(|i| {
            let t = f64::from(i) / 400.0 * std::f64::consts::TAU;
            (1000.0 + 700.0 * t.cos(), 750.0 + 700.0 * t.sin())
        })
        .collect();
    let doc = path_doc(&pts, true);
    let view = identity_view(2000, 1500);
    let mut out = view.blank();
    let started = std::time::Instant::now();
    draw_objects(&mut out, &doc, &view);
    assert!(started.elapsed() < std::time::Duration::from_secs(5));
    let on_stroke = out.get_pixel(1699, 750);
    assert_eq!(on_stroke[0], 255);
    assert!(on_stroke[3] > 200);
    assert_eq!(out.get_pixel(1000, 750)[3], 0);
}

#[test]
fn overlapping_segments_do_not_double_blend() {
    // Two segments meet at (10, 5); the joint keeps single-stroke coverage.
    let doc = path_doc(&[(2.0, 5.3), (10.0, 5.3), (18.0, 5.3)], false);
    let single = path_doc(&[(2.0, 5.3), (18.0, 5.3)], false);
    let view = identity_view(20, 10);
    let (mut a, mut b) = (view.blank(), view.blank());
    draw_objects(&mut a, &doc, &view);
    draw_objects(&mut b, &single, &view);
    for (pa, pb) in a.pixels().zip(b.pixels()) {
        assert!(pa.0.iter().zip(pb.0.iter()).all(|(x, y)| x.abs_diff(*y) <= 1), "{pa:?} vs {pb:?}");
    }
}

// --- Overlay ---

#[test]
fn grid_sits_under_objects() {
    let mut doc = DocStore::new();
    doc.add(CanvasObject::Image(DroppedImage::centered_at("a", "a.png", solid(2, 2, RED), Point::new(1.0, 1.0), 1.0)));
    let tile = RgbaImage::from_pixel(2, 2, BLUE);
    let view = identity_view(4, 4);
    let mut out = view.blank();
    draw(&mut out, &doc, &view, &Overlay { grid: Some(&tile), ..Overlay::default() });
    assert_eq!(out.get_pixel(0, 0), &RED);
    assert_eq!(out.get_pixel(3, 3), &BLUE);
}

#[test]
fn objects_alone_skip_grid() {
    let doc = DocStore::new();
    let view = identity_view(4, 4);
    let mut out = view.blank();
    draw_objects(&mut out, &doc, &view);
    assert!(out.pixels().all(|p| p[3] == 0));
}

#[test]
fn selection_draws_delete_control() {
    let img = DroppedImage::centered_at("a", "a.png", solid(100, 100, BLUE), Point::new(100.0, 100.0), 1.0);
    let mut doc = DocStore::new();
    doc.add(CanvasObject::Image(img.clone()));
    let view = identity_view(200, 200);
    let mut out = view.blank();
    draw(&mut out, &doc, &view, &Overlay { selected: Some(&img), ..Overlay::default() });
    // Control center is (166, 34); six pixels right is inside the disc, off the glyph.
    assert_eq!(out.get_pixel(172, 34), &Rgba(DELETE_FILL));
    // The glyph crosses the center in white.
    assert_eq!(out.get_pixel(165, 33), &Rgba(WHITE));
    // The outline straddles the top edge; above it only the border color shows.
    let above = out.get_pixel(100, 49);
    assert_eq!(&above.0[..3], &SELECTION_BORDER[..3]);
    assert!(above[3] > 0);
}

#[test]
fn marquee_is_translucent() {
    let doc = DocStore::new();
    let view = identity_view(20, 20);
    let mut out = view.blank();
    let marquee = Rect::new(2.0, 2.0, 10.0, 10.0);
    draw(&mut out, &doc, &view, &Overlay { marquee: Some(marquee), ..Overlay::default() });
    let inside = out.get_pixel(6, 6);
    assert_eq!(inside[3], 77);
    assert_eq!(out.get_pixel(15, 15)[3], 0);
}

// --- Helpers ---

#[test]
fn pixel_range_clips() {
    assert_eq!(pixel_range(-3.0, 2.5, 10), 0..3);
    assert_eq!(pixel_range(8.2, 20.0, 10), 8..10);
    assert_eq!(pixel_range(5.0, 5.0, 10), 0..0);
    assert_eq!(pixel_range(f64::NAN, 5.0, 10), 0..0);
}

#[test]
fn segment_distance() {
    let a = Point::new(0.0, 0.0);
    let b = Point::new(10.0, 0.0);
    assert_eq!(distance_to_segment(Point::new(5.0, 3.0), a, b), 3.0);
    assert_eq!(distance_to_segment(Point::new(-4.0, 3.0), a, b), 5.0);
    assert!((distance_to_segment(Point::new(1.0, 1.0), a, a) - 2.0_f64.sqrt()).abs() < 1e-12);
}
