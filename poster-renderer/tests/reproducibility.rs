//! Integration tests for render reproducibility (poster-renderer).
//!
//! Every family must draw the same image for the same snapshot, and an
//! export at scale `k` must be the preview with every coordinate and size
//! multiplied by `k`.

use poster_core::{
    Composition, EditorKind, PatternParams, PixelParams, RenderSnapshot, SandParams,
    ScatterParams, Seed,
};
use poster_renderer::patterns::scatter;
use poster_renderer::{
    render, DrawOp, PixmapSurface, RecordingSurface, RenderContext, Rgba, SourceImage,
};

/// Defaults for `kind`, shrunk where the full simulation would be slow.
fn light_params(kind: EditorKind) -> PatternParams {
    match PatternParams::defaults(kind) {
        PatternParams::Sand(p) => PatternParams::Sand(SandParams {
            sand_amount: 400,
            ..p
        }),
        PatternParams::CrashClock(mut p) => {
            p.particle_count = 300;
            PatternParams::CrashClock(p)
        }
        other => other,
    }
}

fn snapshot(kind: EditorKind, seed: &str, time: f64) -> RenderSnapshot {
    RenderSnapshot::new(Seed::parse(seed), light_params(kind)).at_time(time)
}

fn gradient_source() -> SourceImage {
    SourceImage::from_fn(64, 96, |x, y| Rgba::rgb((x * 4) as u8, (y * 2) as u8, 90))
        .expect("source")
}

fn record(snapshot: &RenderSnapshot, ctx: &RenderContext<'_>) -> RecordingSurface {
    let (w, h) = ctx.output_size();
    let mut surface = RecordingSurface::new(w, h);
    render(&mut surface, snapshot, ctx);
    surface
}

#[test]
fn raster_renders_are_pixel_identical() {
    let source = gradient_source();
    for kind in EditorKind::ALL {
        let snap = snapshot(kind, "repeat me", 12.0);
        let (w, h) = kind.design_size();
        let ctx = RenderContext::new(w, h, 0.25).with_source(&source);
        let (ow, oh) = ctx.output_size();

        let mut a = PixmapSurface::new(ow, oh).expect("surface");
        let mut b = PixmapSurface::new(ow, oh).expect("surface");
        render(&mut a, &snap, &ctx);
        render(&mut b, &snap, &ctx);
        assert!(a.data() == b.data(), "{kind} renders differ");
    }
}

#[test]
fn exports_are_scaled_copies_of_the_preview() {
    let source = gradient_source();
    for kind in EditorKind::ALL {
        let snap = snapshot(kind, "scale", 30.0);
        let preview_ctx = RenderContext::preview(kind).with_source(&source);
        let preview = record(&snap, &preview_ctx).into_list();

        for k in [2.0, 3.6] {
            let (w, h) = kind.design_size();
            let export_ctx = RenderContext::new(w, h, k).with_source(&source);
            let export = record(&snap, &export_ctx).into_list();
            let tol = 1e-6 * k * 1000.0;
            assert!(
                preview.is_scaled_copy(&export, k, tol),
                "{kind} at k={k}: first mismatch at op {:?}",
                preview.first_mismatch(&export, k, tol)
            );
        }
    }
}

#[test]
fn different_seeds_differ() {
    for kind in [EditorKind::Poster, EditorKind::CrashClock, EditorKind::Sand] {
        let a = record(&snapshot(kind, "one", 5.0), &RenderContext::preview(kind)).into_list();
        let b = record(&snapshot(kind, "two", 5.0), &RenderContext::preview(kind)).into_list();
        assert_ne!(a, b, "{kind} ignores its seed");
    }
}

#[test]
fn alpha_grid_scatter_is_reproducible() {
    let params = ScatterParams {
        shape_count: 10,
        composition: Composition::Grid,
        ..ScatterParams::default()
    };
    let seed = Seed::parse("alpha");
    assert_eq!(seed.value, 92_909_918);
    assert_eq!(scatter::grid_dimensions(10), (4, 3));

    let first = scatter::layout(&params, seed.value, 500.0, 750.0, 1.0);
    let second = scatter::layout(&params, Seed::parse("alpha").value, 500.0, 750.0, 1.0);
    assert_eq!(first.len(), 10);
    assert_eq!(first, second);

    // Every centre is its lattice anchor plus at most half the jitter.
    for (i, shape) in first.iter().enumerate() {
        let (col, row) = ((i % 4) as f64, (i / 4) as f64);
        let anchor_x = 500.0 / 5.0 * (col + 1.0);
        let anchor_y = 750.0 / 4.0 * (row + 1.0);
        let reach = scatter::GRID_JITTER / 2.0 + 1e-9;
        assert!((shape.x - anchor_x).abs() <= reach, "shape {i} x={}", shape.x);
        assert!((shape.y - anchor_y).abs() <= reach, "shape {i} y={}", shape.y);
    }
}

#[test]
fn pixelation_samples_the_mapped_source_pixel() {
    // Colour depends on the row only; 40 rows cropped to 37.5 put every
    // sample strictly between source rows.
    let source = SourceImage::from_fn(25, 40, |_, y| Rgba::rgb(y as u8 * 6, 20, 200 - y as u8))
        .expect("source");
    let params = PixelParams {
        pixel_size: 10.0,
        animate: false,
        ..PixelParams::default()
    };
    let snap = RenderSnapshot::new(Seed::from_value(1), PatternParams::Pixel(params));
    let ctx = RenderContext::new(500, 750, 1.0).with_source(&source);
    let surface = record(&snap, &ctx);

    let blocks: Vec<(Vec<(f64, f64)>, Rgba)> = surface
        .list()
        .shapes()
        .map(|op| match op {
            DrawOp::Polygon { points, paint } => {
                (points.clone(), paint.fill.expect("blocks are filled"))
            }
            other => panic!("unexpected op {other:?}"),
        })
        .collect();
    assert_eq!(blocks.len(), 50 * 75);

    for (i, (points, fill)) in blocks.iter().enumerate() {
        let (x, y) = ((i % 50) as u32, (i / 50) as u32);
        assert_eq!(points[0], (f64::from(x) * 10.0, f64::from(y) * 10.0));
        assert_eq!(points[2], (f64::from(x) * 10.0 + 10.0, f64::from(y) * 10.0 + 10.0));
        // Source row = floor(1.25 + y / 2).
        let src_y = (5 + 2 * y) / 4;
        assert_eq!(*fill, source.pixel(0, src_y), "block ({x}, {y})");
    }
}
