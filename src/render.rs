//! Local preview rendering.
//!
//! Legends and symbol pickers need a small image of a symbol without a
//! round trip to the tile service. The preview paints a sample feature
//! (point, line or polygon) with each style slot in order, so layered
//! symbols look the way the service will draw them. Raster layers get the
//! matching [`colorbar`] legend strip.

use image::{Rgba, RgbaImage};

use crate::color::{self, Rgba as Color};
use crate::error::Result;
use crate::raster::RasterColorizer;
use crate::symbology::{StyleSlot, Symbol, Symbolizer};

/// Base preview edge in pixels at `size == 1`.
const BASE_SIZE: u32 = 64;

/// The sample feature a preview draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewShape {
    Point,
    Line,
    #[default]
    Polygon,
}

/// Renders a preview image of a symbol.
///
/// The canvas is a `64 * size` pixel square, clipped to `clip_dimension`
/// on both edges when that is smaller. `show_border` frames the image
/// with a one-pixel outline.
pub fn preview(
    symbol: &Symbol,
    shape: PreviewShape,
    size: u32,
    clip_dimension: u32,
    show_border: bool,
) -> RgbaImage {
    let edge = BASE_SIZE
        .saturating_mul(size.max(1))
        .min(clip_dimension.max(1));
    let mut img = RgbaImage::from_pixel(edge, edge, Rgba([0, 0, 0, 0]));

    for slot in symbol.slots() {
        let paint = SlotPaint::from_slot(slot);
        match shape {
            PreviewShape::Polygon => draw_polygon_sample(&mut img, &paint),
            PreviewShape::Line => draw_line_sample(&mut img, &paint),
            PreviewShape::Point => draw_point_sample(&mut img, &paint),
        }
    }

    if show_border {
        draw_border(&mut img, [96, 96, 96, 255]);
    }
    img
}

/// Renders a horizontal legend strip for a raster colorizer, sampling
/// colors across the stop range.
pub fn colorbar(colorizer: &RasterColorizer, width: u32, height: u32) -> RgbaImage {
    let mut img = RgbaImage::new(width.max(1), height.max(1));
    let (min, max) = colorizer.range().unwrap_or((0.0, 1.0));
    let w = img.width();
    for x in 0..w {
        let t = if w > 1 { x as f64 / (w - 1) as f64 } else { 0.0 };
        let rgba = colorizer.color_at(min + (max - min) * t);
        for y in 0..img.height() {
            img.put_pixel(x, y, Rgba(rgba));
        }
    }
    img
}

/// Encodes an image as PNG bytes, ready to embed in a legend widget.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Paint state extracted from one style slot.
struct SlotPaint {
    fill: Option<Color>,
    stroke: Option<Color>,
    stroke_width: f64,
    point_size: f64,
}

impl SlotPaint {
    fn from_slot(slot: &StyleSlot) -> Self {
        let mut fill: Option<Color> = None;
        let mut fill_opacity: Option<f64> = None;
        let mut stroke: Option<Color> = None;
        let mut stroke_width = 1.0;
        let mut point_size = 8.0;

        for d in slot.directives() {
            match (&d.symbolizer, d.key.as_str()) {
                (
                    Symbolizer::PolygonSymbolizer
                    | Symbolizer::PointSymbolizer
                    | Symbolizer::MarkersSymbolizer,
                    "fill",
                ) => {
                    fill = d.value.as_str().and_then(color::parse_color).or(fill);
                }
                (Symbolizer::PolygonSymbolizer, "fill-opacity") => {
                    fill_opacity = d.value.as_f64();
                }
                (Symbolizer::LineSymbolizer | Symbolizer::MarkersSymbolizer, "stroke") => {
                    stroke = d.value.as_str().and_then(color::parse_color).or(stroke);
                }
                (Symbolizer::LineSymbolizer, "stroke-width") => {
                    if let Some(w) = d.value.as_f64() {
                        stroke_width = w.max(0.0);
                    }
                }
                (Symbolizer::MarkersSymbolizer | Symbolizer::PointSymbolizer, "width" | "size") => {
                    if let Some(s) = d.value.as_f64() {
                        point_size = s.max(1.0);
                    }
                }
                _ => {}
            }
        }

        if let (Some(color), Some(opacity)) = (fill.as_mut(), fill_opacity) {
            color[3] = (color[3] as f64 * opacity.clamp(0.0, 1.0)).round() as u8;
        }
        Self {
            fill,
            stroke,
            stroke_width,
            point_size,
        }
    }
}

fn draw_polygon_sample(img: &mut RgbaImage, paint: &SlotPaint) {
    let w = img.width() as f64;
    let margin = w / 8.0;
    let (x0, y0, x1, y1) = (margin, margin, w - margin, w - margin);

    if let Some(fill) = paint.fill {
        for y in y0 as u32..y1 as u32 {
            for x in x0 as u32..x1 as u32 {
                blend(img, x, y, fill);
            }
        }
    }
    if let Some(stroke) = paint.stroke {
        draw_segment(img, (x0, y0), (x1, y0), paint.stroke_width, stroke);
        draw_segment(img, (x1, y0), (x1, y1), paint.stroke_width, stroke);
        draw_segment(img, (x1, y1), (x0, y1), paint.stroke_width, stroke);
        draw_segment(img, (x0, y1), (x0, y0), paint.stroke_width, stroke);
    }
}

fn draw_line_sample(img: &mut RgbaImage, paint: &SlotPaint) {
    let Some(stroke) = paint.stroke else { return };
    let w = img.width() as f64;
    let margin = w / 8.0;
    // A bent sample line reads better than a straight diagonal.
    let a = (margin, w - margin);
    let b = (w * 0.45, w * 0.55);
    let c = (w - margin, margin);
    draw_segment(img, a, b, paint.stroke_width, stroke);
    draw_segment(img, b, c, paint.stroke_width, stroke);
}

fn draw_point_sample(img: &mut RgbaImage, paint: &SlotPaint) {
    let w = img.width() as f64;
    let center = (w / 2.0, w / 2.0);
    let radius = (paint.point_size / 2.0).min(w / 2.0 - 1.0);
    let fill = paint.fill.or(paint.stroke);
    if let Some(fill) = fill {
        fill_circle(img, center, radius, fill);
    }
    if let Some(stroke) = paint.stroke {
        if paint.fill.is_some() {
            ring(img, center, radius, paint.stroke_width.max(1.0), stroke);
        }
    }
}

fn draw_border(img: &mut RgbaImage, color: Color) {
    let (w, h) = (img.width(), img.height());
    for x in 0..w {
        blend(img, x, 0, color);
        blend(img, x, h - 1, color);
    }
    for y in 1..h.saturating_sub(1) {
        blend(img, 0, y, color);
        blend(img, w - 1, y, color);
    }
}

/// Paints every pixel within `width / 2` of the segment.
fn draw_segment(img: &mut RgbaImage, a: (f64, f64), b: (f64, f64), width: f64, color: Color) {
    let half = (width / 2.0).max(0.5);
    let min_x = (a.0.min(b.0) - half).floor().max(0.0) as u32;
    let max_x = (a.0.max(b.0) + half).ceil().min(img.width() as f64 - 1.0) as u32;
    let min_y = (a.1.min(b.1) - half).floor().max(0.0) as u32;
    let max_y = (a.1.max(b.1) + half).ceil().min(img.height() as f64 - 1.0) as u32;

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let p = (x as f64 + 0.5, y as f64 + 0.5);
            if segment_distance(p, a, b) <= half {
                blend(img, x, y, color);
            }
        }
    }
}

fn fill_circle(img: &mut RgbaImage, center: (f64, f64), radius: f64, color: Color) {
    let min_x = (center.0 - radius).floor().max(0.0) as u32;
    let max_x = (center.0 + radius).ceil().min(img.width() as f64 - 1.0) as u32;
    let min_y = (center.1 - radius).floor().max(0.0) as u32;
    let max_y = (center.1 + radius).ceil().min(img.height() as f64 - 1.0) as u32;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = x as f64 + 0.5 - center.0;
            let dy = y as f64 + 0.5 - center.1;
            if dx * dx + dy * dy <= radius * radius {
                blend(img, x, y, color);
            }
        }
    }
}

fn ring(img: &mut RgbaImage, center: (f64, f64), radius: f64, width: f64, color: Color) {
    let outer = radius + width / 2.0;
    let inner = (radius - width / 2.0).max(0.0);
    let min_x = (center.0 - outer).floor().max(0.0) as u32;
    let max_x = (center.0 + outer).ceil().min(img.width() as f64 - 1.0) as u32;
    let min_y = (center.1 - outer).floor().max(0.0) as u32;
    let max_y = (center.1 + outer).ceil().min(img.height() as f64 - 1.0) as u32;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = x as f64 + 0.5 - center.0;
            let dy = y as f64 + 0.5 - center.1;
            let d = (dx * dx + dy * dy).sqrt();
            if d >= inner && d <= outer {
                blend(img, x, y, color);
            }
        }
    }
}

fn segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let abx = b.0 - a.0;
    let aby = b.1 - a.1;
    let len2 = abx * abx + aby * aby;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (((p.0 - a.0) * abx + (p.1 - a.1) * aby) / len2).clamp(0.0, 1.0)
    };
    let cx = a.0 + t * abx;
    let cy = a.1 + t * aby;
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}

/// Source-over alpha blend of one pixel.
fn blend(img: &mut RgbaImage, x: u32, y: u32, src: Color) {
    if x >= img.width() || y >= img.height() {
        return;
    }
    let dst = img.get_pixel(x, y).0;
    let sa = src[3] as f64 / 255.0;
    let da = dst[3] as f64 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        img.put_pixel(x, y, Rgba([0, 0, 0, 0]));
        return;
    }
    let mix = |s: u8, d: u8| {
        let v = (s as f64 * sa + d as f64 * da * (1.0 - sa)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    img.put_pixel(
        x,
        y,
        Rgba([
            mix(src[0], dst[0]),
            mix(src[1], dst[1]),
            mix(src[2], dst[2]),
            (out_a * 255.0).round() as u8,
        ]),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::ColorizerMode;

    fn polygon_symbol() -> Symbol {
        Symbol::from_json(
            r##"[[
                ["PolygonSymbolizer", "fill", "#0088ff"],
                ["LineSymbolizer", "stroke", "#000000"],
                ["LineSymbolizer", "stroke-width", 2.0]
            ]]"##,
        )
        .unwrap()
    }

    #[test]
    fn test_preview_dimensions() {
        let img = preview(&polygon_symbol(), PreviewShape::Polygon, 1, 999, false);
        assert_eq!((img.width(), img.height()), (64, 64));

        let img = preview(&polygon_symbol(), PreviewShape::Polygon, 2, 999, false);
        assert_eq!(img.width(), 128);

        // Clip dimension wins when smaller.
        let img = preview(&polygon_symbol(), PreviewShape::Polygon, 2, 100, false);
        assert_eq!(img.width(), 100);
    }

    #[test]
    fn test_huge_size_clamped_by_clip() {
        let img = preview(&polygon_symbol(), PreviewShape::Polygon, u32::MAX, 64, false);
        assert_eq!((img.width(), img.height()), (64, 64));
    }

    #[test]
    fn test_polygon_preview_center_is_filled() {
        let img = preview(&polygon_symbol(), PreviewShape::Polygon, 1, 999, false);
        assert_eq!(img.get_pixel(32, 32).0, [0, 136, 255, 255]);
        // Corners stay transparent.
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_border_drawn_on_request() {
        let img = preview(&polygon_symbol(), PreviewShape::Polygon, 1, 999, true);
        assert_eq!(img.get_pixel(0, 0).0, [96, 96, 96, 255]);
    }

    #[test]
    fn test_line_preview_paints_path() {
        let symbol = Symbol::from_json(
            r##"[[["LineSymbolizer", "stroke", "#ff0000"], ["LineSymbolizer", "stroke-width", 4.0]]]"##,
        )
        .unwrap();
        let img = preview(&symbol, PreviewShape::Line, 1, 999, false);
        // The bend of the sample line sits at (0.45, 0.55) of the canvas.
        assert_eq!(img.get_pixel(28, 35).0, [255, 0, 0, 255]);
        // Off the path the canvas stays transparent.
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert_eq!(img.get_pixel(63, 63).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_point_preview_marks_center() {
        let symbol = Symbol::from_json(
            r#"[[["MarkersSymbolizer", "fill", "red"], ["MarkersSymbolizer", "width", 10.0]]]"#,
        )
        .unwrap();
        let img = preview(&symbol, PreviewShape::Point, 1, 999, false);
        assert_eq!(img.get_pixel(32, 32).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(4, 4).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_empty_symbol_renders_blank() {
        let img = preview(&Symbol::new(), PreviewShape::Polygon, 1, 999, false);
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn test_colorbar_samples_ramp() {
        let mut c = RasterColorizer::default();
        c.add_stop(0.0, "#000000", ColorizerMode::Linear);
        c.add_stop(1.0, "#ffffff", ColorizerMode::Linear);
        let img = colorbar(&c, 100, 10);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(99, 9).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_encode_png_signature() {
        let img = preview(&polygon_symbol(), PreviewShape::Polygon, 1, 999, false);
        let bytes = encode_png(&img).unwrap();
        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
    }
}
