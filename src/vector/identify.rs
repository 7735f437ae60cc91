//! Local identify: hit testing and attribute formatting.
//!
//! Clicking the map asks the layer which feature sits under a geographic
//! coordinate. For sources materialized locally this is answered without
//! the tile service: point-in-polygon for areas, distance-to-segment for
//! lines, a click radius for points. Tolerances are expressed in degrees
//! and derived from the map zoom so the clickable halo stays a constant
//! few pixels on screen.

use geo_types::{Coord, Geometry, LineString, Polygon};

use crate::vector::source::Properties;

/// Click halo in screen pixels for lines and points.
const HIT_RADIUS_PX: f64 = 6.0;

/// Degrees covered by one pixel of a 256px tile at the given zoom,
/// measured at the equator.
pub fn degrees_per_pixel(zoom: u8) -> f64 {
    360.0 / (256.0 * f64::powi(2.0, zoom as i32))
}

/// Hit tolerance in degrees for a click at the given zoom.
pub fn hit_tolerance(zoom: u8) -> f64 {
    degrees_per_pixel(zoom) * HIT_RADIUS_PX
}

/// Tests whether a geographic coordinate hits a geometry.
pub fn hit_test(geometry: &Geometry<f64>, lon: f64, lat: f64, tolerance: f64) -> bool {
    let p = Coord { x: lon, y: lat };
    match geometry {
        Geometry::Point(point) => distance(p, point.0) <= tolerance,
        Geometry::MultiPoint(points) => points.iter().any(|pt| distance(p, pt.0) <= tolerance),
        Geometry::Line(line) => distance_to_segment(p, line.start, line.end) <= tolerance,
        Geometry::LineString(line) => line_hit(p, line, tolerance),
        Geometry::MultiLineString(lines) => lines.iter().any(|l| line_hit(p, l, tolerance)),
        Geometry::Polygon(polygon) => polygon_hit(p, polygon),
        Geometry::MultiPolygon(polygons) => polygons.iter().any(|poly| polygon_hit(p, poly)),
        Geometry::GeometryCollection(geometries) => geometries
            .iter()
            .any(|g| hit_test(g, lon, lat, tolerance)),
        Geometry::Rect(rect) => polygon_hit(p, &rect.to_polygon()),
        Geometry::Triangle(triangle) => polygon_hit(p, &triangle.to_polygon()),
    }
}

fn line_hit(p: Coord<f64>, line: &LineString<f64>, tolerance: f64) -> bool {
    line.0
        .windows(2)
        .any(|seg| distance_to_segment(p, seg[0], seg[1]) <= tolerance)
}

fn polygon_hit(p: Coord<f64>, polygon: &Polygon<f64>) -> bool {
    if !point_in_ring(p, polygon.exterior()) {
        return false;
    }
    !polygon.interiors().iter().any(|hole| point_in_ring(p, hole))
}

/// Even-odd ray cast against a closed ring.
fn point_in_ring(p: Coord<f64>, ring: &LineString<f64>) -> bool {
    let coords = &ring.0;
    if coords.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = coords.len() - 1;
    for i in 0..coords.len() {
        let (a, b) = (coords[i], coords[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Planar distance with the longitude axis compressed by cos(latitude),
/// adequate at click-tolerance scale.
fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let lat_correction = a.y.to_radians().cos().max(0.01);
    let dx = (a.x - b.x) * lat_correction;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

fn distance_to_segment(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len2 = abx * abx + aby * aby;
    if len2 == 0.0 {
        return distance(p, a);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len2).clamp(0.0, 1.0);
    let closest = Coord {
        x: a.x + t * abx,
        y: a.y + t * aby,
    };
    distance(p, closest)
}

/// Formats a feature's attributes for identify output.
///
/// `fields` selects and orders the reported attributes; an empty list
/// reports them all. Missing fields are skipped.
pub fn format_properties(properties: &Properties, fields: &[String]) -> String {
    let mut lines = Vec::new();
    if fields.is_empty() {
        for (name, value) in properties {
            lines.push(format!("{} = {}", name, format_value(value)));
        }
    } else {
        for name in fields {
            if let Some(value) = properties.get(name) {
                lines.push(format!("{} = {}", name, format_value(value)));
            }
        }
    }
    lines.join("\n")
}

fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
