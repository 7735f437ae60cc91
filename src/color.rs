//! Color string parsing.
//!
//! Symbology values carry colors as CSS-style strings (`#rrggbb`, `rgb()`,
//! a small set of named colors). The tile service accepts them verbatim;
//! the local preview renderer needs them resolved to RGBA.

/// An 8-bit RGBA color.
pub type Rgba = [u8; 4];

/// Parses a color string into RGBA.
///
/// Accepts `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r,g,b)`, `rgba(r,g,b,a)`
/// and the named colors that commonly appear in symbology documents.
/// Returns `None` for anything else.
pub fn parse_color(s: &str) -> Option<Rgba> {
    let s = s.trim();
    if s.starts_with('#') {
        return parse_hex(s);
    }
    if s.starts_with("rgb(") || s.starts_with("rgba(") {
        return parse_rgb(s);
    }
    named_color(s)
}

fn parse_hex(s: &str) -> Option<Rgba> {
    let hex = s.trim_start_matches('#');
    match hex.len() {
        3 => {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            Some([r, g, b, 255])
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some([r, g, b, 255])
        }
        8 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            let a = u8::from_str_radix(&hex[6..8], 16).ok()?;
            Some([r, g, b, a])
        }
        _ => None,
    }
}

fn parse_rgb(s: &str) -> Option<Rgba> {
    let inner = s
        .trim_start_matches("rgba(")
        .trim_start_matches("rgb(")
        .trim_end_matches(')');
    let parts: Vec<&str> = inner.split(',').map(|p| p.trim()).collect();
    if parts.len() < 3 {
        return None;
    }

    let r: f64 = parts[0].parse().ok()?;
    let g: f64 = parts[1].parse().ok()?;
    let b: f64 = parts[2].parse().ok()?;
    let a: f64 = if parts.len() >= 4 {
        parts[3].parse().ok()?
    } else {
        1.0
    };

    Some([
        r.clamp(0.0, 255.0) as u8,
        g.clamp(0.0, 255.0) as u8,
        b.clamp(0.0, 255.0) as u8,
        (a.clamp(0.0, 1.0) * 255.0).round() as u8,
    ])
}

fn named_color(s: &str) -> Option<Rgba> {
    let rgba = match s.to_ascii_lowercase().as_str() {
        "red" => [255, 0, 0, 255],
        "green" => [0, 128, 0, 255],
        "blue" => [0, 0, 255, 255],
        "black" => [0, 0, 0, 255],
        "white" => [255, 255, 255, 255],
        "yellow" => [255, 255, 0, 255],
        "cyan" => [0, 255, 255, 255],
        "magenta" => [255, 0, 255, 255],
        "gray" | "grey" => [128, 128, 128, 255],
        "orange" => [255, 165, 0, 255],
        "brown" => [165, 42, 42, 255],
        "purple" => [128, 0, 128, 255],
        "pink" => [255, 192, 203, 255],
        "transparent" => [0, 0, 0, 0],
        _ => return None,
    };
    Some(rgba)
}

/// Linearly interpolates between two colors, `t` in `[0, 1]`.
pub fn lerp(a: Rgba, b: Rgba, t: f64) -> Rgba {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    [
        mix(a[0], b[0]),
        mix(a[1], b[1]),
        mix(a[2], b[2]),
        mix(a[3], b[3]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_forms() {
        assert_eq!(parse_color("#ff0000"), Some([255, 0, 0, 255]));
        assert_eq!(parse_color("#f00"), Some([255, 0, 0, 255]));
        assert_eq!(parse_color("#00aa0080"), Some([0, 170, 0, 128]));
        assert_eq!(parse_color("#zzz"), None);
        assert_eq!(parse_color("#ff00"), None);
    }

    #[test]
    fn test_rgb_forms() {
        assert_eq!(parse_color("rgb(0, 136, 255)"), Some([0, 136, 255, 255]));
        assert_eq!(parse_color("rgba(255, 0, 0, 0.5)"), Some([255, 0, 0, 128]));
        assert_eq!(parse_color("rgb(1)"), None);
    }

    #[test]
    fn test_named() {
        assert_eq!(parse_color("red"), Some([255, 0, 0, 255]));
        assert_eq!(parse_color("Transparent"), Some([0, 0, 0, 0]));
        assert_eq!(parse_color("chartreuse"), None);
    }

    #[test]
    fn test_lerp_endpoints() {
        let black = [0, 0, 0, 255];
        let white = [255, 255, 255, 255];
        assert_eq!(lerp(black, white, 0.0), black);
        assert_eq!(lerp(black, white, 1.0), white);
        assert_eq!(lerp(black, white, 0.5), [128, 128, 128, 255]);
    }
}
