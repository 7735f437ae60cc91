//! Raster colorizer: maps pixel values to colors.
//!
//! Mirrors the renderer's RasterColorizer convention: an ordered list of
//! value/color stops, each with an interpolation mode, plus a default color
//! for values outside every stop.

use serde::{Deserialize, Serialize};

use crate::color::{self, Rgba};

/// How a stop's color extends to values above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorizerMode {
    /// Constant color up to the next stop.
    Discrete,
    /// Interpolated towards the next stop's color.
    #[default]
    Linear,
    /// Color applies only to the stop value itself (within epsilon).
    Exact,
}

/// One value/color stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub value: f64,
    pub color: String,
    pub mode: ColorizerMode,
}

/// A full colorizer: default behavior plus ordered stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterColorizer {
    pub default_mode: ColorizerMode,
    pub default_color: String,
    pub epsilon: f64,
    pub stops: Vec<ColorStop>,
}

impl Default for RasterColorizer {
    fn default() -> Self {
        Self {
            default_mode: ColorizerMode::Linear,
            default_color: "transparent".to_string(),
            epsilon: 1.5e-07,
            stops: Vec::new(),
        }
    }
}

impl RasterColorizer {
    /// Creates a colorizer with the given defaults and no stops.
    pub fn new(default_mode: ColorizerMode, default_color: impl Into<String>, epsilon: f64) -> Self {
        Self {
            default_mode,
            default_color: default_color.into(),
            epsilon,
            stops: Vec::new(),
        }
    }

    /// Adds a stop, keeping the list sorted by value.
    pub fn add_stop(&mut self, value: f64, color: impl Into<String>, mode: ColorizerMode) {
        self.stops.push(ColorStop {
            value,
            color: color.into(),
            mode,
        });
        self.stops
            .sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(std::cmp::Ordering::Equal));
    }

    /// Value range covered by the stops, if any.
    pub fn range(&self) -> Option<(f64, f64)> {
        let first = self.stops.first()?;
        let last = self.stops.last()?;
        Some((first.value, last.value))
    }

    /// Resolves a pixel value to a color, applying each stop's mode the way
    /// the tile service's renderer does. Values below the first stop get the
    /// default color.
    pub fn color_at(&self, value: f64) -> Rgba {
        let default = self.default_rgba();
        if self.stops.is_empty() || !value.is_finite() {
            return default;
        }

        // Index of the last stop at or below the value.
        let idx = match self
            .stops
            .iter()
            .rposition(|s| s.value <= value + self.epsilon)
        {
            Some(i) => i,
            None => return default,
        };
        let stop = &self.stops[idx];
        let stop_color = color::parse_color(&stop.color).unwrap_or(default);

        match stop.mode {
            ColorizerMode::Exact => {
                if (value - stop.value).abs() <= self.epsilon {
                    stop_color
                } else {
                    default
                }
            }
            ColorizerMode::Discrete => stop_color,
            ColorizerMode::Linear => match self.stops.get(idx + 1) {
                Some(next) if next.value > stop.value => {
                    let next_color = color::parse_color(&next.color).unwrap_or(default);
                    let t = (value - stop.value) / (next.value - stop.value);
                    color::lerp(stop_color, next_color, t)
                }
                _ => stop_color,
            },
        }
    }

    fn default_rgba(&self) -> Rgba {
        color::parse_color(&self.default_color).unwrap_or([0, 0, 0, 0])
    }
}
