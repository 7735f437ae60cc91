//! Raster dataset layers.
//!
//! A [`RasterLayer`] describes a raster source (single band or RGB
//! composition), its symbology (scaling, opacity, colorizer) and its
//! identify settings. Rendering happens on the external tile service; the
//! layer is the configuration shipped to it, plus local colorizer
//! evaluation and identify-value formatting.

mod colorizer;

pub use colorizer::{ColorStop, ColorizerMode, RasterColorizer};

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tile::{LayerDescriptor, TileLayer, TileService};

/// Resampling method used when the service scales raster pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scaling {
    #[default]
    Near,
    Bilinear,
    Bicubic,
}

/// A per-band or uniform scale bound for RGB compositions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BandScale {
    Uniform(f64),
    PerBand([f64; 3]),
}

impl From<f64> for BandScale {
    fn from(v: f64) -> Self {
        BandScale::Uniform(v)
    }
}

impl From<[f64; 3]> for BandScale {
    fn from(v: [f64; 3]) -> Self {
        BandScale::PerBand(v)
    }
}

/// What the raster source is: one band rendered through a colorizer, or a
/// three-band RGB composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RasterSource {
    Single {
        filepath: String,
        band: u32,
    },
    Rgb {
        filepath: String,
        band_r: u32,
        band_g: u32,
        band_b: u32,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        scalemin: Option<BandScale>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        scalemax: Option<BandScale>,
    },
}

/// RasterSymbolizer settings shipped with the descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterSymbolizer {
    pub scaling: Scaling,
    pub opacity: f64,
    /// Compositing operation (e.g. "multiply"), empty for plain painting.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub composition: Option<String>,
}

impl Default for RasterSymbolizer {
    fn default() -> Self {
        Self {
            scaling: Scaling::Near,
            opacity: 1.0,
            composition: None,
        }
    }
}

/// Settings controlling how identify formats a sampled pixel value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IdentifySettings {
    /// Maps integer pixel values to class names.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dict: Option<BTreeMap<i64, String>>,
    /// Round sampled values to integers before formatting.
    pub integer: bool,
    /// Digits shown for float values.
    pub digits: usize,
    /// Label prefixed to the formatted value.
    pub label: String,
}

/// Display of a raster dataset through the dynamic tile service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterLayer {
    source: RasterSource,
    epsg: u32,
    /// Proj4 string; when non-empty it takes precedence over `epsg`.
    proj: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    nodata: Option<f64>,
    symbolizer: RasterSymbolizer,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    colorizer: Option<RasterColorizer>,
    identify: IdentifySettings,
}

impl RasterLayer {
    fn from_source(source: RasterSource, nodata: Option<f64>) -> Self {
        Self {
            source,
            epsg: 4326,
            proj: String::new(),
            nodata,
            symbolizer: RasterSymbolizer::default(),
            colorizer: None,
            identify: IdentifySettings {
                dict: None,
                integer: false,
                digits: 6,
                label: "Value".to_string(),
            },
        }
    }

    /// Displays a single band of a raster file (any format the service's
    /// GDAL build can open).
    pub fn single(filepath: impl Into<String>) -> Self {
        let filepath = filepath.into();
        log::debug!("rasterlayer: single band source {}", filepath);
        Self::from_source(RasterSource::Single { filepath, band: 1 }, Some(999999.0))
    }

    /// Displays an RGB composition of three bands of a raster file.
    pub fn rgb(
        filepath: impl Into<String>,
        band_r: u32,
        band_g: u32,
        band_b: u32,
        scalemin: Option<BandScale>,
        scalemax: Option<BandScale>,
    ) -> Self {
        let filepath = filepath.into();
        log::debug!(
            "rasterlayer: rgb source {} bands ({}, {}, {})",
            filepath,
            band_r,
            band_g,
            band_b
        );
        Self::from_source(
            RasterSource::Rgb {
                filepath,
                band_r,
                band_g,
                band_b,
                scalemin,
                scalemax,
            },
            None,
        )
    }

    /// Selects the band of a single-band source.
    pub fn band(mut self, band: u32) -> Self {
        if let RasterSource::Single { band: b, .. } = &mut self.source {
            *b = band;
        }
        self
    }

    /// Sets the EPSG code of the source coordinate system.
    pub fn epsg(mut self, epsg: u32) -> Self {
        self.epsg = epsg;
        self
    }

    /// Sets a proj4 string for coordinate systems without an EPSG code;
    /// takes precedence over the EPSG code when non-empty.
    pub fn proj(mut self, proj: impl Into<String>) -> Self {
        self.proj = proj.into();
        self
    }

    /// Sets the nodata value.
    pub fn nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }

    /// Configures the RasterSymbolizer.
    pub fn symbolizer(mut self, scaling: Scaling, opacity: f64, composition: &str) -> Self {
        self.symbolizer = RasterSymbolizer {
            scaling,
            opacity: opacity.clamp(0.0, 1.0),
            composition: if composition.is_empty() {
                None
            } else {
                Some(composition.to_string())
            },
        };
        self
    }

    /// Starts a colorizer with the given defaults, replacing any previous
    /// one.
    pub fn colorizer(
        mut self,
        default_mode: ColorizerMode,
        default_color: &str,
        epsilon: f64,
    ) -> Self {
        self.colorizer = Some(RasterColorizer::new(default_mode, default_color, epsilon));
        self
    }

    /// Adds one colorizer stop. Creates a default colorizer if none was
    /// started yet.
    pub fn color(&mut self, value: f64, color: &str, mode: ColorizerMode) -> &mut Self {
        self.colorizer
            .get_or_insert_with(RasterColorizer::default)
            .add_stop(value, color, mode);
        self
    }

    /// Spreads a palette linearly over `[scalemin, scalemax]`.
    pub fn colorlist(&mut self, scalemin: f64, scalemax: f64, colors: &[&str]) -> &mut Self {
        if colors.is_empty() {
            return self;
        }
        let n = colors.len();
        for (i, color) in colors.iter().enumerate() {
            let t = if n == 1 { 0.0 } else { i as f64 / (n - 1) as f64 };
            let value = scalemin + (scalemax - scalemin) * t;
            self.color(value, color, ColorizerMode::Linear);
        }
        self
    }

    /// Adds stops from a value-to-color mapping, all with the same mode.
    pub fn colormap(&mut self, values_to_colors: &[(f64, &str)], mode: ColorizerMode) -> &mut Self {
        for (value, color) in values_to_colors {
            self.color(*value, color, mode);
        }
        self
    }

    /// The effective colorizer, if one was configured.
    pub fn colorizer_ref(&self) -> Option<&RasterColorizer> {
        self.colorizer.as_ref()
    }

    /// Get/set the integer-value-to-class-name dictionary used by
    /// identify.
    pub fn identify_dict(&self) -> Option<&BTreeMap<i64, String>> {
        self.identify.dict.as_ref()
    }

    pub fn set_identify_dict(&mut self, dict: BTreeMap<i64, String>) {
        self.identify.dict = Some(dict);
    }

    /// Get/set whether identify rounds sampled values to integers.
    pub fn identify_integer(&self) -> bool {
        self.identify.integer
    }

    pub fn set_identify_integer(&mut self, flag: bool) {
        self.identify.integer = flag;
    }

    /// Get/set the number of digits identify shows for float values.
    pub fn identify_digits(&self) -> usize {
        self.identify.digits
    }

    pub fn set_identify_digits(&mut self, digits: usize) {
        self.identify.digits = digits;
    }

    /// Get/set the label prefixed to identify output.
    pub fn identify_label(&self) -> &str {
        &self.identify.label
    }

    pub fn set_identify_label(&mut self, label: impl Into<String>) {
        self.identify.label = label.into();
    }

    /// Formats a sampled pixel value according to the identify settings.
    /// Pixel sampling itself happens on the tile service; this is the
    /// client-side presentation of the returned value.
    pub fn identify_value(&self, raw: f64) -> String {
        if let Some(nodata) = self.nodata {
            if raw == nodata {
                return format!("{}: nodata", self.identify.label);
            }
        }

        let rounded = raw.round() as i64;
        if let Some(dict) = &self.identify.dict {
            if let Some(name) = dict.get(&rounded) {
                return format!("{}: {}", self.identify.label, name);
            }
        }

        if self.identify.integer {
            format!("{}: {}", self.identify.label, rounded)
        } else {
            format!(
                "{}: {:.digits$}",
                self.identify.label,
                raw,
                digits = self.identify.digits
            )
        }
    }

    /// Builds the descriptor shipped to the tile service.
    pub fn descriptor(&self) -> LayerDescriptor {
        LayerDescriptor::Raster(Box::new(self.clone()))
    }

    /// Produces the tile layer for the default tile service.
    pub fn tile_layer(&self, max_zoom: u8) -> Result<TileLayer> {
        self.tile_layer_with(&TileService::default(), max_zoom)
    }

    /// Produces the tile layer for a specific tile service.
    pub fn tile_layer_with(&self, service: &TileService, max_zoom: u8) -> Result<TileLayer> {
        service.tile_layer(&self.descriptor(), max_zoom)
    }
}

impl fmt::Display for RasterLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            RasterSource::Single { filepath, band } => {
                write!(f, "rasterlayer(single band {} of {})", band, filepath)?;
            }
            RasterSource::Rgb {
                filepath,
                band_r,
                band_g,
                band_b,
                ..
            } => {
                write!(
                    f,
                    "rasterlayer(rgb bands ({}, {}, {}) of {})",
                    band_r, band_g, band_b, filepath
                )?;
            }
        }
        if !self.proj.is_empty() {
            write!(f, " proj={:?}", self.proj)?;
        } else {
            write!(f, " epsg={}", self.epsg)?;
        }
        if let Some(nodata) = self.nodata {
            write!(f, " nodata={}", nodata)?;
        }
        if let Some(c) = &self.colorizer {
            write!(f, " colorizer[{} stops]", c.stops.len())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_defaults() {
        let layer = RasterLayer::single("/data/dem.tif");
        assert_eq!(
            layer.source,
            RasterSource::Single {
                filepath: "/data/dem.tif".to_string(),
                band: 1
            }
        );
        assert_eq!(layer.epsg, 4326);
        assert_eq!(layer.nodata, Some(999999.0));
        assert_eq!(layer.identify_label(), "Value");
    }

    #[test]
    fn test_builder_chain() {
        let layer = RasterLayer::single("/data/dem.tif")
            .band(3)
            .epsg(3035)
            .nodata(-9999.0)
            .symbolizer(Scaling::Bilinear, 0.7, "multiply");
        assert!(matches!(
            layer.source,
            RasterSource::Single { band: 3, .. }
        ));
        assert_eq!(layer.epsg, 3035);
        assert_eq!(layer.symbolizer.opacity, 0.7);
        assert_eq!(layer.symbolizer.composition.as_deref(), Some("multiply"));
    }

    #[test]
    fn test_colorlist_spreads_linearly() {
        let mut layer = RasterLayer::single("/data/ndvi.tif");
        layer.colorlist(0.0, 0.75, &["#784519", "#ffeda6", "#015000"]);
        let c = layer.colorizer_ref().unwrap();
        assert_eq!(c.stops.len(), 3);
        assert_eq!(c.stops[0].value, 0.0);
        assert!((c.stops[1].value - 0.375).abs() < 1e-12);
        assert_eq!(c.stops[2].value, 0.75);
    }

    #[test]
    fn test_colormap_sorts_by_value() {
        let mut layer = RasterLayer::single("/data/classes.tif");
        layer.colormap(&[(30.0, "green"), (10.0, "blue")], ColorizerMode::Exact);
        let c = layer.colorizer_ref().unwrap();
        assert_eq!(c.stops[0].value, 10.0);
        assert_eq!(c.stops[1].mode, ColorizerMode::Exact);
    }

    #[test]
    fn test_identify_value_formatting() {
        let mut layer = RasterLayer::single("/data/dem.tif");
        assert_eq!(layer.identify_value(12.3456789), "Value: 12.345679");

        layer.set_identify_digits(2);
        layer.set_identify_label("Elevation");
        assert_eq!(layer.identify_value(12.3456789), "Elevation: 12.35");

        layer.set_identify_integer(true);
        assert_eq!(layer.identify_value(12.6), "Elevation: 13");

        assert_eq!(layer.identify_value(999999.0), "Elevation: nodata");
    }

    #[test]
    fn test_identify_dict_lookup() {
        let mut layer = RasterLayer::single("/data/corine.tif");
        layer.set_identify_label("Class");
        assert!(layer.identify_dict().is_none());

        layer.set_identify_dict(BTreeMap::from([
            (1, "Artificial".to_string()),
            (2, "Agricultural".to_string()),
        ]));
        assert_eq!(layer.identify_dict().map(|d| d.len()), Some(2));
        assert_eq!(layer.identify_value(2.0), "Class: Agricultural");
        // Values outside the dict fall back to numeric formatting.
        assert_eq!(layer.identify_value(7.0), "Class: 7.000000");
    }

    #[test]
    fn test_rgb_band_scales() {
        let layer = RasterLayer::rgb(
            "/data/ortho.tif",
            1,
            2,
            3,
            Some(0.0.into()),
            Some([255.0, 255.0, 200.0].into()),
        );
        match layer.source {
            RasterSource::Rgb {
                scalemin, scalemax, ..
            } => {
                assert_eq!(scalemin, Some(BandScale::Uniform(0.0)));
                assert_eq!(scalemax, Some(BandScale::PerBand([255.0, 255.0, 200.0])));
            }
            _ => panic!("expected rgb source"),
        }
    }
}
