//! Vector dataset layers.
//!
//! A [`VectorLayer`] ties a vector source (file, WKT strings, GeoJSON,
//! PostGIS query) to its symbology: an ordered list of (rule, symbol)
//! pairs that the tile service expands into its numbered styles
//! `style0`..`style9`. The layer also answers identify requests locally
//! for sources whose features can be materialized in memory.

mod identify;
mod source;

pub use source::{Feature, PostgisConfig, Properties, VectorSource};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::filter::Rule;
use crate::symbology::{StyleSlot, Symbol};
use crate::tile::{LayerDescriptor, TileLayer, TileService};

/// One symbology entry: a symbol applied to the features a rule selects.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbologyEntry {
    pub rule: Rule,
    pub symbol: Symbol,
}

/// Display of a vector dataset through the dynamic tile service.
#[derive(Debug, Clone)]
pub struct VectorLayer {
    source: VectorSource,
    epsg: u32,
    /// Proj4 string; when non-empty it takes precedence over `epsg`.
    proj: String,
    symbology: Vec<SymbologyEntry>,
    /// Highest style slot index the service should reset when clearing.
    max_style: u32,
    identify_fields: Vec<String>,
    /// Features materialized for identify; lazy for file sources.
    features: Option<Vec<Feature>>,
}

impl VectorLayer {
    fn from_source(source: VectorSource, features: Option<Vec<Feature>>) -> Self {
        Self {
            source,
            epsg: 4326,
            proj: String::new(),
            symbology: Vec::new(),
            max_style: 0,
            identify_fields: Vec::new(),
            features,
        }
    }

    /// Displays a file-based vector dataset (shapefile, geopackage, ...).
    /// `layer` names the layer inside multi-layer formats; leave it empty
    /// for shapefiles.
    pub fn file(filepath: impl Into<String>, layer: impl Into<String>) -> Self {
        let filepath = filepath.into();
        log::debug!("vectorlayer: file source {}", filepath);
        Self::from_source(
            VectorSource::File {
                filepath,
                layer: layer.into(),
            },
            None,
        )
    }

    /// Displays features given as WKT strings in EPSG:4326, with optional
    /// parallel attribute maps (features beyond the list get no
    /// attributes).
    pub fn wkt(wkt_strings: &[&str], properties: Vec<Properties>) -> Result<Self> {
        let geometries: Vec<String> = wkt_strings.iter().map(|s| s.to_string()).collect();
        let source = VectorSource::Wkt {
            geometries,
            properties,
        };
        let features = source.load_features()?;
        log::debug!("vectorlayer: wkt source with {} features", features.len());
        Ok(Self::from_source(source, Some(features)))
    }

    /// Displays features given as a GeoJSON document.
    pub fn geojson(data: impl Into<String>) -> Result<Self> {
        let source = VectorSource::GeoJson { data: data.into() };
        let features = source.load_features()?;
        log::debug!(
            "vectorlayer: geojson source with {} features",
            features.len()
        );
        Ok(Self::from_source(source, Some(features)))
    }

    /// Displays the result of a PostGIS query. The query runs on the tile
    /// service; identify is not available locally for this source.
    pub fn postgis(config: PostgisConfig) -> Self {
        log::debug!(
            "vectorlayer: postgis source {}:{}/{}",
            config.host,
            config.port,
            config.dbname
        );
        Self::from_source(VectorSource::Postgis(config), None)
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

    /// Get/set the attribute names reported by identify. An empty list
    /// reports every attribute.
    pub fn identify_fields(&self) -> &[String] {
        &self.identify_fields
    }

    pub fn set_identify_fields(&mut self, fields: Vec<String>) {
        self.identify_fields = fields;
    }

    /// Removes the default symbology and every added symbol. `maxstyle` is
    /// the highest style slot index the service resets server-side.
    pub fn symbology_clear(&mut self, maxstyle: u32) {
        log::debug!(
            "vectorlayer: clearing {} symbology entries (maxstyle {})",
            self.symbology.len(),
            maxstyle
        );
        self.symbology.clear();
        self.max_style = maxstyle;
    }

    /// Applies a symbol to the features selected by `rule` ([`Rule::All`]
    /// for every feature). Entries keep their insertion order, which is
    /// the order the service evaluates them in.
    pub fn symbology_add(&mut self, rule: Rule, symbol: Symbol) -> Result<()> {
        symbol.validate()?;
        log::debug!(
            "vectorlayer: adding symbol with {} slots for rule {}",
            symbol.slots().len(),
            rule
        );
        self.symbology.push(SymbologyEntry { rule, symbol });
        Ok(())
    }

    /// The symbology entries currently applied, in evaluation order.
    pub fn symbology(&self) -> &[SymbologyEntry] {
        &self.symbology
    }

    /// Returns the attributes of the feature under a geographic
    /// coordinate, formatted per `identify_fields`, or `None` when
    /// nothing is hit. File sources are materialized on first call.
    pub fn identify(&mut self, lon: f64, lat: f64, zoom: u8) -> Result<Option<String>> {
        if self.features.is_none() {
            self.features = Some(self.source.load_features()?);
        }
        let Some(features) = self.features.as_ref() else {
            return Ok(None);
        };

        let tolerance = identify::hit_tolerance(zoom);
        for feature in features {
            if identify::hit_test(&feature.geometry, lon, lat, tolerance) {
                return Ok(Some(identify::format_properties(
                    &feature.properties,
                    &self.identify_fields,
                )));
            }
        }
        Ok(None)
    }

    /// Builds the descriptor shipped to the tile service.
    pub fn descriptor(&self) -> VectorDescriptor {
        let slot_count = self
            .symbology
            .iter()
            .map(|e| e.symbol.slots().len())
            .max()
            .unwrap_or(0);

        let mut styles: Vec<StyleDescriptor> = (0..slot_count)
            .map(|i| StyleDescriptor {
                name: crate::symbology::style_name(i),
                rules: Vec::new(),
            })
            .collect();
        for entry in &self.symbology {
            for (i, slot) in entry.symbol.slots().iter().enumerate() {
                styles[i].rules.push(StyleRule {
                    filter: entry.rule.clone(),
                    symbolizers: slot.clone(),
                });
            }
        }

        VectorDescriptor {
            source: self.source.clone(),
            epsg: self.epsg,
            proj: self.proj.clone(),
            max_style: self.max_style,
            styles,
        }
    }

    /// Produces the tile layer for the default tile service.
    pub fn tile_layer(&self, max_zoom: u8) -> Result<TileLayer> {
        self.tile_layer_with(&TileService::default(), max_zoom)
    }

    /// Produces the tile layer for a specific tile service.
    pub fn tile_layer_with(&self, service: &TileService, max_zoom: u8) -> Result<TileLayer> {
        service.tile_layer(
            &LayerDescriptor::Vector(Box::new(self.descriptor())),
            max_zoom,
        )
    }
}

impl fmt::Display for VectorLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vectorlayer({} source", self.source.kind())?;
        if let VectorSource::File { filepath, layer } = &self.source {
            write!(f, " {}", filepath)?;
            if !layer.is_empty() {
                write!(f, " layer {}", layer)?;
            }
        }
        if !self.proj.is_empty() {
            write!(f, ", proj={:?}", self.proj)?;
        } else {
            write!(f, ", epsg={}", self.epsg)?;
        }
        write!(f, ", {} symbology entries)", self.symbology.len())
    }
}

/// One rule inside a numbered style: a filter plus the directives of the
/// symbol slot mapped to that style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRule {
    pub filter: Rule,
    pub symbolizers: StyleSlot,
}

/// One of the service's numbered styles (`style0`..`style9`) with the
/// rules feeding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDescriptor {
    pub name: String,
    pub rules: Vec<StyleRule>,
}

/// The vector-layer configuration shipped to the tile service: source,
/// coordinate system and symbology expanded to numbered styles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorDescriptor {
    pub source: VectorSource,
    pub epsg: u32,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub proj: String,
    pub max_style: u32,
    pub styles: Vec<StyleDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbology::SymbolOverrides;

    fn parametric_symbol() -> Symbol {
        Symbol::from_json(
            r##"[
                [
                    ["PolygonSymbolizer", "fill", "FILL-COLOR"],
                    ["PolygonSymbolizer", "fill-opacity", 0.8],
                    ["LineSymbolizer", "stroke", "#000000"],
                    ["LineSymbolizer", "stroke-width", 1.0]
                ]
            ]"##,
        )
        .unwrap()
    }

    #[test]
    fn test_documented_workflow() {
        // The shapefile workflow from the usage guide: clear the default
        // symbology, red everywhere, green for Italy.
        let mut vlayer = VectorLayer::file("/data/NUTS_RG_03M_2021_4326_0.shp", "").epsg(4326);
        vlayer.symbology_clear(0);
        vlayer
            .symbology_add(
                Rule::All,
                parametric_symbol().instantiate(&SymbolOverrides::fill("red")),
            )
            .unwrap();
        vlayer
            .symbology_add(
                Rule::parse("[CNTR_CODE] = 'IT'").unwrap(),
                parametric_symbol().instantiate(&SymbolOverrides::fill("#00aa00")),
            )
            .unwrap();

        assert_eq!(vlayer.symbology().len(), 2);
        let descriptor = vlayer.descriptor();
        assert_eq!(descriptor.styles.len(), 1);
        assert_eq!(descriptor.styles[0].name, "style0");
        assert_eq!(descriptor.styles[0].rules.len(), 2);
        assert_eq!(descriptor.styles[0].rules[0].filter, Rule::All);
        assert_eq!(
            descriptor.styles[0].rules[1].filter,
            Rule::Filter("[CNTR_CODE] = 'IT'".to_string())
        );
    }

    #[test]
    fn test_layered_symbol_spreads_across_styles() {
        // Two slots: casing line under a thinner center line.
        let symbol = Symbol::from_json(
            r##"[
                [["LineSymbolizer", "stroke", "#000000"], ["LineSymbolizer", "stroke-width", 5.0]],
                [["LineSymbolizer", "stroke", "#ffcc00"], ["LineSymbolizer", "stroke-width", 3.0]]
            ]"##,
        )
        .unwrap();

        let mut vlayer = VectorLayer::file("/data/roads.gpkg", "roads");
        vlayer.symbology_add(Rule::All, symbol).unwrap();

        let descriptor = vlayer.descriptor();
        assert_eq!(descriptor.styles.len(), 2);
        assert_eq!(descriptor.styles[1].name, "style1");
        assert_eq!(descriptor.styles[0].rules.len(), 1);
        assert_eq!(descriptor.styles[1].rules.len(), 1);
    }

    #[test]
    fn test_wkt_identify() {
        let mut props = Properties::new();
        props.insert("ndx".into(), serde_json::json!(22));
        props.insert("units".into(), serde_json::json!("abcd"));

        let mut vlayer = VectorLayer::wkt(
            &["POLYGON ((20 40, 0 45, 10 52, 30 52, 20 40))"],
            vec![props],
        )
        .unwrap();

        let hit = vlayer.identify(15.0, 48.0, 10).unwrap();
        assert_eq!(hit.as_deref(), Some("ndx = 22\nunits = abcd"));

        vlayer.set_identify_fields(vec!["units".to_string()]);
        let hit = vlayer.identify(15.0, 48.0, 10).unwrap();
        assert_eq!(hit.as_deref(), Some("units = abcd"));

        let miss = vlayer.identify(50.0, 48.0, 10).unwrap();
        assert_eq!(miss, None);
    }

    #[test]
    fn test_postgis_identify_unsupported() {
        let mut vlayer = VectorLayer::postgis(PostgisConfig {
            host: "db.example.org".to_string(),
            port: 5432,
            dbname: "gis".to_string(),
            query: "select * from parcels".to_string(),
            geomtype: "polygon".to_string(),
            ..Default::default()
        });
        assert!(vlayer.identify(9.0, 45.0, 10).is_err());
    }

    #[test]
    fn test_symbology_clear_resets_entries() {
        let mut vlayer = VectorLayer::wkt(&["POINT (0 0)"], Vec::new()).unwrap();
        vlayer.symbology_add(Rule::All, parametric_symbol()).unwrap();
        vlayer.symbology_clear(3);
        assert!(vlayer.symbology().is_empty());
        assert_eq!(vlayer.descriptor().max_style, 3);
        assert!(vlayer.descriptor().styles.is_empty());
    }

    #[test]
    fn test_display() {
        let vlayer = VectorLayer::file("/data/nuts.shp", "").epsg(3035);
        let repr = vlayer.to_string();
        assert!(repr.contains("file source /data/nuts.shp"));
        assert!(repr.contains("epsg=3035"));
    }
}
