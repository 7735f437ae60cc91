//! Vector data sources and feature loading.
//!
//! A source is the part of the layer configuration that tells the tile
//! service where the data lives. File and in-memory sources can also be
//! materialized locally into [`Feature`]s for the identify operation;
//! PostGIS sources cannot (the query runs on the service side).

use geo_types::{
    Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shapefile::dbase::FieldValue;
use wkt::TryFromWkt;

use crate::error::{Error, Result};

/// Attribute map of one feature.
pub type Properties = Map<String, Value>;

/// A materialized feature: geometry plus attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry<f64>,
    pub properties: Properties,
}

/// Connection and query parameters for a PostGIS-backed source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PostgisConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub query: String,
    pub geomtype: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub geometry_field: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub geometry_table: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub extents: String,
}

/// Where the layer's features come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum VectorSource {
    /// A vector file (shapefile, geopackage, ...). `layer` selects the
    /// layer inside multi-layer formats and is empty for shapefiles.
    File {
        filepath: String,
        #[serde(skip_serializing_if = "String::is_empty", default)]
        layer: String,
    },
    /// In-memory features as WKT strings (EPSG:4326) with parallel
    /// attribute maps.
    Wkt {
        geometries: Vec<String>,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        properties: Vec<Properties>,
    },
    /// In-memory features as a GeoJSON document.
    GeoJson { data: String },
    /// A PostGIS query executed by the tile service.
    Postgis(PostgisConfig),
}

impl VectorSource {
    /// Short name used in log and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            VectorSource::File { .. } => "file",
            VectorSource::Wkt { .. } => "wkt",
            VectorSource::GeoJson { .. } => "geojson",
            VectorSource::Postgis(_) => "postgis",
        }
    }

    /// Materializes the source into features for local identify.
    ///
    /// PostGIS sources return [`Error::IdentifyUnsupported`]: their data
    /// only exists on the service side.
    pub fn load_features(&self) -> Result<Vec<Feature>> {
        match self {
            VectorSource::File { filepath, .. } => load_shapefile(filepath),
            VectorSource::Wkt {
                geometries,
                properties,
            } => load_wkt(geometries, properties),
            VectorSource::GeoJson { data } => load_geojson(data),
            VectorSource::Postgis(_) => Err(Error::IdentifyUnsupported("postgis")),
        }
    }
}

fn load_wkt(geometries: &[String], properties: &[Properties]) -> Result<Vec<Feature>> {
    let mut features = Vec::with_capacity(geometries.len());
    for (i, text) in geometries.iter().enumerate() {
        let geometry =
            Geometry::<f64>::try_from_wkt_str(text).map_err(|e| Error::Wkt(e.to_string()))?;
        features.push(Feature {
            geometry,
            properties: properties.get(i).cloned().unwrap_or_default(),
        });
    }
    log::debug!("loaded {} features from WKT strings", features.len());
    Ok(features)
}

fn load_geojson(data: &str) -> Result<Vec<Feature>> {
    let geojson: geojson::GeoJson = data.parse()?;
    let mut features = Vec::new();
    match geojson {
        geojson::GeoJson::FeatureCollection(fc) => {
            for feature in fc.features {
                if let Some(f) = convert_geojson_feature(feature)? {
                    features.push(f);
                }
            }
        }
        geojson::GeoJson::Feature(feature) => {
            if let Some(f) = convert_geojson_feature(feature)? {
                features.push(f);
            }
        }
        geojson::GeoJson::Geometry(geometry) => {
            features.push(Feature {
                geometry: Geometry::try_from(geometry.value)?,
                properties: Properties::new(),
            });
        }
    }
    log::debug!("loaded {} features from GeoJSON", features.len());
    Ok(features)
}

fn convert_geojson_feature(feature: geojson::Feature) -> Result<Option<Feature>> {
    let Some(geometry) = feature.geometry else {
        return Ok(None);
    };
    Ok(Some(Feature {
        geometry: Geometry::try_from(geometry.value)?,
        properties: feature.properties.unwrap_or_default(),
    }))
}

fn load_shapefile(filepath: &str) -> Result<Vec<Feature>> {
    let mut reader = shapefile::Reader::from_path(filepath)?;
    let mut features = Vec::new();
    for shape_record in reader.iter_shapes_and_records() {
        let (shape, record) = shape_record?;
        if let Some(geometry) = convert_shape(shape) {
            features.push(Feature {
                geometry,
                properties: record_to_properties(record),
            });
        }
    }
    log::debug!("loaded {} features from {}", features.len(), filepath);
    Ok(features)
}

fn convert_shape(shape: shapefile::Shape) -> Option<Geometry<f64>> {
    match shape {
        shapefile::Shape::Point(p) => Some(Geometry::Point(Point::new(p.x, p.y))),
        shapefile::Shape::Multipoint(mp) => {
            let points: Vec<Point<f64>> =
                mp.points().iter().map(|p| Point::new(p.x, p.y)).collect();
            Some(Geometry::MultiPoint(MultiPoint::new(points)))
        }
        shapefile::Shape::Polyline(pl) => {
            let mut lines: Vec<LineString<f64>> = pl
                .parts()
                .iter()
                .map(|part| part.iter().map(|p| Coord { x: p.x, y: p.y }).collect())
                .collect();
            match lines.len() {
                0 => None,
                1 => Some(Geometry::LineString(lines.remove(0))),
                _ => Some(Geometry::MultiLineString(MultiLineString::new(lines))),
            }
        }
        shapefile::Shape::Polygon(poly) => convert_polygon(poly),
        _ => None,
    }
}

fn convert_polygon(poly: shapefile::Polygon) -> Option<Geometry<f64>> {
    use shapefile::PolygonRing;

    let mut outer_rings: Vec<LineString<f64>> = Vec::new();
    let mut holes: Vec<LineString<f64>> = Vec::new();
    for ring in poly.rings() {
        let coords: LineString<f64> = ring
            .points()
            .iter()
            .map(|p| Coord { x: p.x, y: p.y })
            .collect();
        match ring {
            PolygonRing::Outer(_) => outer_rings.push(coords),
            PolygonRing::Inner(_) => holes.push(coords),
        }
    }

    match outer_rings.len() {
        0 => None,
        1 => Some(Geometry::Polygon(Polygon::new(outer_rings.remove(0), holes))),
        // Multi-part polygons: the format does not say which hole belongs
        // to which part, so holes are kept only in the single-part case.
        _ => Some(Geometry::MultiPolygon(MultiPolygon::new(
            outer_rings
                .into_iter()
                .map(|ext| Polygon::new(ext, Vec::new()))
                .collect(),
        ))),
    }
}

fn record_to_properties(record: shapefile::dbase::Record) -> Properties {
    let mut properties = Properties::new();
    for (name, value) in record {
        let json = match value {
            FieldValue::Character(Some(s)) => Value::String(s.trim().to_string()),
            FieldValue::Numeric(Some(n)) => json_number(n),
            FieldValue::Float(Some(f)) => json_number(f as f64),
            FieldValue::Integer(i) => Value::from(i),
            FieldValue::Double(d) => json_number(d),
            FieldValue::Logical(Some(b)) => Value::Bool(b),
            _ => Value::Null,
        };
        properties.insert(name, json);
    }
    properties
}

fn json_number(n: f64) -> Value {
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_wkt_with_properties() {
        let geometries = vec!["POLYGON ((20 40, 0 45, 10 52, 30 52, 20 40))".to_string()];
        let mut props = Properties::new();
        props.insert("units".to_string(), Value::String("abcd".to_string()));
        let features = load_wkt(&geometries, &[props]).unwrap();

        assert_eq!(features.len(), 1);
        assert!(matches!(features[0].geometry, Geometry::Polygon(_)));
        assert_eq!(features[0].properties["units"], "abcd");
    }

    #[test]
    fn test_load_wkt_missing_properties_default_empty() {
        let geometries = vec![
            "POINT (9.0 45.0)".to_string(),
            "POINT (10.0 46.0)".to_string(),
        ];
        let features = load_wkt(&geometries, &[]).unwrap();
        assert_eq!(features.len(), 2);
        assert!(features[1].properties.is_empty());
    }

    #[test]
    fn test_load_wkt_invalid() {
        let geometries = vec!["POLYGO ((0 0))".to_string()];
        assert!(matches!(
            load_wkt(&geometries, &[]),
            Err(Error::Wkt(_))
        ));
    }

    #[test]
    fn test_load_geojson_collection() {
        let data = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [9.19, 45.46]},
                    "properties": {"name": "Milano"}
                },
                {
                    "type": "Feature",
                    "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]},
                    "properties": null
                }
            ]
        }"#;
        let features = load_geojson(data).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].properties["name"], "Milano");
        assert!(matches!(features[1].geometry, Geometry::LineString(_)));
    }

    #[test]
    fn test_postgis_has_no_local_features() {
        let source = VectorSource::Postgis(PostgisConfig::default());
        assert!(matches!(
            source.load_features(),
            Err(Error::IdentifyUnsupported("postgis"))
        ));
    }

    #[test]
    fn test_source_serde_tags() {
        let source = VectorSource::File {
            filepath: "/data/nuts.shp".to_string(),
            layer: String::new(),
        };
        let json = serde_json::to_string(&source).unwrap();
        assert!(json.contains("\"kind\":\"file\""));
        // Empty layer name is omitted on the wire.
        assert!(!json.contains("\"layer\""));
        let back: VectorSource = serde_json::from_str(&json).unwrap();
        assert_eq!(back, source);
    }
}
