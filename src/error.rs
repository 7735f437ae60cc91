//! Crate-level error type.

use thiserror::Error;

/// Errors returned by layer construction, symbology handling and
/// descriptor building.
#[derive(Debug, Error)]
pub enum Error {
    /// A symbol carries more style slots than the tile service supports.
    #[error("symbol has {0} style slots, the maximum is {max}", max = crate::symbology::MAX_STYLE_SLOTS)]
    TooManyStyleSlots(usize),

    /// A filter rule string was empty.
    #[error("filter rule must not be empty")]
    EmptyRule,

    /// Identify is not available for this source type.
    #[error("identify is not supported for {0} sources")]
    IdentifyUnsupported(&'static str),

    /// WKT string could not be parsed into a geometry.
    #[error("failed to parse WKT: {0}")]
    Wkt(String),

    /// GeoJSON input could not be parsed.
    #[error("failed to parse GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Shapefile source could not be read.
    #[error("failed to read shapefile: {0}")]
    Shapefile(#[from] shapefile::Error),

    /// Symbol or layer descriptor JSON was invalid or failed to encode.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A tile URL payload was not valid base64.
    #[error("failed to decode tile payload: {0}")]
    Payload(#[from] base64::DecodeError),

    /// Preview image could not be encoded.
    #[error("failed to encode preview image: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
