//! Tile layer production.
//!
//! A layer does not render anything locally: its full configuration is
//! serialized into a [`LayerDescriptor`], encoded into the tile URL, and
//! rendered tile by tile by the external dynamic tile service. The
//! resulting [`TileLayer`] is what an interactive map front end consumes.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::raster::RasterLayer;
use crate::vector::VectorDescriptor;

/// Default endpoint of the dynamic tile-rendering service.
pub const DEFAULT_TILE_SERVICE: &str = "https://geolayer.azurewebsites.net/tile";

/// The configuration shipped to the tile service for one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerDescriptor {
    Raster(Box<RasterLayer>),
    Vector(Box<VectorDescriptor>),
}

/// A renderable map layer: slippy-map URL template plus zoom bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayer {
    /// URL template with `{z}`, `{x}`, `{y}` placeholders.
    pub url: String,
    pub max_zoom: u8,
}

/// Handle on a dynamic tile-rendering service endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct TileService {
    base_url: String,
}

impl Default for TileService {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_SERVICE)
    }
}

impl TileService {
    /// Points at a specific service endpoint (no trailing slash needed).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Builds the tile layer for a descriptor: the descriptor travels
    /// URL-safe base64-encoded inside the tile URL template.
    pub fn tile_layer(&self, descriptor: &LayerDescriptor, max_zoom: u8) -> Result<TileLayer> {
        let json = serde_json::to_vec(descriptor)?;
        let payload = URL_SAFE_NO_PAD.encode(&json);
        log::debug!(
            "tile layer: {} byte descriptor, {} byte payload",
            json.len(),
            payload.len()
        );
        Ok(TileLayer {
            url: format!("{}/{}/{{z}}/{{x}}/{{y}}.png", self.base_url, payload),
            max_zoom,
        })
    }

    /// Decodes a payload back into its descriptor. The inverse of
    /// [`TileService::tile_layer`]; what the service does on each tile
    /// request.
    pub fn decode(payload: &str) -> Result<LayerDescriptor> {
        let json = URL_SAFE_NO_PAD.decode(payload)?;
        Ok(serde_json::from_slice(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::RasterLayer;

    #[test]
    fn test_url_template_shape() {
        let layer = RasterLayer::single("/data/dem.tif");
        let tile = TileService::new("https://tiles.example.org/render/")
            .tile_layer(&layer.descriptor(), 18)
            .unwrap();
        assert!(tile.url.starts_with("https://tiles.example.org/render/"));
        assert!(tile.url.ends_with("/{z}/{x}/{y}.png"));
        assert_eq!(tile.max_zoom, 18);
    }

    #[test]
    fn test_payload_roundtrip() {
        let layer = RasterLayer::single("/data/dem.tif").epsg(3035);
        let descriptor = layer.descriptor();
        let tile = TileService::default().tile_layer(&descriptor, 22).unwrap();

        let payload = tile
            .url
            .strip_prefix(&format!("{}/", DEFAULT_TILE_SERVICE))
            .unwrap()
            .strip_suffix("/{z}/{x}/{y}.png")
            .unwrap();
        let decoded = TileService::decode(payload).unwrap();
        assert_eq!(decoded, descriptor);
    }

    #[test]
    fn test_payload_is_url_safe() {
        let layer = RasterLayer::single("/data/a file with spaces?.tif");
        let tile = TileService::default()
            .tile_layer(&layer.descriptor(), 22)
            .unwrap();
        let payload = tile.url.split('/').nth(4).unwrap();
        assert!(payload
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
