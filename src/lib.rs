//! Server-side construction of raster and vector map layers for dynamic
//! tile rendering.
//!
//! A layer pairs a geospatial data source with its symbology and turns
//! both into a [`TileLayer`]: a slippy-map URL template whose payload
//! carries the full layer configuration to an external tile-rendering
//! service. Nothing is rasterized locally except previews; the service
//! draws every tile.
//!
//! ```no_run
//! use geolayer::{Rule, Symbol, SymbolOverrides, VectorLayer};
//!
//! # fn main() -> geolayer::Result<()> {
//! let symbol = Symbol::from_json(
//!     r##"[[
//!         ["PolygonSymbolizer", "fill", "FILL-COLOR"],
//!         ["PolygonSymbolizer", "fill-opacity", 0.8],
//!         ["LineSymbolizer", "stroke", "#000000"],
//!         ["LineSymbolizer", "stroke-width", 1.0]
//!     ]]"##,
//! )?;
//!
//! let mut vlayer = VectorLayer::file("NUTS_RG_03M_2021_4326_0.shp", "").epsg(4326);
//! vlayer.symbology_clear(0);
//! vlayer.symbology_add(Rule::All, symbol.instantiate(&SymbolOverrides::fill("red")))?;
//! vlayer.symbology_add(
//!     Rule::parse("[CNTR_CODE] = 'IT'")?,
//!     symbol.instantiate(&SymbolOverrides::fill("#00aa00")),
//! )?;
//!
//! let tile_layer = vlayer.tile_layer(22)?;
//! println!("{}", tile_layer.url);
//! # Ok(())
//! # }
//! ```

pub mod color;
pub mod error;
pub mod filter;
pub mod raster;
pub mod render;
pub mod symbology;
pub mod tile;
pub mod vector;

pub use error::{Error, Result};
pub use filter::Rule;
pub use raster::{ColorizerMode, RasterColorizer, RasterLayer, Scaling};
pub use render::{colorbar, preview, PreviewShape};
pub use symbology::{Directive, StyleSlot, StyleValue, Symbol, SymbolOverrides, Symbolizer};
pub use tile::{LayerDescriptor, TileLayer, TileService};
pub use vector::{PostgisConfig, VectorLayer};
