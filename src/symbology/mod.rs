//! Symbology data model.
//!
//! A [`Symbol`] describes how a vector feature is drawn: an ordered list of
//! style slots, each an ordered list of symbolizer directives. Slots map to
//! the named styles `style0`..`style9` on the tile service and are painted
//! back to front, which is how layered renderings (e.g. a casing line under
//! a thinner center line) are expressed.
//!
//! The wire format is the nested-array JSON the Symbol Editor produces:
//!
//! ```json
//! [
//!   [
//!     ["PolygonSymbolizer", "fill", "#0088ff"],
//!     ["PolygonSymbolizer", "fill-opacity", 0.8],
//!     ["LineSymbolizer", "stroke", "#000000"],
//!     ["LineSymbolizer", "stroke-width", 4.0]
//!   ]
//! ]
//! ```

mod parametric;
mod symbol;

pub use parametric::SymbolOverrides;
pub use symbol::{Directive, StyleSlot, StyleValue, Symbol, Symbolizer};

/// Number of style slots the tile service exposes (`style0`..`style9`).
pub const MAX_STYLE_SLOTS: usize = 10;

/// Name of the service style a slot index maps to.
pub fn style_name(index: usize) -> String {
    format!("style{index}")
}
