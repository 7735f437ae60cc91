//! Symbol, style slot and symbolizer directive types.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::symbology::MAX_STYLE_SLOTS;

/// Symbolizer kinds understood by the tile service.
///
/// The renderer's vocabulary is open-ended, so unrecognized names are
/// carried through as-is rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Symbolizer {
    PolygonSymbolizer,
    LineSymbolizer,
    PointSymbolizer,
    MarkersSymbolizer,
    TextSymbolizer,
    PolygonPatternSymbolizer,
    LinePatternSymbolizer,
    RasterSymbolizer,
    #[serde(untagged)]
    Other(String),
}

impl Symbolizer {
    /// Returns the symbolizer name as it appears on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Symbolizer::PolygonSymbolizer => "PolygonSymbolizer",
            Symbolizer::LineSymbolizer => "LineSymbolizer",
            Symbolizer::PointSymbolizer => "PointSymbolizer",
            Symbolizer::MarkersSymbolizer => "MarkersSymbolizer",
            Symbolizer::TextSymbolizer => "TextSymbolizer",
            Symbolizer::PolygonPatternSymbolizer => "PolygonPatternSymbolizer",
            Symbolizer::LinePatternSymbolizer => "LinePatternSymbolizer",
            Symbolizer::RasterSymbolizer => "RasterSymbolizer",
            Symbolizer::Other(name) => name,
        }
    }
}

impl std::fmt::Display for Symbolizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Symbolizer {
    fn from(name: &str) -> Self {
        match name {
            "PolygonSymbolizer" => Symbolizer::PolygonSymbolizer,
            "LineSymbolizer" => Symbolizer::LineSymbolizer,
            "PointSymbolizer" => Symbolizer::PointSymbolizer,
            "MarkersSymbolizer" => Symbolizer::MarkersSymbolizer,
            "TextSymbolizer" => Symbolizer::TextSymbolizer,
            "PolygonPatternSymbolizer" => Symbolizer::PolygonPatternSymbolizer,
            "LinePatternSymbolizer" => Symbolizer::LinePatternSymbolizer,
            "RasterSymbolizer" => Symbolizer::RasterSymbolizer,
            other => Symbolizer::Other(other.to_string()),
        }
    }
}

/// The value position of a directive: a string (colors, modes, file names)
/// or a number (widths, opacities, scales).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    Number(f64),
    Text(String),
}

impl StyleValue {
    /// Returns the value as a string slice if it is textual.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StyleValue::Text(s) => Some(s),
            StyleValue::Number(_) => None,
        }
    }

    /// Returns the value as a number if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StyleValue::Number(n) => Some(*n),
            StyleValue::Text(_) => None,
        }
    }
}

impl From<f64> for StyleValue {
    fn from(n: f64) -> Self {
        StyleValue::Number(n)
    }
}

impl From<&str> for StyleValue {
    fn from(s: &str) -> Self {
        StyleValue::Text(s.to_string())
    }
}

impl From<String> for StyleValue {
    fn from(s: String) -> Self {
        StyleValue::Text(s)
    }
}

/// One symbolizer directive: a `(SymbolizerName, KeyName, Value)` triple
/// configuring a single visual property, e.g.
/// `["PolygonSymbolizer", "fill", "#ff0000"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "(Symbolizer, String, StyleValue)",
    into = "(Symbolizer, String, StyleValue)"
)]
pub struct Directive {
    pub symbolizer: Symbolizer,
    pub key: String,
    pub value: StyleValue,
}

impl Directive {
    /// Creates a directive from its three parts.
    pub fn new(
        symbolizer: impl Into<Symbolizer>,
        key: impl Into<String>,
        value: impl Into<StyleValue>,
    ) -> Self {
        Self {
            symbolizer: symbolizer.into(),
            key: key.into(),
            value: value.into(),
        }
    }
}

impl From<(Symbolizer, String, StyleValue)> for Directive {
    fn from((symbolizer, key, value): (Symbolizer, String, StyleValue)) -> Self {
        Self {
            symbolizer,
            key,
            value,
        }
    }
}

impl From<Directive> for (Symbolizer, String, StyleValue) {
    fn from(d: Directive) -> Self {
        (d.symbolizer, d.key, d.value)
    }
}

/// One style slot: an ordered list of directives painted together.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleSlot(pub Vec<Directive>);

impl StyleSlot {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a directive to the slot.
    pub fn push(&mut self, directive: Directive) {
        self.0.push(directive);
    }

    /// Iterates over the slot's directives.
    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.0.iter()
    }
}

/// A symbol: the full rendering description for one class of features.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol {
    slots: Vec<StyleSlot>,
}

impl Symbol {
    /// Creates an empty symbol.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a symbol from pre-assembled slots.
    pub fn from_slots(slots: Vec<StyleSlot>) -> Self {
        Self { slots }
    }

    /// Parses a symbol from its JSON wire form (what the Symbol Editor
    /// exports).
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the symbol back to its JSON wire form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The symbol's style slots, in paint order.
    pub fn slots(&self) -> &[StyleSlot] {
        &self.slots
    }

    /// Appends a style slot and returns the symbol for chaining.
    pub fn with_slot(mut self, slot: StyleSlot) -> Self {
        self.slots.push(slot);
        self
    }

    /// Checks the symbol fits in the tile service's style slots.
    pub fn validate(&self) -> Result<()> {
        if self.slots.len() > MAX_STYLE_SLOTS {
            return Err(Error::TooManyStyleSlots(self.slots.len()));
        }
        Ok(())
    }

    /// Names of the styles the slots map to, `style0`..`styleN`.
    pub fn style_names(&self) -> Vec<String> {
        (0..self.slots.len())
            .map(crate::symbology::style_name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC_SYMBOL: &str = r##"[
        [
            ["PolygonSymbolizer", "fill", "#0088ff"],
            ["PolygonSymbolizer", "fill-opacity", 0.8],
            ["LineSymbolizer", "stroke", "#000000"],
            ["LineSymbolizer", "stroke-width", 4.0]
        ]
    ]"##;

    #[test]
    fn test_parse_documented_symbol() {
        let symbol = Symbol::from_json(DOC_SYMBOL).unwrap();
        assert_eq!(symbol.slots().len(), 1);

        let slot = &symbol.slots()[0];
        assert_eq!(slot.0.len(), 4);
        assert_eq!(slot.0[0].symbolizer, Symbolizer::PolygonSymbolizer);
        assert_eq!(slot.0[0].key, "fill");
        assert_eq!(slot.0[0].value, StyleValue::Text("#0088ff".into()));
        assert_eq!(slot.0[1].value, StyleValue::Number(0.8));
    }

    #[test]
    fn test_wire_roundtrip() {
        let symbol = Symbol::from_json(DOC_SYMBOL).unwrap();
        let json = symbol.to_json().unwrap();
        let back = Symbol::from_json(&json).unwrap();
        assert_eq!(symbol, back);
        // Wire form stays a nested array, not an object.
        assert!(json.trim_start().starts_with("[["));
    }

    #[test]
    fn test_unknown_symbolizer_carried_through() {
        let json = r#"[[["ShieldSymbolizer", "file", "badge.svg"]]]"#;
        let symbol = Symbol::from_json(json).unwrap();
        assert_eq!(
            symbol.slots()[0].0[0].symbolizer,
            Symbolizer::Other("ShieldSymbolizer".into())
        );
        let out = symbol.to_json().unwrap();
        assert!(out.contains("ShieldSymbolizer"));
    }

    #[test]
    fn test_style_names_follow_slot_order() {
        let mut slot = StyleSlot::new();
        slot.push(Directive::new("LineSymbolizer", "stroke", "#000000"));
        let symbol = Symbol::new().with_slot(slot.clone()).with_slot(slot);
        assert_eq!(symbol.style_names(), vec!["style0", "style1"]);
    }

    #[test]
    fn test_validate_rejects_too_many_slots() {
        let slot = StyleSlot(vec![Directive::new("LineSymbolizer", "stroke", "red")]);
        let symbol = Symbol::from_slots(vec![slot; MAX_STYLE_SLOTS + 1]);
        assert!(symbol.validate().is_err());
    }
}
