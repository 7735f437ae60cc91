//! Parametric symbol instantiation.
//!
//! A parametric symbol leaves selected values as reserved placeholder
//! tokens (`FILL-COLOR`, `STROKE-WIDTH`, ...) so one template can be
//! stamped out with different colors, e.g. one fill per legend class.

use crate::symbology::{StyleSlot, StyleValue, Symbol};

/// Placeholder tokens recognized in the value position of a directive.
const TOKENS: [&str; 7] = [
    "COLOR",
    "FILL-COLOR",
    "FILL-OPACITY",
    "STROKE-COLOR",
    "STROKE-WIDTH",
    "SCALEMIN",
    "SCALEMAX",
];

/// Concrete values substituted into a parametric symbol.
///
/// Defaults mirror the Symbol Editor's: red fill, full opacity, yellow
/// hairline stroke, no scale limits.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolOverrides {
    pub color: String,
    pub fill_color: String,
    pub fill_opacity: f64,
    pub stroke_color: String,
    pub stroke_width: f64,
    pub scalemin: Option<f64>,
    pub scalemax: Option<f64>,
}

impl Default for SymbolOverrides {
    fn default() -> Self {
        Self {
            color: "#ff0000".to_string(),
            fill_color: "#ff0000".to_string(),
            fill_opacity: 1.0,
            stroke_color: "#ffff00".to_string(),
            stroke_width: 0.5,
            scalemin: None,
            scalemax: None,
        }
    }
}

impl SymbolOverrides {
    /// Overrides with just a fill color, the most common case.
    pub fn fill(color: impl Into<String>) -> Self {
        Self {
            fill_color: color.into(),
            ..Self::default()
        }
    }
}

impl Symbol {
    /// True if any directive still carries a placeholder token.
    pub fn is_parametric(&self) -> bool {
        self.slots().iter().any(|slot| {
            slot.directives()
                .any(|d| matches!(d.value.as_str(), Some(s) if TOKENS.contains(&s)))
        })
    }

    /// Instantiates a parametric symbol, replacing placeholder tokens with
    /// the values in `overrides`. Non-token values are kept as they are.
    ///
    /// `SCALEMIN`/`SCALEMAX` directives are dropped when no corresponding
    /// override is supplied, so an uncapped instantiation renders at every
    /// scale.
    pub fn instantiate(&self, overrides: &SymbolOverrides) -> Symbol {
        let slots = self
            .slots()
            .iter()
            .map(|slot| {
                StyleSlot(
                    slot.directives()
                        .filter_map(|d| {
                            let mut d = d.clone();
                            match d.value.as_str() {
                                Some("COLOR") => {
                                    d.value = StyleValue::Text(overrides.color.clone());
                                }
                                Some("FILL-COLOR") => {
                                    d.value = StyleValue::Text(overrides.fill_color.clone());
                                }
                                Some("FILL-OPACITY") => {
                                    d.value = StyleValue::Number(overrides.fill_opacity);
                                }
                                Some("STROKE-COLOR") => {
                                    d.value = StyleValue::Text(overrides.stroke_color.clone());
                                }
                                Some("STROKE-WIDTH") => {
                                    d.value = StyleValue::Number(overrides.stroke_width);
                                }
                                Some("SCALEMIN") => {
                                    d.value = StyleValue::Number(overrides.scalemin?);
                                }
                                Some("SCALEMAX") => {
                                    d.value = StyleValue::Number(overrides.scalemax?);
                                }
                                _ => {}
                            }
                            Some(d)
                        })
                        .collect(),
                )
            })
            .collect();
        Symbol::from_slots(slots)
    }
}
