//! Shift symbols.
//!
//! The four cell values of a roster. NORMAL and LATE are working
//! shifts; OFF and EARLY both count as rest for run-length and
//! rest-window purposes, since an EARLY shift ends before the evening
//! block.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single roster cell value.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ShiftSymbol {
    /// Regular full working day.
    #[default]
    Normal,
    /// Short day ending early; counts as rest.
    Early,
    /// Working day covering the evening block.
    Late,
    /// Full day off.
    Off,
}

impl ShiftSymbol {
    /// All symbols, in declaration order.
    pub const ALL: [ShiftSymbol; 4] = [
        ShiftSymbol::Normal,
        ShiftSymbol::Early,
        ShiftSymbol::Late,
        ShiftSymbol::Off,
    ];

    /// Whether the symbol counts toward consecutive working days.
    pub fn is_working(self) -> bool {
        matches!(self, ShiftSymbol::Normal | ShiftSymbol::Late)
    }

    /// Whether the symbol counts as a rest day.
    pub fn is_rest(self) -> bool {
        matches!(self, ShiftSymbol::Off | ShiftSymbol::Early)
    }

    /// Single-character grid glyph.
    pub fn glyph(self) -> char {
        match self {
            ShiftSymbol::Normal => '.',
            ShiftSymbol::Early => 'E',
            ShiftSymbol::Late => 'L',
            ShiftSymbol::Off => 'O',
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ShiftSymbol::Normal => "NORMAL",
            ShiftSymbol::Early => "EARLY",
            ShiftSymbol::Late => "LATE",
            ShiftSymbol::Off => "OFF",
        }
    }
}

impl fmt::Display for ShiftSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A symbol as received at the boundary.
///
/// Imported rosters sometimes carry labels from older systems; those
/// are kept verbatim as [`SymbolToken::Legacy`] so a round-trip does
/// not silently rewrite them, and [`SymbolToken::resolve`] maps them
/// to the nearest engine symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SymbolToken {
    /// One of the engine's four symbols.
    Known(ShiftSymbol),
    /// An unrecognized label, preserved verbatim.
    Legacy(String),
}

impl SymbolToken {
    /// Parses a label; names and grid glyphs are both accepted.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "NORMAL" | "." => SymbolToken::Known(ShiftSymbol::Normal),
            "EARLY" | "E" => SymbolToken::Known(ShiftSymbol::Early),
            "LATE" | "L" => SymbolToken::Known(ShiftSymbol::Late),
            "OFF" | "O" => SymbolToken::Known(ShiftSymbol::Off),
            _ => SymbolToken::Legacy(raw.to_owned()),
        }
    }

    /// Resolves to an engine symbol; legacy labels fall back to NORMAL.
    pub fn resolve(&self) -> ShiftSymbol {
        match self {
            SymbolToken::Known(symbol) => *symbol,
            SymbolToken::Legacy(_) => ShiftSymbol::Normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_working_rest_partition() {
        for symbol in ShiftSymbol::ALL {
            assert_ne!(symbol.is_working(), symbol.is_rest());
        }
        assert!(ShiftSymbol::Late.is_working());
        assert!(ShiftSymbol::Early.is_rest());
    }

    #[test]
    fn test_default_is_normal() {
        assert_eq!(ShiftSymbol::default(), ShiftSymbol::Normal);
    }

    #[test]
    fn test_glyphs_are_distinct() {
        let glyphs: std::collections::BTreeSet<char> =
            ShiftSymbol::ALL.iter().map(|s| s.glyph()).collect();
        assert_eq!(glyphs.len(), ShiftSymbol::ALL.len());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(ShiftSymbol::Normal.to_string(), "NORMAL");
        assert_eq!(ShiftSymbol::Off.to_string(), "OFF");
    }

    #[test]
    fn test_serde_uppercase() {
        let json = serde_json::to_string(&ShiftSymbol::Early).unwrap();
        assert_eq!(json, "\"EARLY\"");
        let back: ShiftSymbol = serde_json::from_str("\"LATE\"").unwrap();
        assert_eq!(back, ShiftSymbol::Late);
    }

    #[test]
    fn test_token_parse_and_resolve() {
        assert_eq!(SymbolToken::parse("off"), SymbolToken::Known(ShiftSymbol::Off));
        assert_eq!(SymbolToken::parse("E"), SymbolToken::Known(ShiftSymbol::Early));
        let legacy = SymbolToken::parse("NIGHT");
        assert_eq!(legacy, SymbolToken::Legacy("NIGHT".into()));
        assert_eq!(legacy.resolve(), ShiftSymbol::Normal);
    }
}
