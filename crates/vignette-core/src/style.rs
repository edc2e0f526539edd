//! Key/value style descriptors with a canonical string encoding.
//!
//! A [`Style`] is an insertion-ordered map that encodes as
//! `key=value;key=value`. Keys without a value (`ellipse;rounded=1`) are kept
//! as bare tokens. Two styles built by the same sequence of calls always
//! encode to byte-identical strings, while equality compares the decoded maps.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

// Well-known style keys.
pub const SHAPE: &str = "shape";
pub const FILL_COLOR: &str = "fillColor";
pub const STROKE_COLOR: &str = "strokeColor";
pub const STROKE_WIDTH: &str = "strokeWidth";
pub const GRADIENT_COLOR: &str = "gradientColor";
pub const GRADIENT_DIRECTION: &str = "gradientDirection";
pub const FONT_COLOR: &str = "fontColor";
pub const FONT_SIZE: &str = "fontSize";
pub const FONT_STYLE: &str = "fontStyle";
pub const ALIGN: &str = "align";
pub const VERTICAL_ALIGN: &str = "verticalAlign";
pub const ROTATION: &str = "rotation";
pub const ROUNDED: &str = "rounded";
pub const DASHED: &str = "dashed";
pub const WHITE_SPACE: &str = "whiteSpace";
pub const HTML: &str = "html";
pub const IMAGE: &str = "image";
pub const SELECTABLE: &str = "selectable";
pub const EDGE_STYLE: &str = "edgeStyle";
pub const CURVED: &str = "curved";
pub const START_ARROW: &str = "startArrow";
pub const END_ARROW: &str = "endArrow";
pub const START_FILL: &str = "startFill";
pub const END_FILL: &str = "endFill";
pub const EXIT_X: &str = "exitX";
pub const EXIT_Y: &str = "exitY";
pub const ENTRY_X: &str = "entryX";
pub const ENTRY_Y: &str = "entryY";
pub const PERIMETER: &str = "perimeter";

/// Encoded form of the empty key, which would otherwise vanish as an empty segment.
const EMPTY_KEY: &str = "%00";

/// An ordered key/value style descriptor.
///
/// Unknown keys are carried opaquely, so renderer-specific keys survive
/// composition and serialization untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Style {
    entries: IndexMap<String, String>,
}

impl Style {
    /// Create an empty style.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key, keeping its original position if it already exists.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Builder form of [`Style::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value.to_string());
        self
    }

    /// Add a bare token such as `ellipse`.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.set(token, String::new());
        self
    }

    /// Get the value of a key. Bare tokens yield an empty string.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Get a numeric value; unparsable values are treated as absent.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Check whether a flag key is set to `1`.
    pub fn is_enabled(&self, key: &str) -> bool {
        self.get(key) == Some("1")
    }

    /// Check if a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.shift_remove(key)
    }

    /// Builder form of [`Style::remove`].
    pub fn without(mut self, key: &str) -> Self {
        self.remove(key);
        self
    }

    /// Return a new style with `other` layered on top of `self`.
    ///
    /// Keys already present keep their position and take the overriding value;
    /// new keys are appended in `other`'s order.
    pub fn merge(&self, other: &Style) -> Style {
        let mut merged = self.clone();
        for (key, value) in &other.entries {
            merged.entries.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Entries of `other` that are missing from or different in `self`.
    pub fn diff(&self, other: &Style) -> Style {
        let entries = other
            .entries
            .iter()
            .filter(|(key, value)| self.entries.get(*key) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Style { entries }
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode as `key=value;key=value`.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                out.push(';');
            }
            if key.is_empty() {
                out.push_str(EMPTY_KEY);
            } else {
                escape_into(&mut out, key, true);
            }
            if !value.is_empty() {
                out.push('=');
                escape_into(&mut out, value, false);
            }
        }
        out
    }

    /// Decode a style string. Never fails: empty segments are skipped and a
    /// segment without `=` becomes a bare token.
    pub fn deserialize(encoded: &str) -> Style {
        let mut style = Style::new();
        for segment in encoded.split(';') {
            if segment.is_empty() {
                continue;
            }
            match segment.split_once('=') {
                Some((key, value)) => style.set(unescape_key(key), unescape(value)),
                None => style.set(unescape_key(segment), String::new()),
            }
        }
        style
    }
}

fn escape_into(out: &mut String, raw: &str, is_key: bool) {
    for ch in raw.chars() {
        match ch {
            '%' => out.push_str("%25"),
            ';' => out.push_str("%3B"),
            '=' if is_key => out.push_str("%3D"),
            _ => out.push(ch),
        }
    }
}

fn unescape_key(raw: &str) -> String {
    if raw == EMPTY_KEY {
        String::new()
    } else {
        unescape(raw)
    }
}

fn unescape(raw: &str) -> String {
    if !raw.contains('%') {
        return raw.to_string();
    }
    raw.replace("%3B", ";").replace("%3D", "=").replace("%25", "%")
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl FromStr for Style {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Style::deserialize(s))
    }
}

impl From<String> for Style {
    fn from(encoded: String) -> Self {
        Style::deserialize(&encoded)
    }
}

impl From<Style> for String {
    fn from(style: Style) -> Self {
        style.serialize()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Style {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut style = Style::new();
        for (key, value) in iter {
            style.set(key, value);
        }
        style
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_insertion_order() {
        let style = Style::new()
            .with(FILL_COLOR, "#ffffff")
            .with(STROKE_COLOR, "#000000")
            .with(STROKE_WIDTH, 2);
        assert_eq!(
            style.serialize(),
            "fillColor=#ffffff;strokeColor=#000000;strokeWidth=2"
        );
    }

    #[test]
    fn test_set_existing_key_keeps_position() {
        let mut style = Style::new().with("a", 1).with("b", 2);
        style.set("a", "3");
        assert_eq!(style.serialize(), "a=3;b=2");
    }

    #[test]
    fn test_remove_preserves_order() {
        let style = Style::new().with("a", 1).with("b", 2).with("c", 3).without("b");
        assert_eq!(style.serialize(), "a=1;c=3");
        assert_eq!(style.get("b"), None);
    }

    #[test]
    fn test_merge_returns_new_instance() {
        let base = Style::new().with("a", 1).with("b", 2);
        let overlay = Style::new().with("b", 5).with("c", 6);
        let merged = base.merge(&overlay);

        assert_eq!(merged.serialize(), "a=1;b=5;c=6");
        // The base is untouched.
        assert_eq!(base.serialize(), "a=1;b=2");
    }

    #[test]
    fn test_deserialize_bare_tokens_and_empty_segments() {
        let style = Style::deserialize("ellipse;;whiteSpace=wrap;");
        assert_eq!(style.len(), 2);
        assert_eq!(style.get("ellipse"), Some(""));
        assert_eq!(style.get(WHITE_SPACE), Some("wrap"));
        assert_eq!(style.serialize(), "ellipse;whiteSpace=wrap");
    }

    #[test]
    fn test_value_with_equals_sign() {
        let style = Style::deserialize("image=data:a=b");
        assert_eq!(style.get(IMAGE), Some("data:a=b"));
    }

    #[test]
    fn test_round_trip_with_reserved_characters() {
        let style = Style::new()
            .with("k;e=y", "v;a=l%ue")
            .with("plain", "x")
            .with_token("token");
        let decoded = Style::deserialize(&style.serialize());
        assert_eq!(decoded, style);
        assert_eq!(decoded.serialize(), style.serialize());
    }

    #[test]
    fn test_empty_key_round_trip() {
        let style = Style::new().with("", "").with("a", 1);
        assert_eq!(style.serialize(), "%00;a=1");
        assert_eq!(Style::deserialize(&style.serialize()), style);

        let valued = Style::new().with("", "v");
        assert_eq!(valued.serialize(), "%00=v");
        assert_eq!(Style::deserialize(&valued.serialize()), valued);

        // A literal `%00` key stays distinct from the empty key.
        let literal = Style::new().with("%00", "x");
        assert_eq!(Style::deserialize(&literal.serialize()).get("%00"), Some("x"));
    }

    #[test]
    fn test_equality_ignores_order() {
        let a = Style::new().with("x", 1).with("y", 2);
        let b = Style::new().with("y", 2).with("x", 1);
        assert_eq!(a, b);
        assert_ne!(a.serialize(), b.serialize());
    }

    #[test]
    fn test_diff() {
        let a = Style::new().with("x", 1).with("y", 2);
        let b = Style::new().with("x", 1).with("y", 3).with("z", 4);
        assert_eq!(a.diff(&b).serialize(), "y=3;z=4");
        assert!(a.diff(&a).is_empty());
    }

    #[test]
    fn test_typed_accessors() {
        let style = Style::deserialize("rounded=1;strokeWidth=2.5;fontSize=big");
        assert!(style.is_enabled(ROUNDED));
        assert_eq!(style.get_f64(STROKE_WIDTH), Some(2.5));
        assert_eq!(style.get_f64(FONT_SIZE), None);
        assert!(!style.is_enabled(DASHED));
    }

    #[test]
    fn test_serde_as_string() {
        let style = Style::new().with(SHAPE, "ellipse").with(FILL_COLOR, "#ff0000");
        let json = serde_json::to_string(&style).unwrap();
        assert_eq!(json, "\"shape=ellipse;fillColor=#ff0000\"");
        let back: Style = serde_json::from_str(&json).unwrap();
        assert_eq!(back, style);
    }
}
