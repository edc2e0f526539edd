//! Color parsing and opacity-aware conversion for style composition.

use peniko::Color;
use serde::{Deserialize, Serialize};

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Check if the color is fully transparent.
    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Parse a color string.
    ///
    /// Accepts `#rgb`, `#rrggbb`, `#rrggbbaa` and the names `black`, `white`,
    /// `none` and `transparent`. Returns `None` for anything else.
    pub fn parse(color: &str) -> Option<Self> {
        let color = color.trim();
        match color.to_ascii_lowercase().as_str() {
            "none" | "transparent" => return Some(Self::transparent()),
            "black" => return Some(Self::black()),
            "white" => return Some(Self::white()),
            _ => {}
        }

        let hex = color.strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        match hex.len() {
            3 => {
                // #rgb -> #rrggbb
                let r = channel(0..1)? * 17;
                let g = channel(1..2)? * 17;
                let b = channel(2..3)? * 17;
                Some(Self::new(r, g, b, 255))
            }
            6 => Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?, 255)),
            8 => Some(Self::new(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => None,
        }
    }

    /// Format as a style value: `none` for transparent colors, `#rrggbb` for
    /// opaque ones and `#rrggbbaa` otherwise.
    pub fn to_hex(&self) -> String {
        if self.is_transparent() {
            "none".to_string()
        } else if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Re-express this color with the given opacity as an opaque color
    /// blended over a white canvas.
    ///
    /// Transparent colors are returned unchanged. Opacity is clamped to `[0, 1]`.
    pub fn blend_over_white(self, opacity: f64) -> Self {
        if self.is_transparent() {
            return self;
        }
        let alpha = (self.a as f64 / 255.0) * opacity.clamp(0.0, 1.0);
        let blend = |c: u8| -> u8 { (c as f64 * alpha + 255.0 * (1.0 - alpha)).round() as u8 };
        Self::new(blend(self.r), blend(self.g), blend(self.b), 255)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Resolve a color attribute into a style value, applying opacity when both
/// are present. Malformed colors are treated as absent.
pub fn style_color(color: Option<&str>, opacity: Option<f64>) -> Option<String> {
    let parsed = SerializableColor::parse(color?)?;
    let resolved = match opacity {
        Some(opacity) => parsed.blend_over_white(opacity),
        None => parsed,
    };
    Some(resolved.to_hex())
}
