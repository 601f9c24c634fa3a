//! Run-scoped theme palette.
//!
//! Built once from caller-supplied colors at the start of a run and treated
//! as read-only afterward. Every consumer (styling, links, shape fills)
//! resolves colors through the theme rather than hard-coding hex values.

use serde::{Deserialize, Serialize};

use crate::errors::{FillError, Result};

/// An opaque RGB color with channels in `0.0..=1.0`, matching the remote
/// API's `rgbColor` encoding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl Rgb {
    pub const fn new(red: f32, green: f32, blue: f32) -> Self {
        Rgb { red, green, blue }
    }

    /// Parses `#rrggbb` or `rrggbb`.
    pub fn from_hex(hex: &str) -> Result<Rgb> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(FillError::InvalidInput(format!(
                "invalid hex color: {hex:?}"
            )));
        }
        let channel = |range: std::ops::Range<usize>| -> f32 {
            u8::from_str_radix(&digits[range], 16).unwrap_or(0) as f32 / 255.0
        };
        Ok(Rgb {
            red: channel(0..2),
            green: channel(2..4),
            blue: channel(4..6),
        })
    }

    pub fn to_hex(self) -> String {
        let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            byte(self.red),
            byte(self.green),
            byte(self.blue)
        )
    }
}

/// Default palette, used for any color the caller does not supply.
pub const DEFAULT_PRIMARY: &str = "#2563eb";
pub const DEFAULT_SECONDARY: &str = "#1e40af";
pub const DEFAULT_ACCENT: &str = "#3b82f6";
pub const DEFAULT_TEXT: &str = "#1f2937";
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// Font sizes in points for the main text roles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSizes {
    pub title: f64,
    pub body: f64,
}

impl Default for FontSizes {
    fn default() -> Self {
        FontSizes {
            title: 24.0,
            body: 12.0,
        }
    }
}

/// The resolved palette for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub primary: Rgb,
    pub secondary: Rgb,
    pub accent: Rgb,
    pub text: Rgb,
    pub background: Rgb,
    pub font_family: String,
    pub font_sizes: FontSizes,
}

impl Default for Theme {
    fn default() -> Self {
        // The default constants are valid hex, so parsing cannot fail.
        Theme {
            primary: Rgb::from_hex(DEFAULT_PRIMARY).unwrap_or(Rgb::new(0.0, 0.0, 0.0)),
            secondary: Rgb::from_hex(DEFAULT_SECONDARY).unwrap_or(Rgb::new(0.0, 0.0, 0.0)),
            accent: Rgb::from_hex(DEFAULT_ACCENT).unwrap_or(Rgb::new(0.0, 0.0, 0.0)),
            text: Rgb::from_hex(DEFAULT_TEXT).unwrap_or(Rgb::new(0.0, 0.0, 0.0)),
            background: Rgb::from_hex(DEFAULT_BACKGROUND).unwrap_or(Rgb::new(1.0, 1.0, 1.0)),
            font_family: "Inter".to_string(),
            font_sizes: FontSizes::default(),
        }
    }
}

impl Theme {
    /// Builds a theme from optional caller colors, falling back to the
    /// defaults per slot. A malformed caller color is an input error.
    pub fn from_colors(
        primary: Option<&str>,
        secondary: Option<&str>,
        accent: Option<&str>,
    ) -> Result<Theme> {
        let base = Theme::default();
        Ok(Theme {
            primary: primary.map(Rgb::from_hex).transpose()?.unwrap_or(base.primary),
            secondary: secondary
                .map(Rgb::from_hex)
                .transpose()?
                .unwrap_or(base.secondary),
            accent: accent.map(Rgb::from_hex).transpose()?.unwrap_or(base.accent),
            ..base
        })
    }

    /// Looks a color up by its theme key; unknown keys resolve to None.
    pub fn by_key(&self, key: &str) -> Option<Rgb> {
        match key {
            "primary" => Some(self.primary),
            "secondary" => Some(self.secondary),
            "accent" => Some(self.accent),
            "text" => Some(self.text),
            "background" => Some(self.background),
            _ => None,
        }
    }
}
