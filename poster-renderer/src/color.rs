//! Colour values and HSB conversion.
//!
//! Editors describe colours in HSB with hue in degrees and saturation and
//! brightness in `0..=100`. [`Rgba`] is the 8-bit colour every surface draws.

use std::fmt;

/// An 8-bit RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha, 255 is opaque.
    pub a: u8,
}

impl Rgba {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Opaque colour from channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Colour from channels and alpha.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Colour from hue (degrees), saturation and brightness (`0..=100`), and
    /// alpha in `0..=1`.
    #[must_use]
    pub fn hsb(hue: f64, saturation: f64, brightness: f64, alpha: f64) -> Self {
        let h = hue.rem_euclid(360.0) / 60.0;
        let s = (saturation / 100.0).clamp(0.0, 1.0);
        let v = (brightness / 100.0).clamp(0.0, 1.0);
        let c = v * s;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let m = v - c;
        let (r, g, b) = match h {
            h if h < 1.0 => (c, x, 0.0),
            h if h < 2.0 => (x, c, 0.0),
            h if h < 3.0 => (0.0, c, x),
            h if h < 4.0 => (0.0, x, c),
            h if h < 5.0 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        Self {
            r: unit_to_byte(r + m),
            g: unit_to_byte(g + m),
            b: unit_to_byte(b + m),
            a: unit_to_byte(alpha),
        }
    }

    /// Opaque HSB colour.
    #[must_use]
    pub fn hsb_opaque(hue: f64, saturation: f64, brightness: f64) -> Self {
        Self::hsb(hue, saturation, brightness, 1.0)
    }

    /// Parse `#rgb` or `#rrggbb`. Returns `None` for anything else.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().strip_prefix('#')?;
        let nibble = |i: usize| u8::from_str_radix(digits.get(i..=i)?, 16).ok();
        match digits.len() {
            3 => Some(Self::rgb(nibble(0)? * 17, nibble(1)? * 17, nibble(2)? * 17)),
            6 => {
                let byte = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
                Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?))
            }
            _ => None,
        }
    }

    /// Copy with a different alpha (`0..=1`).
    #[must_use]
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self {
            a: unit_to_byte(alpha),
            ..self
        }
    }

    /// HSB brightness (`0..=100`): the largest channel.
    #[must_use]
    pub fn brightness(self) -> f64 {
        f64::from(self.r.max(self.g).max(self.b)) / 255.0 * 100.0
    }

    /// Perceived luminance in `0..=1`.
    #[must_use]
    pub fn luminance(self) -> f64 {
        (0.299 * f64::from(self.r) + 0.587 * f64::from(self.g) + 0.114 * f64::from(self.b))
            / 255.0
    }

    /// Black or white, whichever reads better on top of `self`.
    #[must_use]
    pub fn contrasting(self) -> Self {
        if self.luminance() > 0.5 {
            Self::BLACK
        } else {
            Self::WHITE
        }
    }

    /// Alpha as a float in `0..=1`.
    #[must_use]
    pub fn alpha_f(self) -> f64 {
        f64::from(self.a) / 255.0
    }

    /// Hex form `#rrggbb` (alpha dropped).
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Background used by editors with a hue slider: 0 is black, 360 is white,
/// anything else is a muted colour.
#[must_use]
pub fn hue_background(hue: f64, saturation: f64, brightness: f64) -> Rgba {
    if hue <= 0.0 {
        Rgba::BLACK
    } else if hue >= 360.0 {
        Rgba::WHITE
    } else {
        Rgba::hsb_opaque(hue, saturation, brightness)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn unit_to_byte(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_hues() {
        assert_eq!(Rgba::hsb_opaque(0.0, 100.0, 100.0), Rgba::rgb(255, 0, 0));
        assert_eq!(Rgba::hsb_opaque(120.0, 100.0, 100.0), Rgba::rgb(0, 255, 0));
        assert_eq!(Rgba::hsb_opaque(240.0, 100.0, 100.0), Rgba::rgb(0, 0, 255));
        assert_eq!(Rgba::hsb_opaque(360.0, 100.0, 100.0), Rgba::rgb(255, 0, 0));
    }

    #[test]
    fn greys_ignore_hue() {
        assert_eq!(Rgba::hsb_opaque(200.0, 0.0, 100.0), Rgba::WHITE);
        assert_eq!(Rgba::hsb_opaque(200.0, 80.0, 0.0), Rgba::BLACK);
    }

    #[test]
    fn alpha_maps_to_byte() {
        assert_eq!(Rgba::hsb(0.0, 0.0, 0.0, 0.5).a, 128);
        assert_eq!(Rgba::WHITE.with_alpha(0.0).a, 0);
    }

    #[test]
    fn hex_parsing() {
        assert_eq!(Rgba::from_hex("#f5f0e8"), Some(Rgba::rgb(0xf5, 0xf0, 0xe8)));
        assert_eq!(Rgba::from_hex("#fff"), Some(Rgba::WHITE));
        assert_eq!(Rgba::from_hex("f5f0e8"), None);
        assert_eq!(Rgba::from_hex("#zzzzzz"), None);
        assert_eq!(Rgba::rgb(1, 2, 255).to_hex(), "#0102ff");
    }

    #[test]
    fn brightness_is_max_channel() {
        assert!((Rgba::rgb(255, 0, 0).brightness() - 100.0).abs() < 1e-9);
        assert!((Rgba::rgb(0, 51, 0).brightness() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn contrasting_text() {
        assert_eq!(Rgba::BLACK.contrasting(), Rgba::WHITE);
        assert_eq!(Rgba::WHITE.contrasting(), Rgba::BLACK);
    }

    #[test]
    fn hue_background_extremes() {
        assert_eq!(hue_background(0.0, 60.0, 30.0), Rgba::BLACK);
        assert_eq!(hue_background(360.0, 60.0, 30.0), Rgba::WHITE);
        assert_ne!(hue_background(200.0, 60.0, 30.0), Rgba::BLACK);
    }
}
