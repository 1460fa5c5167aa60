//! Color type conversions and utilities
//!
//! Provides type-safe color handling with conversions between:
//! - Hex strings (#AARRGGBB format)
//! - ARGB32 values (u32)
//! - HSL components (for deriving the dimmed ring groove color)
//! - egui::Color32 (for the preferences pickers)

/// Hex color in ARGB32 format (#AARRGGBB)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor(u32);

impl HexColor {
    /// Parse hex color string supporting multiple formats:
    /// - 6 digits: RRGGBB (full opacity assumed, becomes FFRRGGBB)
    /// - 8 digits: AARRGGBB (explicit alpha)
    /// - Optional '#' prefix supported but not required
    pub fn parse(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.is_empty() || hex.len() > 8 {
            return None;
        }
        let value = u32::from_str_radix(hex, 16).ok()?;

        let argb = if hex.len() <= 6 {
            0xFF_00_00_00 | value // Prepend FF for full opacity
        } else {
            value // Already has alpha channel
        };

        Some(Self(argb))
    }

    /// Create from ARGB32 value
    pub fn from_argb32(argb: u32) -> Self {
        Self(argb)
    }

    /// Get raw ARGB32 value
    pub fn argb32(self) -> u32 {
        self.0
    }

    /// Split into (alpha, red, green, blue) channels
    pub fn channels(self) -> (u8, u8, u8, u8) {
        (
            (self.0 >> 24) as u8,
            (self.0 >> 16) as u8,
            (self.0 >> 8) as u8,
            self.0 as u8,
        )
    }

    /// Convert to HSL components with Qt-style quantization
    pub fn to_hsla(self) -> Hsla {
        let (a, r, g, b) = self.channels();
        let rf = r as f32 / 255.0;
        let gf = g as f32 / 255.0;
        let bf = b as f32 / 255.0;

        let max = rf.max(gf).max(bf);
        let min = rf.min(gf).min(bf);
        let delta = max - min;
        let lightness = (max + min) / 2.0;

        let (hue, saturation) = if delta <= f32::EPSILON {
            // Achromatic: hue is meaningless, stored as 0
            (0.0, 0.0)
        } else {
            let s = delta / (1.0 - (2.0 * lightness - 1.0).abs());
            let h = if max == rf {
                60.0 * (((gf - bf) / delta) % 6.0)
            } else if max == gf {
                60.0 * ((bf - rf) / delta + 2.0)
            } else {
                60.0 * ((rf - gf) / delta + 4.0)
            };
            (h.rem_euclid(360.0), s)
        };

        Hsla {
            hue: (hue.round() as u16).min(359),
            saturation: (saturation * 255.0).round() as u8,
            lightness: (lightness * 255.0).round() as u8,
            alpha: a,
        }
    }

    /// Derive the ring groove color: hue and lightness unchanged,
    /// saturation and alpha halved (integer division)
    pub fn groove(self) -> HexColor {
        self.to_hsla().dimmed().to_color()
    }
}

/// HSL color with alpha, using Qt-style integer ranges:
/// hue 0-359, saturation/lightness/alpha 0-255
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsla {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
    pub alpha: u8,
}

impl Hsla {
    /// Half-saturation, half-alpha variant used for the dial groove
    pub fn dimmed(self) -> Hsla {
        Hsla {
            hue: self.hue,
            saturation: self.saturation / 2,
            lightness: self.lightness,
            alpha: self.alpha / 2,
        }
    }

    /// Convert back to an ARGB color
    pub fn to_color(self) -> HexColor {
        let h = self.hue as f32;
        let s = self.saturation as f32 / 255.0;
        let l = self.lightness as f32 / 255.0;

        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = l - c / 2.0;

        let (rf, gf, bf) = match h as u16 {
            0..=59 => (c, x, 0.0),
            60..=119 => (x, c, 0.0),
            120..=179 => (0.0, c, x),
            180..=239 => (0.0, x, c),
            240..=299 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        let quant = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u32;
        let argb = ((self.alpha as u32) << 24) | (quant(rf) << 16) | (quant(gf) << 8) | quant(bf);
        HexColor(argb)
    }
}

/// Parse hex color string into egui::Color32 for the preferences pickers
pub fn parse_hex_color(hex: &str) -> Option<egui::Color32> {
    let color = HexColor::parse(hex)?;
    let (a, r, g, b) = color.channels();
    Some(egui::Color32::from_rgba_unmultiplied(r, g, b, a))
}

/// Convert egui::Color32 back to a #AARRGGBB string
pub fn format_hex_color(color: egui::Color32) -> String {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    format!("#{:02X}{:02X}{:02X}{:02X}", a, r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_color_parsing() {
        // 8-digit format (AARRGGBB)
        assert_eq!(HexColor::parse("#7FFF0000"), Some(HexColor(0x7FFF0000)));
        assert_eq!(HexColor::parse("7FFF0000"), Some(HexColor(0x7FFF0000)));
        assert_eq!(HexColor::parse("FFFFFFFF"), Some(HexColor(0xFFFFFFFF)));
        assert_eq!(HexColor::parse("#77dbdbdb"), Some(HexColor(0x77DBDBDB)));

        // 6-digit format (RRGGBB) - should prepend FF for full opacity
        assert_eq!(HexColor::parse("#FF0000"), Some(HexColor(0xFFFF0000)));
        assert_eq!(HexColor::parse("5bfc37"), Some(HexColor(0xFF5BFC37)));

        // Invalid
        assert_eq!(HexColor::parse("invalid"), None);
        assert_eq!(HexColor::parse(""), None);
        assert_eq!(HexColor::parse("#123456789"), None);
    }

    #[test]
    fn test_channels() {
        let (a, r, g, b) = HexColor(0xAA_DB_40_20).channels();
        assert_eq!(a, 0xAA);
        assert_eq!(r, 0xDB);
        assert_eq!(g, 0x40);
        assert_eq!(b, 0x20);
    }

    #[test]
    fn test_to_hsla_achromatic() {
        let hsla = HexColor(0x77DBDBDB).to_hsla();
        assert_eq!(hsla.hue, 0);
        assert_eq!(hsla.saturation, 0);
        assert_eq!(hsla.lightness, 0xDB);
        assert_eq!(hsla.alpha, 0x77);
    }

    #[test]
    fn test_to_hsla_primaries() {
        let red = HexColor(0xFFFF0000).to_hsla();
        assert_eq!(red.hue, 0);
        assert_eq!(red.saturation, 255);
        assert_eq!(red.alpha, 255);

        let green = HexColor(0xFF00FF00).to_hsla();
        assert_eq!(green.hue, 120);
        assert_eq!(green.saturation, 255);

        let blue = HexColor(0xFF0000FF).to_hsla();
        assert_eq!(blue.hue, 240);
        assert_eq!(blue.saturation, 255);
    }

    #[test]
    fn test_dimmed_halves_saturation_and_alpha() {
        let hsla = Hsla {
            hue: 210,
            saturation: 201,
            lightness: 130,
            alpha: 0xAB,
        };
        let dim = hsla.dimmed();
        assert_eq!(dim.hue, 210);
        assert_eq!(dim.lightness, 130);
        // Integer division on both channels
        assert_eq!(dim.saturation, 100);
        assert_eq!(dim.alpha, 0x55);
    }

    #[test]
    fn test_groove_of_gray_is_exact() {
        // Saturation of a gray is zero both before and after halving,
        // so the RGB round trip is exact apart from the halved alpha.
        let groove = HexColor(0x77DBDBDB).groove();
        assert_eq!(groove.argb32(), 0x3BDBDBDB);

        let groove = HexColor(0xFFFFFFFF).groove();
        assert_eq!(groove.argb32(), 0x7FFFFFFF);
    }

    #[test]
    fn test_groove_preserves_hue_and_lightness() {
        let color = HexColor(0xFF3A76C4);
        let before = color.to_hsla();
        let after = color.groove().to_hsla();

        // Hue and lightness survive the round trip within quantization error
        assert!((before.hue as i32 - after.hue as i32).abs() <= 1);
        assert!((before.lightness as i32 - after.lightness as i32).abs() <= 1);
        assert_eq!(after.alpha, before.alpha / 2);
    }

    #[test]
    fn test_egui_round_trip() {
        let color = parse_hex_color("#AADBDBDB").unwrap();
        assert_eq!(format_hex_color(color), "#AADBDBDB");
        assert!(parse_hex_color("nonsense").is_none());
    }
}
