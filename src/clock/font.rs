//! Font resolution and text rasterization
//!
//! Resolves the configured font family to a TrueType file via fontconfig and
//! rasterizes text lines with fontdue straight onto the face canvas. A clock
//! without any usable font still renders its arcs; text is simply skipped.

use anyhow::{Context, Result};
use fontconfig::{Fontconfig, Pattern};
use std::collections::BTreeSet;
use std::ffi::CString;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::color::HexColor;
use crate::constants::defaults;

use super::face::Canvas;

/// Find the best matching font file path for a family name
pub fn find_font_path(family: &str) -> Result<PathBuf> {
    let fc = Fontconfig::new().context("Failed to initialize fontconfig")?;

    let mut pattern = Pattern::new(&fc);
    let family_cstr =
        CString::new(family).with_context(|| format!("Invalid family name: {}", family))?;
    pattern.add_string(fontconfig::FC_FAMILY, &family_cstr);

    let matched = pattern.font_match();

    let file_path = matched
        .filename()
        .with_context(|| format!("No font file found for '{}'", family))?;
    let path = PathBuf::from(file_path);

    if !path.exists() {
        return Err(anyhow::anyhow!(
            "Font file path '{}' does not exist",
            path.display()
        ));
    }

    debug!(family = family, path = %path.display(), "Resolved font via fontconfig");
    Ok(path)
}

/// List available font family names for the preferences font picker
pub fn list_families() -> Result<Vec<String>> {
    let fc = Fontconfig::new().context("Failed to initialize fontconfig")?;
    let pattern = Pattern::new(&fc);
    let font_set = fontconfig::list_fonts(&pattern, None);

    let mut families = BTreeSet::new();
    for font_pattern in font_set.iter() {
        if let Some(family) = font_pattern.get_string(fontconfig::FC_FAMILY) {
            families.insert(family.to_string());
        }
    }

    info!(count = families.len(), "Discovered font families via fontconfig");
    Ok(families.into_iter().collect())
}

/// A loaded TrueType font ready for measurement and rasterization
pub struct LoadedFont {
    font: fontdue::Font,
}

impl LoadedFont {
    /// Load a TrueType font from a file path
    pub fn from_path(path: PathBuf) -> Result<Self> {
        let font_data = fs::read(&path)
            .with_context(|| format!("Failed to read font file: {}", path.display()))?;

        let font = fontdue::Font::from_bytes(font_data, fontdue::FontSettings::default())
            .map_err(|e| {
                anyhow::anyhow!("Failed to parse font file '{}': {}", path.display(), e)
            })?;

        info!(path = %path.display(), "Loaded font");
        Ok(Self { font })
    }

    /// Resolve the configured family, falling back through the candidate
    /// list; `None` means no usable TrueType font exists on this system
    pub fn resolve(configured_family: &str) -> Option<Self> {
        let mut candidates: Vec<&str> = Vec::new();
        if !configured_family.is_empty() {
            candidates.push(configured_family);
        }
        candidates.extend_from_slice(defaults::FONT_CANDIDATES);

        for family in candidates {
            match find_font_path(family).and_then(Self::from_path) {
                Ok(font) => return Some(font),
                Err(e) => {
                    debug!(family = family, error = %e, "Font candidate rejected");
                }
            }
        }

        warn!(
            configured = configured_family,
            "No usable TrueType font found, rendering arcs without text"
        );
        None
    }

    /// Width of `text` rendered at `size` pixels
    pub fn measure(&self, text: &str, size: f32) -> f32 {
        text.chars()
            .map(|ch| self.font.metrics(ch, size).advance_width)
            .sum()
    }

    /// Ascent and descent (descent is negative) of a line at `size` pixels
    pub fn line_metrics(&self, size: f32) -> (f32, f32) {
        match self.font.horizontal_line_metrics(size) {
            Some(metrics) => (metrics.ascent, metrics.descent),
            // Degenerate fonts: approximate from the size
            None => (size * 0.8, size * -0.2),
        }
    }

    /// Rasterize one line of text onto the canvas, with its left edge at `x`
    /// and its baseline at `baseline_y`
    pub fn draw(
        &self,
        canvas: &mut Canvas,
        text: &str,
        size: f32,
        color: HexColor,
        x: f32,
        baseline_y: f32,
    ) {
        let mut pen_x = x;

        for ch in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(ch, size);
            let glyph_x = pen_x as i32 + metrics.xmin;
            let glyph_y = baseline_y as i32 - metrics.height as i32 - metrics.ymin;

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let coverage = bitmap[gy * metrics.width + gx];
                    if coverage > 0 {
                        canvas.blend(
                            glyph_x + gx as i32,
                            glyph_y + gy as i32,
                            color,
                            coverage as f32 / 255.0,
                        );
                    }
                }
            }

            pen_x += metrics.advance_width;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Font discovery depends on the host fontconfig installation, so these
    // tests only assert invariants that hold whenever a font is present.

    #[test]
    fn test_resolve_measures_monotonically() {
        let Some(font) = LoadedFont::resolve("") else {
            return;
        };

        let narrow = font.measure("1:00", 20.0);
        let wide = font.measure("10:00 pm", 20.0);
        assert!(wide > narrow);

        let small = font.measure("12:34", 10.0);
        let large = font.measure("12:34", 30.0);
        assert!(large > small);
    }

    #[test]
    fn test_line_metrics_ordering() {
        let Some(font) = LoadedFont::resolve("") else {
            return;
        };
        let (ascent, descent) = font.line_metrics(24.0);
        assert!(ascent > 0.0);
        assert!(descent <= 0.0);
    }

    #[test]
    fn test_draw_paints_into_canvas() {
        let Some(font) = LoadedFont::resolve("") else {
            return;
        };
        let mut canvas = Canvas::new(64, 32);
        font.draw(
            &mut canvas,
            "8",
            20.0,
            HexColor::from_argb32(0xFFFFFFFF),
            10.0,
            24.0,
        );
        assert!(canvas.bytes().iter().any(|&b| b > 0));
    }
}
