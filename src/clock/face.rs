//! Clock face rasterization
//!
//! Software renderer producing a premultiplied BGRA buffer that is uploaded
//! to the X11 window in one piece. All drawing is anti-aliased; arcs are
//! annulus sectors swept clockwise from the 12 o'clock position.

use chrono::{DateTime, Datelike, Local, Timelike};
use tracing::trace;

use crate::color::HexColor;
use crate::constants::face;
use crate::settings::DisplayConfig;
use crate::timefmt;

use super::font::LoadedFont;

/// End-cap style for stroked arcs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cap {
    Round,
    Flat,
}

/// Arc caps are rounded normally, but flat when the groove rings are shown
/// so the arc head sits flush with the ring track
pub fn cap_for(show_rings: bool) -> Cap {
    if show_rings { Cap::Flat } else { Cap::Round }
}

/// Hour sweep angle in degrees: 0 at 12 o'clock, negative clockwise
pub fn hour_angle(hour: u32, minute: u32) -> f32 {
    -30.0 * (hour % 12) as f32 - minute as f32 / 2.0
}

/// Minute sweep angle in degrees: 0 at 12 o'clock, negative clockwise
pub fn minute_angle(minute: u32) -> f32 {
    -6.0 * minute as f32
}

/// Time text size in pixels: `side/5`, reduced for an AM/PM suffix, reduced
/// again when the measured string would not fit the inner dial diameter.
/// `measure` reports the string width at a given pixel size.
pub fn time_font_size(
    side: i32,
    inner_diameter: i32,
    has_meridiem_suffix: bool,
    measure: impl Fn(f32) -> f32,
) -> f32 {
    let mut size = side as f32 / face::TIME_FONT_DIVISOR;
    if has_meridiem_suffix {
        size -= face::MERIDIEM_FONT_ADJUST;
    }
    if measure(size) > (inner_diameter - face::OVERFLOW_SLACK) as f32 {
        size -= face::OVERFLOW_FONT_ADJUST;
    }
    size.max(1.0)
}

/// Premultiplied BGRA pixel buffer (little-endian ARGB32)
pub struct Canvas {
    pub width: u16,
    pub height: u16,
    data: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Raw premultiplied BGRA bytes for PutImage upload
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Source-over blend of `color` at fractional `coverage` onto one pixel
    pub fn blend(&mut self, x: i32, y: i32, color: HexColor, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let coverage = coverage.clamp(0.0, 1.0);
        if coverage <= 0.0 {
            return;
        }

        let (a, r, g, b) = color.channels();
        let sa = (a as f32 / 255.0) * coverage;
        let sr = (r as f32 / 255.0) * sa;
        let sg = (g as f32 / 255.0) * sa;
        let sb = (b as f32 / 255.0) * sa;

        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let inv = 1.0 - sa;
        let blend_channel = |dst: u8, src: f32| -> u8 {
            (src * 255.0 + dst as f32 * inv).round().min(255.0) as u8
        };

        // BGRA byte order (little-endian ARGB32)
        self.data[idx] = blend_channel(self.data[idx], sb);
        self.data[idx + 1] = blend_channel(self.data[idx + 1], sg);
        self.data[idx + 2] = blend_channel(self.data[idx + 2], sr);
        self.data[idx + 3] = blend_channel(self.data[idx + 3], sa);
    }

    /// Alpha of the pixel at (x, y), 0 when out of bounds
    pub fn alpha_at(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0;
        }
        self.data[(y as usize * self.width as usize + x as usize) * 4 + 3]
    }

    /// Opaque-ish rectangle fill (popup backgrounds)
    pub fn fill_rect(&mut self, x: i32, y: i32, w: u16, h: u16, color: HexColor) {
        for py in y..y + h as i32 {
            for px in x..x + w as i32 {
                self.blend(px, py, color, 1.0);
            }
        }
    }

    /// Stroke an arc of `sweep_deg` degrees, swept clockwise from the
    /// 12 o'clock position, centered on the circle of `radius` around
    /// (`cx`, `cy`), with the given stroke `thickness` and end caps.
    pub fn stroke_arc(
        &mut self,
        cx: f32,
        cy: f32,
        radius: f32,
        thickness: f32,
        sweep_deg: f32,
        color: HexColor,
        cap: Cap,
    ) {
        if sweep_deg <= 0.0 || radius <= 0.0 {
            return;
        }
        let sweep = sweep_deg.min(360.0);
        let full_circle = sweep >= 360.0;
        let half = thickness / 2.0;

        // Cap disc centers at the sector start and end
        let endpoint = |deg: f32| {
            let rad = deg.to_radians();
            (cx + radius * rad.sin(), cy - radius * rad.cos())
        };
        let (sx, sy) = endpoint(0.0);
        let (ex, ey) = endpoint(sweep);

        let reach = (radius + half + 1.0).ceil() as i32;
        let x0 = (cx.floor() as i32 - reach).max(0);
        let x1 = ((cx.ceil() as i32) + reach).min(self.width as i32 - 1);
        let y0 = (cy.floor() as i32 - reach).max(0);
        let y1 = ((cy.ceil() as i32) + reach).min(self.height as i32 - 1);

        for py in y0..=y1 {
            for px in x0..=x1 {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                let dist = (dx * dx + dy * dy).sqrt();

                // Radial band coverage
                let band = half + 0.5 - (dist - radius).abs();
                if band <= 0.0 {
                    continue;
                }
                let cov_radial = band.min(1.0);

                let cov_angular = if full_circle {
                    1.0
                } else {
                    // Angle clockwise from 12 o'clock, in [0, 360)
                    let theta = dx.atan2(-dy).to_degrees().rem_euclid(360.0);
                    // Signed angular distance to the sector boundary,
                    // positive outside, scaled to pixels at this radius
                    let deg = if theta <= sweep {
                        -theta.min(sweep - theta)
                    } else {
                        (theta - sweep).min(360.0 - theta)
                    };
                    let linear = deg.to_radians() * dist.max(1.0);
                    (0.5 - linear).clamp(0.0, 1.0)
                };

                let mut cov = cov_radial * cov_angular;

                if cap == Cap::Round && !full_circle {
                    let disc = |px_c: f32, py_c: f32| {
                        let ddx = px as f32 + 0.5 - px_c;
                        let ddy = py as f32 + 0.5 - py_c;
                        (half + 0.5 - (ddx * ddx + ddy * ddy).sqrt()).clamp(0.0, 1.0)
                    };
                    cov = cov.max(disc(sx, sy)).max(disc(ex, ey));
                }

                if cov > 0.0 {
                    self.blend(px, py, color, cov);
                }
            }
        }
    }
}

/// Derived per-frame dial geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialGeometry {
    pub side: i32,
    pub arc_thickness: i32,
    pub minute_arc_offset: i32,
    pub hour_arc_offset: i32,
    pub inner_diameter: i32,
}

impl DialGeometry {
    pub fn for_size(width: u16, height: u16) -> Self {
        let side = width.min(height) as i32;
        let arc_thickness = (side / face::ARC_THICKNESS_DIVISOR as i32).max(1);
        let minute_arc_offset = face::MINUTE_ARC_OFFSET as i32;
        let hour_arc_offset = minute_arc_offset + arc_thickness;
        let inner_diameter = side - (hour_arc_offset * 2 + arc_thickness * 2);
        Self {
            side,
            arc_thickness,
            minute_arc_offset,
            hour_arc_offset,
            inner_diameter,
        }
    }

    fn ring_radius(&self, offset: i32) -> f32 {
        (self.side - 2 * offset) as f32 / 2.0
    }
}

/// Paint the complete clock face for `now` into `canvas`
pub fn render_face(
    canvas: &mut Canvas,
    config: &DisplayConfig,
    font: Option<&LoadedFont>,
    now: DateTime<Local>,
) {
    canvas.clear();

    let geom = DialGeometry::for_size(canvas.width, canvas.height);
    let center = geom.side as f32 / 2.0;
    let thickness = geom.arc_thickness as f32;
    let hour_radius = geom.ring_radius(geom.hour_arc_offset);
    let minute_radius = geom.ring_radius(geom.minute_arc_offset);

    let hour_sweep = -hour_angle(now.hour(), now.minute());
    let minute_sweep = -minute_angle(now.minute());
    trace!(
        hour_sweep = hour_sweep,
        minute_sweep = minute_sweep,
        side = geom.side,
        "Rendering face"
    );

    if let Some(font) = font {
        draw_text(canvas, config, font, &geom, now);
    }

    // The groove is always a full circle; the live arc is drawn on top of it
    if config.show_rings {
        canvas.stroke_arc(
            center,
            center,
            hour_radius,
            thickness,
            360.0,
            config.hour_color.groove(),
            Cap::Flat,
        );
        canvas.stroke_arc(
            center,
            center,
            minute_radius,
            thickness,
            360.0,
            config.minute_color.groove(),
            Cap::Flat,
        );
    }

    let cap = cap_for(config.show_rings);
    canvas.stroke_arc(
        center,
        center,
        hour_radius,
        thickness,
        hour_sweep,
        config.hour_color,
        cap,
    );
    canvas.stroke_arc(
        center,
        center,
        minute_radius,
        thickness,
        minute_sweep,
        config.minute_color,
        cap,
    );
}

fn draw_text(
    canvas: &mut Canvas,
    config: &DisplayConfig,
    font: &LoadedFont,
    geom: &DialGeometry,
    now: DateTime<Local>,
) {
    let time_text = timefmt::format_time(&config.time_format, &now.time());
    let has_suffix = timefmt::has_meridiem_suffix(&config.time_format);

    let time_size = time_font_size(geom.side, geom.inner_diameter, has_suffix, |size| {
        font.measure(&time_text, size)
    });

    let (ascent, descent) = font.line_metrics(time_size);
    let line_height = ascent - descent;
    let center_y = geom.side as f32 / 2.0;

    // Time text, centered in the dial square
    let width = font.measure(&time_text, time_size);
    let baseline = center_y - line_height / 2.0 + ascent;
    font.draw(
        canvas,
        &time_text,
        time_size,
        config.time_color,
        (geom.side as f32 - width) / 2.0,
        baseline,
    );

    if config.show_date {
        let date_size = (geom.side as f32 / face::DATE_FONT_DIVISOR).max(1.0);
        let (date_ascent, date_descent) = font.line_metrics(date_size);

        // Short date below the time text...
        let date_text = format!(
            "{} {} {:02}",
            now.day(),
            month_abbrev(now.month()),
            now.year() % 100
        );
        let date_width = font.measure(&date_text, date_size);
        let date_top = center_y + line_height / 2.0;
        font.draw(
            canvas,
            &date_text,
            date_size,
            config.date_color,
            (geom.side as f32 - date_width) / 2.0,
            date_top + date_ascent,
        );

        // ...and the weekday name above it
        let weekday_text = weekday_name(now.weekday());
        let weekday_width = font.measure(weekday_text, date_size);
        let weekday_bottom = center_y - line_height / 2.0;
        font.draw(
            canvas,
            weekday_text,
            date_size,
            config.date_color,
            (geom.side as f32 - weekday_width) / 2.0,
            weekday_bottom + date_descent,
        );
    }
}

fn month_abbrev(month: u32) -> &'static str {
    match month {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "Jul",
        8 => "Aug",
        9 => "Sep",
        10 => "Oct",
        11 => "Nov",
        _ => "Dec",
    }
}

fn weekday_name(weekday: chrono::Weekday) -> &'static str {
    match weekday {
        chrono::Weekday::Mon => "Monday",
        chrono::Weekday::Tue => "Tuesday",
        chrono::Weekday::Wed => "Wednesday",
        chrono::Weekday::Thu => "Thursday",
        chrono::Weekday::Fri => "Friday",
        chrono::Weekday::Sat => "Saturday",
        chrono::Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hour_angle_values() {
        assert_eq!(hour_angle(0, 0), 0.0);
        assert_eq!(hour_angle(3, 30), -105.0);
        assert_eq!(hour_angle(12, 0), 0.0);
        assert_eq!(hour_angle(18, 15), -187.5);
    }

    #[test]
    fn test_minute_angle_values() {
        assert_eq!(minute_angle(0), 0.0);
        assert_eq!(minute_angle(30), -180.0);
        assert_eq!(minute_angle(15), -90.0);
    }

    #[test]
    fn test_cap_follows_ring_mode() {
        assert_eq!(cap_for(false), Cap::Round);
        assert_eq!(cap_for(true), Cap::Flat);
    }

    #[test]
    fn test_dial_geometry() {
        let geom = DialGeometry::for_size(180, 180);
        assert_eq!(geom.side, 180);
        assert_eq!(geom.arc_thickness, 6);
        assert_eq!(geom.minute_arc_offset, 8);
        assert_eq!(geom.hour_arc_offset, 14);
        assert_eq!(geom.inner_diameter, 180 - (28 + 12));

        // Thickness never collapses to zero on tiny windows
        assert_eq!(DialGeometry::for_size(20, 20).arc_thickness, 1);

        // Non-square widgets use the short edge
        assert_eq!(DialGeometry::for_size(300, 120).side, 120);
    }

    #[test]
    fn test_time_font_size_plain() {
        // Fits comfortably: base size side/5
        let size = time_font_size(180, 140, false, |_| 50.0);
        assert_eq!(size, 36.0);
    }

    #[test]
    fn test_time_font_size_shrinks_on_overflow() {
        // Wider than inner_diameter - 4 => one extra reduction step
        let size = time_font_size(180, 140, false, |_| 137.0);
        assert_eq!(size, 32.0);
    }

    #[test]
    fn test_time_font_size_shrinks_for_meridiem() {
        let size = time_font_size(180, 140, true, |_| 50.0);
        assert_eq!(size, 26.0);

        // Both reductions stack
        let size = time_font_size(180, 140, true, |_| 137.0);
        assert_eq!(size, 22.0);
    }

    #[test]
    fn test_stroke_arc_zero_sweep_paints_nothing() {
        let mut canvas = Canvas::new(100, 100);
        canvas.stroke_arc(
            50.0,
            50.0,
            40.0,
            4.0,
            0.0,
            HexColor::from_argb32(0xFFFFFFFF),
            Cap::Flat,
        );
        assert!(canvas.bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_stroke_arc_full_circle_covers_ring() {
        let mut canvas = Canvas::new(100, 100);
        canvas.stroke_arc(
            50.0,
            50.0,
            40.0,
            4.0,
            360.0,
            HexColor::from_argb32(0xFFFFFFFF),
            Cap::Flat,
        );
        // On-ring samples at 12, 3, 6 and 9 o'clock are painted
        assert!(canvas.alpha_at(50, 10) > 200);
        assert!(canvas.alpha_at(90, 50) > 200);
        assert!(canvas.alpha_at(50, 90) > 200);
        assert!(canvas.alpha_at(10, 50) > 200);
        // The dial center stays transparent
        assert_eq!(canvas.alpha_at(50, 50), 0);
    }

    #[test]
    fn test_stroke_arc_quarter_sweep_is_clockwise() {
        let mut canvas = Canvas::new(100, 100);
        // 90 degrees clockwise from 12 o'clock ends at 3 o'clock
        canvas.stroke_arc(
            50.0,
            50.0,
            40.0,
            4.0,
            90.0,
            HexColor::from_argb32(0xFFFFFFFF),
            Cap::Flat,
        );
        // Midpoint of the sweep (1:30 direction) is painted
        let mid = 40.0 / std::f32::consts::SQRT_2;
        assert!(canvas.alpha_at(50 + mid as i32, 50 - mid as i32) > 200);
        // The 9 o'clock side is untouched
        assert_eq!(canvas.alpha_at(10, 50), 0);
        // 6 o'clock is outside the quarter sweep
        assert_eq!(canvas.alpha_at(50, 90), 0);
    }

    #[test]
    fn test_blend_accumulates_alpha() {
        let mut canvas = Canvas::new(4, 4);
        canvas.blend(1, 1, HexColor::from_argb32(0x80FF0000), 1.0);
        let first = canvas.alpha_at(1, 1);
        assert!(first > 0);
        canvas.blend(1, 1, HexColor::from_argb32(0x80FF0000), 1.0);
        assert!(canvas.alpha_at(1, 1) > first);
    }
}
