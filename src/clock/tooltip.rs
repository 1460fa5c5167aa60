//! Hover tooltip
//!
//! Passive override-redirect popup with the drag instructions. It takes no
//! input; the event loop tears it down on leave, press, or drag start.

use anyhow::{Context, Result};
use tracing::trace;
use x11rb::protocol::xproto::{Gcontext, Window};

use crate::color::HexColor;
use crate::constants::popup;
use crate::constants::ui;

use super::face::Canvas;
use super::font::LoadedFont;
use super::window::X11Context;

pub struct Tooltip {
    pub window: Window,
    gc: Gcontext,
    width: u16,
    height: u16,
}

impl Tooltip {
    /// Show the tooltip near the pointer
    pub fn show(ctx: &X11Context, font: &LoadedFont, root_x: i16, root_y: i16) -> Result<Self> {
        let line_height = popup::TEXT_SIZE as u16 + popup::PADDING_Y;
        let text_width = ui::TOOLTIP_LINES
            .iter()
            .map(|line| font.measure(line, popup::TEXT_SIZE).ceil() as u16)
            .max()
            .unwrap_or(0);
        let width = text_width + 2 * popup::PADDING_X;
        let height = line_height * ui::TOOLTIP_LINES.len() as u16 + popup::PADDING_Y;

        let screen = ctx.screen();
        let x = (root_x + popup::POINTER_OFFSET)
            .min(screen.width_in_pixels as i16 - width as i16)
            .max(0);
        let y = (root_y + popup::POINTER_OFFSET)
            .min(screen.height_in_pixels as i16 - height as i16)
            .max(0);

        let window = ctx
            .create_popup(x, y, width, height)
            .context("Failed to create tooltip popup")?;
        let gc = ctx
            .create_gc(window)
            .context("Failed to create tooltip GC")?;

        let tooltip = Self {
            window,
            gc,
            width,
            height,
        };
        tooltip.draw(ctx, font)?;
        trace!(window = window, "Showed tooltip");
        Ok(tooltip)
    }

    fn draw(&self, ctx: &X11Context, font: &LoadedFont) -> Result<()> {
        let mut canvas = Canvas::new(self.width, self.height);
        canvas.fill_rect(
            0,
            0,
            self.width,
            self.height,
            HexColor::from_argb32(popup::BACKGROUND),
        );

        let line_height = popup::TEXT_SIZE as u16 + popup::PADDING_Y;
        let (ascent, _) = font.line_metrics(popup::TEXT_SIZE);
        for (index, line) in ui::TOOLTIP_LINES.iter().enumerate() {
            let baseline =
                (popup::PADDING_Y + index as u16 * line_height) as f32 + ascent;
            font.draw(
                &mut canvas,
                line,
                popup::TEXT_SIZE,
                HexColor::from_argb32(popup::TEXT_COLOR),
                popup::PADDING_X as f32,
                baseline,
            );
        }

        ctx.present(self.window, self.gc, &canvas)
    }

    pub fn hide(self, ctx: &X11Context) {
        ctx.destroy_popup(self.window);
        trace!(window = self.window, "Hid tooltip");
    }
}
