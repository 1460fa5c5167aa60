//! Right-click context menu
//!
//! A small override-redirect popup with the two widget actions. The pointer
//! is grabbed while the menu is open so a click anywhere else dismisses it.

use anyhow::{Context, Result};
use tracing::debug;
use x11rb::protocol::xproto::*;

use crate::color::HexColor;
use crate::constants::popup;
use crate::constants::ui;

use super::face::Canvas;
use super::font::LoadedFont;
use super::window::X11Context;

/// Action triggered by a menu row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Preferences,
    Exit,
}

const ITEMS: &[(&str, MenuAction)] = &[
    (ui::MENU_PREFERENCES, MenuAction::Preferences),
    (ui::MENU_EXIT, MenuAction::Exit),
];

/// An open context menu popup
pub struct Menu {
    pub window: Window,
    gc: Gcontext,
    width: u16,
    height: u16,
    row_height: u16,
    hovered: Option<usize>,
}

impl Menu {
    /// Open the menu near the pointer and grab the pointer so any press
    /// outside the popup dismisses it
    pub fn open(ctx: &X11Context, font: &LoadedFont, root_x: i16, root_y: i16) -> Result<Self> {
        let row_height = popup::TEXT_SIZE as u16 + 2 * popup::PADDING_Y;
        let text_width = ITEMS
            .iter()
            .map(|(label, _)| font.measure(label, popup::TEXT_SIZE).ceil() as u16)
            .max()
            .unwrap_or(0);
        let width = text_width + 2 * popup::PADDING_X;
        let height = row_height * ITEMS.len() as u16;

        // Keep the popup on screen
        let screen = ctx.screen();
        let x = (root_x + popup::POINTER_OFFSET)
            .min(screen.width_in_pixels as i16 - width as i16)
            .max(0);
        let y = (root_y + popup::POINTER_OFFSET)
            .min(screen.height_in_pixels as i16 - height as i16)
            .max(0);

        let window = ctx
            .create_popup(x, y, width, height)
            .context("Failed to create menu popup")?;
        let gc = ctx.create_gc(window).context("Failed to create menu GC")?;

        ctx.conn
            .grab_pointer(
                false,
                window,
                EventMask::BUTTON_PRESS
                    | EventMask::BUTTON_RELEASE
                    | EventMask::POINTER_MOTION
                    | EventMask::LEAVE_WINDOW,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                x11rb::NONE,
                x11rb::NONE,
                x11rb::CURRENT_TIME,
            )
            .context("Failed to send pointer grab request")?
            .reply()
            .context("Failed to grab pointer for menu")?;

        let menu = Self {
            window,
            gc,
            width,
            height,
            row_height,
            hovered: None,
        };
        menu.draw(ctx, font)?;
        debug!(window = window, x = x, y = y, "Opened context menu");
        Ok(menu)
    }

    /// Repaint all rows, highlighting the hovered one
    pub fn draw(&self, ctx: &X11Context, font: &LoadedFont) -> Result<()> {
        let mut canvas = Canvas::new(self.width, self.height);
        canvas.fill_rect(
            0,
            0,
            self.width,
            self.height,
            HexColor::from_argb32(popup::BACKGROUND),
        );

        let (ascent, descent) = font.line_metrics(popup::TEXT_SIZE);
        for (index, (label, _)) in ITEMS.iter().enumerate() {
            let top = index as i32 * self.row_height as i32;
            if self.hovered == Some(index) {
                canvas.fill_rect(
                    0,
                    top,
                    self.width,
                    self.row_height,
                    HexColor::from_argb32(popup::HIGHLIGHT),
                );
            }
            let baseline =
                top as f32 + (self.row_height as f32 + ascent + descent) / 2.0;
            font.draw(
                &mut canvas,
                label,
                popup::TEXT_SIZE,
                HexColor::from_argb32(popup::TEXT_COLOR),
                popup::PADDING_X as f32,
                baseline,
            );
        }

        ctx.present(self.window, self.gc, &canvas)
    }

    /// Row index at a menu-local position, if any
    pub fn row_at(&self, x: i16, y: i16) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i16 || y >= self.height as i16 {
            return None;
        }
        let index = (y / self.row_height as i16) as usize;
        (index < ITEMS.len()).then_some(index)
    }

    /// Handle pointer motion; returns true when a repaint happened
    pub fn motion(&mut self, ctx: &X11Context, font: &LoadedFont, x: i16, y: i16) -> Result<bool> {
        let hovered = self.row_at(x, y);
        if hovered != self.hovered {
            self.hovered = hovered;
            self.draw(ctx, font)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Handle a button press at a menu-local position. A press on a row
    /// yields its action; any other press just dismisses the menu.
    pub fn press(&self, x: i16, y: i16) -> Option<MenuAction> {
        self.row_at(x, y).map(|index| ITEMS[index].1)
    }

    /// Release the grab and tear the popup down
    pub fn close(self, ctx: &X11Context) {
        let _ = ctx.conn.ungrab_pointer(x11rb::CURRENT_TIME);
        ctx.destroy_popup(self.window);
        debug!(window = self.window, "Closed context menu");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Hit testing is pure; exercised without an X server by poking the
    // geometry fields directly.
    fn test_menu() -> Menu {
        Menu {
            window: 1,
            gc: 2,
            width: 100,
            height: 52,
            row_height: 26,
            hovered: None,
        }
    }

    #[test]
    fn test_row_hit_testing() {
        let menu = test_menu();
        assert_eq!(menu.row_at(10, 5), Some(0));
        assert_eq!(menu.row_at(10, 30), Some(1));
        assert_eq!(menu.row_at(10, -1), None);
        assert_eq!(menu.row_at(-1, 10), None);
        assert_eq!(menu.row_at(10, 60), None);
        assert_eq!(menu.row_at(120, 10), None);
    }

    #[test]
    fn test_press_maps_rows_to_actions() {
        let menu = test_menu();
        assert_eq!(menu.press(4, 4), Some(MenuAction::Preferences));
        assert_eq!(menu.press(4, 40), Some(MenuAction::Exit));
        assert_eq!(menu.press(4, 200), None);
    }
}
