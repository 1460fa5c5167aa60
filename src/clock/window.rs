//! X11 connection, window creation, and canvas presentation
//!
//! The clock itself is a managed, borderless, always-below ARGB window; the
//! context menu and tooltip are short-lived override-redirect popups sharing
//! the same 32-bit visual. Rendering is a full-canvas PutImage per frame.

use anyhow::{Context, Result};
use tracing::info;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as WrapperExt;

use crate::constants::{ui, x11};

use super::face::Canvas;

/// Pre-cached X11 atoms to avoid repeated roundtrips
pub struct CachedAtoms {
    pub wm_protocols: Atom,
    pub wm_delete_window: Atom,
    pub net_wm_name: Atom,
    pub utf8_string: Atom,
    pub wm_class: Atom,
    pub net_wm_pid: Atom,
    pub net_wm_window_type: Atom,
    pub net_wm_window_type_normal: Atom,
    pub net_wm_state: Atom,
    pub net_wm_state_below: Atom,
    pub net_wm_state_skip_taskbar: Atom,
    pub net_wm_state_skip_pager: Atom,
    pub motif_wm_hints: Atom,
}

impl CachedAtoms {
    pub fn new(conn: &RustConnection) -> Result<Self> {
        let intern = |name: &[u8]| -> Result<Atom> {
            Ok(conn
                .intern_atom(false, name)
                .with_context(|| {
                    format!("Failed to intern {} atom", String::from_utf8_lossy(name))
                })?
                .reply()
                .with_context(|| {
                    format!(
                        "Failed to get reply for {} atom",
                        String::from_utf8_lossy(name)
                    )
                })?
                .atom)
        };

        Ok(Self {
            wm_protocols: intern(b"WM_PROTOCOLS")?,
            wm_delete_window: intern(b"WM_DELETE_WINDOW")?,
            net_wm_name: intern(b"_NET_WM_NAME")?,
            utf8_string: intern(b"UTF8_STRING")?,
            wm_class: intern(b"WM_CLASS")?,
            net_wm_pid: intern(b"_NET_WM_PID")?,
            net_wm_window_type: intern(b"_NET_WM_WINDOW_TYPE")?,
            net_wm_window_type_normal: intern(b"_NET_WM_WINDOW_TYPE_NORMAL")?,
            net_wm_state: intern(b"_NET_WM_STATE")?,
            net_wm_state_below: intern(b"_NET_WM_STATE_BELOW")?,
            net_wm_state_skip_taskbar: intern(b"_NET_WM_STATE_SKIP_TASKBAR")?,
            net_wm_state_skip_pager: intern(b"_NET_WM_STATE_SKIP_PAGER")?,
            motif_wm_hints: intern(b"_MOTIF_WM_HINTS")?,
        })
    }
}

/// The 32-bit TrueColor visual and its colormap used by every window we
/// create; required for per-pixel transparency under a compositor
pub struct ArgbVisual {
    pub visual: Visualid,
    pub colormap: Colormap,
}

impl ArgbVisual {
    fn find(conn: &RustConnection, screen: &Screen) -> Result<Self> {
        let visual = screen
            .allowed_depths
            .iter()
            .find(|depth| depth.depth == x11::ARGB_DEPTH)
            .and_then(|depth| {
                depth
                    .visuals
                    .iter()
                    .find(|v| v.class == VisualClass::TRUE_COLOR)
            })
            .map(|v| v.visual_id)
            .ok_or_else(|| {
                anyhow::anyhow!("No 32-bit TrueColor visual available; is a compositor running?")
            })?;

        let colormap = conn
            .generate_id()
            .context("Failed to generate colormap ID")?;
        conn.create_colormap(ColormapAlloc::NONE, colormap, screen.root, visual)
            .context("Failed to create ARGB colormap")?;

        Ok(Self { visual, colormap })
    }
}

/// Shared X11 state: connection, screen, atoms, ARGB visual
pub struct X11Context {
    pub conn: RustConnection,
    pub screen_num: usize,
    pub atoms: CachedAtoms,
    pub argb: ArgbVisual,
}

impl X11Context {
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None)
            .context("Failed to connect to X11 server. Is DISPLAY set correctly?")?;

        let screen = &conn.setup().roots[screen_num];
        info!(
            screen = screen_num,
            width = screen.width_in_pixels,
            height = screen.height_in_pixels,
            "Connected to X11 server"
        );

        let atoms = CachedAtoms::new(&conn).context("Failed to cache X11 atoms at startup")?;
        let argb = ArgbVisual::find(&conn, &conn.setup().roots[screen_num])
            .context("Failed to find ARGB visual")?;

        Ok(Self {
            conn,
            screen_num,
            atoms,
            argb,
        })
    }

    pub fn screen(&self) -> &Screen {
        &self.conn.setup().roots[self.screen_num]
    }

    /// Create the clock window: managed, undecorated, kept below other
    /// windows, skipped in taskbar and pager
    pub fn create_clock_window(&self, x: i16, y: i16, width: u16, height: u16) -> Result<Window> {
        let window = self
            .conn
            .generate_id()
            .context("Failed to generate clock window ID")?;

        self.conn
            .create_window(
                x11::ARGB_DEPTH,
                window,
                self.screen().root,
                x,
                y,
                width,
                height,
                0,
                WindowClass::INPUT_OUTPUT,
                self.argb.visual,
                &CreateWindowAux::new()
                    .background_pixel(0)
                    .border_pixel(0)
                    .colormap(self.argb.colormap)
                    .event_mask(
                        EventMask::EXPOSURE
                            | EventMask::BUTTON_PRESS
                            | EventMask::BUTTON_RELEASE
                            | EventMask::POINTER_MOTION
                            | EventMask::BUTTON1_MOTION
                            | EventMask::ENTER_WINDOW
                            | EventMask::LEAVE_WINDOW
                            | EventMask::STRUCTURE_NOTIFY,
                    ),
            )
            .context("Failed to create clock window")?;

        let atoms = &self.atoms;

        // Participate in the WM close handshake
        self.conn
            .change_property32(
                PropMode::REPLACE,
                window,
                atoms.wm_protocols,
                AtomEnum::ATOM,
                &[atoms.wm_delete_window],
            )
            .context("Failed to set WM_PROTOCOLS")?;

        self.conn
            .change_property8(
                PropMode::REPLACE,
                window,
                atoms.net_wm_name,
                atoms.utf8_string,
                ui::WINDOW_TITLE.as_bytes(),
            )
            .context("Failed to set _NET_WM_NAME")?;

        self.conn
            .change_property8(
                PropMode::REPLACE,
                window,
                AtomEnum::WM_NAME,
                AtomEnum::STRING,
                ui::WINDOW_TITLE.as_bytes(),
            )
            .context("Failed to set WM_NAME")?;

        self.conn
            .change_property8(
                PropMode::REPLACE,
                window,
                atoms.wm_class,
                AtomEnum::STRING,
                ui::WM_CLASS,
            )
            .context("Failed to set WM_CLASS")?;

        self.conn
            .change_property32(
                PropMode::REPLACE,
                window,
                atoms.net_wm_pid,
                AtomEnum::CARDINAL,
                &[std::process::id()],
            )
            .context("Failed to set _NET_WM_PID")?;

        self.conn
            .change_property32(
                PropMode::REPLACE,
                window,
                atoms.net_wm_window_type,
                AtomEnum::ATOM,
                &[atoms.net_wm_window_type_normal],
            )
            .context("Failed to set _NET_WM_WINDOW_TYPE")?;

        // Keep the clock under everything and out of the taskbar
        self.conn
            .change_property32(
                PropMode::REPLACE,
                window,
                atoms.net_wm_state,
                AtomEnum::ATOM,
                &[
                    atoms.net_wm_state_below,
                    atoms.net_wm_state_skip_taskbar,
                    atoms.net_wm_state_skip_pager,
                ],
            )
            .context("Failed to set _NET_WM_STATE")?;

        // Motif hints: flags = decorations, decorations = 0 (borderless)
        self.conn
            .change_property32(
                PropMode::REPLACE,
                window,
                atoms.motif_wm_hints,
                atoms.motif_wm_hints,
                &[x11::MOTIF_HINTS_DECORATIONS, 0, 0, 0, 0],
            )
            .context("Failed to set _MOTIF_WM_HINTS")?;

        self.conn
            .map_window(window)
            .context("Failed to map clock window")?;
        self.conn.flush().context("Failed to flush after map")?;

        info!(window = window, width = width, height = height, "Mapped clock window");
        Ok(window)
    }

    /// Create an unmanaged popup (context menu, tooltip)
    pub fn create_popup(&self, x: i16, y: i16, width: u16, height: u16) -> Result<Window> {
        let window = self
            .conn
            .generate_id()
            .context("Failed to generate popup window ID")?;

        self.conn
            .create_window(
                x11::ARGB_DEPTH,
                window,
                self.screen().root,
                x,
                y,
                width,
                height,
                0,
                WindowClass::INPUT_OUTPUT,
                self.argb.visual,
                &CreateWindowAux::new()
                    .background_pixel(0)
                    .border_pixel(0)
                    .colormap(self.argb.colormap)
                    .override_redirect(x11::OVERRIDE_REDIRECT)
                    .event_mask(
                        EventMask::EXPOSURE
                            | EventMask::BUTTON_PRESS
                            | EventMask::BUTTON_RELEASE
                            | EventMask::POINTER_MOTION
                            | EventMask::LEAVE_WINDOW,
                    ),
            )
            .context("Failed to create popup window")?;

        self.conn
            .map_window(window)
            .context("Failed to map popup window")?;
        Ok(window)
    }

    /// Create a graphics context for PutImage uploads onto `window`
    pub fn create_gc(&self, window: Window) -> Result<Gcontext> {
        let gc = self.conn.generate_id().context("Failed to generate GC ID")?;
        self.conn
            .create_gc(gc, window, &CreateGCAux::new().graphics_exposures(0))
            .context("Failed to create graphics context")?;
        Ok(gc)
    }

    /// Upload the full canvas onto the window, chunked by rows to stay
    /// within the X11 maximum request size
    pub fn present(&self, window: Window, gc: Gcontext, canvas: &Canvas) -> Result<()> {
        let stride = canvas.width as usize * 4;
        if stride == 0 {
            return Ok(());
        }
        let rows_per_chunk = (200_000 / stride).max(1);
        let bytes = canvas.bytes();

        let mut row = 0usize;
        while row < canvas.height as usize {
            let rows = rows_per_chunk.min(canvas.height as usize - row);
            let chunk = &bytes[row * stride..(row + rows) * stride];
            self.conn
                .put_image(
                    ImageFormat::Z_PIXMAP,
                    window,
                    gc,
                    canvas.width,
                    rows as u16,
                    0,
                    row as i16,
                    0,
                    x11::ARGB_DEPTH,
                    chunk,
                )
                .context("Failed to upload canvas chunk")?;
            row += rows;
        }

        self.conn.flush().context("Failed to flush after present")?;
        Ok(())
    }

    /// Current position of the window's client origin in root coordinates
    pub fn frame_position(&self, window: Window) -> Result<(i16, i16)> {
        let translated = self
            .conn
            .translate_coordinates(window, self.screen().root, 0, 0)
            .context("Failed to send coordinate translation request")?
            .reply()
            .context("Failed to translate window coordinates")?;
        Ok((translated.dst_x, translated.dst_y))
    }

    /// Move a window to root coordinates
    pub fn move_window(&self, window: Window, x: i16, y: i16) -> Result<()> {
        self.conn
            .configure_window(
                window,
                &ConfigureWindowAux::new().x(x as i32).y(y as i32),
            )
            .context("Failed to move window")?;
        self.conn.flush().context("Failed to flush after move")?;
        Ok(())
    }

    /// Destroy a popup window, ignoring errors from already-gone windows
    pub fn destroy_popup(&self, window: Window) {
        let _ = self.conn.destroy_window(window);
        let _ = self.conn.flush();
    }
}
