//! Clock widget process
//!
//! Owns the X11 window and the async event loop. Redraws happen on a
//! one-second tick, on Expose, and whenever the preferences dialog reports a
//! settings change over IPC.

pub mod face;
pub mod font;
pub mod menu;
pub mod tooltip;
pub mod window;

use std::os::fd::AsRawFd;
use std::process::{Child, Command};

use anyhow::{Context, Result};
use chrono::Local;
use ipc_channel::ipc::IpcOneShotServer;
use tokio::io::unix::AsyncFd;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::*;

use crate::constants::mouse;
use crate::constants::timer;
use crate::ipc::PrefsMessage;
use crate::settings::{DisplayConfig, SettingsStore};

use face::{Canvas, render_face};
use font::LoadedFont;
use menu::{Menu, MenuAction};
use tooltip::Tooltip;
use window::X11Context;

/// Active left-button drag. The offset is pointer-in-root minus frame
/// origin, captured at press time.
struct Drag {
    offset_x: i16,
    offset_y: i16,
}

struct ClockApp {
    ctx: X11Context,
    window: Window,
    gc: Gcontext,
    store: SettingsStore,
    config: DisplayConfig,
    font: Option<LoadedFont>,
    width: u16,
    height: u16,
    drag: Option<Drag>,
    menu: Option<Menu>,
    tooltip: Option<Tooltip>,
    /// Pointer root position while hovering the face, cleared on leave
    hover: Option<(i16, i16)>,
    prefs_child: Option<Child>,
    prefs_tx: mpsc::Sender<PrefsMessage>,
    closing: bool,
}

pub async fn run() -> Result<()> {
    let store = SettingsStore::open().context("Failed to open settings store")?;
    let config = DisplayConfig::load(&store);
    info!(
        width = config.init_width,
        height = config.init_height,
        x = config.pos_x,
        y = config.pos_y,
        "Loaded display configuration"
    );

    let ctx = X11Context::connect().context("Failed to connect to X server")?;
    let width = config.init_width.clamp(1, u16::MAX as i64) as u16;
    let height = config.init_height.clamp(1, u16::MAX as i64) as u16;
    let window = ctx
        .create_clock_window(config.pos_x as i16, config.pos_y as i16, width, height)
        .context("Failed to create clock window")?;
    let gc = ctx.create_gc(window).context("Failed to create GC")?;

    // The WM is free to place a fresh window wherever it likes; re-assert
    // the stored position when one was saved
    if (config.pos_x, config.pos_y) != (0, 0) {
        ctx.move_window(window, config.pos_x as i16, config.pos_y as i16)?;
    }

    let font = LoadedFont::resolve(&config.text_font);

    let (prefs_tx, mut prefs_rx) = mpsc::channel(8);

    let mut app = ClockApp {
        ctx,
        window,
        gc,
        store,
        config,
        font,
        width,
        height,
        drag: None,
        menu: None,
        tooltip: None,
        hover: None,
        prefs_child: None,
        prefs_tx,
        closing: false,
    };
    app.redraw()?;

    let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
        .context("Failed to register SIGINT handler")?;
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .context("Failed to register SIGTERM handler")?;

    let x11_fd = AsyncFd::new(app.ctx.conn.stream().as_raw_fd())
        .context("Failed to create AsyncFd for X11 connection")?;

    let mut tick = tokio::time::interval(timer::TICK_PERIOD);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    info!("Clock widget running");

    while !app.closing {
        // Drain pending X11 events before sleeping so the queue never backs
        // up during drags
        while let Some(event) = app
            .ctx
            .conn
            .poll_for_event()
            .context("Failed to poll for X11 event")?
        {
            if let Err(err) = app.handle_event(event) {
                error!(error = ?err, "Event handling error");
            }
            if app.closing {
                break;
            }
        }
        let _ = app.ctx.conn.flush();
        if app.closing {
            break;
        }

        tokio::select! {
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down");
                app.closing = true;
            }

            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down");
                app.closing = true;
            }

            Some(msg) = prefs_rx.recv() => {
                if let Err(err) = app.handle_prefs_message(msg) {
                    error!(error = ?err, "Failed to apply preferences update");
                }
            }

            _ = tick.tick() => {
                app.on_tick()?;
            }

            ready = x11_fd.readable() => {
                match ready {
                    Ok(mut guard) => {
                        // Level-triggered; clear readiness or the next
                        // readable() returns immediately and spins the loop
                        guard.clear_ready();
                    }
                    Err(err) => {
                        error!(error = ?err, "Failed to poll X11 fd readiness");
                    }
                }
            }
        }
    }

    app.save_position();
    if let Some(mut child) = app.prefs_child.take() {
        let _ = child.kill();
        let _ = child.wait();
    }
    info!("Clock widget exited");
    Ok(())
}

impl ClockApp {
    fn redraw(&mut self) -> Result<()> {
        let mut canvas = Canvas::new(self.width, self.height);
        render_face(&mut canvas, &self.config, self.font.as_ref(), Local::now());
        self.ctx.present(self.window, self.gc, &canvas)
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Expose(ev) if ev.window == self.window && ev.count == 0 => {
                self.redraw()?;
            }

            Event::ConfigureNotify(ev) if ev.window == self.window => {
                if ev.width != self.width || ev.height != self.height {
                    self.width = ev.width;
                    self.height = ev.height;
                    debug!(width = ev.width, height = ev.height, "Window resized");
                    self.redraw()?;
                }
            }

            Event::ButtonPress(ev) => self.on_button_press(ev)?,

            Event::ButtonRelease(ev) => {
                if ev.detail == mouse::BUTTON_LEFT && self.drag.take().is_some() {
                    debug!("Drag finished");
                }
            }

            Event::MotionNotify(ev) => self.on_motion(ev)?,

            Event::EnterNotify(ev) if ev.event == self.window => {
                self.hover = Some((ev.root_x, ev.root_y));
            }

            Event::LeaveNotify(ev) if ev.event == self.window => {
                self.hover = None;
                self.hide_tooltip();
            }

            Event::ClientMessage(ev) if ev.window == self.window => {
                if ev.type_ == self.ctx.atoms.wm_protocols
                    && ev.data.as_data32()[0] == self.ctx.atoms.wm_delete_window
                {
                    info!("Close requested by window manager");
                    self.closing = true;
                }
            }

            _ => {}
        }
        Ok(())
    }

    fn on_button_press(&mut self, ev: ButtonPressEvent) -> Result<()> {
        self.hide_tooltip();

        // While the menu holds the pointer grab every press is reported
        // relative to the menu window
        if let Some(menu) = self.menu.take() {
            let action = menu.press(ev.event_x, ev.event_y);
            menu.close(&self.ctx);
            match action {
                Some(MenuAction::Preferences) => self.launch_preferences()?,
                Some(MenuAction::Exit) => {
                    info!("Exit chosen from menu");
                    self.closing = true;
                }
                None => {}
            }
            return Ok(());
        }

        if ev.event != self.window {
            return Ok(());
        }

        match ev.detail {
            mouse::BUTTON_LEFT => {
                let (frame_x, frame_y) = self
                    .ctx
                    .frame_position(self.window)
                    .context("Failed to query frame position")?;
                self.drag = Some(Drag {
                    offset_x: ev.root_x - frame_x,
                    offset_y: ev.root_y - frame_y,
                });
                debug!(
                    offset_x = ev.root_x - frame_x,
                    offset_y = ev.root_y - frame_y,
                    "Drag started"
                );
            }
            mouse::BUTTON_RIGHT => {
                if let Some(font) = self.font.as_ref() {
                    self.menu = Some(Menu::open(&self.ctx, font, ev.root_x, ev.root_y)?);
                } else {
                    warn!("No usable font, context menu unavailable");
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn on_motion(&mut self, ev: MotionNotifyEvent) -> Result<()> {
        if let Some(mut menu) = self.menu.take() {
            if let Some(font) = self.font.as_ref() {
                menu.motion(&self.ctx, font, ev.event_x, ev.event_y)?;
            }
            self.menu = Some(menu);
            return Ok(());
        }

        if let Some(drag) = self.drag.as_ref() {
            self.ctx.move_window(
                self.window,
                ev.root_x - drag.offset_x,
                ev.root_y - drag.offset_y,
            )?;
            return Ok(());
        }

        if ev.event == self.window && self.hover.is_some() {
            self.hover = Some((ev.root_x, ev.root_y));
        }
        Ok(())
    }

    /// Once-a-second housekeeping: repaint the face, pop the tooltip for a
    /// pointer that stayed on the face across a tick, and reap a finished
    /// preferences process
    fn on_tick(&mut self) -> Result<()> {
        self.redraw()?;

        if let Some((root_x, root_y)) = self.hover
            && self.tooltip.is_none()
            && self.menu.is_none()
            && self.drag.is_none()
        {
            if let Some(font) = self.font.as_ref() {
                self.tooltip = Some(Tooltip::show(&self.ctx, font, root_x, root_y)?);
            }
        }

        if let Some(child) = self.prefs_child.as_mut() {
            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!(exit = ?status.code(), "Preferences dialog exited");
                    self.prefs_child = None;
                }
                Ok(None) => {}
                Err(err) => {
                    error!(error = ?err, "Failed to query preferences process status");
                    self.prefs_child = None;
                }
            }
        }
        Ok(())
    }

    fn hide_tooltip(&mut self) {
        if let Some(tooltip) = self.tooltip.take() {
            tooltip.hide(&self.ctx);
        }
    }

    /// Spawn the preferences dialog as a child process and bridge its IPC
    /// receiver onto the event loop. A dialog that is already open is left
    /// alone.
    fn launch_preferences(&mut self) -> Result<()> {
        if let Some(child) = self.prefs_child.as_mut()
            && matches!(child.try_wait(), Ok(None))
        {
            debug!("Preferences dialog already open");
            return Ok(());
        }

        let (server, server_name) = IpcOneShotServer::<PrefsMessage>::new()
            .context("Failed to create IPC server")?;

        let exe_path = std::env::current_exe().context("Failed to resolve executable path")?;
        let child = Command::new(exe_path)
            .arg("--prefs")
            .arg("--ipc-server")
            .arg(&server_name)
            .spawn()
            .context("Failed to spawn preferences dialog")?;
        info!(pid = child.id(), server_name = %server_name, "Started preferences dialog");
        self.prefs_child = Some(child);

        // IpcReceiver is blocking, so a thread bridges it onto the tokio
        // channel the select! loop reads from
        let tx = self.prefs_tx.clone();
        std::thread::spawn(move || {
            let (receiver, first) = match server.accept() {
                Ok(pair) => pair,
                Err(err) => {
                    error!(error = %err, "Failed to accept IPC connection from preferences");
                    return;
                }
            };
            if tx.blocking_send(first).is_err() {
                return;
            }
            while let Ok(msg) = receiver.recv() {
                if tx.blocking_send(msg).is_err() {
                    break;
                }
            }
        });
        Ok(())
    }

    fn handle_prefs_message(&mut self, msg: PrefsMessage) -> Result<()> {
        match msg {
            PrefsMessage::Connected => {
                debug!("Preferences dialog connected");
            }
            PrefsMessage::SettingsUpdated => {
                info!("Settings updated, reloading");
                self.store
                    .reload()
                    .context("Failed to reload settings store")?;
                let previous_font = self.config.text_font.clone();
                self.config.reload(&self.store);
                if self.config.text_font != previous_font {
                    self.font = LoadedFont::resolve(&self.config.text_font);
                }
                self.redraw()?;
            }
            PrefsMessage::Closed => {
                debug!("Preferences dialog closed");
            }
        }
        Ok(())
    }

    /// Persist the on-screen position so the next launch restores it
    fn save_position(&mut self) {
        match self.ctx.frame_position(self.window) {
            Ok((x, y)) => {
                if let Err(err) =
                    DisplayConfig::write_position(&mut self.store, x as i64, y as i64)
                {
                    error!(error = ?err, "Failed to persist window position");
                } else {
                    info!(x = x, y = y, "Saved window position");
                }
            }
            Err(err) => {
                error!(error = ?err, "Failed to query window position on exit");
            }
        }
    }
}
