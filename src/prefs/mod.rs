//! Preferences dialog
//!
//! Spawned by the clock process as `--prefs --ipc-server <name>`. Edits are
//! staged in the form and only hit the settings file on Apply or OK, after
//! which the clock is notified over IPC and re-reads the store.

use anyhow::{Context, Result, anyhow};
use eframe::{NativeOptions, egui};
use ipc_channel::ipc::IpcSender;
use tracing::{error, info, warn};

use crate::color::{format_hex_color, parse_hex_color};
use crate::constants::store;
use crate::constants::ui;
use crate::ipc::PrefsMessage;
use crate::settings::SettingsStore;
use crate::timefmt;

const WINDOW_WIDTH: f32 = 360.0;
const WINDOW_HEIGHT: f32 = 440.0;

const FORMAT_PRESETS: &[&str] = &["h:mm", "h:mm ap", "h:mm AP", "HH:mm", "H:mm:ss"];

struct PrefsApp {
    store: SettingsStore,
    clock_tx: IpcSender<PrefsMessage>,

    show_date: bool,
    show_rings: bool,
    hour_color: String,
    minute_color: String,
    time_color: String,
    date_color: String,
    time_format: String,
    text_font: String,
    init_width: i64,
    init_height: i64,

    available_fonts: Vec<String>,
    font_list_error: Option<String>,
}

impl PrefsApp {
    fn new(store: SettingsStore, clock_tx: IpcSender<PrefsMessage>) -> Self {
        let (available_fonts, font_list_error) = match crate::clock::font::list_families() {
            Ok(families) => (families, None),
            Err(err) => {
                warn!(error = ?err, "Failed to enumerate font families");
                (Vec::new(), Some(err.to_string()))
            }
        };

        Self {
            show_date: store.get_bool(store::KEY_SHOW_DATE),
            show_rings: store.get_bool(store::KEY_RINGS),
            hour_color: store.get_string(store::KEY_HOUR_COLOR),
            minute_color: store.get_string(store::KEY_MINUTE_COLOR),
            time_color: store.get_string(store::KEY_TIME_COLOR),
            date_color: store.get_string(store::KEY_DATE_COLOR),
            time_format: store.get_string(store::KEY_TIME_FORMAT),
            text_font: store.get_string(store::KEY_TEXT_FONT),
            init_width: store.get_int(store::KEY_INIT_WIDTH),
            init_height: store.get_int(store::KEY_INIT_HEIGHT),
            store,
            clock_tx,
            available_fonts,
            font_list_error,
        }
    }

    /// Write the staged form values to the store and tell the clock. The
    /// position keys belong to the clock and are never touched here.
    fn apply(&mut self) {
        self.store.set_bool(store::KEY_SHOW_DATE, self.show_date);
        self.store.set_bool(store::KEY_RINGS, self.show_rings);
        self.store.set_string(store::KEY_HOUR_COLOR, &self.hour_color);
        self.store
            .set_string(store::KEY_MINUTE_COLOR, &self.minute_color);
        self.store.set_string(store::KEY_TIME_COLOR, &self.time_color);
        self.store.set_string(store::KEY_DATE_COLOR, &self.date_color);
        self.store
            .set_string(store::KEY_TIME_FORMAT, &self.time_format);
        self.store.set_string(store::KEY_TEXT_FONT, &self.text_font);
        self.store.set_int(store::KEY_INIT_WIDTH, self.init_width);
        self.store.set_int(store::KEY_INIT_HEIGHT, self.init_height);

        if let Err(err) = self.store.flush() {
            error!(error = ?err, "Failed to write settings");
            return;
        }
        info!("Settings applied");
        if let Err(err) = self.clock_tx.send(PrefsMessage::SettingsUpdated) {
            error!(error = %err, "Failed to notify clock of settings update");
        }
    }

    fn color_row(ui: &mut egui::Ui, label: &str, value: &mut String) {
        ui.horizontal(|ui| {
            ui.label(label);
            let text_edit = egui::TextEdit::singleline(value).desired_width(100.0);
            ui.add(text_edit);
            if let Some(mut color) = parse_hex_color(value)
                && ui.color_edit_button_srgba(&mut color).changed()
            {
                *value = format_hex_color(color);
            }
        });
    }
}

impl eframe::App for PrefsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.group(|ui| {
                ui.label(egui::RichText::new("Display").strong());
                ui.checkbox(&mut self.show_date, "Show date and weekday");
                ui.checkbox(&mut self.show_rings, "Show background rings");

                ui.horizontal(|ui| {
                    ui.label("Initial size:");
                    ui.add(
                        egui::DragValue::new(&mut self.init_width)
                            .range(40..=2000)
                            .suffix(" px"),
                    );
                    ui.label("×");
                    ui.add(
                        egui::DragValue::new(&mut self.init_height)
                            .range(40..=2000)
                            .suffix(" px"),
                    );
                });
            });

            ui.add_space(8.0);

            ui.group(|ui| {
                ui.label(egui::RichText::new("Colors").strong());
                Self::color_row(ui, "Hour arc:", &mut self.hour_color);
                Self::color_row(ui, "Minute arc:", &mut self.minute_color);
                Self::color_row(ui, "Time text:", &mut self.time_color);
                Self::color_row(ui, "Date text:", &mut self.date_color);
            });

            ui.add_space(8.0);

            ui.group(|ui| {
                ui.label(egui::RichText::new("Text").strong());

                ui.horizontal(|ui| {
                    ui.label("Time format:");
                    ui.add(egui::TextEdit::singleline(&mut self.time_format).desired_width(100.0));
                    egui::ComboBox::from_id_salt("time_format_preset")
                        .selected_text("Presets")
                        .width(100.0)
                        .show_ui(ui, |ui| {
                            for preset in FORMAT_PRESETS {
                                ui.selectable_value(
                                    &mut self.time_format,
                                    preset.to_string(),
                                    *preset,
                                );
                            }
                        });
                });
                if timefmt::has_meridiem_suffix(&self.time_format) {
                    ui.small("Suffix format shrinks the time text to make room");
                }

                ui.horizontal(|ui| {
                    ui.label("Font:");
                    if let Some(ref error) = self.font_list_error {
                        ui.colored_label(egui::Color32::RED, "⚠")
                            .on_hover_text(format!("Failed to list fonts: {}", error));
                    }
                    egui::ComboBox::from_id_salt("text_font_family")
                        .selected_text(&self.text_font)
                        .width(180.0)
                        .show_ui(ui, |ui| {
                            for family in &self.available_fonts {
                                ui.selectable_value(
                                    &mut self.text_font,
                                    family.clone(),
                                    family,
                                );
                            }
                        });
                });
            });

            ui.add_space(12.0);

            ui.horizontal(|ui| {
                if ui.button("OK").clicked() {
                    self.apply();
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
                if ui.button("Apply").clicked() {
                    self.apply();
                }
                if ui.button("Cancel").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        let _ = self.clock_tx.send(PrefsMessage::Closed);
    }
}

pub fn run(ipc_server_name: String) -> Result<()> {
    info!(server_name = %ipc_server_name, "Connecting to clock IPC server");
    let clock_tx: IpcSender<PrefsMessage> =
        IpcSender::connect(ipc_server_name).context("Failed to connect to IPC server")?;
    clock_tx
        .send(PrefsMessage::Connected)
        .context("Failed to send IPC handshake")?;

    let store = SettingsStore::open().context("Failed to open settings store")?;

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([WINDOW_WIDTH, WINDOW_HEIGHT])
        .with_title(format!("{} Preferences", ui::WINDOW_TITLE));
    let options = NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        &format!("{} Preferences", ui::WINDOW_TITLE),
        options,
        Box::new(|_cc| Ok(Box::new(PrefsApp::new(store, clock_tx)))),
    )
    .map_err(|err| anyhow!("Failed to launch preferences dialog: {err}"))
}
