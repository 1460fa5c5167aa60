//! Persistent settings store and display configuration
//!
//! The store is a flat key-value map persisted as JSON under the user config
//! directory. A sentinel key (`Existant`) marks a fully seeded store; when it
//! is missing, all defaults are written exactly once. Missing or malformed
//! values read back as the type's zero-equivalent (0 / false / "") rather
//! than raising an error.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::color::HexColor;
use crate::constants::{defaults, store};

/// Flat key-value settings store backed by a JSON file
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl SettingsStore {
    /// Default store location under the user config dir
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(store::APP_DIR);
        path.push(store::FILENAME);
        path
    }

    /// Open the store at its default location
    pub fn open() -> Result<Self> {
        Self::open_at(Self::default_path())
    }

    /// Open the store at an explicit path, seeding defaults on first run
    pub fn open_at(path: PathBuf) -> Result<Self> {
        let values = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Value>(&contents) {
                Ok(Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    warn!(path = %path.display(), "Settings file is not a JSON object, starting fresh");
                    Map::new()
                }
            },
            Err(_) => Map::new(),
        };

        let mut store = Self { path, values };

        if !store.contains(store::KEY_EXISTANT) {
            info!(path = %store.path.display(), "Settings store not initialized, seeding defaults");
            store.seed_defaults();
            store.flush()?;
        }

        Ok(store)
    }

    /// Re-read the backing file, picking up edits made by another process
    pub fn reload(&mut self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {:?}", self.path))?;
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&contents) {
            self.values = map;
        } else {
            warn!(path = %self.path.display(), "Settings file unparsable on reload, keeping in-memory values");
        }
        Ok(())
    }

    /// Write the store back to disk as pretty JSON
    pub fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create settings directory {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(&Value::Object(self.values.clone()))
            .context("Failed to serialize settings to JSON")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write settings to {:?}", self.path))?;
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Integer value, or 0 when absent or not a number
    pub fn get_int(&self, key: &str) -> i64 {
        self.values.get(key).and_then(Value::as_i64).unwrap_or(0)
    }

    /// Boolean value, or false when absent or not a boolean
    pub fn get_bool(&self, key: &str) -> bool {
        self.values.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// String value, or "" when absent or not a string
    pub fn get_string(&self, key: &str) -> String {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    pub fn set_int(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), Value::from(value));
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.values.insert(key.to_string(), Value::from(value));
    }

    pub fn set_string(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), Value::from(value));
    }

    fn seed_defaults(&mut self) {
        self.set_int(store::KEY_INIT_WIDTH, defaults::INIT_WIDTH);
        self.set_int(store::KEY_INIT_HEIGHT, defaults::INIT_HEIGHT);
        self.set_bool(store::KEY_SHOW_DATE, defaults::SHOW_DATE);
        self.set_string(store::KEY_HOUR_COLOR, defaults::HOUR_COLOR);
        self.set_string(store::KEY_MINUTE_COLOR, defaults::MINUTE_COLOR);
        self.set_string(store::KEY_TIME_COLOR, defaults::TIME_COLOR);
        self.set_string(store::KEY_DATE_COLOR, defaults::DATE_COLOR);
        self.set_string(store::KEY_TIME_FORMAT, defaults::TIME_FORMAT);
        self.set_string(store::KEY_TEXT_FONT, defaults::TEXT_FONT);
        self.set_int(store::KEY_POS_X, defaults::POS_X);
        self.set_int(store::KEY_POS_Y, defaults::POS_Y);
        self.set_bool(store::KEY_RINGS, defaults::RINGS);
        self.set_bool(store::KEY_EXISTANT, true);
    }
}

/// In-memory display configuration, loaded from the store at startup and
/// partially re-read after a preferences update
#[derive(Debug, Clone)]
pub struct DisplayConfig {
    pub init_width: i64,
    pub init_height: i64,
    pub pos_x: i64,
    pub pos_y: i64,
    pub show_date: bool,
    pub show_rings: bool,
    pub hour_color: HexColor,
    pub minute_color: HexColor,
    pub time_color: HexColor,
    pub date_color: HexColor,
    pub time_format: String,
    pub text_font: String,
}

/// Parse a stored color string, falling back to the seeded default
fn parse_color_or_default(value: &str, key: &str, fallback: &str) -> HexColor {
    HexColor::parse(value).unwrap_or_else(|| {
        warn!(key = key, value = value, "Invalid color in settings, using default");
        HexColor::parse(fallback).expect("default colors are valid hex")
    })
}

impl DisplayConfig {
    /// Full load at startup: geometry, position, and appearance.
    /// Negative stored positions are normalized to 0 (not applied).
    pub fn load(store: &SettingsStore) -> Self {
        let mut config = Self {
            init_width: store.get_int(store::KEY_INIT_WIDTH),
            init_height: store.get_int(store::KEY_INIT_HEIGHT),
            pos_x: store.get_int(store::KEY_POS_X).max(0),
            pos_y: store.get_int(store::KEY_POS_Y).max(0),
            show_date: false,
            show_rings: false,
            hour_color: HexColor::from_argb32(0xFFFFFFFF),
            minute_color: HexColor::from_argb32(0xFFFFFFFF),
            time_color: HexColor::from_argb32(0xFFFFFFFF),
            date_color: HexColor::from_argb32(0xFFFFFFFF),
            time_format: String::new(),
            text_font: String::new(),
        };
        config.reload(store);
        config
    }

    /// Re-read appearance settings only; size and position fields are owned
    /// by the running widget and left untouched
    pub fn reload(&mut self, store: &SettingsStore) {
        self.show_date = store.get_bool(store::KEY_SHOW_DATE);
        self.show_rings = store.get_bool(store::KEY_RINGS);
        self.hour_color = parse_color_or_default(
            &store.get_string(store::KEY_HOUR_COLOR),
            store::KEY_HOUR_COLOR,
            defaults::HOUR_COLOR,
        );
        self.minute_color = parse_color_or_default(
            &store.get_string(store::KEY_MINUTE_COLOR),
            store::KEY_MINUTE_COLOR,
            defaults::MINUTE_COLOR,
        );
        self.time_color = parse_color_or_default(
            &store.get_string(store::KEY_TIME_COLOR),
            store::KEY_TIME_COLOR,
            defaults::TIME_COLOR,
        );
        self.date_color = parse_color_or_default(
            &store.get_string(store::KEY_DATE_COLOR),
            store::KEY_DATE_COLOR,
            defaults::DATE_COLOR,
        );
        self.time_format = store.get_string(store::KEY_TIME_FORMAT);
        self.text_font = store.get_string(store::KEY_TEXT_FONT);
    }

    /// Persist the live frame position at shutdown.
    /// Negative coordinates are written back as 1.
    pub fn write_position(store: &mut SettingsStore, x: i64, y: i64) -> Result<()> {
        store.set_int(store::KEY_POS_X, if x < 0 { 1 } else { x });
        store.set_int(store::KEY_POS_Y, if y < 0 { 1 } else { y });
        store.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, SettingsStore) {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::open_at(dir.path().join("settings.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_first_run_seeds_all_defaults() {
        let (_dir, store) = open_temp();

        assert_eq!(store.get_int(store::KEY_INIT_WIDTH), 180);
        assert_eq!(store.get_int(store::KEY_INIT_HEIGHT), 180);
        assert!(store.get_bool(store::KEY_SHOW_DATE));
        assert_eq!(store.get_string(store::KEY_HOUR_COLOR), "#FFFFFFFF");
        assert_eq!(store.get_string(store::KEY_MINUTE_COLOR), "#77dbdbdb");
        assert_eq!(store.get_string(store::KEY_TIME_COLOR), "#FFFFFFFF");
        assert_eq!(store.get_string(store::KEY_DATE_COLOR), "#aadbdbdb");
        assert_eq!(store.get_string(store::KEY_TIME_FORMAT), "h:mm");
        assert_eq!(store.get_string(store::KEY_TEXT_FONT), "Sans");
        assert_eq!(store.get_int(store::KEY_POS_X), 0);
        assert_eq!(store.get_int(store::KEY_POS_Y), 0);
        assert!(!store.get_bool(store::KEY_RINGS));
        assert!(store.get_bool(store::KEY_EXISTANT));
    }

    #[test]
    fn test_seeding_is_one_time() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        let mut store = SettingsStore::open_at(path.clone()).unwrap();
        store.set_string(store::KEY_TIME_FORMAT, "hh:mm ap");
        store.flush().unwrap();

        // Re-opening must not clobber user edits with defaults
        let reopened = SettingsStore::open_at(path).unwrap();
        assert_eq!(reopened.get_string(store::KEY_TIME_FORMAT), "hh:mm ap");
    }

    #[test]
    fn test_zero_fallbacks_for_missing_and_malformed() {
        let (_dir, mut store) = open_temp();

        assert_eq!(store.get_int("no_such_key"), 0);
        assert!(!store.get_bool("no_such_key"));
        assert_eq!(store.get_string("no_such_key"), "");

        // Wrong-typed values also fall back silently
        store.set_string(store::KEY_INIT_WIDTH, "not a number");
        store.set_int(store::KEY_SHOW_DATE, 7);
        assert_eq!(store.get_int(store::KEY_INIT_WIDTH), 0);
        assert!(!store.get_bool(store::KEY_SHOW_DATE));
    }

    #[test]
    fn test_startup_load_normalizes_negative_position() {
        let (_dir, mut store) = open_temp();
        store.set_int(store::KEY_POS_X, -30);
        store.set_int(store::KEY_POS_Y, 42);

        let config = DisplayConfig::load(&store);
        assert_eq!(config.pos_x, 0);
        assert_eq!(config.pos_y, 42);
    }

    #[test]
    fn test_write_position_clamps_negative_to_one() {
        let (_dir, mut store) = open_temp();
        DisplayConfig::write_position(&mut store, -5, 42).unwrap();

        assert_eq!(store.get_int(store::KEY_POS_X), 1);
        assert_eq!(store.get_int(store::KEY_POS_Y), 42);
    }

    #[test]
    fn test_reload_touches_appearance_only() {
        let (_dir, mut store) = open_temp();
        let mut config = DisplayConfig::load(&store);
        assert_eq!(config.init_width, 180);
        assert!(!config.show_rings);

        // Simulate a preferences edit session
        store.set_int(store::KEY_INIT_WIDTH, 999);
        store.set_int(store::KEY_POS_X, 555);
        store.set_bool(store::KEY_RINGS, true);
        store.set_string(store::KEY_HOUR_COLOR, "#7F102030");
        store.set_string(store::KEY_TIME_FORMAT, "h:mm ap");
        store.set_bool(store::KEY_SHOW_DATE, false);

        config.reload(&store);

        // Geometry and position stay as loaded at startup
        assert_eq!(config.init_width, 180);
        assert_eq!(config.pos_x, 0);
        // Appearance fields reflect the edits
        assert!(config.show_rings);
        assert!(!config.show_date);
        assert_eq!(config.hour_color.argb32(), 0x7F102030);
        assert_eq!(config.time_format, "h:mm ap");
    }

    #[test]
    fn test_invalid_color_falls_back_to_default() {
        let (_dir, mut store) = open_temp();
        store.set_string(store::KEY_MINUTE_COLOR, "not-a-color");

        let config = DisplayConfig::load(&store);
        assert_eq!(config.minute_color.argb32(), 0x77DBDBDB);
    }

    #[test]
    fn test_corrupt_file_reseeds() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{{{ not json").unwrap();

        let store = SettingsStore::open_at(path).unwrap();
        assert!(store.get_bool(store::KEY_EXISTANT));
        assert_eq!(store.get_int(store::KEY_INIT_WIDTH), 180);
    }
}
