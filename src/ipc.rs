//! IPC message types between the clock widget and the preferences surface
//!
//! The clock creates a one-shot server and passes its name to the spawned
//! preferences process, which connects and pushes notifications back.

use serde::{Deserialize, Serialize};

/// Messages sent from the preferences surface to the clock
#[derive(Debug, Serialize, Deserialize)]
pub enum PrefsMessage {
    /// Preferences process connected to the clock's IPC server
    Connected,
    /// The user committed edits to the settings store; the clock should
    /// re-read appearance settings and repaint
    SettingsUpdated,
    /// Preferences window closed
    Closed,
}
