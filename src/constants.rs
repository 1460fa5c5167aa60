//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// X11 protocol and rendering constants
pub mod x11 {
    /// Standard 32-bit color depth required for translucent windows
    pub const ARGB_DEPTH: u8 = 32;

    /// Override redirect flag for unmanaged popup windows (menu, tooltip)
    pub const OVERRIDE_REDIRECT: u32 = 1;

    /// _MOTIF_WM_HINTS flag selecting the decorations field
    pub const MOTIF_HINTS_DECORATIONS: u32 = 2;
}

/// Mouse button constants
pub mod mouse {
    /// Left mouse button number
    pub const BUTTON_LEFT: u8 = 1;
    /// Right mouse button number
    pub const BUTTON_RIGHT: u8 = 3;
}

/// Settings store location and keys
pub mod store {
    /// Directory under the user config dir
    pub const APP_DIR: &str = "arc-clock";

    /// Settings file name
    pub const FILENAME: &str = "settings.json";

    /// Sentinel key marking a fully seeded store
    pub const KEY_EXISTANT: &str = "Existant";

    pub const KEY_INIT_WIDTH: &str = "initWidth";
    pub const KEY_INIT_HEIGHT: &str = "initHeight";
    pub const KEY_SHOW_DATE: &str = "showDate";
    pub const KEY_HOUR_COLOR: &str = "hourColor";
    pub const KEY_MINUTE_COLOR: &str = "minuteColor";
    pub const KEY_TIME_COLOR: &str = "timeColor";
    pub const KEY_DATE_COLOR: &str = "dateColor";
    pub const KEY_TIME_FORMAT: &str = "timeFormat";
    pub const KEY_TEXT_FONT: &str = "textFont";
    pub const KEY_POS_X: &str = "posX";
    pub const KEY_POS_Y: &str = "posY";
    pub const KEY_RINGS: &str = "rings";
}

/// Default settings values (seeded on first run)
pub mod defaults {
    pub const INIT_WIDTH: i64 = 180;
    pub const INIT_HEIGHT: i64 = 180;
    pub const SHOW_DATE: bool = true;
    pub const HOUR_COLOR: &str = "#FFFFFFFF";
    pub const MINUTE_COLOR: &str = "#77dbdbdb";
    pub const TIME_COLOR: &str = "#FFFFFFFF";
    pub const DATE_COLOR: &str = "#aadbdbdb";
    pub const TIME_FORMAT: &str = "h:mm";
    pub const TEXT_FONT: &str = "Sans";
    pub const POS_X: i64 = 0;
    pub const POS_Y: i64 = 0;
    pub const RINGS: bool = false;

    /// Fonts probed when the configured family cannot be resolved
    pub const FONT_CANDIDATES: &[&str] = &[
        "DejaVu Sans",
        "Liberation Sans",
        "Noto Sans",
        "Cantarell",
        "Ubuntu",
    ];
}

/// Clock face geometry (spec'd against a square dial of side `min(w, h)`)
pub mod face {
    /// Arc stroke thickness is `side / ARC_THICKNESS_DIVISOR`
    pub const ARC_THICKNESS_DIVISOR: u16 = 30;

    /// Inset of the minute ring square from the widget edge, in pixels
    pub const MINUTE_ARC_OFFSET: u16 = 8;

    /// Time text size is `side / TIME_FONT_DIVISOR`
    pub const TIME_FONT_DIVISOR: f32 = 5.0;

    /// Date and weekday text size is `side / DATE_FONT_DIVISOR`
    pub const DATE_FONT_DIVISOR: f32 = 18.0;

    /// Time text size reduction when the format carries an AM/PM marker
    pub const MERIDIEM_FONT_ADJUST: f32 = 10.0;

    /// Further reduction when the time string overflows the inner diameter
    pub const OVERFLOW_FONT_ADJUST: f32 = 4.0;

    /// Slack subtracted from the inner diameter before the overflow check
    pub const OVERFLOW_SLACK: i32 = 4;
}

/// Redraw timer period
pub mod timer {
    use std::time::Duration;

    /// Wall-clock tick driving the repaint loop
    pub const TICK_PERIOD: Duration = Duration::from_secs(1);
}

/// Context menu and tooltip layout
pub mod popup {
    /// Menu/tooltip text size in pixels
    pub const TEXT_SIZE: f32 = 14.0;

    /// Horizontal padding around popup text
    pub const PADDING_X: u16 = 12;

    /// Vertical padding around each text row
    pub const PADDING_Y: u16 = 6;

    /// Popup background
    pub const BACKGROUND: u32 = 0xF0202020;

    /// Row highlight background
    pub const HIGHLIGHT: u32 = 0xF0404040;

    /// Popup text color
    pub const TEXT_COLOR: u32 = 0xFFEEEEEE;

    /// Offset of a popup from the pointer position
    pub const POINTER_OFFSET: i16 = 6;
}

/// User-facing strings
pub mod ui {
    /// WM_CLASS instance and class value
    pub const WM_CLASS: &[u8] = b"arc-clock\0arc-clock\0";

    /// Window title
    pub const WINDOW_TITLE: &str = "Arc Clock";

    /// Context menu entries, in display order
    pub const MENU_PREFERENCES: &str = "Preferences";
    pub const MENU_EXIT: &str = "Exit";

    /// Hover tooltip lines
    pub const TOOLTIP_LINES: &[&str] = &[
        "Drag the clock with the left mouse button.",
        "Use the right mouse button to open a context menu.",
    ];
}
