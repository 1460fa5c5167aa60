//! Qt-style time format interpretation
//!
//! The settings store carries time format patterns in the Qt convention
//! ("h:mm", "hh:mm ap", ...). This module expands them against a wall-clock
//! time. Supported tokens:
//!
//! - `hh` / `h`  hour, two digits / no leading zero; 12-hour when the format
//!   also carries a meridiem token, 24-hour otherwise
//! - `HH` / `H`  hour, always 24-hour
//! - `mm` / `m`  minute
//! - `ss` / `s`  second
//! - `ap` / `AP` meridiem marker, lower / upper case
//!
//! Everything else is copied through verbatim.

use chrono::Timelike;

/// True when the pattern contains a meridiem token (selects 12-hour `h`)
fn has_meridiem(format: &str) -> bool {
    format.contains("ap") || format.contains("AP")
}

/// True when the pattern ends with an AM/PM marker; the renderer shrinks the
/// time font to make room for the suffix
pub fn has_meridiem_suffix(format: &str) -> bool {
    format.ends_with('p') || format.ends_with('P')
}

/// Render `time` according to the Qt-style `format` pattern
pub fn format_time<T: Timelike>(format: &str, time: &T) -> String {
    let hour24 = time.hour();
    let (is_pm, hour12) = time.hour12();
    let twelve_hour = has_meridiem(format);

    let hour = if twelve_hour { hour12 } else { hour24 };

    let mut out = String::with_capacity(format.len() + 4);
    let chars: Vec<char> = format.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let pair = (chars[i], chars.get(i + 1).copied());
        match pair {
            ('h', Some('h')) | ('H', Some('H')) => {
                let value = if chars[i] == 'H' { hour24 } else { hour };
                out.push_str(&format!("{:02}", value));
                i += 2;
            }
            ('h', _) => {
                out.push_str(&hour.to_string());
                i += 1;
            }
            ('H', _) => {
                out.push_str(&hour24.to_string());
                i += 1;
            }
            ('m', Some('m')) => {
                out.push_str(&format!("{:02}", time.minute()));
                i += 2;
            }
            ('m', _) => {
                out.push_str(&time.minute().to_string());
                i += 1;
            }
            ('s', Some('s')) => {
                out.push_str(&format!("{:02}", time.second()));
                i += 2;
            }
            ('s', _) => {
                out.push_str(&time.second().to_string());
                i += 1;
            }
            ('a', Some('p')) => {
                out.push_str(if is_pm { "pm" } else { "am" });
                i += 2;
            }
            ('A', Some('P')) => {
                out.push_str(if is_pm { "PM" } else { "AM" });
                i += 2;
            }
            (other, _) => {
                out.push(other);
                i += 1;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn at(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn test_default_format_is_24_hour() {
        assert_eq!(format_time("h:mm", &at(18, 15, 0)), "18:15");
        assert_eq!(format_time("h:mm", &at(3, 5, 0)), "3:05");
        assert_eq!(format_time("h:mm", &at(0, 0, 0)), "0:00");
    }

    #[test]
    fn test_meridiem_selects_12_hour() {
        assert_eq!(format_time("h:mm ap", &at(18, 15, 0)), "6:15 pm");
        assert_eq!(format_time("h:mm AP", &at(0, 30, 0)), "12:30 AM");
        assert_eq!(format_time("hh:mm ap", &at(9, 5, 0)), "09:05 am");
        assert_eq!(format_time("h:mm ap", &at(12, 0, 0)), "12:00 pm");
    }

    #[test]
    fn test_explicit_24_hour_tokens() {
        assert_eq!(format_time("HH:mm:ss", &at(6, 7, 8)), "06:07:08");
        assert_eq!(format_time("H:mm ap", &at(18, 15, 0)), "18:15 pm");
    }

    #[test]
    fn test_literals_pass_through() {
        assert_eq!(format_time("h.mm", &at(10, 52, 10)), "10.52");
        assert_eq!(format_time("", &at(1, 2, 3)), "");
    }

    #[test]
    fn test_meridiem_suffix_detection() {
        assert!(has_meridiem_suffix("h:mm ap"));
        assert!(has_meridiem_suffix("h:mm AP"));
        assert!(!has_meridiem_suffix("h:mm"));
        assert!(!has_meridiem_suffix("ap h:mm"));
    }
}
