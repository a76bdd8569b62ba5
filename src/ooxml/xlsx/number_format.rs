//! Number format codes and the textual rendering of numeric cell values.
//!
//! Numbers read back the way a Python client of the workbook would print
//! them: integers verbatim, floats in shortest round-trip form, and serial
//! dates as `YYYY-MM-DD HH:MM:SS` when the cell's format is a date format.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

/// First id available to custom number formats.
pub const FIRST_CUSTOM_ID: u32 = 164;

/// How a format code displays a numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    DateTime,
    /// Elapsed time such as `[h]:mm:ss`
    Duration,
}

/// Classify a format code, looking only at its first section.
pub fn classify(format: &str) -> ValueKind {
    let mut escaped = false;
    let mut is_quote = false;
    let mut brackets = 0u8;
    let mut prev = ' ';
    let mut hms = false;
    let mut ap = false;

    for s in format.chars() {
        match (s, escaped, is_quote, ap, brackets) {
            (_, true, ..) => escaped = false,
            ('_' | '\\' | '*', ..) => escaped = true,
            ('"', _, true, _, _) => is_quote = false,
            (_, _, true, _, _) => (),
            ('"', _, _, _, _) => is_quote = true,
            (';', ..) => return ValueKind::Number,
            ('[', ..) => brackets += 1,
            (']', .., 1) if hms => return ValueKind::Duration,
            (']', ..) => brackets = brackets.saturating_sub(1),
            ('a' | 'A', _, _, false, 0) => ap = true,
            ('p' | 'm' | '/' | 'P' | 'M', _, _, true, 0) => return ValueKind::DateTime,
            ('d' | 'm' | 'h' | 'y' | 's' | 'D' | 'M' | 'H' | 'Y' | 'S', _, _, false, 0) => {
                return ValueKind::DateTime;
            },
            _ => {
                if !(hms && s.eq_ignore_ascii_case(&prev)) {
                    hms = prev == '[' && matches!(s, 'm' | 'h' | 's' | 'M' | 'H' | 'S');
                }
            },
        }
        prev = s;
    }
    ValueKind::Number
}

/// Format code of a built-in number format id.
pub fn builtin_format_code(id: u32) -> Option<&'static str> {
    BUILTIN_FORMATS
        .iter()
        .find(|(builtin, _)| *builtin == id)
        .map(|(_, code)| *code)
}

/// Built-in id for a format code, if Excel predefines it.
pub fn builtin_format_id(code: &str) -> Option<u32> {
    BUILTIN_FORMATS
        .iter()
        .find(|(_, builtin)| *builtin == code)
        .map(|(id, _)| *id)
}

const BUILTIN_FORMATS: &[(u32, &str)] = &[
    (0, "General"),
    (1, "0"),
    (2, "0.00"),
    (3, "#,##0"),
    (4, "#,##0.00"),
    (9, "0%"),
    (10, "0.00%"),
    (11, "0.00E+00"),
    (12, "# ?/?"),
    (13, "# ??/??"),
    (14, "mm-dd-yy"),
    (15, "d-mmm-yy"),
    (16, "d-mmm"),
    (17, "mmm-yy"),
    (18, "h:mm AM/PM"),
    (19, "h:mm:ss AM/PM"),
    (20, "h:mm"),
    (21, "h:mm:ss"),
    (22, "m/d/yy h:mm"),
    (37, "#,##0 ;(#,##0)"),
    (38, "#,##0 ;[Red](#,##0)"),
    (39, "#,##0.00;(#,##0.00)"),
    (40, "#,##0.00;[Red](#,##0.00)"),
    (45, "mm:ss"),
    (46, "[h]:mm:ss"),
    (47, "mmss.0"),
    (48, "##0.0E+0"),
    (49, "@"),
];

/// Render the raw text of a numeric `<v>` for display.
///
/// Values without a decimal point or exponent are integers and come back
/// unchanged; anything else is a float.
pub fn render_number(raw: &str, kind: ValueKind) -> String {
    let raw = raw.trim();
    let is_float = raw.contains(['.', 'e', 'E']);
    if !is_float && kind == ValueKind::Number {
        return match atoi_simd::parse::<i64>(raw.as_bytes()) {
            Ok(n) => itoa::Buffer::new().format(n).to_string(),
            Err(_) => raw.to_string(),
        };
    }
    let Ok(value) = raw.parse::<f64>() else {
        return raw.to_string();
    };
    match kind {
        ValueKind::Number => float_repr(value),
        ValueKind::DateTime => serial_to_datetime(value).unwrap_or_else(|| float_repr(value)),
        ValueKind::Duration => serial_to_duration(value),
    }
}

/// Shortest round-trip float text using exponent notation outside
/// `1e-4 <= |v| < 1e16`, e.g. `2.0`, `0.001`, `1e-05`, `1.5e+20`.
pub fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return (if value > 0.0 { "inf" } else { "-inf" }).to_string();
    }
    if value == 0.0 {
        return (if value.is_sign_negative() { "-0.0" } else { "0.0" }).to_string();
    }

    let sci = format!("{:e}", value);
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if (-4..16).contains(&exponent) {
        let plain = format!("{}", value);
        if plain.contains('.') {
            plain
        } else {
            plain + ".0"
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    }
}

fn epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)
}

/// Serial date in the 1900 date system.
///
/// Serials below 1 are times of day. Serials below 60 are shifted by a
/// day to undo the fictitious 1900-02-29.
fn serial_to_datetime(serial: f64) -> Option<String> {
    let days = serial.floor();
    let millis = ((serial - days) * 86_400_000.0).round() as i64;
    let time = Duration::try_milliseconds(millis)?;

    if (0.0..1.0).contains(&serial) && millis < 86_400_000 {
        let moment = epoch()?.checked_add_signed(time)?;
        return Some(format_clock(
            moment.hour(),
            moment.minute(),
            moment.second(),
            moment.nanosecond(),
        ));
    }

    let mut days = days as i64;
    if serial > 0.0 && serial < 60.0 {
        days += 1;
    }
    let moment = epoch()?
        .checked_add_signed(Duration::try_days(days)?)?
        .checked_add_signed(time)?;
    let mut out = moment.format("%Y-%m-%d ").to_string();
    out.push_str(&format_clock(
        moment.hour(),
        moment.minute(),
        moment.second(),
        moment.nanosecond(),
    ));
    Some(out)
}

fn format_clock(hour: u32, minute: u32, second: u32, nanos: u32) -> String {
    let micros = nanos / 1_000;
    if micros == 0 {
        format!("{:02}:{:02}:{:02}", hour, minute, second)
    } else {
        format!("{:02}:{:02}:{:02}.{:06}", hour, minute, second, micros)
    }
}

/// Elapsed time as `[D day[s], ]H:MM:SS`.
fn serial_to_duration(serial: f64) -> String {
    let total_millis = (serial * 86_400_000.0).round() as i64;
    let negative = total_millis < 0;
    let total_millis = total_millis.abs();
    let days = total_millis / 86_400_000;
    let rest = total_millis % 86_400_000;
    let (hours, rest) = (rest / 3_600_000, rest % 3_600_000);
    let (minutes, rest) = (rest / 60_000, rest % 60_000);
    let (seconds, millis) = (rest / 1_000, rest % 1_000);

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if days > 0 {
        out.push_str(&format!("{} day{}, ", days, if days == 1 { "" } else { "s" }));
    }
    out.push_str(&format!("{}:{:02}:{:02}", hours, minutes, seconds));
    if millis > 0 {
        out.push_str(&format!(".{:06}", millis * 1_000));
    }
    out
}
