//! Hex color parameters.
//!
//! Requests carry colors as `RRGGBB`, optionally prefixed with `#`.
//! WordprocessingML and DrawingML store the six digits as is; SpreadsheetML
//! stores an `AARRGGBB` value.

use crate::common::error::{Error, Result};

/// Normalize an `RRGGBB` color to upper case without the `#` prefix.
pub fn parse_rgb(value: &str) -> Result<String> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::invalid(format!(
            "color must be 6 hex digits (RRGGBB), got '{}'",
            value
        )));
    }
    Ok(hex.to_ascii_uppercase())
}

/// Normalize an `RRGGBB` or `AARRGGBB` color to `AARRGGBB`; six digit
/// colors are made opaque.
pub fn parse_argb(value: &str) -> Result<String> {
    let hex = value.trim().trim_start_matches('#');
    match hex.len() {
        8 if hex.bytes().all(|b| b.is_ascii_hexdigit()) => Ok(hex.to_ascii_uppercase()),
        _ => parse_rgb(value).map(|rgb| format!("FF{}", rgb)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rgb() {
        assert_eq!(parse_rgb("#ff0000").unwrap(), "FF0000");
        assert_eq!(parse_rgb("00aa11").unwrap(), "00AA11");
        assert!(parse_rgb("red").is_err());
        assert!(parse_rgb("#12345").is_err());
    }

    #[test]
    fn test_parse_argb() {
        assert_eq!(parse_argb("ff0000").unwrap(), "FFFF0000");
        assert_eq!(parse_argb("#80112233").unwrap(), "80112233");
        assert!(matches!(parse_argb("xyz"), Err(Error::InvalidArgument(_))));
    }
}
