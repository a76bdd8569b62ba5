//! Unit conversion utilities.
//!
//! Drawing coordinates are English Metric Units (EMU); Word page geometry
//! is in twentieths of a point (twips); Word font sizes are half points.

pub const EMUS_PER_INCH: i64 = 914_400;
pub const EMUS_PER_PT: i64 = 12_700;
pub const EMUS_PER_TWIP: i64 = 635;
pub const TWIPS_PER_INCH: i64 = 1_440;

/// Inches (request unit for slide geometry) to EMU, rounded.
#[inline]
pub fn inches_to_emu(inches: f64) -> i64 {
    (inches * EMUS_PER_INCH as f64).round() as i64
}

#[inline]
pub fn emu_to_inches(emu: i64) -> f64 {
    emu as f64 / EMUS_PER_INCH as f64
}

#[inline]
pub fn emu_to_twip(emu: i64) -> i64 {
    (emu as f64 / EMUS_PER_TWIP as f64).round() as i64
}

/// Points to the half-point value of `w:sz`.
#[inline]
pub fn pt_to_half_points(pt: f64) -> i64 {
    (pt * 2.0).round() as i64
}

/// Points to hundredths of a point, as used by DrawingML `sz`.
#[inline]
pub fn pt_to_centipoints(pt: f64) -> i64 {
    (pt * 100.0).round() as i64
}
