//! Primitive field codecs: big-endian integers, UTF-16BE names, packed dates,
//! and binary-coded decimal.

use alloc::string::String;

use chrono::{Days, NaiveDate, NaiveDateTime};
use tartan_bitfield::bitfield;
use thiserror::Error;

/// Capacity, in UTF-8 bytes, of a decoded name.
pub const NAME_CAPACITY: usize = 23;

/// A field read ran past the end of its slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Field needs {needed} bytes, found {found}.")]
pub struct Truncated {
    pub needed: usize,
    pub found: usize,
}

/// Read a big-endian `u16` from the start of a slice.
pub fn read_u16_be(r: &[u8]) -> Result<u16, Truncated> {
    let found = r.len();
    let bytes = r.first_chunk().ok_or(Truncated { needed: 2, found })?;
    Ok(u16::from_be_bytes(*bytes))
}

/// Read a big-endian `u32` from the start of a slice.
pub fn read_u32_be(r: &[u8]) -> Result<u32, Truncated> {
    let found = r.len();
    let bytes = r.first_chunk().ok_or(Truncated { needed: 4, found })?;
    Ok(u32::from_be_bytes(*bytes))
}

/// Transcode a zero-terminated UTF-16BE string to UTF-8.
///
/// Reads at most `max_units` code units, stopping early at a zero unit or at
/// the end of the slice. Output stops before any character that would take it
/// past [`NAME_CAPACITY`] bytes. Surrogate units are not paired; each is
/// replaced by U+FFFD.
pub fn decode_utf16be(r: &[u8], max_units: usize) -> String {
    let mut name = String::with_capacity(NAME_CAPACITY);

    let units = r
        .chunks_exact(2)
        .take(max_units)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .take_while(|&u| u != 0);

    for unit in units {
        let c = char::from_u32(unit.into()).unwrap_or(char::REPLACEMENT_CHARACTER);

        if name.len() + c.len_utf8() > NAME_CAPACITY {
            break;
        }

        name.push(c);
    }

    name
}

bitfield! {
    struct PackedDate(u32) {
        [0..6] minute: u8,
        [6..11] hour: u8,
        [11..16] day: u8,
        [16..20] month: u8,
        [20..31] year: u16,
    }
}

/// Decode a packed date bitfield.
///
/// Components outside their range are replaced rather than rejected: the year
/// must fall within 2006 to 2030 (else 2020), the month within 1 to 12 (else
/// January), the day within 1 to 31 (else the 1st), the hour within 0 to 23
/// and the minute within 0 to 59 (else zero). A day past the end of its month
/// rolls over into the next. Seconds are not stored and are always zero.
pub fn decode_packed_date(bits: u32) -> NaiveDateTime {
    let date = PackedDate(bits);

    let year = match date.year() {
        y @ 2006..=2030 => y,
        _ => 2020,
    };
    let month = match date.month() + 1 {
        m @ 1..=12 => m,
        _ => 1,
    };
    let day = match date.day() {
        d @ 1..=31 => d,
        _ => 1,
    };
    let hour = match date.hour() {
        h @ 0..=23 => h,
        _ => 0,
    };
    let minute = match date.minute() {
        m @ 0..=59 => m,
        _ => 0,
    };

    NaiveDate::from_ymd_opt(year.into(), month.into(), 1)
        .and_then(|d| d.checked_add_days(Days::new(u64::from(day) - 1)))
        .and_then(|d| d.and_hms_opt(hour.into(), minute.into(), 0))
        // Unreachable once every component is clamped.
        .unwrap_or_default()
}

/// Decode one byte of two binary-coded decimal digits.
///
/// Nibbles above nine are not rejected.
pub fn decode_bcd(b: u8) -> u8 {
    (b >> 4) * 10 + (b & 0xF)
}

/// Decode two bytes of four binary-coded decimal digits.
pub fn decode_bcd16(r: [u8; 2]) -> u16 {
    u16::from(decode_bcd(r[0])) * 100 + u16::from(decode_bcd(r[1]))
}
