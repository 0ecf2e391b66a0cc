//! Byte layouts of the save format.
//!
//! Offsets follow the Wii Fit Plus body-test save. Another revision of the
//! format records measurements at a 16-byte stride with different date bits;
//! that revision is not supported, and nothing here tries to detect it.

use zerocopy::FromBytes;

/// Size of one profile slot.
pub const PROFILE_SIZE: usize = 0x9289;
/// Maximum number of profile slots in a save.
pub const MAX_PROFILES: usize = 8;

/// Offset of the measurement table within a profile slot.
pub const MEASUREMENT_OFFSET: usize = 0x3661;
/// Size of one measurement record.
pub const MEASUREMENT_SIZE: usize = 21;
/// Maximum number of measurement records per profile.
pub const MAX_MEASUREMENTS: usize = 1024;

/// Number of UTF-16 code units in a name.
pub const NAME_UNITS: usize = 10;

/// Offset of the weight within a measurement record.
pub const WEIGHT_OFFSET: usize = 4;
/// Lowest plausible weight, in tenths of a kilogram.
pub const MIN_RAW_WEIGHT: u16 = 300;
/// Highest plausible weight, in tenths of a kilogram.
pub const MAX_RAW_WEIGHT: u16 = 1500;

/// Leading bytes of a profile slot.
#[repr(C, packed)]
#[derive(FromBytes)]
pub struct ProfileHeader {
    _reserved: [u8; 8],
    /// UTF-16BE, zero-terminated if shorter than the field.
    pub name: [u8; NAME_UNITS * 2],
    _unknown: [u8; 3],
    pub height_cm: u8,
    /// Four binary-coded decimal digits.
    pub birth_year: [u8; 2],
    /// Two binary-coded decimal digits.
    pub birth_month: u8,
    /// Two binary-coded decimal digits.
    pub birth_day: u8,
}

pub const PROFILE_HEADER_SIZE: usize = 36;

impl ProfileHeader {
    /// Overlay the header on the start of a slot, if the slot is long enough.
    pub fn read(slot: &[u8]) -> Option<Self> {
        let bytes: &[u8; PROFILE_HEADER_SIZE] = slot.first_chunk()?;
        let header: Self = zerocopy::transmute!(*bytes);
        Some(header)
    }
}

/// One body-test record.
#[repr(C, packed)]
#[derive(FromBytes)]
pub struct MeasurementRecord {
    /// Packed date bitfield, big-endian.
    pub date: [u8; 4],
    /// Weight in tenths of a kilogram, big-endian.
    pub weight: [u8; 2],
    /// BMI in hundredths, big-endian.
    pub bmi: [u8; 2],
    /// Balance in tenths of a percent, big-endian.
    pub balance: [u8; 2],
    /// Non-zero when the test stored extended data.
    pub extended: u8,
    _reserved: [u8; 10],
}

impl MeasurementRecord {
    /// Overlay a record on the start of a slice, if the slice is long enough.
    pub fn read(r: &[u8]) -> Option<Self> {
        let bytes: &[u8; MEASUREMENT_SIZE] = r.first_chunk()?;
        let record: Self = zerocopy::transmute!(*bytes);
        Some(record)
    }
}
