//! Decoded save records.
//!
//! Records are built once per decode pass and are not mutated afterward, so a
//! [`SaveData`] can be shared read-only across any number of sessions.

use alloc::{string::String, vec::Vec};

use chrono::NaiveDateTime;

/// One body-composition sample from a body test.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Time of the test, to the minute.
    pub timestamp: NaiveDateTime,
    pub weight_kg: f32,
    pub bmi: f32,
    /// Centre-of-balance reading, where 50.0 is perfectly centred.
    pub balance_percent: f32,
    pub has_extended_data: bool,
}

/// Category of an exercise activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Yoga,
    Strength,
    Aerobics,
    Balance,
    Training,
}

impl ActivityKind {
    /// Label used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yoga => "yoga",
            Self::Strength => "strength",
            Self::Aerobics => "aerobics",
            Self::Balance => "balance",
            Self::Training => "training",
        }
    }
}

/// One exercise activity.
///
/// The activity table in the save is not decoded, so no profile produced by
/// this crate holds any. The type exists so the wire format is complete.
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub timestamp: NaiveDateTime,
    pub kind: ActivityKind,
    pub name: String,
    pub duration_min: u16,
    pub calories: u16,
    pub score: u16,
}

/// One user's identity and measurement history.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    /// Mii name, at most 23 bytes of UTF-8. Never empty.
    pub name: String,
    pub height_cm: u8,
    pub birth_year: u16,
    pub birth_month: u8,
    pub birth_day: u8,
    /// Measurements in stored order.
    pub measurements: Vec<Measurement>,
    /// Always empty.
    pub activities: Vec<Activity>,
}

/// A successfully decoded save, holding at least one profile.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveData {
    /// Profiles in slot order, skipping empty slots.
    pub profiles: Vec<Profile>,
}
