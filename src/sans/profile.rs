//! Decoder for a single profile slot.

use alloc::vec::Vec;

use crate::model::Profile;

use super::{
    Observer,
    codec::{decode_bcd, decode_bcd16, decode_utf16be},
    layout::{NAME_UNITS, ProfileHeader},
    measurement::Measurements,
};

/// Decode a profile slot.
///
/// Returns `None` for an unused slot, recognised by an empty name, or for a
/// slot too short to hold a header. The birth date is not validated.
pub fn decode<O: Observer + ?Sized>(slot: &[u8], observer: &mut O) -> Option<Profile> {
    let header = ProfileHeader::read(slot)?;

    let name = decode_utf16be(&header.name, NAME_UNITS);
    if name.is_empty() {
        return None;
    }

    let measurements: Vec<_> = Measurements::new(slot, observer).collect();

    Some(Profile {
        name,
        height_cm: header.height_cm,
        birth_year: decode_bcd16(header.birth_year),
        birth_month: decode_bcd(header.birth_month),
        birth_day: decode_bcd(header.birth_day),
        measurements,
        activities: Vec::new(),
    })
}
