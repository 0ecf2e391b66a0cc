//! Decoder for a whole save image.

use alloc::vec::Vec;

use thiserror::Error;

use crate::model::SaveData;

use super::{
    Observer,
    layout::{MAX_PROFILES, PROFILE_SIZE},
    profile,
};

/// An error decoding a save image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// No slot held a profile.
    #[error("No profiles found in save file")]
    NoProfiles,
}

/// Decode every occupied profile slot of a save image.
///
/// Slots are read in order; a slot extending past the end of the image ends
/// the scan. Fails unless at least one profile was found.
pub fn decode<O: Observer + ?Sized>(r: &[u8], observer: &mut O) -> Result<SaveData, Error> {
    let mut profiles = Vec::new();

    for slot in 0..MAX_PROFILES {
        let offset = slot * PROFILE_SIZE;

        let Some(bytes) = r.get(offset..offset + PROFILE_SIZE) else {
            observer.slot_out_of_bounds(slot, offset, r.len());
            break;
        };

        match profile::decode(bytes, observer) {
            Some(profile) => {
                observer.profile(slot, &profile);
                profiles.push(profile);
            }
            None => observer.empty_slot(slot),
        }
    }

    if profiles.is_empty() {
        Err(Error::NoProfiles)?;
    }

    Ok(SaveData { profiles })
}
