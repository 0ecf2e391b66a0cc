//! Convenience interfaces for loading saves and serving sessions.
//!
//! The functions in this module drive the pure pieces of [`crate::sans`]
//! against real collaborators: a [`Storage`] provider holding the save file,
//! and (with the `net` feature) a [`net::Connection`] to a client.
//!
//! Loading and serving are deliberately separate steps. Read and decode the
//! save with [`load`], let the storage provider go, and only then bring up the
//! network and [`serve`] the decoded result.
//!
//! _Requires Cargo feature `std`._

pub mod load;
#[cfg(feature = "net")]
pub mod net;
#[cfg(feature = "net")]
pub mod session;
pub mod storage;

pub use load::{Error, describe, load, read};
#[cfg(feature = "net")]
pub use session::{Respond, serve};
pub use storage::{FsStorage, SAVE_PATHS, Storage, probe};

use tracing::debug;

use crate::{Profile, sans::Observer};

/// An observer forwarding decoder events to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn empty_slot(&mut self, slot: usize) {
        debug!(slot, "empty profile slot");
    }

    fn slot_out_of_bounds(&mut self, slot: usize, offset: usize, len: usize) {
        debug!(slot, offset, len, "profile slot extends past end of save");
    }

    fn profile(&mut self, slot: usize, profile: &Profile) {
        debug!(
            slot,
            name = %profile.name,
            measurements = profile.measurements.len(),
            "decoded profile"
        );
    }

    fn implausible_weight(&mut self, index: usize, raw_weight: u16) {
        debug!(index, raw_weight, "measurement table ends at implausible weight");
    }

    fn end_of_slot(&mut self, index: usize) {
        debug!(index, "measurement table ends at end of slot");
    }
}
