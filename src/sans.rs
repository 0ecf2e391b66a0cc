//! Pure building blocks for decoding saves and running sync sessions.
//!
//! Nothing in this module performs I/O, sleeps, or logs. See [`crate::avec`]
//! for implementations that drive these pieces against storage and network
//! connections.
//!
//! # Decoding
//!
//! A save image is a run of fixed-size profile slots. [`save::decode`] walks
//! the slots, [`profile::decode`] reads one slot, and [`measurement`] yields
//! the body tests stored inside a slot. Field access goes through the
//! byte-for-byte layouts in [`layout`], each validated against the slot length
//! before any field is read.
//!
//! # Sessions
//!
//! A sync session is a finite-state machine. Every state is a token, and the
//! only way to reach another state is to consume the token through its
//! `advance` method, which returns the successor. The driver is responsible
//! for everything the machine does not represent:
//!
//! - Polling the connection, and feeding each result to the current state
//!   along with the time spent waiting.
//!
//! - Pausing between sends and between polls.
//!
//! - Releasing the connection once [`session::Closed`] is reached.
//!
//! Implementers are recommended to begin by studying and modifying the driver
//! in [`crate::avec::session`].

pub mod codec;
pub mod layout;
pub mod measurement;
pub mod profile;
pub mod response;
pub mod save;
pub mod session;

/// Receive diagnostic events while decoding.
///
/// Decoding is a pure function of the input bytes; observers see why the
/// decoder stopped or skipped something but cannot influence the result. The
/// default implementation of each method ignores the event.
#[allow(unused_variables)]
pub trait Observer {
    /// A profile slot held no name and was skipped.
    fn empty_slot(&mut self, slot: usize) {}
    /// A profile slot did not fit inside the save image.
    fn slot_out_of_bounds(&mut self, slot: usize, offset: usize, len: usize) {}
    /// A profile was decoded from a slot.
    fn profile(&mut self, slot: usize, profile: &crate::Profile) {}
    /// The measurement table ended at an implausible weight.
    fn implausible_weight(&mut self, index: usize, raw_weight: u16) {}
    /// The measurement table ran into the end of the profile slot.
    fn end_of_slot(&mut self, index: usize) {}
}

/// An observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Observer for Silent {}
