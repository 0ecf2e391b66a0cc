#![no_std]

//! A decoder and sync service for Wii Fit body-test save data.
//!
//! The Wii Fit save format is undocumented. This crate reads user profiles
//! (name, height, birth date) and their body-test history (weight, BMI,
//! balance) from a raw save image, and serves the result to one remote client
//! at a time over a small request/response protocol.
//!
//! Most users should begin with [`avec::load`] to read a save through a
//! storage provider, and [`avec::serve`] to answer a single connection. The
//! pure pieces underneath (layouts, decoders, the response encoder, and the
//! session's finite-state machine) live in the [`sans`] module and perform no
//! I/O at all.
//!
//! Activity (exercise) records are not decoded. Their layout is not understood
//! well enough, so every profile reports an empty activity list.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `std`: enable storage-backed loading (default).
//! - `net`: enable the connection-driven session driver and TCP transport
//!   (default, implies `std`).

extern crate alloc;

#[cfg(feature = "std")]
pub mod avec;
pub mod model;
pub mod sans;

pub use model::{Activity, ActivityKind, Measurement, Profile, SaveData};
