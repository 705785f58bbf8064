//! Test infrastructure for traffic-generator drivers
//!
//! Provides:
//! - In-memory IxNetwork client and session with call recording
//! - In-memory reservation with output and attachment capture
//! - Fixtures for a two-port reservation and typical statistics views
//! - Verification helpers over recorded session calls

pub mod fakes;
pub mod fixtures;
mod verification;

pub use fakes::{FakeIxnClient, FakeReservation, FakeSession, SessionCall};
pub use verification::*;
