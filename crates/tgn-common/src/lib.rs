//! Common infrastructure for CloudShell traffic-generator drivers.
//!
//! This crate provides what the driver and its test fixtures share:
//!
//! - [`error`]: Error types for driver operations
//! - [`types`]: Ports, bindings and statistics tables
//! - [`api`]: Traits for the traffic-generator client and the reservation
//!   service
//! - [`attributes`]: Attribute and model names used by the shells
//!
//! # Architecture
//!
//! A driver command follows this pattern:
//!
//! 1. Issue the request against the open [`IxnSession`]
//! 2. Read reservation state through [`ReservationApi`] when needed
//! 3. Write results back to the reservation output or as an attachment
//!
//! Both collaborators are black boxes to the driver; tests replace them with
//! in-memory fakes.

pub mod api;
pub mod attributes;
pub mod error;
pub mod types;

// Re-export commonly used items at crate root
pub use api::{IxnClient, IxnSession, ReservationApi};
pub use error::{TgnError, TgnResult};
pub use types::{
    LogicalPort, OutputKind, PortBinding, ReservationPort, ReservationResource, StatisticsEntry,
    StatisticsRow, StatisticsTable, StatisticsView,
};
