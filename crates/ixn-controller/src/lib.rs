//! IxNetwork controller driver for CloudShell.
//!
//! This crate implements the driver behind the IxNetwork controller service
//! of a CloudShell reservation. It loads traffic configurations on an
//! IxNetwork API server, reserves the configuration's ports on the chassis
//! ports of the reservation, drives protocols and traffic, and reports
//! statistics back to the reservation.
//!
//! # Responsibilities
//!
//! - Bind configuration ports to reservation ports by logical name
//! - Normalize reservation addresses to `chassis/module/port`
//! - Render statistics views as JSON or CSV
//! - Deliver statistics and quick test results to the reservation
//! - Own the IxNetwork session from `initialize` to `cleanup`
//!
//! # Collaborators
//!
//! | Trait | Role |
//! |-------|------|
//! | [`tgn_common::IxnClient`] | Opens IxNetwork sessions |
//! | [`tgn_common::IxnSession`] | Issues commands on an open session |
//! | [`tgn_common::ReservationApi`] | Reservation inventory and output |
//!
//! # Example
//!
//! ```ignore
//! use ixn_controller::{ControllerAttributes, DriverConfig, IxnController};
//!
//! let controller = IxnController::new(client, reservation, DriverConfig::default());
//! controller.initialize(&ControllerAttributes::new(install_path, "NA", "")?).await?;
//! controller.load_config(reservation_id, "/configs/bgp.ixncfg").await?;
//! controller.start_traffic(true).await?;
//! let csv = controller.get_statistics(reservation_id, "Port Statistics", "csv").await?;
//! controller.cleanup().await;
//! ```

pub mod address;
pub mod config;
mod controller;
mod handler;
pub mod reconcile;
pub mod snapshot;
pub mod statistics;

pub use address::normalize_physical_address;
pub use config::{ControllerAttributes, DriverConfig, DEFAULT_CONFIG_PATH};
pub use controller::IxnController;
pub use handler::{parse_blocking, IxnHandler};
pub use reconcile::reconcile;
pub use snapshot::ReservationSnapshot;
pub use statistics::{format_statistics, format_statistics_as, StatisticsDelivery};
