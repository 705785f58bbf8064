//! Collaborator traits.
//!
//! The traffic-generator client and the reservation service are external
//! systems; the driver only talks to them through these traits.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::TgnResult;
use crate::types::{LogicalPort, ReservationResource, StatisticsTable, StatisticsView};

/// Entry point to the traffic-generator client library.
///
/// Connecting yields an [`IxnSession`], which is exclusively owned by the
/// caller until it is disconnected.
#[async_trait]
pub trait IxnClient: Send + Sync {
    /// The session type produced by [`IxnClient::connect`].
    type Session: IxnSession;

    /// Connects to the API server at `address:port` using the client
    /// installed under `install_path`.
    async fn connect(
        &self,
        install_path: &str,
        address: &str,
        port: u16,
    ) -> TgnResult<Self::Session>;
}

/// An open session against the traffic-generator API server.
///
/// Failures are reported as [`crate::TgnError::VendorSession`].
#[async_trait]
pub trait IxnSession: Send {
    /// Loads a configuration file on the API server.
    async fn load_config(&mut self, path: &str) -> TgnResult<()>;

    /// Lists the ports declared by the loaded configuration.
    async fn get_ports(&mut self) -> TgnResult<Vec<LogicalPort>>;

    /// Connects a logical port to a physical `chassis/module/port` address.
    async fn reserve(
        &mut self,
        port: &LogicalPort,
        physical_address: &str,
        force: bool,
        wait_for_up: bool,
    ) -> TgnResult<()>;

    /// Disconnects a logical port from its physical port.
    async fn release(&mut self, port: &LogicalPort) -> TgnResult<()>;

    /// Returns true if the port's link is up.
    async fn port_is_up(&mut self, port: &LogicalPort) -> TgnResult<bool>;

    /// Sends ARP/NS for all interfaces.
    async fn send_arp(&mut self) -> TgnResult<()>;

    async fn protocols_start(&mut self) -> TgnResult<()>;

    async fn protocols_stop(&mut self) -> TgnResult<()>;

    /// Regenerates and applies all L2/3 traffic items.
    async fn traffic_apply(&mut self) -> TgnResult<()>;

    /// Starts L2/3 traffic. When `blocking`, returns once traffic stops.
    async fn traffic_start(&mut self, blocking: bool) -> TgnResult<()>;

    async fn traffic_stop(&mut self) -> TgnResult<()>;

    /// Reads the current content of a statistics view.
    async fn read_statistics(&mut self, view: &StatisticsView) -> TgnResult<StatisticsTable>;

    async fn quick_test_apply(&mut self, name: &str) -> TgnResult<()>;

    /// Runs a quick test and returns its result string.
    async fn quick_test_start(
        &mut self,
        name: &str,
        blocking: bool,
        timeout: Duration,
    ) -> TgnResult<String>;

    /// Closes the session.
    async fn disconnect(&mut self) -> TgnResult<()>;
}

/// The lab reservation and inventory service.
///
/// Failures are reported as [`crate::TgnError::Reservation`].
#[async_trait]
pub trait ReservationApi: Send + Sync {
    /// Lists all resources attached to a reservation.
    async fn get_reservation_details(
        &self,
        reservation_id: &str,
    ) -> TgnResult<Vec<ReservationResource>>;

    /// Reads an attribute of a resource. Unset attributes read as empty.
    async fn get_attribute_value(&self, resource: &str, attribute: &str) -> TgnResult<String>;

    /// Appends a message to the reservation output window.
    async fn write_message_to_reservation_output(
        &self,
        reservation_id: &str,
        message: &str,
    ) -> TgnResult<()>;

    /// Attaches a file to the reservation.
    async fn upload_file(
        &self,
        reservation_id: &str,
        filename: &str,
        content: &[u8],
    ) -> TgnResult<()>;
}
