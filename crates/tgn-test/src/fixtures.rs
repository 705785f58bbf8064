//! Test fixtures for common driver scenarios
//!
//! Two logical ports ("Port 1", "Port 2") bound to ports 1 and 2 of module 1
//! on chassis 10.0.0.1, plus typical statistics views.

use tgn_common::{LogicalPort, StatisticsTable};

use crate::fakes::{FakeReservation, FakeSession};

/// Reservation id used by the fixtures.
pub const RESERVATION_ID: &str = "0f5c7e52-3b1d-4c8e-9d8a-1f2e3a4b5c6d";

/// Configuration file path used by the fixtures.
pub const CONFIG_PATH: &str = "/configs/two_ports.ixncfg";

/// Chassis resource model of the fixture reservation.
pub const CHASSIS_MODEL: &str = "Ixia Chassis Shell 2G";

/// Ports declared by the two-port configuration.
pub fn two_port_config() -> Vec<LogicalPort> {
    vec![
        LogicalPort::new("Port 1", "::ixNet::OBJ-/vport:1"),
        LogicalPort::new("Port 2", "::ixNet::OBJ-/vport:2"),
    ]
}

/// A reservation holding the chassis and both named ports.
pub fn two_port_reservation() -> FakeReservation {
    FakeReservation::new(RESERVATION_ID)
        .with_resource("Ixia", CHASSIS_MODEL, "10.0.0.1")
        .with_port("Ixia/Module1/Port1", "10.0.0.1/1/1", "Port 1")
        .with_port("Ixia/Module1/Port2", "10.0.0.1/1/2", "Port 2")
}

/// A session loaded with the two-port configuration and both statistics
/// views.
pub fn two_port_session() -> FakeSession {
    FakeSession::new()
        .with_ports(two_port_config())
        .with_statistics("Port Statistics", port_statistics())
        .with_statistics("Flow Statistics", flow_statistics())
}

/// "Port Statistics" after a short run.
pub fn port_statistics() -> StatisticsTable {
    StatisticsTable::new(["Port Name", "Frames Tx.", "Valid Frames Rx.", "Line Speed"])
        .with_row(
            "Port 1",
            [
                ("Port Name", "Port 1"),
                ("Frames Tx.", "10000"),
                ("Valid Frames Rx.", "9998"),
                ("Line Speed", "10GE LAN"),
            ],
        )
        .with_row(
            "Port 2",
            [
                ("Port Name", "Port 2"),
                ("Frames Tx.", "10000"),
                ("Valid Frames Rx.", "10000"),
                ("Line Speed", "10GE LAN"),
            ],
        )
}

/// "Flow Statistics" with one traffic item in each direction.
pub fn flow_statistics() -> StatisticsTable {
    StatisticsTable::new(["Traffic Item", "Tx Frames", "Rx Frames", "Loss %"])
        .with_row(
            "Port 1-Port 2",
            [
                ("Traffic Item", "east"),
                ("Tx Frames", "5000"),
                ("Rx Frames", "4998"),
                ("Loss %", "0.040"),
            ],
        )
        .with_row(
            "Port 2-Port 1",
            [
                ("Traffic Item", "west"),
                ("Tx Frames", "5000"),
                ("Rx Frames", "5000"),
                ("Loss %", "0.000"),
            ],
        )
}
