//! Attribute, model and view names used by CloudShell traffic-generator
//! shells.

/// Resource model of traffic-generator ports in a reservation.
pub const TRAFFIC_GENERATOR_PORT_MODEL: &str = "Generic Traffic Generator Port";

/// Port attribute holding the user-assigned logical name.
pub const LOGICAL_NAME_ATTRIBUTE: &str = "Logical Name";

/// Statistics view handled as per-flow statistics.
pub const FLOW_STATISTICS_VIEW: &str = "Flow Statistics";

/// Controller address used when none is configured.
pub const DEFAULT_CONTROLLER_ADDRESS: &str = "localhost";

/// Controller TCP port used when none is configured.
pub const DEFAULT_CONTROLLER_PORT: u16 = 8009;

/// Attributes of the controller service resource.
pub mod resource {
    /// Path to the installed IxNetwork client.
    pub const CLIENT_INSTALL_PATH: &str = "Client Install Path";

    /// IxNetwork API server address.
    pub const CONTROLLER_ADDRESS: &str = "Controller Address";

    /// IxNetwork API server TCP port.
    pub const CONTROLLER_TCP_PORT: &str = "Controller TCP Port";
}
