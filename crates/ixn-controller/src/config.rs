//! Driver configuration.
//!
//! Two sources feed the driver:
//!
//! - [`ControllerAttributes`]: the attributes of the controller service
//!   resource (install path, controller address and port), read at
//!   `initialize` time.
//! - [`DriverConfig`]: driver policies loaded from a TOML file. Missing
//!   sections and fields fall back to defaults.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use tgn_common::attributes::{
    resource, DEFAULT_CONTROLLER_ADDRESS, DEFAULT_CONTROLLER_PORT, LOGICAL_NAME_ATTRIBUTE,
    TRAFFIC_GENERATOR_PORT_MODEL,
};
use tgn_common::{TgnError, TgnResult};

use crate::statistics::StatisticsDelivery;

/// Default location of the driver configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/cloudshell/ixn-controller.toml";

/// Connection settings of the controller service resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerAttributes {
    /// Path to the installed IxNetwork client.
    pub client_install_path: String,
    /// API server address.
    pub controller_address: String,
    /// API server TCP port.
    pub controller_port: u16,
}

impl ControllerAttributes {
    /// Builds attributes from raw string values.
    ///
    /// `"NA"` or an empty address means `localhost`, and an empty port means
    /// 8009.
    pub fn new(install_path: &str, address: &str, port: &str) -> TgnResult<Self> {
        Ok(Self {
            client_install_path: install_path.trim().to_string(),
            controller_address: controller_host(address),
            controller_port: controller_port(port)?,
        })
    }

    /// Builds attributes from the resource attribute map.
    pub fn from_resource_attributes(attributes: &HashMap<String, String>) -> TgnResult<Self> {
        let get = |name: &str| attributes.get(name).map(String::as_str).unwrap_or("");
        Self::new(
            get(resource::CLIENT_INSTALL_PATH),
            get(resource::CONTROLLER_ADDRESS),
            get(resource::CONTROLLER_TCP_PORT),
        )
    }
}

fn controller_host(address: &str) -> String {
    let address = address.trim();
    if address.is_empty() || address.eq_ignore_ascii_case("na") {
        DEFAULT_CONTROLLER_ADDRESS.to_string()
    } else {
        address.to_string()
    }
}

fn controller_port(port: &str) -> TgnResult<u16> {
    let port = port.trim();
    if port.is_empty() {
        return Ok(DEFAULT_CONTROLLER_PORT);
    }
    match port.parse::<u16>() {
        Ok(0) => Err(TgnError::invalid_config(
            resource::CONTROLLER_TCP_PORT,
            "port must be > 0",
        )),
        Ok(p) => Ok(p),
        Err(e) => Err(TgnError::invalid_config(
            resource::CONTROLLER_TCP_PORT,
            format!("'{}' is not a TCP port: {}", port, e),
        )),
    }
}

/// How reservation ports are discovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationSettings {
    /// Resource models treated as traffic-generator ports
    #[serde(default = "default_port_models")]
    pub port_models: Vec<String>,

    /// Port attribute holding the logical name
    #[serde(default = "default_logical_name_attribute")]
    pub logical_name_attribute: String,
}

/// Port reservation policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSettings {
    /// Release all configuration ports before reserving
    #[serde(default = "default_release_before_reserve")]
    pub release_before_reserve: bool,

    /// Wait for every reserved port to report link up
    #[serde(default)]
    pub wait_for_up: bool,

    /// Bound on the link-up wait, in seconds
    #[serde(default = "default_up_timeout")]
    pub up_timeout_secs: u64,

    /// Link state poll interval, in milliseconds
    #[serde(default = "default_up_poll_interval")]
    pub up_poll_interval_ms: u64,
}

/// Statistics reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSettings {
    /// Where rendered statistics are forwarded
    #[serde(default)]
    pub delivery: StatisticsDelivery,
}

/// Quick test execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickTestSettings {
    /// Bound on a blocking quick test run, in seconds
    #[serde(default = "default_quick_test_timeout")]
    pub timeout_secs: u64,
}

/// Complete driver configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default)]
    pub reservation: ReservationSettings,

    #[serde(default)]
    pub ports: PortSettings,

    #[serde(default)]
    pub statistics: StatisticsSettings,

    #[serde(default)]
    pub quick_test: QuickTestSettings,
}

// Default functions
fn default_port_models() -> Vec<String> {
    vec![
        TRAFFIC_GENERATOR_PORT_MODEL.to_string(),
        "Ixia Chassis Shell 2G.GenericTrafficGeneratorPort".to_string(),
        "PerfectStorm Chassis Shell 2G.GenericTrafficGeneratorPort".to_string(),
    ]
}

fn default_logical_name_attribute() -> String {
    LOGICAL_NAME_ATTRIBUTE.to_string()
}

fn default_release_before_reserve() -> bool {
    true
}

fn default_up_timeout() -> u64 {
    60
}

fn default_up_poll_interval() -> u64 {
    1000
}

fn default_quick_test_timeout() -> u64 {
    24 * 60 * 60
}

// Default implementations
impl Default for ReservationSettings {
    fn default() -> Self {
        Self {
            port_models: default_port_models(),
            logical_name_attribute: default_logical_name_attribute(),
        }
    }
}

impl Default for PortSettings {
    fn default() -> Self {
        Self {
            release_before_reserve: default_release_before_reserve(),
            wait_for_up: false,
            up_timeout_secs: default_up_timeout(),
            up_poll_interval_ms: default_up_poll_interval(),
        }
    }
}

impl Default for QuickTestSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_quick_test_timeout(),
        }
    }
}

impl PortSettings {
    /// Get link-up timeout as Duration
    pub fn up_timeout(&self) -> Duration {
        Duration::from_secs(self.up_timeout_secs)
    }

    /// Get link state poll interval as Duration
    pub fn up_poll_interval(&self) -> Duration {
        Duration::from_millis(self.up_poll_interval_ms)
    }
}

impl QuickTestSettings {
    /// Get quick test timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl DriverConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> TgnResult<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => {
                let config: Self = toml::from_str(&content).map_err(|e| {
                    TgnError::invalid_config(
                        path.display().to_string(),
                        format!("Failed to parse config file: {}", e),
                    )
                })?;
                config.validate()?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(TgnError::Io(e)),
        }
    }

    /// Load from default location or defaults
    pub fn load() -> TgnResult<Self> {
        Self::load_or_default(DEFAULT_CONFIG_PATH)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> TgnResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            TgnError::internal(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> TgnResult<()> {
        if self.reservation.port_models.is_empty() {
            return Err(TgnError::invalid_config(
                "reservation.port_models",
                "at least one port model is required",
            ));
        }

        if self.reservation.logical_name_attribute.trim().is_empty() {
            return Err(TgnError::invalid_config(
                "reservation.logical_name_attribute",
                "must not be empty",
            ));
        }

        if self.ports.up_timeout_secs == 0 {
            return Err(TgnError::invalid_config(
                "ports.up_timeout_secs",
                "must be > 0",
            ));
        }

        if self.ports.up_poll_interval_ms == 0 || self.ports.up_poll_interval_ms > 1000 {
            return Err(TgnError::invalid_config(
                "ports.up_poll_interval_ms",
                "must be 1-1000",
            ));
        }

        if self.ports.up_poll_interval() >= self.ports.up_timeout() {
            return Err(TgnError::invalid_config(
                "ports.up_poll_interval_ms",
                "must be shorter than ports.up_timeout_secs",
            ));
        }

        if self.quick_test.timeout_secs == 0 {
            return Err(TgnError::invalid_config(
                "quick_test.timeout_secs",
                "must be > 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_controller_attributes_defaults() {
        let attrs = ControllerAttributes::new("C:/Ixia/IxNetwork/8.01-GA", "NA", "").unwrap();
        assert_eq!(attrs.controller_address, "localhost");
        assert_eq!(attrs.controller_port, 8009);
        assert_eq!(attrs.client_install_path, "C:/Ixia/IxNetwork/8.01-GA");

        let attrs = ControllerAttributes::new("", "  ", " ").unwrap();
        assert_eq!(attrs.controller_address, "localhost");
        assert_eq!(attrs.controller_port, 8009);

        let attrs = ControllerAttributes::new("", "na", "").unwrap();
        assert_eq!(attrs.controller_address, "localhost");
    }

    #[test]
    fn test_controller_attributes_explicit() {
        let attrs = ControllerAttributes::new("/opt/ixia", "172.40.0.228", "8008").unwrap();
        assert_eq!(attrs.controller_address, "172.40.0.228");
        assert_eq!(attrs.controller_port, 8008);
    }

    #[test]
    fn test_controller_attributes_invalid_port() {
        assert!(matches!(
            ControllerAttributes::new("", "localhost", "http"),
            Err(TgnError::InvalidConfig { .. })
        ));
        assert!(matches!(
            ControllerAttributes::new("", "localhost", "0"),
            Err(TgnError::InvalidConfig { .. })
        ));
        assert!(ControllerAttributes::new("", "localhost", "70000").is_err());
    }

    #[test]
    fn test_from_resource_attributes() {
        let mut map = HashMap::new();
        map.insert(resource::CLIENT_INSTALL_PATH.to_string(), "/opt/ixia".to_string());
        map.insert(resource::CONTROLLER_ADDRESS.to_string(), "10.0.0.5".to_string());

        let attrs = ControllerAttributes::from_resource_attributes(&map).unwrap();
        assert_eq!(attrs.client_install_path, "/opt/ixia");
        assert_eq!(attrs.controller_address, "10.0.0.5");
        assert_eq!(attrs.controller_port, 8009);
    }

    #[test]
    fn test_default_config() {
        let config = DriverConfig::default();
        assert_eq!(config.reservation.logical_name_attribute, "Logical Name");
        assert!(config
            .reservation
            .port_models
            .contains(&"Generic Traffic Generator Port".to_string()));
        assert!(config.ports.release_before_reserve);
        assert!(!config.ports.wait_for_up);
        assert_eq!(config.ports.up_timeout(), Duration::from_secs(60));
        assert_eq!(config.statistics.delivery, StatisticsDelivery::Output);
        assert_eq!(config.quick_test.timeout(), Duration::from_secs(86400));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
[ports]
wait_for_up = true
up_timeout_secs = 30

[statistics]
delivery = "attachment"
"#;
        let config: DriverConfig = toml::from_str(toml_str).unwrap();
        assert!(config.ports.wait_for_up);
        assert_eq!(config.ports.up_timeout_secs, 30);
        assert_eq!(config.statistics.delivery, StatisticsDelivery::Attachment);
        // Unspecified values should use defaults
        assert!(config.ports.release_before_reserve);
        assert_eq!(config.ports.up_poll_interval_ms, 1000);
        assert_eq!(config.reservation, ReservationSettings::default());
    }

    #[test]
    fn test_validate_invalid_poll_interval() {
        let mut config = DriverConfig::default();
        config.ports.up_poll_interval_ms = 5000;
        assert!(config.validate().is_err());

        let mut config = DriverConfig::default();
        config.ports.up_timeout_secs = 1;
        config.ports.up_poll_interval_ms = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_models() {
        let mut config = DriverConfig::default();
        config.reservation.port_models.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_nonexistent_file_defaults() {
        let config = DriverConfig::load_or_default("/nonexistent/ixn-controller.toml").unwrap();
        assert_eq!(config, DriverConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ixn-controller.toml");

        let mut config = DriverConfig::default();
        config.ports.wait_for_up = true;
        config.quick_test.timeout_secs = 600;
        config.save(&path).unwrap();

        let loaded = DriverConfig::load_or_default(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[ports]\nup_timeout_secs = 0\n").unwrap();
        assert!(matches!(
            DriverConfig::load_or_default(&path),
            Err(TgnError::InvalidConfig { .. })
        ));
    }
}
