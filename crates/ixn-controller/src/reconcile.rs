//! Port reconciliation.
//!
//! Binds the logical ports declared by a loaded configuration to the
//! physical ports attached to the reservation. Matching is on the logical
//! name attribute of each reservation port, trimmed and case-insensitive.
//! Binding either succeeds for every logical port or fails before any port
//! is reserved.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use tgn_common::{
    IxnSession, LogicalPort, PortBinding, ReservationApi, ReservationPort, TgnError, TgnResult,
};

use crate::address::normalize_physical_address;
use crate::config::{PortSettings, ReservationSettings};

fn match_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Binds every logical port to exactly one reservation port.
///
/// Reservation ports without a logical name are never candidates. The
/// returned bindings follow the order of `logical_ports`.
///
/// # Errors
///
/// * [`TgnError::DuplicateLogicalName`] - two reservation ports share a name
/// * [`TgnError::UnboundPort`] - a logical port has no match
/// * [`TgnError::ConflictingBinding`] - two logical ports match the same
///   reservation port
/// * [`TgnError::InvalidConfig`] - a matched port has no usable address
pub fn reconcile(
    logical_ports: &[LogicalPort],
    reservation_ports: &[ReservationPort],
) -> TgnResult<Vec<PortBinding>> {
    let mut index: HashMap<String, &ReservationPort> = HashMap::new();
    for port in reservation_ports.iter().filter(|p| p.has_logical_name()) {
        let key = match_key(&port.logical_name);
        if index.contains_key(&key) {
            let resources = reservation_ports
                .iter()
                .filter(|p| p.has_logical_name() && match_key(&p.logical_name) == key)
                .map(|p| p.resource_name.clone())
                .collect();
            return Err(TgnError::DuplicateLogicalName {
                name: port.logical_name.trim().to_string(),
                resources,
            });
        }
        index.insert(key, port);
    }

    // reservation resource -> logical port already bound to it
    let mut bound: HashMap<&str, &str> = HashMap::new();
    let mut bindings = Vec::with_capacity(logical_ports.len());
    for logical in logical_ports {
        let Some(&port) = index.get(&match_key(&logical.name)) else {
            let mut available: Vec<String> = index
                .values()
                .map(|p| p.logical_name.trim().to_string())
                .collect();
            available.sort();
            return Err(TgnError::UnboundPort {
                port: logical.name.clone(),
                available,
            });
        };

        if let Some(first) = bound.insert(&port.resource_name, &logical.name) {
            return Err(TgnError::ConflictingBinding {
                first: first.to_string(),
                second: logical.name.clone(),
                resource: port.resource_name.clone(),
            });
        }

        let physical_address = normalize_physical_address(&port.full_address);
        if physical_address.is_empty() {
            return Err(TgnError::invalid_config(
                port.resource_name.clone(),
                format!("no physical address in '{}'", port.full_address),
            ));
        }

        bindings.push(PortBinding {
            logical_name: logical.name.clone(),
            physical_address,
        });
    }

    Ok(bindings)
}

/// Reads the traffic-generator ports of a reservation with their logical
/// names.
///
/// Only resources whose model is listed in `settings.port_models` are
/// returned. The reservation is queried on every call.
#[instrument(skip(api, settings))]
pub async fn fetch_reservation_ports<R>(
    api: &R,
    reservation_id: &str,
    settings: &ReservationSettings,
) -> TgnResult<Vec<ReservationPort>>
where
    R: ReservationApi + ?Sized,
{
    let resources = api.get_reservation_details(reservation_id).await?;

    let mut ports = Vec::new();
    for resource in resources {
        if !settings.port_models.iter().any(|m| *m == resource.model) {
            continue;
        }
        let logical_name = api
            .get_attribute_value(&resource.name, &settings.logical_name_attribute)
            .await?;
        debug!(
            "Reservation port {} ({}) has logical name '{}'",
            resource.name, resource.full_address, logical_name
        );
        ports.push(ReservationPort::new(
            resource.name,
            resource.full_address,
            logical_name.trim(),
        ));
    }

    Ok(ports)
}

/// Reserves each bound logical port on its physical address.
///
/// `bindings` must come from [`reconcile`] over the same `ports`.
#[instrument(skip_all, fields(bindings = bindings.len()))]
pub async fn reserve_bindings<S>(
    session: &mut S,
    ports: &[LogicalPort],
    bindings: &[PortBinding],
    settings: &PortSettings,
) -> TgnResult<()>
where
    S: IxnSession + ?Sized,
{
    for binding in bindings {
        let port = find_port(ports, &binding.logical_name)?;
        info!(
            "Logical port {} will be reserved on physical location {}",
            binding.logical_name, binding.physical_address
        );
        session
            .reserve(port, &binding.physical_address, true, settings.wait_for_up)
            .await?;
    }
    Ok(())
}

/// Releases every configuration port.
pub async fn release_ports<S>(session: &mut S, ports: &[LogicalPort]) -> TgnResult<()>
where
    S: IxnSession + ?Sized,
{
    for port in ports {
        debug!("Releasing logical port {}", port.name);
        session.release(port).await?;
    }
    Ok(())
}

/// Waits until every port reports link up.
///
/// `timeout` bounds the whole wait, not each port.
#[instrument(skip(session, ports), fields(port_count = ports.len()))]
pub async fn wait_ports_up<S>(
    session: &mut S,
    ports: &[LogicalPort],
    timeout: Duration,
    poll_interval: Duration,
) -> TgnResult<()>
where
    S: IxnSession + ?Sized,
{
    let deadline = Instant::now() + timeout;

    for port in ports {
        loop {
            if session.port_is_up(port).await? {
                debug!("Port {} is up", port.name);
                break;
            }
            if Instant::now() + poll_interval > deadline {
                warn!("Port {} did not come up within {:?}", port.name, timeout);
                return Err(TgnError::PortNotUp {
                    port: port.name.clone(),
                    timeout,
                });
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    Ok(())
}

fn find_port<'a>(ports: &'a [LogicalPort], name: &str) -> TgnResult<&'a LogicalPort> {
    ports
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| TgnError::internal(format!("binding for unknown port '{}'", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tgn_test::fakes::{FakeReservation, FakeSession, SessionCall};
    use tgn_test::fixtures;

    fn logical(names: &[&str]) -> Vec<LogicalPort> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| LogicalPort::new(*name, format!("::ixNet::OBJ-/vport:{}", i + 1)))
            .collect()
    }

    fn binding(name: &str, address: &str) -> PortBinding {
        PortBinding {
            logical_name: name.to_string(),
            physical_address: address.to_string(),
        }
    }

    #[test]
    fn test_all_ports_bound() {
        let reservation = vec![
            ReservationPort::new("Ixia/M1/P1", "10.0.0.1/1/1", "Port 1"),
            ReservationPort::new("Ixia/M1/P2", "10.0.0.1/1/2", "Port 2"),
        ];
        let bindings = reconcile(&logical(&["Port 1", "Port 2"]), &reservation).unwrap();
        assert_eq!(
            bindings,
            vec![
                binding("Port 1", "10.0.0.1/1/1"),
                binding("Port 2", "10.0.0.1/1/2")
            ]
        );
    }

    #[test]
    fn test_missing_port_fails() {
        let reservation = vec![ReservationPort::new("Ixia/M1/P1", "10.0.0.1/1/1", "Port 1")];
        let err = reconcile(&logical(&["Port 1", "Port 2"]), &reservation).unwrap_err();
        match err {
            TgnError::UnboundPort { port, available } => {
                assert_eq!(port, "Port 2");
                assert_eq!(available, vec!["Port 1".to_string()]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_matching_ignores_case_and_whitespace() {
        let reservation = vec![
            ReservationPort::new("Ixia/M1/P1", "10.0.0.1/1/1", "  port 1 "),
            ReservationPort::new("Ixia/M1/P2", "10.0.0.1/1/2", "PORT 2"),
        ];
        let bindings = reconcile(&logical(&["Port 1", " Port 2"]), &reservation).unwrap();
        assert_eq!(bindings[0], binding("Port 1", "10.0.0.1/1/1"));
        // The declared name is kept as-is
        assert_eq!(bindings[1], binding(" Port 2", "10.0.0.1/1/2"));
    }

    #[test]
    fn test_unnamed_ports_are_not_candidates() {
        let reservation = vec![
            ReservationPort::new("Ixia/M1/P1", "10.0.0.1/1/1", ""),
            ReservationPort::new("Ixia/M1/P2", "10.0.0.1/1/2", "   "),
        ];
        let err = reconcile(&logical(&[""]), &reservation).unwrap_err();
        assert!(matches!(err, TgnError::UnboundPort { ref available, .. } if available.is_empty()));
    }

    #[test]
    fn test_duplicate_logical_name_fails() {
        let reservation = vec![
            ReservationPort::new("Ixia/M1/P1", "10.0.0.1/1/1", "Port 1"),
            ReservationPort::new("Ixia/M1/P2", "10.0.0.1/1/2", "Port 2"),
            ReservationPort::new("Ixia/M1/P3", "10.0.0.1/1/3", "port 1"),
        ];
        let err = reconcile(&logical(&["Port 2"]), &reservation).unwrap_err();
        match err {
            TgnError::DuplicateLogicalName { name, resources } => {
                assert_eq!(name, "port 1");
                assert_eq!(resources, vec!["Ixia/M1/P1", "Ixia/M1/P3"]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_case_variants_cannot_share_a_port() {
        let reservation = vec![
            ReservationPort::new("Ixia/M1/P1", "10.0.0.1/1/1", "Port 1"),
            ReservationPort::new("Ixia/M1/P2", "10.0.0.1/1/2", "Port 2"),
        ];
        let err = reconcile(&logical(&["Port 1", "Port 2", "PORT 1"]), &reservation).unwrap_err();
        match err {
            TgnError::ConflictingBinding {
                first,
                second,
                resource,
            } => {
                assert_eq!(first, "Port 1");
                assert_eq!(second, "PORT 1");
                assert_eq!(resource, "Ixia/M1/P1");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_address_is_normalized() {
        let reservation = vec![
            ReservationPort::new("PS/M1/P2", "10.1.2.3/Module1/Port2PG1", "Port 1"),
            ReservationPort::new("Ixia/M1/P2", "192.168.1.1/M1/PG1/P2", "Port 2"),
        ];
        let bindings = reconcile(&logical(&["Port 1", "Port 2"]), &reservation).unwrap();
        assert_eq!(bindings[0].physical_address, "10.1.2.3/Module1/Port2");
        assert_eq!(bindings[1].physical_address, "192.168.1.1/1/2");
    }

    #[test]
    fn test_empty_address_rejected() {
        let reservation = vec![ReservationPort::new("Ixia/PG1", "PG1", "Port 1")];
        let err = reconcile(&logical(&["Port 1"]), &reservation).unwrap_err();
        assert!(matches!(err, TgnError::InvalidConfig { .. }));
    }

    #[test]
    fn test_no_logical_ports() {
        let reservation = vec![ReservationPort::new("Ixia/M1/P1", "10.0.0.1/1/1", "Port 1")];
        assert!(reconcile(&[], &reservation).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_filters_by_model() {
        let api = FakeReservation::new(fixtures::RESERVATION_ID)
            .with_port("Ixia/M1/P1", "10.0.0.1/1/1", "Port 1")
            .with_resource("Ixia", "Ixia Chassis Shell 2G", "10.0.0.1")
            .with_port("Ixia/M1/P2", "10.0.0.1/1/2", " Port 2 ");

        let ports = fetch_reservation_ports(
            &api,
            fixtures::RESERVATION_ID,
            &ReservationSettings::default(),
        )
        .await
        .unwrap();

        assert_eq!(
            ports,
            vec![
                ReservationPort::new("Ixia/M1/P1", "10.0.0.1/1/1", "Port 1"),
                ReservationPort::new("Ixia/M1/P2", "10.0.0.1/1/2", "Port 2"),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_propagates_reservation_error() {
        let api = FakeReservation::new(fixtures::RESERVATION_ID);
        let err = fetch_reservation_ports(&api, "other", &ReservationSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TgnError::Reservation { .. }));
    }

    #[tokio::test]
    async fn test_reserve_bindings_forces_ownership() {
        let ports = logical(&["Port 1", "Port 2"]);
        let mut session = FakeSession::new().with_ports(ports.clone());
        let bindings = vec![
            binding("Port 1", "10.0.0.1/1/1"),
            binding("Port 2", "10.0.0.1/1/2"),
        ];

        reserve_bindings(&mut session, &ports, &bindings, &PortSettings::default())
            .await
            .unwrap();

        assert_eq!(
            session.calls(),
            vec![
                SessionCall::Reserve {
                    port: "Port 1".to_string(),
                    address: "10.0.0.1/1/1".to_string(),
                    force: true,
                    wait_for_up: false,
                },
                SessionCall::Reserve {
                    port: "Port 2".to_string(),
                    address: "10.0.0.1/1/2".to_string(),
                    force: true,
                    wait_for_up: false,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_wait_ports_up_succeeds() {
        let ports = logical(&["Port 1", "Port 2"]);
        let mut session = FakeSession::new().with_ports(ports.clone());

        wait_ports_up(
            &mut session,
            &ports,
            Duration::from_millis(200),
            Duration::from_millis(10),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_wait_ports_up_times_out() {
        let ports = logical(&["Port 1", "Port 2"]);
        let mut session = FakeSession::new()
            .with_ports(ports.clone())
            .with_down_port("Port 2");

        let err = wait_ports_up(
            &mut session,
            &ports,
            Duration::from_millis(50),
            Duration::from_millis(10),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, TgnError::PortNotUp { ref port, .. } if port == "Port 2"));
    }
}
