//! In-memory collaborators.
//!
//! [`FakeIxnClient`] hands out [`FakeSession`]s that record every call into a
//! shared log, so a test can inspect the exact command sequence a driver
//! issued. [`FakeReservation`] serves a fixed resource list and records what
//! is written back to the reservation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use tgn_common::attributes::{LOGICAL_NAME_ATTRIBUTE, TRAFFIC_GENERATOR_PORT_MODEL};
use tgn_common::{
    IxnClient, IxnSession, LogicalPort, ReservationApi, ReservationResource, StatisticsTable,
    StatisticsView, TgnError, TgnResult,
};

/// A call received by the fake client or one of its sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCall {
    Connect {
        install_path: String,
        address: String,
        port: u16,
    },
    LoadConfig(String),
    GetPorts,
    Reserve {
        port: String,
        address: String,
        force: bool,
        wait_for_up: bool,
    },
    Release(String),
    PortIsUp(String),
    SendArp,
    ProtocolsStart,
    ProtocolsStop,
    TrafficApply,
    TrafficStart {
        blocking: bool,
    },
    TrafficStop,
    ReadStatistics(String),
    QuickTestApply(String),
    QuickTestStart {
        name: String,
        blocking: bool,
        timeout: Duration,
    },
    Disconnect,
}

/// Shared, ordered call log.
pub type CallLog = Arc<Mutex<Vec<SessionCall>>>;

/// Scripted IxNetwork session.
///
/// Operations named in `failing_on` return a vendor error after being
/// recorded. Unknown statistics views fail the same way. Operations named
/// in `stalling_on` are recorded and then never complete.
#[derive(Debug, Clone)]
pub struct FakeSession {
    calls: CallLog,
    ports: Vec<LogicalPort>,
    down_ports: HashSet<String>,
    statistics: HashMap<String, StatisticsTable>,
    quick_test_result: String,
    failing: HashSet<String>,
    stalling: HashSet<String>,
}

impl Default for FakeSession {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSession {
    /// Creates a session with no ports and a passing quick test.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            ports: Vec::new(),
            down_ports: HashSet::new(),
            statistics: HashMap::new(),
            quick_test_result: "PASS".to_string(),
            failing: HashSet::new(),
            stalling: HashSet::new(),
        }
    }

    /// Sets the ports returned by `get_ports`.
    pub fn with_ports(mut self, ports: Vec<LogicalPort>) -> Self {
        self.ports = ports;
        self
    }

    /// Makes `port_is_up` report this port as down.
    pub fn with_down_port(mut self, name: &str) -> Self {
        self.down_ports.insert(name.to_string());
        self
    }

    /// Sets the content of a statistics view.
    pub fn with_statistics(mut self, view: &str, table: StatisticsTable) -> Self {
        self.statistics.insert(view.to_string(), table);
        self
    }

    /// Sets the result returned by `quick_test_start`.
    pub fn with_quick_test_result(mut self, result: &str) -> Self {
        self.quick_test_result = result.to_string();
        self
    }

    /// Makes an operation fail (e.g. "reserve", "disconnect", "connect").
    pub fn failing_on(mut self, operation: &str) -> Self {
        self.failing.insert(operation.to_string());
        self
    }

    /// Makes an operation hang forever once called.
    pub fn stalling_on(mut self, operation: &str) -> Self {
        self.stalling.insert(operation.to_string());
        self
    }

    /// Returns a copy of the calls recorded so far.
    pub fn calls(&self) -> Vec<SessionCall> {
        self.calls.lock().clone()
    }

    fn record(&self, operation: &str, call: SessionCall) -> TgnResult<()> {
        debug!("fake session: {:?}", call);
        self.calls.lock().push(call);
        if self.failing.contains(operation) {
            return Err(TgnError::vendor(operation, "injected failure"));
        }
        Ok(())
    }

    async fn invoke(&self, operation: &str, call: SessionCall) -> TgnResult<()> {
        self.record(operation, call)?;
        if self.stalling.contains(operation) {
            debug!("fake session: {} stalled", operation);
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

#[async_trait]
impl IxnSession for FakeSession {
    async fn load_config(&mut self, path: &str) -> TgnResult<()> {
        self.invoke("load_config", SessionCall::LoadConfig(path.to_string())).await
    }

    async fn get_ports(&mut self) -> TgnResult<Vec<LogicalPort>> {
        self.invoke("get_ports", SessionCall::GetPorts).await?;
        Ok(self.ports.clone())
    }

    async fn reserve(
        &mut self,
        port: &LogicalPort,
        physical_address: &str,
        force: bool,
        wait_for_up: bool,
    ) -> TgnResult<()> {
        self.invoke(
            "reserve",
            SessionCall::Reserve {
                port: port.name.clone(),
                address: physical_address.to_string(),
                force,
                wait_for_up,
            },
        )
        .await
    }

    async fn release(&mut self, port: &LogicalPort) -> TgnResult<()> {
        self.invoke("release", SessionCall::Release(port.name.clone())).await
    }

    async fn port_is_up(&mut self, port: &LogicalPort) -> TgnResult<bool> {
        self.invoke("port_is_up", SessionCall::PortIsUp(port.name.clone()))
            .await?;
        Ok(!self.down_ports.contains(&port.name))
    }

    async fn send_arp(&mut self) -> TgnResult<()> {
        self.invoke("send_arp", SessionCall::SendArp).await
    }

    async fn protocols_start(&mut self) -> TgnResult<()> {
        self.invoke("protocols_start", SessionCall::ProtocolsStart).await
    }

    async fn protocols_stop(&mut self) -> TgnResult<()> {
        self.invoke("protocols_stop", SessionCall::ProtocolsStop).await
    }

    async fn traffic_apply(&mut self) -> TgnResult<()> {
        self.invoke("traffic_apply", SessionCall::TrafficApply).await
    }

    async fn traffic_start(&mut self, blocking: bool) -> TgnResult<()> {
        self.invoke("traffic_start", SessionCall::TrafficStart { blocking }).await
    }

    async fn traffic_stop(&mut self) -> TgnResult<()> {
        self.invoke("traffic_stop", SessionCall::TrafficStop).await
    }

    async fn read_statistics(&mut self, view: &StatisticsView) -> TgnResult<StatisticsTable> {
        self.invoke(
            "read_statistics",
            SessionCall::ReadStatistics(view.name().to_string()),
        )
        .await?;
        self.statistics.get(view.name()).cloned().ok_or_else(|| {
            TgnError::vendor("read_statistics", format!("view '{}' not found", view))
        })
    }

    async fn quick_test_apply(&mut self, name: &str) -> TgnResult<()> {
        self.invoke(
            "quick_test_apply",
            SessionCall::QuickTestApply(name.to_string()),
        )
        .await
    }

    async fn quick_test_start(
        &mut self,
        name: &str,
        blocking: bool,
        timeout: Duration,
    ) -> TgnResult<String> {
        self.invoke(
            "quick_test_start",
            SessionCall::QuickTestStart {
                name: name.to_string(),
                blocking,
                timeout,
            },
        )
        .await?;
        Ok(self.quick_test_result.clone())
    }

    async fn disconnect(&mut self) -> TgnResult<()> {
        self.invoke("disconnect", SessionCall::Disconnect).await
    }
}

/// Client whose sessions are clones of a template [`FakeSession`].
///
/// All sessions share the template's call log, so `connect` and every
/// session call appear in one sequence.
#[derive(Debug, Clone)]
pub struct FakeIxnClient {
    template: FakeSession,
}

impl FakeIxnClient {
    /// Creates a client handing out copies of `session`.
    pub fn new(session: FakeSession) -> Self {
        Self { template: session }
    }

    /// Returns a copy of the calls recorded so far.
    pub fn calls(&self) -> Vec<SessionCall> {
        self.template.calls()
    }

    /// Counts the recorded calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&SessionCall) -> bool) -> usize {
        self.template
            .calls
            .lock()
            .iter()
            .filter(|call| predicate(*call))
            .count()
    }
}

#[async_trait]
impl IxnClient for FakeIxnClient {
    type Session = FakeSession;

    async fn connect(
        &self,
        install_path: &str,
        address: &str,
        port: u16,
    ) -> TgnResult<FakeSession> {
        self.template.record(
            "connect",
            SessionCall::Connect {
                install_path: install_path.to_string(),
                address: address.to_string(),
                port,
            },
        )?;
        Ok(self.template.clone())
    }
}

/// Reservation output log.
pub type OutputLog = Arc<Mutex<Vec<String>>>;

/// Reservation attachment log: `(filename, content)` in upload order.
pub type UploadLog = Arc<Mutex<Vec<(String, Vec<u8>)>>>;

/// Reservation with a fixed resource list.
///
/// Queries for any other reservation id fail. Attributes that were never
/// set read as empty.
#[derive(Debug, Clone)]
pub struct FakeReservation {
    reservation_id: String,
    resources: Vec<ReservationResource>,
    attributes: HashMap<(String, String), String>,
    outputs: OutputLog,
    uploads: UploadLog,
    failing_writes: bool,
}

impl FakeReservation {
    /// Creates an empty reservation.
    pub fn new(reservation_id: &str) -> Self {
        Self {
            reservation_id: reservation_id.to_string(),
            resources: Vec::new(),
            attributes: HashMap::new(),
            outputs: Arc::new(Mutex::new(Vec::new())),
            uploads: Arc::new(Mutex::new(Vec::new())),
            failing_writes: false,
        }
    }

    /// Adds a resource of any model.
    pub fn with_resource(mut self, name: &str, model: &str, full_address: &str) -> Self {
        self.resources.push(ReservationResource {
            name: name.to_string(),
            model: model.to_string(),
            full_address: full_address.to_string(),
        });
        self
    }

    /// Adds a traffic-generator port carrying a logical name.
    pub fn with_port(self, name: &str, full_address: &str, logical_name: &str) -> Self {
        self.with_resource(name, TRAFFIC_GENERATOR_PORT_MODEL, full_address)
            .with_attribute(name, LOGICAL_NAME_ATTRIBUTE, logical_name)
    }

    /// Sets an attribute value of a resource.
    pub fn with_attribute(mut self, resource: &str, attribute: &str, value: &str) -> Self {
        self.attributes.insert(
            (resource.to_string(), attribute.to_string()),
            value.to_string(),
        );
        self
    }

    /// Makes output writes and uploads fail.
    pub fn with_failing_writes(mut self) -> Self {
        self.failing_writes = true;
        self
    }

    /// Returns the shared output log.
    pub fn output_log(&self) -> OutputLog {
        Arc::clone(&self.outputs)
    }

    /// Returns the shared upload log.
    pub fn upload_log(&self) -> UploadLog {
        Arc::clone(&self.uploads)
    }

    /// Returns a copy of the messages written so far.
    pub fn outputs(&self) -> Vec<String> {
        self.outputs.lock().clone()
    }

    /// Returns a copy of the files uploaded so far.
    pub fn uploads(&self) -> Vec<(String, Vec<u8>)> {
        self.uploads.lock().clone()
    }

    fn check(&self, operation: &str, reservation_id: &str) -> TgnResult<()> {
        if reservation_id != self.reservation_id {
            return Err(TgnError::reservation(
                operation,
                format!("reservation '{}' not found", reservation_id),
            ));
        }
        Ok(())
    }

    fn check_write(&self, operation: &str, reservation_id: &str) -> TgnResult<()> {
        self.check(operation, reservation_id)?;
        if self.failing_writes {
            return Err(TgnError::reservation(operation, "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl ReservationApi for FakeReservation {
    async fn get_reservation_details(
        &self,
        reservation_id: &str,
    ) -> TgnResult<Vec<ReservationResource>> {
        self.check("get_reservation_details", reservation_id)?;
        Ok(self.resources.clone())
    }

    async fn get_attribute_value(&self, resource: &str, attribute: &str) -> TgnResult<String> {
        Ok(self
            .attributes
            .get(&(resource.to_string(), attribute.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn write_message_to_reservation_output(
        &self,
        reservation_id: &str,
        message: &str,
    ) -> TgnResult<()> {
        self.check_write("write_message_to_reservation_output", reservation_id)?;
        self.outputs.lock().push(message.to_string());
        Ok(())
    }

    async fn upload_file(
        &self,
        reservation_id: &str,
        filename: &str,
        content: &[u8],
    ) -> TgnResult<()> {
        self.check_write("upload_file", reservation_id)?;
        self.uploads
            .lock()
            .push((filename.to_string(), content.to_vec()));
        Ok(())
    }
}
