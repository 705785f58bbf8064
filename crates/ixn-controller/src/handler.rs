//! IxnHandler - executes driver commands against one open session.

use std::sync::Arc;

use tracing::{error, info, instrument};

use tgn_common::{
    IxnSession, OutputKind, PortBinding, ReservationApi, StatisticsView, TgnError, TgnResult,
};

use crate::config::DriverConfig;
use crate::reconcile::{
    fetch_reservation_ports, reconcile, release_ports, reserve_bindings, wait_ports_up,
};
use crate::statistics::{deliver_statistics, format_statistics};

/// Parses a command-line style blocking flag (`"True"`, `"true"`).
pub fn parse_blocking(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// Command handler owning an IxNetwork session.
///
/// Every command runs to completion before the next one starts; the owner
/// serializes access.
pub struct IxnHandler<S, R: ?Sized> {
    /// The open vendor session.
    session: S,

    /// Reservation service used for port lookup and output.
    reservation: Arc<R>,

    /// Driver policies.
    config: DriverConfig,
}

impl<S, R> IxnHandler<S, R>
where
    S: IxnSession,
    R: ReservationApi + ?Sized,
{
    /// Creates a handler over an already connected session.
    pub fn new(session: S, reservation: Arc<R>, config: DriverConfig) -> Self {
        Self {
            session,
            reservation,
            config,
        }
    }

    /// Loads a configuration file and reserves its ports.
    ///
    /// Ports are matched against the reservation before anything is
    /// released or reserved, so a failed match leaves the session ports
    /// untouched.
    ///
    /// # Returns
    ///
    /// The applied bindings, in configuration port order.
    #[instrument(skip(self))]
    pub async fn load_config(
        &mut self,
        reservation_id: &str,
        config_path: &str,
    ) -> TgnResult<Vec<PortBinding>> {
        self.session.load_config(config_path).await?;
        let ports = self.session.get_ports().await?;
        info!("Configuration {} declares {} ports", config_path, ports.len());

        let reservation_ports = fetch_reservation_ports(
            self.reservation.as_ref(),
            reservation_id,
            &self.config.reservation,
        )
        .await?;

        let bindings = reconcile(&ports, &reservation_ports).map_err(|e| {
            error!("{}", e);
            e
        })?;

        if self.config.ports.release_before_reserve {
            release_ports(&mut self.session, &ports).await?;
        }

        reserve_bindings(&mut self.session, &ports, &bindings, &self.config.ports).await?;

        if self.config.ports.wait_for_up {
            wait_ports_up(
                &mut self.session,
                &ports,
                self.config.ports.up_timeout(),
                self.config.ports.up_poll_interval(),
            )
            .await?;
        }

        info!("Port Reservation Completed");
        Ok(bindings)
    }

    #[instrument(skip(self))]
    pub async fn send_arp(&mut self) -> TgnResult<()> {
        self.session.send_arp().await
    }

    #[instrument(skip(self))]
    pub async fn start_protocols(&mut self) -> TgnResult<()> {
        self.session.protocols_start().await
    }

    #[instrument(skip(self))]
    pub async fn stop_protocols(&mut self) -> TgnResult<()> {
        self.session.protocols_stop().await
    }

    /// Applies all traffic items, then starts traffic.
    ///
    /// When `blocking`, returns once traffic has stopped.
    #[instrument(skip(self))]
    pub async fn start_traffic(&mut self, blocking: bool) -> TgnResult<()> {
        self.session.traffic_apply().await?;
        self.session.traffic_start(blocking).await
    }

    #[instrument(skip(self))]
    pub async fn stop_traffic(&mut self) -> TgnResult<()> {
        self.session.traffic_stop().await
    }

    /// Reads a statistics view, renders it and forwards it to the
    /// reservation.
    ///
    /// The output kind is checked before the view is read.
    #[instrument(skip(self))]
    pub async fn get_statistics(
        &mut self,
        reservation_id: &str,
        view_name: &str,
        output_kind: &str,
    ) -> TgnResult<String> {
        let kind: OutputKind = output_kind.parse()?;
        let view = StatisticsView::from_name(view_name.trim());

        let table = self.session.read_statistics(&view).await?;
        let content = format_statistics(&table, kind)?;

        deliver_statistics(
            self.reservation.as_ref(),
            self.config.statistics.delivery,
            reservation_id,
            view.name(),
            kind,
            &content,
        )
        .await?;

        Ok(content)
    }

    /// Runs a quick test to completion and reports its result.
    #[instrument(skip(self))]
    pub async fn run_quick_test(
        &mut self,
        reservation_id: &str,
        test_name: &str,
    ) -> TgnResult<String> {
        self.session.quick_test_apply(test_name).await?;
        let result = self
            .session
            .quick_test_start(test_name, true, self.config.quick_test.timeout())
            .await?;
        info!("Quick test {} finished: {}", test_name, result);

        self.reservation
            .write_message_to_reservation_output(
                reservation_id,
                &format!("Quick test result = {}", result),
            )
            .await
            .map_err(|e| TgnError::sink("reservation output", e.to_string()))?;

        Ok(result)
    }

    /// Disconnects the session, consuming the handler.
    pub async fn teardown(mut self) -> TgnResult<()> {
        self.session.disconnect().await
    }
}
