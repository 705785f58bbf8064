//! IxnController - the driver command surface and session lifecycle.
//!
//! The controller owns at most one [`IxnHandler`] at a time:
//!
//! - `initialize` connects a new session
//! - commands run one at a time under an async mutex
//! - `cleanup` (or cancellation of the keep-alive) disconnects it
//!
//! Teardown takes the handler out of the mutex before disconnecting, so it
//! runs at most once however many cleanup paths race. Each session has its
//! own cancellation token; teardown cancels it first so a long-running
//! command (blocking traffic, a quick test) gives up the mutex promptly.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use tgn_common::{IxnClient, ReservationApi, TgnError, TgnResult};

use crate::config::{ControllerAttributes, DriverConfig};
use crate::handler::IxnHandler;

/// IxNetwork controller driver.
pub struct IxnController<C, R>
where
    C: IxnClient,
    R: ReservationApi + ?Sized,
{
    /// Vendor client used to open sessions.
    client: C,

    /// Reservation service shared with the active handler.
    reservation: Arc<R>,

    /// Driver policies handed to each new handler.
    config: DriverConfig,

    /// The active session, if any.
    handler: Mutex<Option<IxnHandler<C::Session, R>>>,

    /// Cancelled when the active session is torn down.
    session_cancel: parking_lot::Mutex<CancellationToken>,
}

/// Runs a handler command until it completes or the session is torn down.
async fn interruptible<T>(
    cancel: CancellationToken,
    command: impl Future<Output = TgnResult<T>>,
) -> TgnResult<T> {
    tokio::select! {
        result = command => result,
        _ = cancel.cancelled() => {
            warn!("IxNetwork command interrupted by session teardown");
            Err(TgnError::Cancelled)
        }
    }
}

impl<C, R> IxnController<C, R>
where
    C: IxnClient,
    R: ReservationApi + ?Sized,
{
    /// Creates a controller with no active session.
    pub fn new(client: C, reservation: Arc<R>, config: DriverConfig) -> Self {
        Self {
            client,
            reservation,
            config,
            handler: Mutex::new(None),
            session_cancel: parking_lot::Mutex::new(CancellationToken::new()),
        }
    }

    fn session_token(&self) -> CancellationToken {
        self.session_cancel.lock().clone()
    }

    /// Returns true if a session is active.
    pub async fn is_initialized(&self) -> bool {
        self.handler.lock().await.is_some()
    }

    /// Connects to the API server described by `attributes`.
    ///
    /// A previously active session is torn down first.
    #[instrument(skip(self, attributes), fields(address = %attributes.controller_address, port = attributes.controller_port))]
    pub async fn initialize(&self, attributes: &ControllerAttributes) -> TgnResult<()> {
        let mut guard = self.handler.lock().await;

        if let Some(previous) = guard.take() {
            warn!("Replacing active IxNetwork session");
            if let Err(e) = previous.teardown().await {
                warn!("Failed to disconnect previous session: {}", e);
            }
        }

        let session = self
            .client
            .connect(
                &attributes.client_install_path,
                &attributes.controller_address,
                attributes.controller_port,
            )
            .await?;

        *self.session_cancel.lock() = CancellationToken::new();
        *guard = Some(IxnHandler::new(
            session,
            Arc::clone(&self.reservation),
            self.config.clone(),
        ));

        info!(
            "Connected to IxNetwork API server {}:{}",
            attributes.controller_address, attributes.controller_port
        );
        Ok(())
    }

    /// Loads a configuration and reserves its ports.
    pub async fn load_config(&self, reservation_id: &str, config_path: &str) -> TgnResult<String> {
        let mut guard = self.handler.lock().await;
        let handler = guard.as_mut().ok_or(TgnError::NotInitialized)?;

        interruptible(
            self.session_token(),
            handler.load_config(reservation_id, config_path),
        )
        .await?;
        Ok(format!("{} loaded, ports reserved", config_path))
    }

    pub async fn send_arp(&self) -> TgnResult<()> {
        let mut guard = self.handler.lock().await;
        let handler = guard.as_mut().ok_or(TgnError::NotInitialized)?;
        interruptible(self.session_token(), handler.send_arp()).await
    }

    pub async fn start_protocols(&self) -> TgnResult<()> {
        let mut guard = self.handler.lock().await;
        let handler = guard.as_mut().ok_or(TgnError::NotInitialized)?;
        interruptible(self.session_token(), handler.start_protocols()).await
    }

    pub async fn stop_protocols(&self) -> TgnResult<()> {
        let mut guard = self.handler.lock().await;
        let handler = guard.as_mut().ok_or(TgnError::NotInitialized)?;
        interruptible(self.session_token(), handler.stop_protocols()).await
    }

    /// Applies and starts traffic. When `blocking`, returns once traffic has
    /// stopped.
    pub async fn start_traffic(&self, blocking: bool) -> TgnResult<()> {
        let mut guard = self.handler.lock().await;
        let handler = guard.as_mut().ok_or(TgnError::NotInitialized)?;
        interruptible(self.session_token(), handler.start_traffic(blocking)).await
    }

    pub async fn stop_traffic(&self) -> TgnResult<()> {
        let mut guard = self.handler.lock().await;
        let handler = guard.as_mut().ok_or(TgnError::NotInitialized)?;
        interruptible(self.session_token(), handler.stop_traffic()).await
    }

    /// Reads, renders and delivers a statistics view.
    pub async fn get_statistics(
        &self,
        reservation_id: &str,
        view_name: &str,
        output_kind: &str,
    ) -> TgnResult<String> {
        let mut guard = self.handler.lock().await;
        let handler = guard.as_mut().ok_or(TgnError::NotInitialized)?;
        interruptible(
            self.session_token(),
            handler.get_statistics(reservation_id, view_name, output_kind),
        )
        .await
    }

    /// Runs a quick test and returns its result.
    pub async fn run_quick_test(&self, reservation_id: &str, test_name: &str) -> TgnResult<String> {
        let mut guard = self.handler.lock().await;
        let handler = guard.as_mut().ok_or(TgnError::NotInitialized)?;
        interruptible(
            self.session_token(),
            handler.run_quick_test(reservation_id, test_name),
        )
        .await
    }

    /// Disconnects the active session, if any.
    ///
    /// Never fails; disconnect errors are logged. Safe to call repeatedly
    /// and before `initialize`. A command still running on the session is
    /// interrupted with [`TgnError::Cancelled`].
    pub async fn cleanup(&self) {
        self.session_cancel.lock().cancel();
        let handler = self.handler.lock().await.take();

        match handler {
            Some(handler) => match handler.teardown().await {
                Ok(()) => info!("IxNetwork session closed"),
                Err(e) => warn!("Failed to disconnect IxNetwork session: {}", e),
            },
            None => debug!("No IxNetwork session to clean up"),
        }
    }

    /// Holds the session until `cancel` fires, then cleans up.
    pub async fn keep_alive(&self, cancel: CancellationToken) {
        debug!("Keep-alive started");
        cancel.cancelled().await;
        info!("Keep-alive cancelled, releasing session");
        self.cleanup().await;
    }
}

impl<C, R> IxnController<C, R>
where
    C: IxnClient + 'static,
    C::Session: 'static,
    R: ReservationApi + ?Sized + 'static,
{
    /// Runs [`IxnController::keep_alive`] on a background task.
    pub fn spawn_keep_alive(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.keep_alive(cancel).await })
    }
}
