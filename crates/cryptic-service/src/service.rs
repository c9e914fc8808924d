//! Assembled service runtime.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use cryptic_config::Config;

use crate::dispatch::Dispatcher;
use crate::handle::ServiceHandle;
use crate::health::HealthReporter;
use crate::pending::PendingCalls;
use crate::registry::EndpointRegistry;
use crate::transport::{Connection, ConnectionSettings};

/// Capacity of the single outbound queue shared by handlers and replies.
pub(crate) const OUTBOUND_QUEUE_CAPACITY: usize = 1024;

const SERVICE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::service");

/// A registry bound to a hub connection.
///
/// Built by [`Bootstrapped::into_service`](crate::Bootstrapped::into_service).
/// Nothing touches the network until [`Service::run`] is awaited, but the
/// [`ServiceHandle`] is usable at once: frames sent through it wait in the
/// outbound queue and are flushed after the first registration.
pub struct Service {
    name: String,
    handle: ServiceHandle,
    connection: Connection,
}

impl Service {
    /// Wires the pending table, the outbound queue and the dispatcher around
    /// `registry`.
    #[must_use]
    pub fn new(
        config: Config,
        registry: EndpointRegistry,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let pending = Arc::new(PendingCalls::new());
        let handle = ServiceHandle::new(sender.clone(), Arc::clone(&pending), config.call_timeout());
        let dispatcher = Dispatcher::new(Arc::new(registry), pending, handle.clone());
        let connection = Connection::new(
            ConnectionSettings::from_config(&config),
            dispatcher,
            receiver,
            sender,
            reporter,
        );
        Self {
            name: config.service_name().to_owned(),
            handle,
            connection,
        }
    }

    /// Name announced to the hub.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle for issuing calls outside of a handler.
    #[must_use]
    pub fn handle(&self) -> ServiceHandle {
        self.handle.clone()
    }

    /// Serves the hub connection forever, reconnecting as needed.
    pub async fn run(self) {
        info!(target: SERVICE_TARGET, service = %self.name, "service running");
        self.connection.run().await;
    }

    /// Serves the hub connection until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let name = self.name.clone();
        tokio::select! {
            () = self.run() => {}
            () = shutdown => {
                info!(target: SERVICE_TARGET, service = %name, "service stopping");
            }
        }
    }
}
