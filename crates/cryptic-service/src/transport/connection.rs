//! Hub connection task.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc};
use tokio_util::codec::Framed;
use tracing::{debug, trace, warn};

use cryptic_config::Config;
use cryptic_wire::{Frame, JsonObjectCodec};

use crate::dispatch::{Classification, Dispatcher};
use crate::health::HealthReporter;

use super::{TRANSPORT_TARGET, TransportError};

/// Dispatch tasks allowed to wait for a slot, per unit of concurrency.
const BACKLOG_PER_SLOT: usize = 16;

/// Parameters of the connection loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConnectionSettings {
    pub(crate) address: String,
    pub(crate) service_name: String,
    pub(crate) reconnect_delay: Duration,
    pub(crate) concurrency: usize,
    /// Dispatch tasks admitted at once, running or waiting for a slot.
    pub(crate) backlog: usize,
}

impl ConnectionSettings {
    pub(crate) fn from_config(config: &Config) -> Self {
        let concurrency = config.dispatch_concurrency();
        Self {
            address: config.hub_address(),
            service_name: config.service_name().to_owned(),
            reconnect_delay: config.reconnect_delay(),
            concurrency,
            backlog: concurrency.saturating_mul(BACKLOG_PER_SLOT),
        }
    }
}

/// Owns the outbound queue and drives the hub socket.
pub(crate) struct Connection {
    settings: ConnectionSettings,
    dispatcher: Dispatcher,
    outbound: mpsc::Receiver<Frame>,
    replies: mpsc::Sender<Frame>,
    reporter: Arc<dyn HealthReporter>,
    permits: Arc<Semaphore>,
    admissions: Arc<Semaphore>,
}

impl Connection {
    pub(crate) fn new(
        settings: ConnectionSettings,
        dispatcher: Dispatcher,
        outbound: mpsc::Receiver<Frame>,
        replies: mpsc::Sender<Frame>,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        let concurrency = settings.concurrency.max(1);
        let permits = Arc::new(Semaphore::new(concurrency));
        let admissions = Arc::new(Semaphore::new(settings.backlog.max(concurrency)));
        Self {
            settings,
            dispatcher,
            outbound,
            replies,
            reporter,
            permits,
            admissions,
        }
    }

    /// Connects, serves, and reconnects until the task is dropped.
    pub(crate) async fn run(mut self) {
        loop {
            self.reporter.connecting(&self.settings.address);
            let Err(error) = self.session().await;
            self.reporter.disconnected(&error);
            self.reporter.reconnect_scheduled(self.settings.reconnect_delay);
            tokio::time::sleep(self.settings.reconnect_delay).await;
        }
    }

    /// One socket lifetime. Only ever returns with the reason it ended.
    async fn session(&mut self) -> Result<Infallible, TransportError> {
        let address = self.settings.address.clone();
        let stream =
            TcpStream::connect(&address)
                .await
                .map_err(|source| TransportError::Connect {
                    address: address.clone(),
                    source,
                })?;
        if let Err(error) = stream.set_nodelay(true) {
            warn!(target: TRANSPORT_TARGET, %error, "failed to disable Nagle's algorithm");
        }

        let mut framed = Framed::new(stream, JsonObjectCodec::new());
        framed
            .send(Frame::register(self.settings.service_name.as_str()))
            .await
            .map_err(|source| TransportError::Write { source })?;
        self.reporter.connected(&address);

        let (mut sink, mut inbound) = framed.split();
        let Self {
            dispatcher,
            outbound,
            replies,
            permits,
            admissions,
            ..
        } = self;

        let writer = async {
            loop {
                let Some(frame) = outbound.recv().await else {
                    return TransportError::QueueClosed;
                };
                trace!(target: TRANSPORT_TARGET, tag = ?frame.tag(), "writing frame");
                if let Err(source) = sink.send(frame).await {
                    return TransportError::Write { source };
                }
            }
        };

        let reader = async {
            loop {
                let bytes = match inbound.next().await {
                    Some(Ok(bytes)) => bytes,
                    Some(Err(source)) => return TransportError::Read { source },
                    None => return TransportError::Closed,
                };
                match dispatcher.classify(&bytes) {
                    Classification::Response { tag, data } => dispatcher.resolve(tag, data),
                    classification => match Arc::clone(admissions).try_acquire_owned() {
                        Ok(admission) => spawn_dispatch(
                            dispatcher.clone(),
                            classification,
                            replies.clone(),
                            Arc::clone(permits),
                            admission,
                        ),
                        Err(_) => refuse(dispatcher, classification, replies),
                    },
                }
            }
        };

        let error = tokio::select! {
            error = writer => error,
            error = reader => error,
        };
        Err(error)
    }
}

/// Serves one classified frame on its own task.
///
/// The permit is taken inside the task so the reader keeps resolving
/// responses while every permit is held by a handler awaiting a call. The
/// admission is held until the task ends.
fn spawn_dispatch(
    dispatcher: Dispatcher,
    classification: Classification,
    replies: mpsc::Sender<Frame>,
    permits: Arc<Semaphore>,
    admission: OwnedSemaphorePermit,
) {
    tokio::spawn(async move {
        let _admission = admission;
        let Ok(_permit) = permits.acquire_owned().await else {
            return;
        };
        let Some(frame) = dispatcher.serve(classification).await else {
            return;
        };
        if replies.send(frame).await.is_err() {
            debug!(target: TRANSPORT_TARGET, "outbound queue closed; reply dropped");
        }
    });
}

/// Answers a frame the backlog has no room for without blocking the reader.
fn refuse(
    dispatcher: &Dispatcher,
    classification: Classification,
    replies: &mpsc::Sender<Frame>,
) {
    let Some(frame) = dispatcher.refuse(classification) else {
        return;
    };
    if let Err(error) = replies.try_send(frame) {
        warn!(target: TRANSPORT_TARGET, %error, "outbound queue unavailable; refusal dropped");
    }
}
