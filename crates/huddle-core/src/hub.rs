//! The hub task.
//!
//! One task owns the session router and the scheduler. Client events,
//! disconnects and refresh ticks all reach it through a single `select!`
//! loop, so each one runs to completion before the next begins and the
//! registry needs no lock.

use crate::fanout::Broadcast;
use crate::registry::RegistryStats;
use crate::router::SessionRouter;
use crate::scheduler::Scheduler;
use crate::session::SessionId;
use std::ops::ControlFlow;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Hub errors.
#[derive(Debug, Error)]
pub enum HubError {
    /// The hub task has stopped.
    #[error("Hub is closed")]
    Closed,
}

#[derive(Debug)]
enum HubCommand {
    Event {
        session_id: SessionId,
        event: String,
        payload: String,
    },
    Disconnect {
        session_id: SessionId,
    },
    Stats {
        reply: oneshot::Sender<RegistryStats>,
    },
    Shutdown,
}

/// Cloneable handle for submitting work to the hub.
#[derive(Debug, Clone)]
pub struct HubHandle {
    tx: mpsc::UnboundedSender<HubCommand>,
}

impl HubHandle {
    /// Queue a client event.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Closed`] if the hub has stopped.
    pub fn event(
        &self,
        session_id: &SessionId,
        event: impl Into<String>,
        payload: impl Into<String>,
    ) -> Result<(), HubError> {
        self.send(HubCommand::Event {
            session_id: session_id.clone(),
            event: event.into(),
            payload: payload.into(),
        })
    }

    /// Queue a transport-level disconnect.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Closed`] if the hub has stopped.
    pub fn disconnect(&self, session_id: &SessionId) -> Result<(), HubError> {
        self.send(HubCommand::Disconnect {
            session_id: session_id.clone(),
        })
    }

    /// Registry statistics, answered in order with queued events.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Closed`] if the hub has stopped.
    pub async fn stats(&self) -> Result<RegistryStats, HubError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Stats { reply })?;
        rx.await.map_err(|_| HubError::Closed)
    }

    /// Ask the hub to close its registry and stop.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Closed`] if the hub has already stopped.
    pub fn shutdown(&self) -> Result<(), HubError> {
        self.send(HubCommand::Shutdown)
    }

    fn send(&self, command: HubCommand) -> Result<(), HubError> {
        self.tx.send(command).map_err(|_| HubError::Closed)
    }
}

/// The single control task.
pub struct Hub<B> {
    router: SessionRouter<B>,
    scheduler: Scheduler,
    rx: mpsc::UnboundedReceiver<HubCommand>,
}

impl<B: Broadcast + 'static> Hub<B> {
    /// Create a hub and its handle.
    #[must_use]
    pub fn new(router: SessionRouter<B>, scheduler: Scheduler) -> (Self, HubHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let hub = Self {
            router,
            scheduler,
            rx,
        };
        (hub, HubHandle { tx })
    }

    /// Spawn the hub onto the runtime.
    #[must_use]
    pub fn spawn(router: SessionRouter<B>, scheduler: Scheduler) -> (HubHandle, JoinHandle<()>) {
        let (hub, handle) = Self::new(router, scheduler);
        (handle, tokio::spawn(hub.run()))
    }

    /// Process commands and refresh ticks until shutdown or until every
    /// handle is dropped.
    pub async fn run(mut self) {
        info!(
            refresh_ms = u64::try_from(self.scheduler.period().as_millis()).unwrap_or(u64::MAX),
            "Hub started"
        );
        let mut refresh = self.scheduler.interval();

        loop {
            tokio::select! {
                command = self.rx.recv() => {
                    let Some(command) = command else { break };
                    if self.handle(command).is_break() {
                        break;
                    }
                }
                _ = refresh.tick() => {
                    self.scheduler.tick(self.router.registry(), self.router.broadcaster());
                }
            }
        }

        self.router.close();
        info!(ticks = self.scheduler.ticks(), "Hub stopped");
    }

    fn handle(&mut self, command: HubCommand) -> ControlFlow<()> {
        match command {
            HubCommand::Event {
                session_id,
                event,
                payload,
            } => {
                if let Err(e) = self.router.dispatch(&session_id, &event, &payload) {
                    warn!(session = %session_id, error = %e, "Event ignored");
                }
            }
            HubCommand::Disconnect { session_id } => self.router.disconnect(&session_id),
            HubCommand::Stats { reply } => {
                let _ = reply.send(self.router.registry().stats());
            }
            HubCommand::Shutdown => {
                debug!("Shutdown requested");
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }
}
