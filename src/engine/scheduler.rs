//! Single-flight, debounced settings reassertion.
//!
//! One task owns the reconciliation state and the last applied snapshot. Every
//! other party talks to it through [`Reconciler`], which only enqueues
//! messages. Apply cycles run on a worker task and report back through a
//! second channel, so the owner never blocks on the operating system.
//!
//! State machine:
//! - `Idle` -> `Applying` on a facts-changed signal or a direct reassert.
//! - `Applying` -> `ApplyingWithPendingRetry` on a signal after facts were sampled.
//!   Signals that arrive during the debounce window are absorbed instead.
//! - On cycle completion a pending retry starts a fresh cycle, otherwise `Idle`.

use super::collaborator::{ErrorNotifier, PacketTunnel, RoutingEngine};
use crate::config;
use crate::error::ReconcileError;
use crate::models::{RunningInfo, TunnelOptions};
use crate::processing::{
    build_settings, equivalent, needs_interface_rebind, snapshot, SettingsSnapshot,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Duration, Instant};

type Reply<T> = oneshot::Sender<T>;

enum Message {
    FactsChanged,
    Reassert(Reply<Result<(), ReconcileError>>),
    LastSnapshot(Reply<Option<SettingsSnapshot>>),
    Shutdown,
}

/// `Ok(Some)` applied a new snapshot, `Ok(None)` nothing changed.
type CycleResult = Result<Option<SettingsSnapshot>, ReconcileError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReconciliationState {
    Idle,
    Applying,
    ApplyingWithPendingRetry,
}

/// Everything a worker needs to run one apply cycle.
#[derive(Clone)]
struct Collaborators {
    engine: Arc<dyn RoutingEngine>,
    tunnel: Arc<dyn PacketTunnel>,
    notifier: Arc<dyn ErrorNotifier>,
    options: Arc<TunnelOptions>,
}

/// Handle to the reconciliation task. Cheap to clone, usable from any thread.
#[derive(Clone)]
pub struct Reconciler {
    tx: mpsc::UnboundedSender<Message>,
}

impl Reconciler {
    /// Start the reconciliation task on the current tokio runtime.
    pub fn spawn(
        engine: Arc<dyn RoutingEngine>,
        tunnel: Arc<dyn PacketTunnel>,
        notifier: Arc<dyn ErrorNotifier>,
        options: TunnelOptions,
    ) -> Reconciler {
        let (tx, rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = mpsc::unbounded_channel();

        let owner = ReconcileLoop {
            collaborators: Collaborators {
                engine,
                tunnel,
                notifier,
                options: Arc::new(options),
            },
            state: ReconciliationState::Idle,
            last_applied: None,
            debounce_until: None,
            waiter: None,
            accepting: true,
            done_tx,
        };
        tokio::spawn(owner.run(rx, done_rx));

        Reconciler { tx }
    }

    /// Signal that the routing engine's facts changed. Never blocks.
    pub fn facts_changed(&self) {
        if self.tx.send(Message::FactsChanged).is_err() {
            log::debug!("Facts changed after reconciler stopped; ignored");
        }
    }

    /// A callback for the routing engine to invoke on every facts change.
    pub fn callback(&self) -> impl Fn() + Send + Sync + 'static {
        let reconciler = self.clone();
        move || reconciler.facts_changed()
    }

    /// Run one cycle now and wait for its outcome.
    ///
    /// Fails with [`ReconcileError::StillInProgress`] when a cycle is already running.
    pub async fn reassert(&self) -> Result<(), ReconcileError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Message::Reassert(reply))
            .map_err(|_| ReconcileError::Stopped)?;
        rx.await.map_err(|_| ReconcileError::Stopped)?
    }

    /// The snapshot of the settings last applied successfully.
    pub async fn last_snapshot(&self) -> Result<Option<SettingsSnapshot>, ReconcileError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Message::LastSnapshot(reply))
            .map_err(|_| ReconcileError::Stopped)?;
        rx.await.map_err(|_| ReconcileError::Stopped)
    }

    /// Stop accepting signals. A cycle in flight runs to completion.
    pub fn shutdown(&self) {
        let _ = self.tx.send(Message::Shutdown);
    }

    /// Resolves once the reconciliation task has exited.
    pub async fn closed(&self) {
        self.tx.closed().await
    }
}

struct ReconcileLoop {
    collaborators: Collaborators,
    state: ReconciliationState,
    last_applied: Option<SettingsSnapshot>,
    /// Armed while the current cycle is still debouncing.
    debounce_until: Option<Instant>,
    waiter: Option<Reply<Result<(), ReconcileError>>>,
    accepting: bool,
    done_tx: mpsc::UnboundedSender<CycleResult>,
}

impl ReconcileLoop {
    async fn run(
        mut self,
        mut rx: mpsc::UnboundedReceiver<Message>,
        mut done_rx: mpsc::UnboundedReceiver<CycleResult>,
    ) {
        log::debug!("Reconciler started");
        loop {
            let deadline = self.debounce_until.unwrap_or_else(Instant::now);
            tokio::select! {
                msg = rx.recv(), if self.accepting => match msg {
                    Some(msg) => self.handle(msg),
                    None => self.stop_accepting(),
                },
                Some(result) = done_rx.recv() => self.finish_cycle(result),
                _ = sleep_until(deadline), if self.debounce_until.is_some() => self.start_apply(),
            }

            if !self.accepting && self.state == ReconciliationState::Idle {
                break;
            }
        }
        log::debug!("Reconciler stopped");
    }

    fn handle(&mut self, msg: Message) {
        match msg {
            Message::FactsChanged => self.on_facts_changed(),
            Message::Reassert(reply) => {
                if self.state != ReconciliationState::Idle {
                    let _ = reply.send(Err(ReconcileError::StillInProgress));
                    return;
                }
                self.waiter = Some(reply);
                self.begin_cycle();
            }
            Message::LastSnapshot(reply) => {
                let _ = reply.send(self.last_applied.clone());
            }
            Message::Shutdown => self.stop_accepting(),
        }
    }

    fn on_facts_changed(&mut self) {
        match self.state {
            ReconciliationState::Idle => self.begin_cycle(),
            ReconciliationState::Applying if self.debounce_until.is_some() => {
                log::trace!("Facts changed inside debounce window; coalesced");
            }
            ReconciliationState::Applying => {
                log::debug!("Facts changed during apply; queueing one retry");
                self.state = ReconciliationState::ApplyingWithPendingRetry;
            }
            ReconciliationState::ApplyingWithPendingRetry => {
                log::trace!("Retry already pending; coalesced");
            }
        }
    }

    fn stop_accepting(&mut self) {
        if !self.accepting {
            return;
        }
        log::info!("Reconciler shutting down");
        self.accepting = false;
        if self.state == ReconciliationState::ApplyingWithPendingRetry {
            self.state = ReconciliationState::Applying;
        }
    }

    /// Enter `Applying` and arm the debounce timer.
    fn begin_cycle(&mut self) {
        self.state = ReconciliationState::Applying;
        self.debounce_until = Some(Instant::now() + Duration::from_millis(config::DEBOUNCE_MSEC));
    }

    /// Debounce elapsed: sample facts and apply on a worker.
    ///
    /// The worker is awaited by a supervisor task so a panicking collaborator
    /// still completes the cycle instead of leaving the owner in `Applying`.
    fn start_apply(&mut self) {
        self.debounce_until = None;
        let collaborators = self.collaborators.clone();
        let notifier = collaborators.notifier.clone();
        let last_applied = self.last_applied.clone();
        let done_tx = self.done_tx.clone();

        let worker = tokio::spawn(async move { run_cycle(&collaborators, last_applied).await });
        tokio::spawn(async move {
            let result = match worker.await {
                Ok(result) => result,
                Err(e) => Err(ReconcileError::ApplyFailed(format!(
                    "apply task panicked: {e}"
                ))),
            };
            if let Err(e) = &result {
                if e.is_reportable() {
                    report(notifier, e.to_string()).await;
                }
            }
            let _ = done_tx.send(result);
        });
    }

    fn finish_cycle(&mut self, result: CycleResult) {
        let outcome = match result {
            Ok(Some(applied)) => {
                log::info!("Network settings applied");
                self.last_applied = Some(applied);
                Ok(())
            }
            Ok(None) => {
                log::debug!("Network settings unchanged; nothing applied");
                Ok(())
            }
            Err(ReconcileError::NotReady) => {
                log::info!("No tunnel address yet; waiting for the next change");
                Err(ReconcileError::NotReady)
            }
            Err(e) => {
                log::error!("Reconciliation failed: {e}");
                Err(e)
            }
        };

        if let Some(waiter) = self.waiter.take() {
            let _ = waiter.send(outcome);
        }

        match self.state {
            ReconciliationState::ApplyingWithPendingRetry => {
                log::debug!("Running queued retry");
                self.begin_cycle();
            }
            _ => self.state = ReconciliationState::Idle,
        }
    }
}

/// Run a synchronous collaborator call on the blocking pool.
async fn blocking<T, F>(call: F) -> Result<T, String>
where
    F: FnOnce() -> Result<T, String> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|e| format!("collaborator call panicked: {e}"))?
}

/// Hand an error to the host. Notifier failures, panics included, are only logged.
async fn report(notifier: Arc<dyn ErrorNotifier>, message: String) {
    let result = tokio::task::spawn_blocking(move || notifier.notify(&message)).await;
    if let Err(e) = result {
        log::error!("Error notifier failed: {e}");
    }
}

/// One apply cycle against the latest facts.
async fn run_cycle(
    collaborators: &Collaborators,
    last_applied: Option<SettingsSnapshot>,
) -> CycleResult {
    let engine = collaborators.engine.clone();
    let facts = match blocking(move || engine.running_info()).await {
        Ok(json) => RunningInfo::from_json_lossy(&json),
        Err(e) => {
            log::warn!("Routing engine returned no running info: {e}");
            RunningInfo::default()
        }
    };

    let settings = build_settings(&facts, &collaborators.options)?;
    let new = snapshot(&settings);

    if let Some(last) = &last_applied {
        if equivalent(last, &new) {
            return Ok(None);
        }
    }

    let rebind = needs_interface_rebind(last_applied.as_ref(), &new);
    log::info!(
        "Applying settings address={} routes={} rebind={rebind}",
        settings.ipv4.address,
        settings.ipv4.included_routes.len()
    );

    collaborators
        .tunnel
        .apply_settings(&settings)
        .await
        .map_err(ReconcileError::ApplyFailed)?;

    if rebind {
        let fd = collaborators.tunnel.tun_fd().ok_or_else(|| {
            ReconcileError::RebindFailed("tunnel file descriptor not found".to_string())
        })?;
        let engine = collaborators.engine.clone();
        blocking(move || engine.set_tun_fd(fd))
            .await
            .map_err(ReconcileError::RebindFailed)?;
        log::info!("Tunnel file descriptor {fd} re-bound");
    }

    Ok(Some(new))
}
