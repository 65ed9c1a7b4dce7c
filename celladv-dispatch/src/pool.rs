//! Dispatch pool: request intake, worker supervision, shutdown

use crate::cache::ScreenCache;
use crate::config::PoolConfig;
use crate::metrics::{AtomicMetrics, MetricsSink};
use crate::request::{CommandKind, Reply, Request};
use crate::state::WorkerState;
use crate::worker::{Worker, WorkerContext, WorkerDeath};
use celladv_client::{InstrumentLink, TcpDeviceLink};
use celladv_core::{CellError, CellResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Worker pool bound to one instrument
///
/// Owns N workers, each driving its own persistent connection, all
/// pulling from one bounded request queue. A supervisor task watches the
/// worker-died channel and restarts slots whose link hit end-of-stream.
pub struct DispatchPool {
    handle: PoolHandle,
    supervisor: JoinHandle<()>,
    cancel: CancellationToken,
}

impl DispatchPool {
    /// Dial the instrument and start the pool.
    ///
    /// One connection per worker is established up front; the first dial
    /// failure aborts construction. This is the only fatal startup path.
    pub async fn connect(config: PoolConfig) -> CellResult<Self> {
        let mut links = Vec::with_capacity(config.workers);
        for _ in 0..config.workers {
            links.push(TcpDeviceLink::connect(&config.instrument_address).await?);
        }
        Ok(Self::with_links(
            config,
            links,
            Arc::new(AtomicMetrics::new()),
        ))
    }

    /// Start the pool over already-established links.
    ///
    /// The worker count is the number of links; the queue is bounded to
    /// the same number, so producers feel backpressure once every worker
    /// is busy and the queue is full.
    pub fn with_links<L>(
        config: PoolConfig,
        links: Vec<L>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self
    where
        L: InstrumentLink + 'static,
    {
        let workers = links.len().max(1);
        let (queue_tx, queue_rx) = mpsc::channel(workers);
        let (died_tx, died_rx) = mpsc::channel(workers);
        let cancel = CancellationToken::new();

        let context = WorkerContext {
            queue: Arc::new(Mutex::new(queue_rx)),
            cache: Arc::new(ScreenCache::new(config.freshness_window)),
            metrics: Arc::clone(&metrics),
            poll_period: config.poll_period,
            cancel: cancel.clone(),
            died: died_tx,
        };

        for (slot, link) in links.into_iter().enumerate() {
            Worker::spawn(slot, link, context.clone());
        }

        let supervisor = tokio::spawn(supervise(context, died_rx, workers));

        let handle = PoolHandle {
            queue: queue_tx,
            cancel: cancel.clone(),
            metrics,
            reply_timeout: config.reply_timeout,
        };

        Self {
            handle,
            supervisor,
            cancel,
        }
    }

    /// Get a cloneable submission handle
    pub fn handle(&self) -> PoolHandle {
        self.handle.clone()
    }

    /// Stop all workers and wait for the supervisor to exit
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.supervisor.await;
    }
}

/// Supervisor loop: owns the worker-died channel and the slot table.
///
/// A dead worker hands its link back in the death notice; the supervisor
/// reinitializes the link (retrying on redial failure) and spawns a fresh
/// worker for the same slot.
async fn supervise<L: InstrumentLink + 'static>(
    context: WorkerContext<L>,
    mut died: mpsc::Receiver<WorkerDeath<L>>,
    workers: usize,
) {
    let mut slots = vec![WorkerState::Idle; workers];
    loop {
        let death = tokio::select! {
            _ = context.cancel.cancelled() => return,
            death = died.recv() => death,
        };
        let Some(WorkerDeath { slot, mut link }) = death else {
            return;
        };

        slots[slot] = WorkerState::Reconnecting;
        log::info!(
            "worker({}) died, slot {}: reinitializing its link",
            slot,
            slots[slot].as_str()
        );
        loop {
            match link.reinitialize().await {
                Ok(()) => break,
                Err(e) => {
                    log::warn!("worker({}) redial failed: {}", slot, e);
                    tokio::select! {
                        _ = context.cancel.cancelled() => return,
                        _ = tokio::time::sleep(context.poll_period) => {}
                    }
                }
            }
        }

        Worker::spawn(slot, link, context.clone());
        slots[slot] = WorkerState::Idle;
        log::info!(
            "worker({}) restarted, slot {}",
            slot,
            slots[slot].as_str()
        );
    }
}

/// Cloneable request submission handle
#[derive(Debug, Clone)]
pub struct PoolHandle {
    queue: mpsc::Sender<Request>,
    cancel: CancellationToken,
    metrics: Arc<dyn MetricsSink>,
    reply_timeout: Duration,
}

impl PoolHandle {
    /// Submit a request by command name.
    ///
    /// # Errors
    /// - `CellError::UnknownCommand` for names outside the command surface
    /// - `CellError::Timeout` when no worker frees up or no reply arrives
    ///   within the configured bound; this outcome is also recorded in the
    ///   receive-pending counter, never silently dropped
    /// - whatever error the worker reports for the command itself
    pub async fn submit(
        &self,
        command: &str,
        args: HashMap<String, String>,
    ) -> CellResult<Reply> {
        let command: CommandKind = command.parse()?;
        self.submit_command(command, args).await
    }

    /// Submit an already-typed request
    pub async fn submit_command(
        &self,
        command: CommandKind,
        args: HashMap<String, String>,
    ) -> CellResult<Reply> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = Request::new(command, args, reply_tx);

        // Enqueue with a bounded, cancellation-aware wait. Backpressure
        // from a full queue surfaces as Timeout, not an indefinite block.
        tokio::select! {
            _ = self.cancel.cancelled() => return Err(shutdown_error()),
            sent = tokio::time::timeout(self.reply_timeout, self.queue.send(request)) => {
                match sent {
                    Err(_) => {
                        self.metrics.increment_receive_pending();
                        return Err(CellError::Timeout);
                    }
                    Ok(Err(_)) => return Err(shutdown_error()),
                    Ok(Ok(())) => {}
                }
            }
        }

        // Wait for the reply on the private channel, bounded the same way.
        tokio::select! {
            _ = self.cancel.cancelled() => Err(shutdown_error()),
            replied = tokio::time::timeout(self.reply_timeout, reply_rx) => match replied {
                Err(_) => {
                    self.metrics.increment_receive_pending();
                    Err(CellError::Timeout)
                }
                Ok(Err(_)) => Err(shutdown_error()),
                Ok(Ok(result)) => {
                    self.metrics.increment_receive_success();
                    result
                }
            },
        }
    }
}

fn shutdown_error() -> CellError {
    CellError::Connection(std::io::Error::new(
        std::io::ErrorKind::NotConnected,
        "dispatch pool is shut down",
    ))
}
