//! Worker loop: one worker per device link

use crate::cache::ScreenCache;
use crate::metrics::MetricsSink;
use crate::request::{CommandKind, Reply, ReplySender, Request};
use crate::state::WorkerState;
use celladv_client::InstrumentLink;
use celladv_core::{CellError, CellResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// Shared handles every worker of one pool runs with
pub(crate) struct WorkerContext<L> {
    /// Shared bounded request queue; idle workers race for the next entry
    pub(crate) queue: Arc<Mutex<mpsc::Receiver<Request>>>,
    pub(crate) cache: Arc<ScreenCache>,
    pub(crate) metrics: Arc<dyn MetricsSink>,
    pub(crate) poll_period: Duration,
    pub(crate) cancel: CancellationToken,
    pub(crate) died: mpsc::Sender<WorkerDeath<L>>,
}

impl<L> Clone for WorkerContext<L> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            cache: Arc::clone(&self.cache),
            metrics: Arc::clone(&self.metrics),
            poll_period: self.poll_period,
            cancel: self.cancel.clone(),
            died: self.died.clone(),
        }
    }
}

/// Death notice a worker sends its supervisor, handing the link back for
/// reinitialization
pub(crate) struct WorkerDeath<L> {
    pub(crate) slot: usize,
    pub(crate) link: L,
}

enum Turn {
    Request(Request),
    Heartbeat,
    Shutdown,
}

/// One unit of concurrent execution, exclusively owning one device link.
///
/// Only this worker ever calls send/receive on its link; the link leaves
/// the worker only inside the death notice, after the worker has stopped
/// touching it.
pub(crate) struct Worker<L: InstrumentLink> {
    slot: usize,
    link: L,
    context: WorkerContext<L>,
    state: WorkerState,
}

impl<L: InstrumentLink + 'static> Worker<L> {
    /// Spawn a worker task for `slot` driving `link`
    pub(crate) fn spawn(slot: usize, link: L, context: WorkerContext<L>) {
        let worker = Self {
            slot,
            link,
            context,
            state: WorkerState::Idle,
        };
        tokio::spawn(worker.run());
    }

    async fn run(mut self) {
        log::debug!("worker({}) serving", self.slot);
        loop {
            match self.next_turn().await {
                Turn::Shutdown => {
                    self.transition(WorkerState::Terminated);
                    log::debug!("worker({}) shut down", self.slot);
                    return;
                }
                Turn::Heartbeat => {
                    self.transition(WorkerState::Dispatching);
                    self.transition(WorkerState::AwaitingReply);
                    match self.link.status_message().await {
                        Ok(status) => {
                            log::debug!(
                                "worker({}): {}",
                                self.slot,
                                String::from_utf8_lossy(&status)
                            );
                            self.transition(WorkerState::Idle);
                        }
                        Err(e) if e.is_disconnect() => return self.terminate().await,
                        Err(e) => {
                            log::warn!("worker({}) heartbeat error: {}", self.slot, e);
                            self.transition(WorkerState::Idle);
                        }
                    }
                }
                Turn::Request(request) => {
                    self.transition(WorkerState::Dispatching);
                    log::debug!(
                        "worker({}) get_request: {}",
                        self.slot,
                        request.command().name()
                    );
                    let Request {
                        command,
                        args,
                        reply,
                    } = request;

                    let result = self.execute(command, &args).await;
                    let fatal = matches!(&result, Err(e) if e.is_disconnect());
                    if let Err(e) = &result {
                        if !fatal {
                            log::warn!("worker({}) {} error: {}", self.slot, command.name(), e);
                        }
                    }
                    self.deliver(reply, result);

                    if fatal {
                        return self.terminate().await;
                    }
                    self.transition(WorkerState::Idle);
                }
            }
        }
    }

    /// Wait for the next request, the heartbeat timer, or shutdown.
    ///
    /// The receive path locks the shared queue only while this worker is
    /// the one idle-waiting on it; the lock is released as soon as a
    /// request is taken, so other idle workers can race for the next one.
    async fn next_turn(&mut self) -> Turn {
        let queue = Arc::clone(&self.context.queue);
        tokio::select! {
            _ = self.context.cancel.cancelled() => Turn::Shutdown,
            request = async {
                let mut receiver = queue.lock().await;
                receiver.recv().await
            } => match request {
                Some(request) => Turn::Request(request),
                None => Turn::Shutdown,
            },
            _ = tokio::time::sleep(self.context.poll_period) => Turn::Heartbeat,
        }
    }

    async fn execute(
        &mut self,
        command: CommandKind,
        args: &HashMap<String, String>,
    ) -> CellResult<Reply> {
        match command {
            CommandKind::Keypad => {
                let Some(value) = required_arg(args, "value") else {
                    return Err(CellError::InvalidArgument("keyp value missing".to_string()));
                };
                self.transition(WorkerState::AwaitingReply);
                let sent = self.link.press_key(value).await?;
                Ok(Reply::Text(format!("keypad: {} byte sent", sent)))
            }
            CommandKind::Touch => {
                let (Some(x), Some(y)) = (required_arg(args, "x"), required_arg(args, "y"))
                else {
                    return Err(CellError::InvalidArgument("x,y value missing".to_string()));
                };
                self.transition(WorkerState::AwaitingReply);
                let sent = self.link.touch(x, y).await?;
                Ok(Reply::Text(format!("touch: {} byte sent", sent)))
            }
            CommandKind::Screen => {
                self.transition(WorkerState::AwaitingReply);
                self.context.cache.refresh_if_stale(&mut self.link).await?;
                Ok(Reply::Binary(self.context.cache.image().await))
            }
            CommandKind::RefreshScreen => {
                self.transition(WorkerState::AwaitingReply);
                self.context.cache.refresh_if_stale(&mut self.link).await?;
                Ok(Reply::Text("refresh_screen: cache done".to_string()))
            }
            CommandKind::Heartbeat => {
                self.transition(WorkerState::AwaitingReply);
                let status = self.link.status_message().await?;
                Ok(Reply::Text(String::from_utf8_lossy(&status).into_owned()))
            }
            CommandKind::InterferencePower => {
                self.transition(WorkerState::AwaitingReply);
                let power = self.link.interference_power().await?;
                Ok(Reply::Measurement(power))
            }
        }
    }

    /// Deliver the result to the caller's reply channel.
    ///
    /// The send never blocks: if the caller abandoned its wait the reply
    /// is dropped and counted, not retried.
    fn deliver(&self, reply: ReplySender, result: CellResult<Reply>) {
        match reply.send(result) {
            Ok(()) => self.context.metrics.increment_send_success(),
            Err(_) => {
                self.context.metrics.increment_send_pending();
                log::debug!("worker({}) caller abandoned its reply", self.slot);
            }
        }
    }

    /// Report this worker's death to the supervisor, handing over the link.
    async fn terminate(mut self) {
        self.transition(WorkerState::Terminated);
        log::warn!("worker({}) connection lost, exiting", self.slot);
        let death = WorkerDeath {
            slot: self.slot,
            link: self.link,
        };
        if self.context.died.send(death).await.is_err() {
            log::debug!("worker({}) supervisor gone, link dropped", self.slot);
        }
    }

    fn transition(&mut self, next: WorkerState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal worker transition {} -> {}",
            self.state.as_str(),
            next.as_str()
        );
        log::trace!(
            "worker({}) {} -> {}",
            self.slot,
            self.state.as_str(),
            next.as_str()
        );
        self.state = next;
    }
}

fn required_arg<'a>(args: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    args.get(key).map(String::as_str).filter(|v| !v.is_empty())
}
