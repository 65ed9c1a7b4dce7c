//! Scripted instrument links for dispatch tests

use async_trait::async_trait;
use celladv_client::InstrumentLink;
use celladv_core::{CellError, CellResult, InterferencePower};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Shared observation and fault-injection handle for [`ScriptedLink`]s.
///
/// The test keeps one clone and reads the spy counters while the link is
/// owned by a worker.
#[derive(Debug, Clone, Default)]
pub struct LinkProbe {
    inner: Arc<ProbeInner>,
}

#[derive(Debug, Default)]
struct ProbeInner {
    scpi_sent: AtomicUsize,
    screen_fetches: AtomicUsize,
    status_probes: AtomicUsize,
    reinitializations: AtomicUsize,
    die_once: AtomicBool,
}

impl LinkProbe {
    pub fn scpi_sent(&self) -> usize {
        self.inner.scpi_sent.load(Ordering::SeqCst)
    }

    pub fn screen_fetches(&self) -> usize {
        self.inner.screen_fetches.load(Ordering::SeqCst)
    }

    pub fn status_probes(&self) -> usize {
        self.inner.status_probes.load(Ordering::SeqCst)
    }

    pub fn reinitializations(&self) -> usize {
        self.inner.reinitializations.load(Ordering::SeqCst)
    }

    /// Make the link's next operation fail with end-of-stream and mark
    /// the link dead until it is reinitialized.
    pub fn kill_next_operation(&self) {
        self.inner.die_once.store(true, Ordering::SeqCst);
    }

    fn take_kill(&self) -> bool {
        self.inner.die_once.swap(false, Ordering::SeqCst)
    }
}

/// Instrument link with canned replies, spy counters and fault injection
#[derive(Debug)]
pub struct ScriptedLink {
    probe: LinkProbe,
    status_reply: Vec<u8>,
    screen_reply: Vec<u8>,
    power_reply: Vec<u8>,
    /// When set, `status_message` waits for a permit before answering
    gate: Option<Arc<Semaphore>>,
    dead: bool,
}

impl ScriptedLink {
    pub fn new(probe: LinkProbe) -> Self {
        Self {
            probe,
            status_reply: b"BASE READY".to_vec(),
            screen_reply: b"JFIFDATA".to_vec(),
            power_reply: br#"<trace Unit="dBm" P0="-101.52" P1="-99.10"/>"#.to_vec(),
            gate: None,
            dead: false,
        }
    }

    /// Block `status_message` on a semaphore permit, so tests can hold
    /// workers busy deliberately.
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_power_reply(mut self, reply: &[u8]) -> Self {
        self.power_reply = reply.to_vec();
        self
    }

    fn check_alive(&mut self) -> CellResult<()> {
        if self.probe.take_kill() {
            self.dead = true;
        }
        if self.dead {
            return Err(CellError::Disconnected);
        }
        Ok(())
    }
}

#[async_trait]
impl InstrumentLink for ScriptedLink {
    async fn status_message(&mut self) -> CellResult<Vec<u8>> {
        self.check_alive()?;
        self.probe.inner.status_probes.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await.map_err(|_| CellError::Disconnected)?;
            permit.forget();
        }
        Ok(self.status_reply.clone())
    }

    async fn screen(&mut self) -> CellResult<Vec<u8>> {
        self.check_alive()?;
        self.probe
            .inner
            .screen_fetches
            .fetch_add(1, Ordering::SeqCst);
        Ok(self.screen_reply.clone())
    }

    async fn send_scpi(&mut self, command: &str) -> CellResult<usize> {
        self.check_alive()?;
        self.probe.inner.scpi_sent.fetch_add(1, Ordering::SeqCst);
        Ok(command.len() + 1)
    }

    async fn interference_power(&mut self) -> CellResult<InterferencePower> {
        self.check_alive()?;
        let reply = self.power_reply.clone();
        InterferencePower::parse(&reply)
    }

    async fn reinitialize(&mut self) -> CellResult<()> {
        self.dead = false;
        self.probe
            .inner
            .reinitializations
            .fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
