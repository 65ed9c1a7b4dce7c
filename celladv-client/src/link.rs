//! Device link implementation

use async_trait::async_trait;
use celladv_core::{CellResult, InterferencePower};
use celladv_protocol::{encode_command, opcode, LinkStatistics, MessageReader};
use celladv_transport::{TcpTransport, TransportLayer};

/// Operation surface the dispatch layer drives on one instrument link.
///
/// `DeviceLink` is the production implementation; tests substitute
/// scripted links behind this trait.
#[async_trait]
pub trait InstrumentLink: Send {
    /// Send the liveness probe and return the raw status reply
    async fn status_message(&mut self) -> CellResult<Vec<u8>>;

    /// Capture the instrument screen, returning the raw JPEG bytes
    async fn screen(&mut self) -> CellResult<Vec<u8>>;

    /// Send one SCPI command; the payload is newline-terminated on the
    /// wire. Returns the number of bytes written.
    async fn send_scpi(&mut self, command: &str) -> CellResult<usize>;

    /// Query the interference power measurement and parse the reply
    async fn interference_power(&mut self) -> CellResult<InterferencePower>;

    /// Discard the current connection and dial a fresh one.
    ///
    /// Called by the supervisor after an end-of-stream failure, never
    /// concurrently with an in-flight operation on the same link.
    async fn reinitialize(&mut self) -> CellResult<()>;

    /// Press a front-panel key by name
    async fn press_key(&mut self, value: &str) -> CellResult<usize> {
        self.send_scpi(&format!("KEYP:{}", value)).await
    }

    /// Inject a touch event at screen coordinates
    async fn touch(&mut self, x: &str, y: &str) -> CellResult<usize> {
        self.send_scpi(&format!("KEYP {} {}", x, y)).await
    }
}

/// One persistent connection to a CellAdvisor instrument
#[derive(Debug)]
pub struct DeviceLink<T: TransportLayer> {
    transport: T,
    reader: MessageReader,
    statistics: LinkStatistics,
}

/// Device link over the standard TCP transport
pub type TcpDeviceLink = DeviceLink<TcpTransport>;

impl DeviceLink<TcpTransport> {
    /// Dial the instrument at `host` (the fixed device port is appended).
    ///
    /// # Errors
    /// A dial failure is returned as-is and is fatal to construction;
    /// there is no retry at this layer.
    pub async fn connect(host: &str) -> CellResult<Self> {
        let mut transport = TcpTransport::from_instrument_address(host);
        transport.open().await?;
        Ok(Self::new(transport))
    }
}

impl<T: TransportLayer> DeviceLink<T> {
    /// Wrap an already-open transport
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            reader: MessageReader::new(),
            statistics: LinkStatistics::new(),
        }
    }

    /// Encode and send one command frame, then flush.
    ///
    /// # Returns
    /// The number of bytes written to the wire.
    pub async fn send(&mut self, command: u8, payload: &[u8]) -> CellResult<usize> {
        let frame = encode_command(command, payload);
        self.transport.write_all(&frame).await?;
        self.transport.flush().await?;
        self.statistics.increment_frames_sent();
        self.statistics.increment_messages_sent();
        Ok(frame.len())
    }

    /// Receive one reassembled logical message.
    ///
    /// # Errors
    /// `CellError::Disconnected` marks the link as dead to the caller;
    /// every other error leaves the link usable.
    pub async fn receive(&mut self) -> CellResult<Vec<u8>> {
        self.reader
            .read_message(&mut self.transport, &mut self.statistics)
            .await
    }

    /// Send a command and wait for its reply
    pub async fn request(&mut self, command: u8, payload: &[u8]) -> CellResult<Vec<u8>> {
        self.send(command, payload).await?;
        self.receive().await
    }

    /// Get link statistics
    pub fn statistics(&self) -> &LinkStatistics {
        &self.statistics
    }
}

#[async_trait]
impl<T: TransportLayer> InstrumentLink for DeviceLink<T> {
    async fn status_message(&mut self) -> CellResult<Vec<u8>> {
        self.request(opcode::STATUS, b"").await
    }

    async fn screen(&mut self) -> CellResult<Vec<u8>> {
        self.request(opcode::SCREEN, b"").await
    }

    async fn send_scpi(&mut self, command: &str) -> CellResult<usize> {
        self.send(opcode::SCPI, format!("{}\n", command).as_bytes())
            .await
    }

    async fn interference_power(&mut self) -> CellResult<InterferencePower> {
        let reply = self.request(opcode::INTERFERENCE_POWER, b"").await?;
        InterferencePower::parse(&reply)
    }

    async fn reinitialize(&mut self) -> CellResult<()> {
        // Best effort: the old connection is usually already dead.
        let _ = self.transport.close().await;
        self.reader.reset();
        self.transport.open().await?;
        self.statistics.increment_reconnects();
        log::info!("device link reinitialized");
        Ok(())
    }
}
