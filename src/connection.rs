//! Connection engine: the single owner of bus traffic ordering.
//!
//! A connection splits a transport into its two halves. The caller keeps the
//! [`FrameSink`] inside a [`Connection`]; a background [`BusReader`] task
//! owns the [`EventSource`], decoding everything seen on the bus (replies,
//! faults and the echo of our own forward frames) into a bounded queue.
//!
//! The queue push blocks when full. This gives backpressure under sustained
//! bus chatter at the cost of possibly stalling the reader; the bound keeps
//! memory fixed.
//!
//! ```rust,ignore
//! static BUS: BusState = BusState::new();
//!
//! let (mut conn, mut reader) = open(tx, rx, &BUS).await?;
//! spawner.spawn(run_reader(reader))?;
//!
//! let reply = conn.query_reply(&frame, DEFAULT_TIMEOUT).await?;
//! ```

use crate::dali_log;
use crate::error::Result;
use crate::frame::{FrameLength, RxEvent, TxFrame};
use crate::transport::{EventSource, FrameSink};
use core::sync::atomic::{AtomicBool, Ordering};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{with_timeout, Duration, Instant};

/// Bound of the event queue between reader and caller.
pub const QUEUE_CAPACITY: usize = 40;

/// Default reply timeout for queries.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(200);

/// Poll interval of the background reader.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Short poll used to flush stale receptions when opening.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(10);

/// Shared state between a [`Connection`] and its [`BusReader`].
///
/// Lives in a `static` so both halves can borrow it for the lifetime of the
/// program, the usual Embassy pattern for inter-task channels.
#[derive(Debug)]
pub struct BusState {
    events: Channel<CriticalSectionRawMutex, RxEvent, QUEUE_CAPACITY>,
    running: AtomicBool,
}

impl BusState {
    /// Create the shared state. `const` so it can be a `static`.
    pub const fn new() -> Self {
        Self {
            events: Channel::new(),
            running: AtomicBool::new(false),
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }
}

impl Default for BusState {
    fn default() -> Self {
        Self::new()
    }
}

/// Open a connection over a split transport.
///
/// Drains any stale pending receptions first, so a fresh connection never
/// surfaces pre-existing bus traffic.
pub async fn open<TX: FrameSink, RX: EventSource>(
    sink: TX,
    mut source: RX,
    state: &BusState,
) -> Result<(Connection<'_, TX>, BusReader<'_, RX>)> {
    while source.poll(DRAIN_TIMEOUT).await?.is_some() {
        dali_log!(debug, "open: discarding stale bus event");
    }
    while state.events.try_receive().is_ok() {}

    state.set_running(true);
    dali_log!(info, "bus connection opened");

    Ok((
        Connection {
            sink,
            state,
            last_transmit: None,
        },
        BusReader { source, state },
    ))
}

/// Caller-side half of a connection.
#[derive(Debug)]
pub struct Connection<'a, TX: FrameSink> {
    sink: TX,
    state: &'a BusState,
    last_transmit: Option<(FrameLength, u32)>,
}

impl<TX: FrameSink> Connection<'_, TX> {
    /// Transmit a forward frame without waiting for anything.
    pub async fn transmit(&mut self, frame: &TxFrame) -> Result<()> {
        self.sink.send(frame).await?;
        self.last_transmit = Some((frame.length(), frame.data()));
        Ok(())
    }

    /// Transmit, then wait for the next bus event of any kind.
    ///
    /// The event may well be the echo of the frame just sent; use
    /// [`query_reply`](Self::query_reply) when a backward reply is expected.
    pub async fn transmit_and_wait(&mut self, frame: &TxFrame, timeout: Duration) -> Result<RxEvent> {
        self.transmit(frame).await?;
        Ok(self.pop_event(timeout).await)
    }

    /// Transmit a query and wait for a genuine answer.
    ///
    /// Anything still queued from before the transmit is dropped first: a
    /// backward frame belonging to an earlier query that already timed out
    /// must never be taken for the answer to this one. The bus also
    /// physically reflects our own forward frame into the receive stream,
    /// so forward-frame events are discarded while the deadline lasts: the
    /// echo of the query itself and unrelated bus chatter. The first
    /// backward frame or fault is the answer; deadline exhaustion yields
    /// [`RxEvent::Timeout`].
    pub async fn query_reply(&mut self, frame: &TxFrame, timeout: Duration) -> Result<RxEvent> {
        while self.state.events.try_receive().is_ok() {}
        self.transmit(frame).await?;
        let deadline = Instant::now() + timeout;
        loop {
            let now = Instant::now();
            if now >= deadline {
                return Ok(RxEvent::Timeout);
            }
            match with_timeout(deadline - now, self.state.events.receive()).await {
                Err(_) => return Ok(RxEvent::Timeout),
                Ok(event) => match event {
                    RxEvent::Frame {
                        length: FrameLength::Backward,
                        ..
                    }
                    | RxEvent::Fault(_)
                    | RxEvent::Timeout => return Ok(event),
                    RxEvent::Frame { .. } => {
                        if self.is_own_echo(&event) {
                            dali_log!(trace, "query: discarding own echo");
                        } else {
                            dali_log!(debug, "query: discarding forward frame");
                        }
                    }
                },
            }
        }
    }

    /// Wait for the next bus event without transmitting (monitor mode).
    pub async fn next_event(&mut self, timeout: Duration) -> RxEvent {
        self.pop_event(timeout).await
    }

    /// Close the connection. The background reader observes the cleared
    /// running flag and terminates at its next poll.
    pub fn close(&mut self) {
        dali_log!(info, "bus connection closed");
        self.state.set_running(false);
        self.sink.close();
    }

    async fn pop_event(&self, timeout: Duration) -> RxEvent {
        match with_timeout(timeout, self.state.events.receive()).await {
            Ok(event) => event,
            Err(_) => RxEvent::Timeout,
        }
    }

    fn is_own_echo(&self, event: &RxEvent) -> bool {
        match (event, self.last_transmit) {
            (RxEvent::Frame { length, data }, Some((tx_length, tx_data))) => {
                *length == tx_length && *data == tx_data
            }
            _ => false,
        }
    }
}

/// Background reader task half of a connection.
///
/// Drive [`run`](Self::run) from a dedicated task (or join it with the
/// client future in tests). It terminates cleanly when the connection is
/// closed and returns the error when the transport fails.
#[derive(Debug)]
pub struct BusReader<'a, RX: EventSource> {
    source: RX,
    state: &'a BusState,
}

impl<RX: EventSource> BusReader<'_, RX> {
    /// Reader loop: poll the transport and queue every decoded event.
    pub async fn run(&mut self) -> Result<()> {
        dali_log!(debug, "bus reader started");
        while self.state.is_running() {
            match self.source.poll(POLL_INTERVAL).await {
                // Poll interval expired with nothing to decode
                Ok(None) => {}
                Ok(Some(event)) => self.state.events.send(event).await,
                Err(e) => {
                    dali_log!(error, "bus reader: transport failed: {}", e);
                    self.state.set_running(false);
                    return Err(e);
                }
            }
        }
        dali_log!(debug, "bus reader terminated");
        Ok(())
    }
}
