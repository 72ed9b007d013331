//! Mock link adapters for integration tests.
//!
//! Records every relay write, timer call and broadcast message so tests
//! can assert on the full history without a serial device.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use greenhouse::app::events::BroadcastMessage;
use greenhouse::app::ports::{EventSink, TimerPort};
use greenhouse::config::ControllerConfig;
use greenhouse::link::channels::{TimerSignalChannel, timer_signal_channel};
use greenhouse::link::intake::CommandIntake;
use greenhouse::link::transport::Transport;
use greenhouse::link::worker::LinkWorker;
use greenhouse::safety::SessionId;
use greenhouse::status::StatusHandle;

pub type Shared<T> = Arc<Mutex<Vec<T>>>;

// ── Scripted transport ────────────────────────────────────────

/// One scripted response to a `read` call.
#[derive(Debug, Clone)]
pub enum ReadStep {
    Bytes(Vec<u8>),
    Fail(io::ErrorKind),
}

/// Link that replays a read script and records writes. An exhausted
/// script reads as end of stream.
pub struct ScriptedTransport {
    reads: VecDeque<ReadStep>,
    pub writes: Shared<Vec<u8>>,
    fail_writes: bool,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn new(reads: impl IntoIterator<Item = ReadStep>) -> Self {
        Self {
            reads: reads.into_iter().collect(),
            writes: Arc::new(Mutex::new(Vec::new())),
            fail_writes: false,
        }
    }

    /// One read per chunk, each returning the chunk's bytes.
    pub fn chunks<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> Self {
        Self::new(chunks.into_iter().map(|c| ReadStep::Bytes(c.to_vec())))
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }
}

impl Transport for ScriptedTransport {
    type Error = io::Error;

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reads.pop_front() {
            None => Ok(0),
            Some(ReadStep::Fail(kind)) => Err(kind.into()),
            Some(ReadStep::Bytes(mut bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    self.reads.push_front(ReadStep::Bytes(bytes.split_off(n)));
                }
                Ok(n)
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::ErrorKind::BrokenPipe.into());
        }
        self.writes.lock().unwrap().push(data.to_vec());
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ── Recording timer ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerCall {
    Start(SessionId, Duration),
    Cancel(SessionId),
}

/// Timer port that only records; tests inject signals by hand.
#[derive(Clone, Default)]
pub struct RecordingTimer {
    pub calls: Shared<TimerCall>,
}

impl TimerPort for RecordingTimer {
    fn start(&mut self, session: SessionId, duration: Duration) {
        self.calls.lock().unwrap().push(TimerCall::Start(session, duration));
    }

    fn cancel(&mut self, session: SessionId) {
        self.calls.lock().unwrap().push(TimerCall::Cancel(session));
    }
}

// ── Collecting sink ───────────────────────────────────────────

#[derive(Clone, Default)]
pub struct CollectSink {
    pub messages: Shared<BroadcastMessage>,
}

impl EventSink for CollectSink {
    fn emit(&mut self, msg: &BroadcastMessage) {
        self.messages.lock().unwrap().push(msg.clone());
    }
}

// ── Harness ───────────────────────────────────────────────────

pub struct Harness {
    pub worker: LinkWorker<ScriptedTransport, RecordingTimer, CollectSink>,
    pub intake: CommandIntake,
    pub signals: Arc<TimerSignalChannel>,
    pub status: StatusHandle,
    pub writes: Shared<Vec<u8>>,
    pub timer_calls: Shared<TimerCall>,
    pub messages: Shared<BroadcastMessage>,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(config: &ControllerConfig, transport: ScriptedTransport) -> Self {
        let intake = CommandIntake::new();
        let signals = timer_signal_channel();
        let status = StatusHandle::new();
        let timer = RecordingTimer::default();
        let sink = CollectSink::default();
        let writes = Arc::clone(&transport.writes);
        let timer_calls = Arc::clone(&timer.calls);
        let messages = Arc::clone(&sink.messages);
        let worker = LinkWorker::new(
            config,
            transport,
            timer,
            sink,
            intake.clone(),
            Arc::clone(&signals),
            status.clone(),
        );
        Self {
            worker,
            intake,
            signals,
            status,
            writes,
            timer_calls,
            messages,
        }
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().unwrap().clone()
    }

    pub fn timer_calls(&self) -> Vec<TimerCall> {
        self.timer_calls.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<BroadcastMessage> {
        self.messages.lock().unwrap().clone()
    }

    /// Humidity values broadcast so far, in order.
    pub fn readings(&self) -> Vec<f32> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                BroadcastMessage::Reading { humidity, .. } => Some(humidity),
                _ => None,
            })
            .collect()
    }

    pub fn last_write(&self) -> Option<Vec<u8>> {
        self.writes.lock().unwrap().last().cloned()
    }
}

/// Config with both relays off at startup and a generous read chunk.
pub fn quiet_config() -> ControllerConfig {
    ControllerConfig {
        read_chunk_size: 64,
        ..ControllerConfig::default()
    }
}
