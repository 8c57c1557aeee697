//! # Frame Source — Paced Chunk Producer
//!
//! Reads fixed-size chunks from any [`Read`] and hands them to the render
//! loop at a target rate. Production and rendering run on separate threads
//! joined by a bounded queue:
//!
//! ```text
//! source thread                          render loop
//! ┌────────────────────────┐   bounded   ┌──────────────────────┐
//! │ Clock ─► Pacer.due()   │   channel   │ drain queue          │
//! │ ChunkSource::next_event├────────────►│ render newest frame  │
//! └────────────────────────┘ SourceEvent └──────────────────────┘
//! ```
//!
//! Events arrive in order: any number of [`SourceEvent::Data`], then exactly
//! one of `Finish`, `Error`, or `Abort`.

mod pacer;

pub use pacer::{DEFAULT_RATE, Pacer};

use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::PlayerConfig;
use crate::error::{Error, Result};
use crate::time::Clock;

/// Largest chunk a source will read at once (4 MiB).
pub const CHUNK_LIMIT: usize = 4 * 1024 * 1024;

/// Longest the producer sleeps between abort checks.
const MAX_IDLE: Duration = Duration::from_millis(20);

/// Summary emitted once the input is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishStats {
    /// Data chunks emitted.
    pub chunk_count: u64,
    /// Time from the first read to the end of input.
    pub time_cost: Duration,
    /// Bytes emitted.
    pub total_size: u64,
}

/// What a source produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// One chunk. The last chunk of the input may be short.
    Data(Vec<u8>),
    /// End of input.
    Finish(FinishStats),
    /// The reader failed.
    Error(String),
    /// The producer was aborted.
    Abort,
}

/// Reads an input one chunk at a time.
pub struct ChunkSource<R> {
    reader: R,
    chunk_size: usize,
    offset: u64,
    chunk_count: u64,
    finished: bool,
    clock: Clock,
}

impl<R: Read> ChunkSource<R> {
    /// `chunk_size` is clamped to `1..=CHUNK_LIMIT`.
    pub fn new(reader: R, chunk_size: usize) -> Self {
        let clamped = chunk_size.clamp(1, CHUNK_LIMIT);
        if clamped != chunk_size {
            log::warn!("chunk size {chunk_size} clamped to {clamped}");
        }
        Self {
            reader,
            chunk_size: clamped,
            offset: 0,
            chunk_count: 0,
            finished: false,
            clock: Clock::new(false),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Bytes read so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Read the next chunk.
    ///
    /// Returns `Data` until the reader is exhausted, then `Finish` once, then
    /// `None` forever. A read error returns `Error` and also ends the source.
    pub fn next_event(&mut self) -> Option<SourceEvent> {
        if self.finished {
            return None;
        }
        // Starts the clock on the first read.
        self.clock.elapsed();

        let mut chunk = Vec::with_capacity(self.chunk_size);
        match self
            .reader
            .by_ref()
            .take(self.chunk_size as u64)
            .read_to_end(&mut chunk)
        {
            Ok(0) => {
                self.finished = true;
                Some(SourceEvent::Finish(FinishStats {
                    chunk_count: self.chunk_count,
                    time_cost: self.clock.elapsed(),
                    total_size: self.offset,
                }))
            }
            Ok(n) => {
                self.offset += n as u64;
                self.chunk_count += 1;
                Some(SourceEvent::Data(chunk))
            }
            Err(e) => {
                self.finished = true;
                Some(SourceEvent::Error(e.to_string()))
            }
        }
    }
}

/// Producer settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceConfig {
    /// Chunks per second.
    pub rate: f64,
    /// Bytes per chunk, normally one frame.
    pub chunk_size: usize,
}

impl SourceConfig {
    /// One chunk per frame at the player's frame rate.
    pub fn for_player(config: &PlayerConfig) -> Result<Self> {
        Ok(Self {
            rate: config.frame_rate,
            chunk_size: config.frame_len()?,
        })
    }

    /// Fail with [`Error::InvalidOption`] unless the rate is finite and positive.
    pub fn validate(&self) -> Result<()> {
        if !(self.rate.is_finite() && self.rate > 0.0) {
            return Err(Error::InvalidOption(format!(
                "source rate must be positive (got {})",
                self.rate
            )));
        }
        Ok(())
    }
}

/// Control over a running producer thread.
pub struct SourceHandle {
    aborted: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl SourceHandle {
    /// Ask the producer to stop. It emits [`SourceEvent::Abort`] and exits.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the producer thread to exit.
    pub fn join(mut self) {
        self.join_thread();
    }

    fn join_thread(&mut self) {
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            log::error!("frame source thread panicked");
        }
    }
}

impl Drop for SourceHandle {
    fn drop(&mut self) {
        self.abort();
        self.join_thread();
    }
}

/// Start a producer thread that paces `reader` into `events`.
///
/// Fails before spawning if `config` has a rate that is not finite and
/// positive.
pub fn spawn_source<R>(
    reader: R,
    config: SourceConfig,
    events: SyncSender<SourceEvent>,
) -> Result<SourceHandle>
where
    R: Read + Send + 'static,
{
    config.validate()?;
    let aborted = Arc::new(AtomicBool::new(false));
    let producer = Producer {
        source: ChunkSource::new(reader, config.chunk_size),
        pacer: Pacer::new(config.rate),
        events,
        aborted: aborted.clone(),
    };

    let thread = thread::Builder::new()
        .name("frame-source".into())
        .spawn(move || producer.run())?;

    log::info!(
        "frame source started: {} byte chunks at {} per second",
        config.chunk_size,
        config.rate
    );
    Ok(SourceHandle {
        aborted,
        thread: Some(thread),
    })
}

struct Producer<R> {
    source: ChunkSource<R>,
    pacer: Pacer,
    events: SyncSender<SourceEvent>,
    aborted: Arc<AtomicBool>,
}

impl<R: Read> Producer<R> {
    fn run(mut self) {
        let mut clock = Clock::new(true);
        loop {
            if self.is_aborted() {
                self.send_abort();
                return;
            }

            let elapsed = clock.elapsed();
            for _ in 0..self.pacer.due(elapsed) {
                match self.source.next_event() {
                    Some(event @ SourceEvent::Data(_)) => {
                        if !self.send(event) {
                            break;
                        }
                        self.pacer.mark(1);
                    }
                    Some(event) => {
                        log::debug!("frame source done: {event:?}");
                        self.send(event);
                        return;
                    }
                    None => return,
                }
            }

            thread::sleep(self.pacer.until_next(clock.elapsed()).min(MAX_IDLE));
        }
    }

    fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    /// Queue an event, waiting while the queue is full. Gives up when the
    /// receiver is gone or the producer is aborted.
    fn send(&self, mut event: SourceEvent) -> bool {
        loop {
            match self.events.try_send(event) {
                Ok(()) => return true,
                Err(TrySendError::Full(returned)) => {
                    if self.is_aborted() {
                        return false;
                    }
                    event = returned;
                    thread::sleep(Duration::from_millis(1));
                }
                Err(TrySendError::Disconnected(_)) => {
                    self.aborted.store(true, Ordering::Release);
                    return false;
                }
            }
        }
    }

    fn send_abort(&self) {
        let mut event = SourceEvent::Abort;
        for _ in 0..100 {
            match self.events.try_send(event) {
                Err(TrySendError::Full(returned)) => {
                    event = returned;
                    thread::sleep(Duration::from_millis(1));
                }
                _ => break,
            }
        }
        log::info!("frame source aborted after {} chunks", self.pacer.emitted());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};
    use std::sync::mpsc;

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("disk on fire"))
        }
    }

    #[test]
    fn chunks_then_finish_once() {
        let mut source = ChunkSource::new(Cursor::new((0u8..10).collect::<Vec<_>>()), 4);
        assert_eq!(source.next_event(), Some(SourceEvent::Data(vec![0, 1, 2, 3])));
        assert_eq!(source.next_event(), Some(SourceEvent::Data(vec![4, 5, 6, 7])));
        // Short final read is emitted as-is.
        assert_eq!(source.next_event(), Some(SourceEvent::Data(vec![8, 9])));

        match source.next_event() {
            Some(SourceEvent::Finish(stats)) => {
                assert_eq!(stats.chunk_count, 3);
                assert_eq!(stats.total_size, 10);
            }
            other => panic!("expected Finish, got {other:?}"),
        }
        assert_eq!(source.next_event(), None);
        assert!(source.is_finished());
    }

    #[test]
    fn empty_input_finishes_immediately() {
        let mut source = ChunkSource::new(io::empty(), 24);
        assert!(matches!(
            source.next_event(),
            Some(SourceEvent::Finish(FinishStats {
                chunk_count: 0,
                total_size: 0,
                ..
            }))
        ));
    }

    #[test]
    fn chunk_size_is_clamped() {
        assert_eq!(ChunkSource::new(io::empty(), usize::MAX).chunk_size(), CHUNK_LIMIT);
        assert_eq!(ChunkSource::new(io::empty(), 0).chunk_size(), 1);
    }

    #[test]
    fn read_error_ends_source() {
        let mut source = ChunkSource::new(Broken, 8);
        match source.next_event() {
            Some(SourceEvent::Error(msg)) => assert!(msg.contains("disk on fire")),
            other => panic!("expected Error, got {other:?}"),
        }
        assert_eq!(source.next_event(), None);
    }

    #[test]
    fn source_config_uses_frame_length() {
        let player = PlayerConfig::from_json(r#"{"resolution":"4x4","frameRate":30}"#).unwrap();
        let config = SourceConfig::for_player(&player).unwrap();
        assert_eq!(config.chunk_size, 24);
        assert_eq!(config.rate, 30.0);
    }

    #[test]
    fn producer_delivers_every_chunk_then_finish() {
        let data: Vec<u8> = (0..=255).collect();
        let (tx, rx) = mpsc::sync_channel(2);
        let config = SourceConfig {
            rate: 1000.0,
            chunk_size: 64,
        };
        let handle = spawn_source(Cursor::new(data.clone()), config, tx).unwrap();

        let mut received = Vec::new();
        loop {
            match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
                SourceEvent::Data(chunk) => received.extend(chunk),
                SourceEvent::Finish(stats) => {
                    assert_eq!(stats.chunk_count, 4);
                    break;
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(received, data);
        handle.join();
    }

    #[test]
    fn abort_stops_endless_input() {
        let (tx, rx) = mpsc::sync_channel(2);
        let config = SourceConfig {
            rate: 500.0,
            chunk_size: 16,
        };
        let handle = spawn_source(io::repeat(7), config, tx).unwrap();

        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(5)),
            Ok(SourceEvent::Data(_))
        ));
        handle.abort();

        loop {
            match rx.recv_timeout(Duration::from_secs(5)) {
                Ok(SourceEvent::Data(chunk)) => assert_eq!(chunk, [7u8; 16]),
                Ok(SourceEvent::Abort) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                other => panic!("unexpected {other:?}"),
            }
        }
        handle.join();
    }

    #[test]
    fn bad_rate_is_rejected_before_spawning() {
        for rate in [0.0, -25.0, f64::NAN, f64::INFINITY] {
            let (tx, rx) = mpsc::sync_channel(1);
            let config = SourceConfig {
                rate,
                chunk_size: 4,
            };
            let result = spawn_source(Cursor::new(vec![1u8; 8]), config, tx);
            assert!(matches!(result, Err(Error::InvalidOption(_))), "rate {rate}");
            // The sender was dropped without a thread ever owning it.
            assert!(matches!(rx.try_recv(), Err(mpsc::TryRecvError::Disconnected)));
        }
    }

    #[test]
    fn dropped_receiver_stops_producer() {
        let (tx, rx) = mpsc::sync_channel(1);
        let config = SourceConfig {
            rate: 1000.0,
            chunk_size: 8,
        };
        let handle = spawn_source(io::repeat(1), config, tx).unwrap();
        drop(rx);
        handle.join();
    }
}
