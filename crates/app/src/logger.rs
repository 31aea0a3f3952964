//! Process-wide fan-out logger.
//!
//! A single input queue accepts `{level bitmask, text}` records; a dedicated
//! dispatch task forwards each record to every registered named sink whose
//! level filter matches. Each sink has its own bounded queue and writer
//! task, so a slow sink cannot block the central dispatcher — only
//! [`Logger::sync`] introduces a synchronization point, used at shutdown and
//! for deterministic test assertions.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;

const QUEUE_SIZE: usize = 100;
const SYNC_POLL: Duration = Duration::from_millis(2);

bitflags::bitflags! {
    /// Level bitmask carried by every record and used by sink filters.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LogLevel: u32 {
        const DEBUG   = 1;
        const MESSAGE = 1 << 1;
        const WARNING = 1 << 2;
        const PASS    = 1 << 3;
        const FAIL    = 1 << 4;
        /// Filter-only level matching `PASS | FAIL` records.
        const RESULTS = 1 << 5;
        const ERROR   = 1 << 6;
        /// Filter-only wildcard matching every record.
        const ALL     = 1 << 7;
    }
}

#[derive(Debug, Clone)]
struct Record {
    level: LogLevel,
    line: String,
}

enum Event {
    Record(Record),
    AddSink(Sink),
}

struct Sink {
    name: String,
    levels: LogLevel,
    queue: mpsc::Sender<Record>,
}

/// Clonable handle onto the fan-out logger.
///
/// Dropping every handle shuts the dispatcher and all writer tasks down.
#[derive(Clone)]
pub struct Logger {
    input: mpsc::Sender<Event>,
    /// Records accepted but not yet written by every matching sink.
    pending: Arc<AtomicUsize>,
    debug: Arc<AtomicBool>,
}

impl Logger {
    /// Create a logger and spawn its dispatch task.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new() -> Self {
        let (input, rx) = mpsc::channel(QUEUE_SIZE);
        let pending = Arc::new(AtomicUsize::new(0));
        let debug = Arc::new(AtomicBool::new(false));
        tokio::spawn(dispatch(rx, Arc::clone(&pending), Arc::clone(&debug)));
        Self {
            input,
            pending,
            debug,
        }
    }

    /// A logger wired to nothing — records are discarded.
    ///
    /// Used as the pre-`init` placeholder inside device cores, which never
    /// log before a real logger is bound.
    #[must_use]
    pub fn disconnected() -> Self {
        let (input, _) = mpsc::channel(1);
        Self {
            input,
            pending: Arc::new(AtomicUsize::new(0)),
            debug: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Register a named sink with its level filter and writer.
    ///
    /// The sink gets its own bounded queue and writer task.
    pub async fn add_sink(
        &self,
        name: impl Into<String>,
        levels: LogLevel,
        writer: Box<dyn Write + Send>,
    ) {
        let (queue, rx) = mpsc::channel(QUEUE_SIZE);
        tokio::spawn(write_loop(rx, writer, Arc::clone(&self.pending)));
        let sink = Sink {
            name: name.into(),
            levels,
            queue,
        };
        let _ = self.input.send(Event::AddSink(sink)).await;
    }

    /// Turn the global debug gate on or off.
    pub fn set_debug(&self, mode: bool) {
        self.debug.store(mode, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    /// Submit a record. A full input queue drops the record rather than
    /// blocking the caller.
    pub fn log(&self, level: LogLevel, text: impl AsRef<str>) {
        let record = Record {
            level,
            line: text.as_ref().to_string(),
        };
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.input.try_send(Event::Record(record)).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
    }

    pub fn message(&self, text: impl AsRef<str>) {
        self.log(LogLevel::MESSAGE, format!("MSG::{}", text.as_ref()));
    }

    pub fn warning(&self, text: impl AsRef<str>) {
        self.log(LogLevel::WARNING, format!("WARN::{}", text.as_ref()));
    }

    pub fn error(&self, text: impl AsRef<str>) {
        self.log(LogLevel::ERROR, format!("ERROR::{}", text.as_ref()));
    }

    /// Debug records are submitted only while the global debug gate is on.
    pub fn debug(&self, text: impl AsRef<str>) {
        if self.is_debug() {
            self.log(LogLevel::DEBUG, format!("DEBUG::{}", text.as_ref()));
        }
    }

    pub fn pass(&self, text: impl AsRef<str>) {
        self.log(LogLevel::PASS, format!("PASS::{}", text.as_ref()));
    }

    pub fn fail(&self, text: impl AsRef<str>) {
        self.log(LogLevel::FAIL, format!("FAIL::{}", text.as_ref()));
    }

    /// Block until every accepted record has been written by every matching
    /// sink. Spin-waits on the pending counter.
    pub async fn sync(&self) {
        while self.pending.load(Ordering::SeqCst) > 0 {
            tokio::time::sleep(SYNC_POLL).await;
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a record should reach a sink with the given filter.
fn matches(sink_levels: LogLevel, record_level: LogLevel, debug_on: bool) -> bool {
    if record_level.contains(LogLevel::DEBUG) {
        return debug_on
            && sink_levels.intersects(LogLevel::DEBUG | LogLevel::MESSAGE | LogLevel::ALL);
    }
    if sink_levels.contains(LogLevel::ALL) {
        return true;
    }
    if sink_levels.contains(LogLevel::RESULTS)
        && record_level.intersects(LogLevel::PASS | LogLevel::FAIL)
    {
        return true;
    }
    sink_levels.intersects(record_level)
}

async fn dispatch(
    mut rx: mpsc::Receiver<Event>,
    pending: Arc<AtomicUsize>,
    debug: Arc<AtomicBool>,
) {
    let mut sinks: Vec<Sink> = Vec::new();
    while let Some(event) = rx.recv().await {
        match event {
            Event::AddSink(sink) => {
                // Re-adding a name replaces the old sink.
                sinks.retain(|s| s.name != sink.name);
                sinks.push(sink);
            }
            Event::Record(record) => {
                let debug_on = debug.load(Ordering::Relaxed);
                for sink in &sinks {
                    if matches(sink.levels, record.level, debug_on) {
                        pending.fetch_add(1, Ordering::SeqCst);
                        if sink.queue.try_send(record.clone()).is_err() {
                            pending.fetch_sub(1, Ordering::SeqCst);
                        }
                    }
                }
                pending.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }
}

async fn write_loop(
    mut rx: mpsc::Receiver<Record>,
    mut writer: Box<dyn Write + Send>,
    pending: Arc<AtomicUsize>,
) {
    while let Some(record) = rx.recv().await {
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.6f");
        let _ = writeln!(writer, "{stamp} {}", record.line);
        let _ = writer.flush();
        pending.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Shared in-memory sink target for assertions.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn should_deliver_message_to_matching_sink() {
        let logger = Logger::new();
        let buf = SharedBuf::default();
        logger
            .add_sink("default", LogLevel::MESSAGE, Box::new(buf.clone()))
            .await;

        logger.message("mash started");
        logger.sync().await;

        assert!(buf.contents().contains("MSG::mash started"));
    }

    #[tokio::test]
    async fn should_deliver_pass_to_results_sink() {
        let logger = Logger::new();
        let buf = SharedBuf::default();
        logger
            .add_sink("results", LogLevel::RESULTS, Box::new(buf.clone()))
            .await;

        logger.pass("strike temp reached");
        logger.sync().await;

        assert!(buf.contents().contains("PASS::strike temp reached"));
    }

    #[tokio::test]
    async fn should_not_deliver_pass_to_debug_only_sink() {
        let logger = Logger::new();
        let buf = SharedBuf::default();
        logger
            .add_sink("debug", LogLevel::DEBUG, Box::new(buf.clone()))
            .await;

        logger.pass("strike temp reached");
        logger.sync().await;

        assert!(buf.contents().is_empty());
    }

    #[tokio::test]
    async fn should_gate_debug_records_on_global_flag() {
        let logger = Logger::new();
        let buf = SharedBuf::default();
        logger
            .add_sink("debug", LogLevel::DEBUG, Box::new(buf.clone()))
            .await;

        logger.debug("dropped");
        logger.sync().await;
        assert!(buf.contents().is_empty());

        logger.set_debug(true);
        logger.debug("kept");
        logger.sync().await;
        assert!(buf.contents().contains("DEBUG::kept"));
    }

    #[tokio::test]
    async fn should_deliver_everything_to_all_sink() {
        let logger = Logger::new();
        let buf = SharedBuf::default();
        logger
            .add_sink("default", LogLevel::ALL, Box::new(buf.clone()))
            .await;

        logger.message("m");
        logger.warning("w");
        logger.error("e");
        logger.fail("f");
        logger.sync().await;

        let contents = buf.contents();
        for needle in ["MSG::m", "WARN::w", "ERROR::e", "FAIL::f"] {
            assert!(contents.contains(needle), "missing {needle}: {contents}");
        }
    }

    #[tokio::test]
    async fn should_fan_out_to_multiple_sinks() {
        let logger = Logger::new();
        let all = SharedBuf::default();
        let errors = SharedBuf::default();
        logger
            .add_sink("default", LogLevel::ALL, Box::new(all.clone()))
            .await;
        logger
            .add_sink("errors", LogLevel::ERROR, Box::new(errors.clone()))
            .await;

        logger.message("quiet");
        logger.error("loud");
        logger.sync().await;

        assert!(all.contents().contains("MSG::quiet"));
        assert!(all.contents().contains("ERROR::loud"));
        assert!(!errors.contents().contains("MSG::quiet"));
        assert!(errors.contents().contains("ERROR::loud"));
    }

    #[tokio::test]
    async fn should_return_from_sync_with_empty_queues() {
        let logger = Logger::new();
        // No sinks registered at all.
        logger.message("into the void");
        logger.sync().await;
    }

    #[tokio::test]
    async fn should_discard_records_when_disconnected() {
        let logger = Logger::disconnected();
        logger.message("nobody listening");
        logger.sync().await;
    }
}
