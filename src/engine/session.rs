//! AnalysisSession: one capture device, one worker thread, one pipeline.
//!
//! Lifecycle is `not running -> running -> not running`. `start` builds the
//! pipeline (configuration errors fail here), spawns the worker, and waits
//! until the worker has opened the capture source, so open failures are
//! reported synchronously. `stop` clears the running flag and joins the
//! worker; the capture source and buffers are owned by the worker and are
//! released only after the loop has exited.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::sync_channel;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::analysis::{AnalysisMode, AnalysisPipeline, HapticSink, NullSink};
use crate::audio::{CaptureBackend, CaptureSource, ReadError};
use crate::config::{AppConfig, InputSource};
use crate::engine::clock::{Clock, MonotonicClock};
use crate::error::{log_audio_error, AudioError};
use crate::telemetry::{SessionEvent, SessionEvents, SessionStats, StatsSnapshot, StopReason};


/// Assembles the collaborators of an [`AnalysisSession`].
pub struct SessionBuilder {
    config: AppConfig,
    backend: Option<Box<dyn CaptureBackend>>,
    sink: Box<dyn HapticSink>,
    clock: Arc<dyn Clock>,
    events: SessionEvents,
}

impl SessionBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            backend: None,
            sink: Box::new(NullSink),
            clock: Arc::new(MonotonicClock::new()),
            events: SessionEvents::default(),
        }
    }

    /// Capture backend; defaults to the platform's live backend.
    pub fn backend(mut self, backend: Box<dyn CaptureBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn sink(mut self, sink: Box<dyn HapticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Publish lifecycle events on an existing channel.
    pub fn events(mut self, events: SessionEvents) -> Self {
        self.events = events;
        self
    }

    pub fn start(self) -> Result<AnalysisSession, AudioError> {
        AnalysisSession::start(self)
    }
}

struct WorkerContext {
    config: AppConfig,
    pipeline: AnalysisPipeline,
    sink: Box<dyn HapticSink>,
    clock: Arc<dyn Clock>,
    running: Arc<AtomicBool>,
    stats: Arc<SessionStats>,
    events: SessionEvents,
    stop_reason: Arc<Mutex<Option<StopReason>>>,
}

/// A running (or finished) analysis session.
///
/// Dropping a session stops it.
pub struct AnalysisSession {
    mode: AnalysisMode,
    input_source: InputSource,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<StopReason>>,
    stats: Arc<SessionStats>,
    events: SessionEvents,
    stop_reason: Arc<Mutex<Option<StopReason>>>,
}

impl AnalysisSession {
    fn start(builder: SessionBuilder) -> Result<Self, AudioError> {
        let SessionBuilder {
            config,
            backend,
            sink,
            clock,
            events,
        } = builder;

        let pipeline = AnalysisPipeline::new(&config).map_err(|err| {
            let err = AudioError::from(err);
            log_audio_error(&err, "session_start");
            err
        })?;
        let backend = backend.unwrap_or_else(crate::audio::default_backend);

        let mode = config.session.mode;
        let input_source = config.session.input_source;
        let running = Arc::new(AtomicBool::new(true));
        let stats = Arc::new(SessionStats::new());
        let stop_reason = Arc::new(Mutex::new(None));

        let ctx = WorkerContext {
            config,
            pipeline,
            sink,
            clock,
            running: Arc::clone(&running),
            stats: Arc::clone(&stats),
            events: events.clone(),
            stop_reason: Arc::clone(&stop_reason),
        };

        let (init_tx, init_rx) = sync_channel::<Result<(), AudioError>>(1);
        let worker = thread::Builder::new()
            .name("haptic-analysis".to_string())
            .spawn(move || {
                let source = match backend.open(&ctx.config.session) {
                    Ok(source) => {
                        let _ = init_tx.send(Ok(()));
                        source
                    }
                    Err(err) => {
                        ctx.running.store(false, Ordering::SeqCst);
                        let _ = init_tx.send(Err(err));
                        return StopReason::DeviceError;
                    }
                };
                run_worker(ctx, source)
            })
            .map_err(|e| AudioError::StreamFailure {
                reason: format!("Failed to spawn analysis thread: {}", e),
            })?;

        let init = init_rx.recv().unwrap_or_else(|_| {
            Err(AudioError::StreamFailure {
                reason: "analysis thread exited during capture init".to_string(),
            })
        });
        if let Err(err) = init {
            let _ = worker.join();
            log_audio_error(&err, "session_start");
            return Err(err);
        }

        tracing::info!(?mode, input = input_source.name(), "analysis session started");

        Ok(Self {
            mode,
            input_source,
            running,
            worker: Some(worker),
            stats,
            events,
            stop_reason,
        })
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn input_source(&self) -> InputSource {
        self.input_source
    }

    /// True until `stop` is called or the worker ends on its own.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Why the worker ended, once it has.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason.lock().ok().and_then(|guard| *guard)
    }

    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Stop the worker and release the capture device.
    ///
    /// Returns why the worker loop ended; `Requested` unless it had already
    /// stopped on a device error or end of stream.
    pub fn stop(&mut self) -> Result<StopReason, AudioError> {
        let worker = self.worker.take().ok_or(AudioError::NotRunning)?;

        self.running.store(false, Ordering::SeqCst);
        let reason = worker.join().map_err(|_| {
            let err = AudioError::StreamFailure {
                reason: "analysis thread panicked".to_string(),
            };
            log_audio_error(&err, "session_stop");
            err
        })?;

        tracing::info!(?reason, "analysis session stopped");
        Ok(reason)
    }
}

impl Drop for AnalysisSession {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let _ = self.stop();
        }
    }
}

fn run_worker(mut ctx: WorkerContext, mut source: Box<dyn CaptureSource>) -> StopReason {
    let read_len = ctx
        .config
        .session
        .buffer_size_samples
        .max(source.min_read_samples());
    let mut buffer = vec![0i16; read_len];

    if source.sample_rate_hz() != ctx.config.session.sample_rate_hz {
        tracing::warn!(
            device_rate = source.sample_rate_hz(),
            session_rate = ctx.config.session.sample_rate_hz,
            "capture rate differs from configured rate"
        );
    }

    ctx.events.publish(SessionEvent::Started {
        mode: ctx.config.session.mode,
        input_source: ctx.config.session.input_source,
        read_buffer_samples: read_len,
    });

    let reason = loop {
        if !ctx.running.load(Ordering::SeqCst) {
            break StopReason::Requested;
        }

        match source.read(&mut buffer) {
            Ok(0) => {
                ctx.stats.record_empty_read();
                tracing::trace!("empty capture read");
            }
            Ok(count) => {
                let now_ms = ctx.clock.now_ms();
                let analysis = ctx
                    .pipeline
                    .process(&buffer[..count], now_ms, ctx.sink.as_mut());
                ctx.stats.record_frame(&analysis);
            }
            Err(ReadError::EndOfStream) => {
                tracing::info!("capture source reached end of stream");
                break StopReason::EndOfStream;
            }
            Err(err) if err.is_fatal() => {
                tracing::error!(error = %err, "fatal capture read error, stopping session");
                break StopReason::DeviceError;
            }
            Err(err) => {
                ctx.stats.record_transient_error();
                tracing::warn!(error = %err, "capture read failed, skipping");
            }
        }
    };

    ctx.running.store(false, Ordering::SeqCst);
    drop(source);
    drop(buffer);

    if let Ok(mut guard) = ctx.stop_reason.lock() {
        *guard = Some(reason);
    }
    ctx.events.publish(SessionEvent::Stopped {
        reason,
        frames_processed: ctx.stats.frames_processed(),
    });

    reason
}
