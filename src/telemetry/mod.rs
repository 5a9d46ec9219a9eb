//! Per-session counters and lifecycle broadcast.
//!
//! The worker thread updates [`SessionStats`] with relaxed atomics; any thread
//! may take a [`StatsSnapshot`] for status reporting. Lifecycle changes go out
//! on a tokio broadcast channel so async observers can follow a session.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::analysis::FrameAnalysis;

pub mod events;

pub use events::{SessionEvent, StopReason};

/// Snapshot of session counters for CLI/status reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub frames_processed: u64,
    pub empty_reads: u64,
    pub transient_read_errors: u64,
    pub beats: u64,
    pub band_events: u64,
    pub last_beat_intensity: f32,
}

/// Lock-free counters shared between the worker and observers
#[derive(Debug, Default)]
pub struct SessionStats {
    frames_processed: AtomicU64,
    empty_reads: AtomicU64,
    transient_read_errors: AtomicU64,
    beats: AtomicU64,
    band_events: AtomicU64,
    // f32 bits
    last_beat_intensity: AtomicU32,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame(&self, analysis: &FrameAnalysis) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);

        let band_events = match analysis.beat {
            Some(intensity) => {
                self.beats.fetch_add(1, Ordering::Relaxed);
                self.last_beat_intensity
                    .store(intensity.to_bits(), Ordering::Relaxed);
                analysis.events_emitted.saturating_sub(1)
            }
            None => analysis.events_emitted,
        };
        self.band_events
            .fetch_add(band_events as u64, Ordering::Relaxed);
    }

    pub fn record_empty_read(&self) {
        self.empty_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transient_error(&self) {
        self.transient_read_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            empty_reads: self.empty_reads.load(Ordering::Relaxed),
            transient_read_errors: self.transient_read_errors.load(Ordering::Relaxed),
            beats: self.beats.load(Ordering::Relaxed),
            band_events: self.band_events.load(Ordering::Relaxed),
            last_beat_intensity: f32::from_bits(self.last_beat_intensity.load(Ordering::Relaxed)),
        }
    }
}

/// Broadcast of [`SessionEvent`]s.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new(buffer: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: SessionEvent) {
        tracing::debug!(?event, "session event");
        // Nobody listening is fine
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new(32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisMode, BandIntensity};
    use crate::config::InputSource;

    fn frame(beat: Option<f32>, events_emitted: usize) -> FrameAnalysis {
        FrameAnalysis {
            bands: BandIntensity::default(),
            beat,
            energy: 0.0,
            peak: 0,
            events_emitted,
        }
    }

    #[test]
    fn test_stats_count_beats_and_band_events() {
        let stats = SessionStats::new();
        stats.record_frame(&frame(None, 1));
        stats.record_frame(&frame(Some(0.75), 2));
        stats.record_frame(&frame(Some(0.5), 1));
        stats.record_empty_read();
        stats.record_transient_error();
        stats.record_transient_error();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.frames_processed, 3);
        assert_eq!(snapshot.beats, 2);
        assert_eq!(snapshot.band_events, 2);
        assert_eq!(snapshot.empty_reads, 1);
        assert_eq!(snapshot.transient_read_errors, 2);
        assert_eq!(snapshot.last_beat_intensity, 0.5);
    }

    #[test]
    fn test_events_reach_subscribers() {
        let events = SessionEvents::default();
        let mut rx = events.subscribe();

        events.publish(SessionEvent::Started {
            mode: AnalysisMode::BeatsBass,
            input_source: InputSource::Mic,
            read_buffer_samples: 1024,
        });
        events.publish(SessionEvent::Stopped {
            reason: StopReason::Requested,
            frames_processed: 12,
        });

        assert!(matches!(rx.try_recv(), Ok(SessionEvent::Started { .. })));
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::Stopped {
                reason: StopReason::Requested,
                frames_processed: 12
            }
        );
    }

    #[test]
    fn test_event_json_is_tagged() {
        let json = serde_json::to_string(&SessionEvent::Stopped {
            reason: StopReason::DeviceError,
            frames_processed: 3,
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"type":"stopped","payload":{"reason":"device_error","frames_processed":3}}"#
        );
    }
}
