//! Event dispatcher: per-frame analysis results to typed haptic events.
//!
//! Beat events go out in every mode whenever the detector fires. The mode
//! then selects at most one band signal, which is emitted on every processed
//! frame (including zero intensity, so actuators can fade out).

use serde::{Deserialize, Serialize};
use std::sync::mpsc;
use tokio::sync::broadcast;

use super::bands::BandIntensity;
use super::mode::{AnalysisMode, Band};

/// What kind of signal produced a haptic event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HapticEventKind {
    Beat,
    Bass,
    Mid,
    Treble,
}

impl From<Band> for HapticEventKind {
    fn from(band: Band) -> Self {
        match band {
            Band::Bass => HapticEventKind::Bass,
            Band::Mid => HapticEventKind::Mid,
            Band::Treble => HapticEventKind::Treble,
        }
    }
}

/// A single haptic trigger, intensity in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HapticEvent {
    pub kind: HapticEventKind,
    pub intensity: f32,
    /// Session clock time of the frame that produced the event
    pub timestamp_ms: u64,
}

/// Receiver of haptic events.
///
/// Delivery is fire-and-forget: implementations must not block the worker
/// thread, and a full or closed channel simply drops the event.
pub trait HapticSink: Send {
    fn trigger(&mut self, event: HapticEvent);
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl HapticSink for NullSink {
    fn trigger(&mut self, _event: HapticEvent) {}
}

/// Adapts a closure into a [`HapticSink`].
pub struct CallbackSink<F>(F);

impl<F> CallbackSink<F>
where
    F: FnMut(HapticEvent) + Send,
{
    pub fn new(callback: F) -> Self {
        Self(callback)
    }
}

impl<F> HapticSink for CallbackSink<F>
where
    F: FnMut(HapticEvent) + Send,
{
    fn trigger(&mut self, event: HapticEvent) {
        (self.0)(event)
    }
}

impl HapticSink for Vec<HapticEvent> {
    fn trigger(&mut self, event: HapticEvent) {
        self.push(event);
    }
}

impl HapticSink for broadcast::Sender<HapticEvent> {
    fn trigger(&mut self, event: HapticEvent) {
        // No receivers is not an error for the producer
        let _ = self.send(event);
    }
}

impl HapticSink for mpsc::Sender<HapticEvent> {
    fn trigger(&mut self, event: HapticEvent) {
        let _ = self.send(event);
    }
}

impl HapticSink for mpsc::SyncSender<HapticEvent> {
    fn trigger(&mut self, event: HapticEvent) {
        if let Err(mpsc::TrySendError::Full(event)) = self.try_send(event) {
            tracing::trace!(?event.kind, "haptic channel full, dropping event");
        }
    }
}

impl<S: HapticSink + ?Sized> HapticSink for Box<S> {
    fn trigger(&mut self, event: HapticEvent) {
        (**self).trigger(event)
    }
}

impl<S: HapticSink + ?Sized> HapticSink for &mut S {
    fn trigger(&mut self, event: HapticEvent) {
        (**self).trigger(event)
    }
}

/// Maps detector and extractor output to events according to the session mode.
#[derive(Debug, Clone, Copy)]
pub struct EventDispatcher {
    mode: AnalysisMode,
}

impl EventDispatcher {
    pub fn new(mode: AnalysisMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    /// Emit this frame's events and return how many were delivered.
    pub fn dispatch(
        &self,
        beat: Option<f32>,
        bands: &BandIntensity,
        timestamp_ms: u64,
        sink: &mut dyn HapticSink,
    ) -> usize {
        let mut emitted = 0;

        if let Some(intensity) = beat {
            sink.trigger(HapticEvent {
                kind: HapticEventKind::Beat,
                intensity,
                timestamp_ms,
            });
            emitted += 1;
        }

        if let Some(band) = self.mode.band_signal() {
            sink.trigger(HapticEvent {
                kind: band.into(),
                intensity: bands.get(band),
                timestamp_ms,
            });
            emitted += 1;
        }

        emitted
    }
}
