use futures::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use super::pattern::{PatternPlanner, VibrationPattern};
use crate::analysis::{HapticEvent, HapticSink};

/// Hardware (or simulated) vibration motor.
pub trait Actuator: Send {
    /// Stop whatever pattern is currently playing.
    fn cancel(&mut self) {}

    fn play(&mut self, pattern: &VibrationPattern);
}

/// [`HapticSink`] that plans a pattern per event and plays it on an actuator.
///
/// A new pattern cancels the previous one so rapid events never queue up
/// on the motor.
pub struct PatternSink<A: Actuator> {
    planner: PatternPlanner,
    actuator: A,
}

impl<A: Actuator> PatternSink<A> {
    pub fn new(planner: PatternPlanner, actuator: A) -> Self {
        Self { planner, actuator }
    }

    pub fn planner_mut(&mut self) -> &mut PatternPlanner {
        &mut self.planner
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn into_actuator(self) -> A {
        self.actuator
    }
}

impl<A: Actuator> HapticSink for PatternSink<A> {
    fn trigger(&mut self, event: HapticEvent) {
        if let Some(pattern) = self.planner.plan(&event) {
            tracing::trace!(?event.kind, intensity = event.intensity, "playing haptic pattern");
            self.actuator.cancel();
            self.actuator.play(&pattern);
        }
    }
}

/// Actuator that records every pattern, for tests and dry runs
#[derive(Debug, Default)]
pub struct RecordingActuator {
    pub played: Vec<VibrationPattern>,
    pub cancels: usize,
}

impl Actuator for RecordingActuator {
    fn cancel(&mut self) {
        self.cancels += 1;
    }

    fn play(&mut self, pattern: &VibrationPattern) {
        self.played.push(pattern.clone());
    }
}

/// Fan-out of haptic events to any number of async subscribers.
///
/// Cloning the channel shares the same underlying broadcast; a clone can be
/// handed to a session as its sink while UI code subscribes to streams.
#[derive(Debug, Clone)]
pub struct HapticChannel {
    tx: broadcast::Sender<HapticEvent>,
}

impl HapticChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HapticEvent> {
        self.tx.subscribe()
    }

    /// Stream of events; lagged receivers skip the missed events.
    pub fn stream(&self) -> impl Stream<Item = HapticEvent> + Send + 'static {
        BroadcastStream::new(self.tx.subscribe()).filter_map(|result| async move {
            match result {
                Ok(event) => Some(event),
                Err(err) => {
                    tracing::warn!("haptic stream lagged: {}", err);
                    None
                }
            }
        })
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for HapticChannel {
    fn default() -> Self {
        Self::new(256)
    }
}

impl HapticSink for HapticChannel {
    fn trigger(&mut self, event: HapticEvent) {
        let _ = self.tx.send(event);
    }
}
