//! Haptic output: pattern planning and actuator/stream adapters.
//!
//! The analysis pipeline only produces [`HapticEvent`](crate::analysis::HapticEvent)s.
//! This module turns them into concrete vibration patterns for an actuator,
//! or republishes them as an async stream for UI consumers.

use serde::{Deserialize, Serialize};

pub mod channel;
pub mod pattern;

pub use channel::{Actuator, HapticChannel, PatternSink, RecordingActuator};
pub use pattern::{PatternPlanner, VibrationPattern};

/// How events are rendered on the actuator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HapticStyle {
    /// Single pulse whose length and strength follow the intensity
    #[default]
    Normal,
    /// Shaped per-event waveforms
    Rich,
}
