//! Analysis modes and the frequency bands they select.

use serde::{Deserialize, Serialize};

/// Selects which derived signal drives haptic output for a session.
///
/// Immutable for the lifetime of one analysis session; switching modes
/// requires a restart.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Beats only, gated on bass-band intensity
    #[default]
    OnlyBeats,
    /// Beats plus continuous bass intensity
    BeatsBass,
    /// Mid-range (vocal) intensity
    MidRangeVocals,
    /// Treble intensity only
    OnlyHighFrequencyInstruments,
    /// Beats plus treble intensity
    BeatsHighFrequencyInstruments,
}

/// Frequency band identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Bass,
    Mid,
    Treble,
}

impl AnalysisMode {
    pub const ALL: [AnalysisMode; 5] = [
        AnalysisMode::OnlyBeats,
        AnalysisMode::BeatsBass,
        AnalysisMode::MidRangeVocals,
        AnalysisMode::OnlyHighFrequencyInstruments,
        AnalysisMode::BeatsHighFrequencyInstruments,
    ];

    /// Band signal dispatched in addition to beats, if any.
    pub fn band_signal(self) -> Option<Band> {
        match self {
            AnalysisMode::OnlyBeats => None,
            AnalysisMode::BeatsBass => Some(Band::Bass),
            AnalysisMode::MidRangeVocals => Some(Band::Mid),
            AnalysisMode::OnlyHighFrequencyInstruments => Some(Band::Treble),
            AnalysisMode::BeatsHighFrequencyInstruments => Some(Band::Treble),
        }
    }

    /// Whether the beat trigger is gated on bass intensity instead of
    /// broadband energy.
    pub fn gates_beats_on_bass(self) -> bool {
        matches!(self, AnalysisMode::OnlyBeats)
    }
}

impl Band {
    pub fn name(self) -> &'static str {
        match self {
            Band::Bass => "bass",
            Band::Mid => "mid",
            Band::Treble => "treble",
        }
    }
}
