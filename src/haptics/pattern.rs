// Vibration pattern planner
//
// amplitude = round(clamp(intensity * global_percent / 100, 0, 1) * 255)
// An amplitude of 0 produces no pattern at all.
//
// Normal style: one pulse of max(10, 50 * scaled) ms.
// Rich style, timings in ms / amplitudes relative to `a`:
//   beat    [0, 50, 100, 50]   [0, a, 0.3a, 0]
//   bass    [0, 80, 200, 100]  [0, 0.8a', 0.8a', 0]   with a' = 0.65a
//   mid     [0, 40, 350, 150]  [0, 0.5a, 0.7a, 0]
//   treble  [0, 15, 8]         [0, a, 0]
// Every derived amplitude is rounded and kept at >= 1.

use serde::{Deserialize, Serialize};

use super::HapticStyle;
use crate::analysis::{HapticEvent, HapticEventKind};
use crate::config::HapticsConfig;

const MAX_AMPLITUDE: f32 = 255.0;
const MIN_PULSE_MS: u64 = 10;
const PULSE_MS_PER_UNIT: f32 = 50.0;

const BEAT_TIMINGS_MS: [u64; 4] = [0, 50, 100, 50];
const BEAT_SUSTAIN_FACTOR: f32 = 0.3;

const BASS_TIMINGS_MS: [u64; 4] = [0, 80, 200, 100];
const BASS_AMPLITUDE_SCALE: f32 = 0.65;
const BASS_SUSTAIN_FACTOR: f32 = 0.8;

const MID_TIMINGS_MS: [u64; 4] = [0, 40, 350, 150];
const MID_INITIAL_FACTOR: f32 = 0.5;
const MID_SUSTAIN_FACTOR: f32 = 0.7;

const TREBLE_TIMINGS_MS: [u64; 3] = [0, 15, 8];

/// Something an actuator can play
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VibrationPattern {
    OneShot {
        duration_ms: u64,
        amplitude: u8,
    },
    /// Alternating segments; `timings_ms[i]` is played at `amplitudes[i]`
    Waveform {
        timings_ms: Vec<u64>,
        amplitudes: Vec<u8>,
    },
}

impl VibrationPattern {
    pub fn total_duration_ms(&self) -> u64 {
        match self {
            VibrationPattern::OneShot { duration_ms, .. } => *duration_ms,
            VibrationPattern::Waveform { timings_ms, .. } => timings_ms.iter().sum(),
        }
    }

    pub fn peak_amplitude(&self) -> u8 {
        match self {
            VibrationPattern::OneShot { amplitude, .. } => *amplitude,
            VibrationPattern::Waveform { amplitudes, .. } => {
                amplitudes.iter().copied().max().unwrap_or(0)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PatternPlanner {
    global_intensity_percent: u8,
    style: HapticStyle,
}

impl PatternPlanner {
    pub fn new(config: &HapticsConfig) -> Self {
        Self {
            global_intensity_percent: config.global_intensity_percent.min(100),
            style: config.style,
        }
    }

    pub fn style(&self) -> HapticStyle {
        self.style
    }

    pub fn set_global_intensity(&mut self, percent: u8) {
        self.global_intensity_percent = percent.min(100);
        tracing::debug!(percent = self.global_intensity_percent, "global haptic intensity set");
    }

    /// Event intensity after global scaling, in [0, 1]
    pub fn scaled_intensity(&self, intensity: f32) -> f32 {
        let scaled = intensity * (self.global_intensity_percent as f32 / 100.0);
        if scaled.is_nan() {
            0.0
        } else {
            scaled.clamp(0.0, 1.0)
        }
    }

    pub fn plan(&self, event: &HapticEvent) -> Option<VibrationPattern> {
        let scaled = self.scaled_intensity(event.intensity);
        let amplitude = (scaled * MAX_AMPLITUDE).round() as u8;
        if amplitude == 0 {
            return None;
        }

        let pattern = match self.style {
            HapticStyle::Normal => VibrationPattern::OneShot {
                duration_ms: ((PULSE_MS_PER_UNIT * scaled) as u64).max(MIN_PULSE_MS),
                amplitude,
            },
            HapticStyle::Rich => rich_waveform(event.kind, amplitude),
        };
        Some(pattern)
    }
}

fn scale(amplitude: u8, factor: f32) -> u8 {
    ((amplitude as f32 * factor).round() as u8).max(1)
}

fn rich_waveform(kind: HapticEventKind, a: u8) -> VibrationPattern {
    let (timings, amplitudes): (&[u64], Vec<u8>) = match kind {
        HapticEventKind::Beat => (
            &BEAT_TIMINGS_MS,
            vec![0, a, scale(a, BEAT_SUSTAIN_FACTOR), 0],
        ),
        HapticEventKind::Bass => {
            let a = scale(a, BASS_AMPLITUDE_SCALE);
            let sustain = scale(a, BASS_SUSTAIN_FACTOR);
            (&BASS_TIMINGS_MS, vec![0, sustain, sustain, 0])
        }
        HapticEventKind::Mid => (
            &MID_TIMINGS_MS,
            vec![
                0,
                scale(a, MID_INITIAL_FACTOR),
                scale(a, MID_SUSTAIN_FACTOR),
                0,
            ],
        ),
        HapticEventKind::Treble => (&TREBLE_TIMINGS_MS, vec![0, a, 0]),
    };

    VibrationPattern::Waveform {
        timings_ms: timings.to_vec(),
        amplitudes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: HapticEventKind, intensity: f32) -> HapticEvent {
        HapticEvent {
            kind,
            intensity,
            timestamp_ms: 0,
        }
    }

    fn planner(percent: u8, style: HapticStyle) -> PatternPlanner {
        PatternPlanner::new(&HapticsConfig {
            global_intensity_percent: percent,
            style,
        })
    }

    #[test]
    fn test_zero_amplitude_plans_nothing() {
        let planner = planner(50, HapticStyle::Normal);
        assert_eq!(planner.plan(&event(HapticEventKind::Beat, 0.0)), None);
        // 0.001 * 0.5 * 255 rounds to 0
        assert_eq!(planner.plan(&event(HapticEventKind::Mid, 0.001)), None);

        let muted = self::planner(0, HapticStyle::Rich);
        assert_eq!(muted.plan(&event(HapticEventKind::Beat, 1.0)), None);
    }

    #[test]
    fn test_normal_pulse() {
        let planner = planner(100, HapticStyle::Normal);
        assert_eq!(
            planner.plan(&event(HapticEventKind::Beat, 1.0)),
            Some(VibrationPattern::OneShot {
                duration_ms: 50,
                amplitude: 255
            })
        );

        let planner = self::planner(50, HapticStyle::Normal);
        assert_eq!(
            planner.plan(&event(HapticEventKind::Bass, 0.2)),
            Some(VibrationPattern::OneShot {
                duration_ms: 10,
                amplitude: 26
            })
        );
    }

    #[test]
    fn test_rich_beat_waveform() {
        let planner = planner(100, HapticStyle::Rich);
        assert_eq!(
            planner.plan(&event(HapticEventKind::Beat, 1.0)),
            Some(VibrationPattern::Waveform {
                timings_ms: vec![0, 50, 100, 50],
                amplitudes: vec![0, 255, 77, 0],
            })
        );
    }

    #[test]
    fn test_rich_bass_is_attenuated() {
        let planner = planner(100, HapticStyle::Rich);
        // 255 * 0.65 = 166, * 0.8 = 133
        assert_eq!(
            planner.plan(&event(HapticEventKind::Bass, 1.0)),
            Some(VibrationPattern::Waveform {
                timings_ms: vec![0, 80, 200, 100],
                amplitudes: vec![0, 133, 133, 0],
            })
        );
    }

    #[test]
    fn test_rich_mid_and_treble() {
        let planner = planner(100, HapticStyle::Rich);
        let mid = planner.plan(&event(HapticEventKind::Mid, 1.0)).unwrap();
        assert_eq!(
            mid,
            VibrationPattern::Waveform {
                timings_ms: vec![0, 40, 350, 150],
                amplitudes: vec![0, 128, 179, 0],
            }
        );
        assert_eq!(mid.total_duration_ms(), 540);

        let treble = planner.plan(&event(HapticEventKind::Treble, 0.5)).unwrap();
        assert_eq!(treble.peak_amplitude(), 128);
        assert_eq!(treble.total_duration_ms(), 23);
    }

    #[test]
    fn test_shaped_amplitudes_never_drop_to_zero() {
        let planner = planner(1, HapticStyle::Rich);
        // 1% of full intensity: amplitude 3, bass 0.65 -> 2, sustain -> 2
        let bass = planner.plan(&event(HapticEventKind::Bass, 1.0)).unwrap();
        let VibrationPattern::Waveform { amplitudes, .. } = bass else {
            panic!("rich style must produce waveforms");
        };
        assert!(amplitudes[1] >= 1 && amplitudes[2] >= 1);
    }

    #[test]
    fn test_intensity_is_clamped() {
        let mut planner = planner(100, HapticStyle::Normal);
        assert_eq!(planner.scaled_intensity(3.0), 1.0);
        assert_eq!(planner.scaled_intensity(-1.0), 0.0);
        assert_eq!(planner.scaled_intensity(f32::NAN), 0.0);

        planner.set_global_intensity(250);
        assert_eq!(planner.scaled_intensity(0.5), 0.5);
    }
}
