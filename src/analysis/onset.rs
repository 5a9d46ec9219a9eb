// BeatDetector - instantaneous energy onset detection with debouncing
//
// Algorithm:
// 1. energy = mean(sample^2) over the normalized raw read (0 for an empty read)
// 2. beat_intensity = clamp(energy * energy_scale_factor, 0, 1)
// 3. trigger value depends on the mode:
//      OnlyBeats    -> bass band intensity, compared against bass_beat_threshold
//      other modes  -> log10(energy + 1), compared against general_beat_threshold
// 4. fire iff trigger > threshold AND now - last_beat > min_beat_interval_ms
//
// Each frame is judged on its own; there is no history beyond the time of the
// last accepted beat.

use super::frame::normalize;
use super::mode::AnalysisMode;
use crate::config::OnsetDetectionConfig;

/// Debounce state for one session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeatState {
    /// Time of the last accepted beat; `None` until the first beat fires
    pub last_beat_ms: Option<u64>,
}

/// Mean-square energy of a raw int16 read, normalized to [-1, 1) first.
pub fn frame_energy(raw: &[i16]) -> f32 {
    if raw.is_empty() {
        return 0.0;
    }
    let sum: f32 = raw
        .iter()
        .map(|&s| {
            let x = normalize(s);
            x * x
        })
        .sum();
    sum / raw.len() as f32
}

pub struct BeatDetector {
    mode: AnalysisMode,
    bass_beat_threshold: f32,
    general_beat_threshold: f32,
    energy_scale_factor: f32,
    min_beat_interval_ms: u64,
    state: BeatState,
}

impl BeatDetector {
    pub fn new(config: &OnsetDetectionConfig, mode: AnalysisMode) -> Self {
        Self {
            mode,
            bass_beat_threshold: config.bass_beat_threshold,
            general_beat_threshold: config.general_beat_threshold,
            energy_scale_factor: config.energy_scale_factor,
            min_beat_interval_ms: config.min_beat_interval_ms,
            state: BeatState::default(),
        }
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn state(&self) -> &BeatState {
        &self.state
    }

    /// Judge one raw read and return the beat intensity if a beat fires.
    pub fn detect(&mut self, raw: &[i16], bass_intensity: f32, now_ms: u64) -> Option<f32> {
        self.evaluate(frame_energy(raw), bass_intensity, now_ms)
    }

    /// Same as [`detect`](Self::detect) for an energy that was already computed.
    pub fn evaluate(&mut self, energy: f32, bass_intensity: f32, now_ms: u64) -> Option<f32> {
        let beat_intensity = (energy * self.energy_scale_factor).clamp(0.0, 1.0);

        let (trigger, threshold) = if self.mode.gates_beats_on_bass() {
            (bass_intensity, self.bass_beat_threshold)
        } else {
            let log_energy = if energy > 0.0 {
                (energy + 1.0).log10()
            } else {
                0.0
            };
            (log_energy, self.general_beat_threshold)
        };

        if !(trigger > threshold) {
            return None;
        }

        if let Some(last) = self.state.last_beat_ms {
            if now_ms.saturating_sub(last) <= self.min_beat_interval_ms {
                tracing::trace!(
                    now_ms,
                    last_beat_ms = last,
                    "beat suppressed by debounce interval"
                );
                return None;
            }
        }

        self.state.last_beat_ms = Some(now_ms);
        tracing::debug!(
            mode = ?self.mode,
            beat_intensity,
            trigger,
            now_ms,
            "beat detected"
        );
        Some(beat_intensity)
    }

    /// Forget the last beat so the next trigger fires immediately.
    pub fn reset(&mut self) {
        self.state = BeatState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_detector(mode: AnalysisMode) -> BeatDetector {
        BeatDetector::new(&OnsetDetectionConfig::default(), mode)
    }

    fn loud_frame() -> Vec<i16> {
        // Square wave at half scale: energy 0.25
        (0..1024)
            .map(|i| if i % 2 == 0 { 16384 } else { -16384 })
            .collect()
    }

    #[test]
    fn test_frame_energy() {
        assert_eq!(frame_energy(&[]), 0.0);
        assert_eq!(frame_energy(&[0; 64]), 0.0);
        assert!((frame_energy(&loud_frame()) - 0.25).abs() < 1e-6);
        assert_eq!(frame_energy(&[i16::MIN; 8]), 1.0);
    }

    #[test]
    fn test_silence_never_fires() {
        for mode in AnalysisMode::ALL {
            let mut detector = new_detector(mode);
            for t in 0..20 {
                assert_eq!(detector.detect(&[0; 1024], 0.0, t * 300), None);
            }
        }
    }

    #[test]
    fn test_first_beat_fires_at_time_zero() {
        let mut detector = new_detector(AnalysisMode::BeatsBass);
        assert_eq!(detector.detect(&loud_frame(), 0.0, 0), Some(1.0));
        assert_eq!(detector.state().last_beat_ms, Some(0));
    }

    #[test]
    fn test_beat_intensity_is_scaled_energy() {
        let mut detector = new_detector(AnalysisMode::MidRangeVocals);
        // 0.02 amplitude square wave: energy 4e-4 -> log10(1.0004) below threshold
        let quiet: Vec<i16> = (0..1024).map(|i| if i % 2 == 0 { 655 } else { -655 }).collect();
        assert_eq!(detector.detect(&quiet, 0.0, 0), None);

        // 0.125 amplitude: energy 0.015625 -> log10 ~ 0.0067 > 0.005, intensity 1.0 capped
        let medium: Vec<i16> = (0..1024)
            .map(|i| if i % 2 == 0 { 4096 } else { -4096 })
            .collect();
        let intensity = detector.detect(&medium, 0.0, 0).unwrap();
        assert!((intensity - 1.0).abs() < 1e-6);

        let mut detector = new_detector(AnalysisMode::OnlyBeats);
        let intensity = detector.detect(&quiet, 0.95, 0).unwrap();
        assert!((intensity - 0.04).abs() < 1e-3, "intensity = {}", intensity);
    }

    #[test]
    fn test_only_beats_gates_on_bass_intensity() {
        let mut detector = new_detector(AnalysisMode::OnlyBeats);
        // Loud broadband frame, bass not above 0.90
        assert_eq!(detector.detect(&loud_frame(), 0.90, 0), None);
        assert_eq!(detector.detect(&loud_frame(), 0.5, 1000), None);
        assert!(detector.detect(&loud_frame(), 0.91, 2000).is_some());
    }

    #[test]
    fn test_other_modes_ignore_bass_intensity() {
        let mut detector = new_detector(AnalysisMode::BeatsHighFrequencyInstruments);
        assert!(detector.detect(&loud_frame(), 0.0, 0).is_some());

        let mut detector = new_detector(AnalysisMode::OnlyHighFrequencyInstruments);
        assert_eq!(detector.detect(&[0; 1024], 1.0, 0), None);
    }

    #[test]
    fn test_debounce_suppresses_close_beats() {
        let mut detector = new_detector(AnalysisMode::BeatsBass);
        assert!(detector.detect(&loud_frame(), 0.0, 1000).is_some());
        assert!(detector.detect(&loud_frame(), 0.0, 1050).is_none());
        // The interval must be strictly exceeded
        assert!(detector.detect(&loud_frame(), 0.0, 1200).is_none());
        assert!(detector.detect(&loud_frame(), 0.0, 1201).is_some());
    }

    #[test]
    fn test_suppressed_beats_do_not_extend_interval() {
        let mut detector = new_detector(AnalysisMode::BeatsBass);
        assert!(detector.detect(&loud_frame(), 0.0, 0).is_some());
        assert!(detector.detect(&loud_frame(), 0.0, 150).is_none());
        assert!(detector.detect(&loud_frame(), 0.0, 250).is_some());
    }

    #[test]
    fn test_reset_clears_last_beat() {
        let mut detector = new_detector(AnalysisMode::BeatsBass);
        assert!(detector.detect(&loud_frame(), 0.0, 500).is_some());
        detector.reset();
        assert!(detector.detect(&loud_frame(), 0.0, 510).is_some());
    }

    #[test]
    fn test_custom_interval() {
        let config = OnsetDetectionConfig {
            min_beat_interval_ms: 50,
            ..OnsetDetectionConfig::default()
        };
        let mut detector = BeatDetector::new(&config, AnalysisMode::BeatsBass);
        assert!(detector.detect(&loud_frame(), 0.0, 0).is_some());
        assert!(detector.detect(&loud_frame(), 0.0, 60).is_some());
    }
}
