use super::*;
use crate::config::{AppConfig, WindowFunction};
use rand::{rngs::StdRng, Rng, SeedableRng};

const SAMPLE_RATE: u32 = 44_100;
const N: usize = 1024;

fn sine(freq_hz: f32, amplitude: f32, len: usize) -> Vec<i16> {
    (0..len)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * freq_hz * i as f32 / SAMPLE_RATE as f32;
            (phase.sin() * amplitude * 32767.0) as i16
        })
        .collect()
}

fn pipeline(mode: AnalysisMode) -> AnalysisPipeline {
    AnalysisPipeline::new(&AppConfig::default().with_mode(mode)).unwrap()
}

#[test]
fn test_pipeline_rejects_invalid_config() {
    let mut config = AppConfig::default();
    config.analysis.fft_size = 1000;
    assert!(matches!(
        AnalysisPipeline::new(&config),
        Err(ConfigError::FftSizeNotPowerOfTwo { size: 1000 })
    ));
}

#[test]
fn test_100hz_sine_is_bass() {
    let mut pipeline = pipeline(AnalysisMode::BeatsBass);
    let result = pipeline.process(&sine(100.0, 1.0, N), 0, &mut NullSink);

    assert!(result.bands.bass > 0.99, "bass = {}", result.bands.bass);
    assert!(result.bands.treble < 0.1, "treble = {}", result.bands.treble);
    // Rectangular window leaks into the low mid bins
    assert!(result.bands.mid < 0.5, "mid = {}", result.bands.mid);
    assert!(result.bands.mid < result.bands.bass);
}

#[test]
fn test_100hz_sine_with_hann_window_has_no_mid() {
    let mut config = AppConfig::default().with_mode(AnalysisMode::BeatsBass);
    config.analysis.window = WindowFunction::Hann;
    let mut pipeline = AnalysisPipeline::new(&config).unwrap();

    let result = pipeline.process(&sine(100.0, 1.0, N), 0, &mut NullSink);
    assert!(result.bands.bass > 0.99);
    assert!(result.bands.mid < 0.1, "mid = {}", result.bands.mid);
    assert!(result.bands.treble < 0.05);
}

#[test]
fn test_8khz_sine_is_treble() {
    let mut pipeline = pipeline(AnalysisMode::OnlyHighFrequencyInstruments);
    let mut events = Vec::new();
    let result = pipeline.process(&sine(8000.0, 1.0, N), 0, &mut events);

    assert!(result.bands.treble > 0.99, "treble = {}", result.bands.treble);
    assert!(result.bands.bass < 0.1);

    let treble = events
        .iter()
        .find(|e| e.kind == HapticEventKind::Treble)
        .unwrap();
    assert_eq!(treble.intensity, result.bands.treble);
}

#[test]
fn test_full_scale_sine_fires_beat_in_every_mode() {
    for mode in AnalysisMode::ALL {
        let mut pipeline = pipeline(mode);
        let mut events = Vec::new();
        let result = pipeline.process(&sine(100.0, 1.0, N), 0, &mut events);

        let beat = result.beat.expect("beat should fire");
        assert!((beat - 1.0).abs() < 1e-6);
        assert_eq!(events[0].kind, HapticEventKind::Beat);
        assert_eq!(result.events_emitted, events.len());
    }
}

#[test]
fn test_silence_produces_no_beat_and_zero_bands() {
    for mode in AnalysisMode::ALL {
        let mut pipeline = pipeline(mode);
        let mut events = Vec::new();
        for t in 0..10u64 {
            let result = pipeline.process(&[0; N], t * 23, &mut events);
            assert_eq!(result.beat, None);
            assert_eq!(result.bands, BandIntensity::default());
            assert_eq!(result.energy, 0.0);
            assert_eq!(result.peak, 0);
        }

        assert!(events.iter().all(|e| e.kind != HapticEventKind::Beat));
        assert!(events.iter().all(|e| e.intensity == 0.0));
        // Band signal still reported every frame
        assert_eq!(events.len(), 10 * mode.band_signal().iter().count());
    }
}

#[test]
fn test_bursts_50ms_apart_yield_one_beat() {
    let mut pipeline = pipeline(AnalysisMode::OnlyBeats);
    let burst = sine(100.0, 1.0, N);

    let beats = [0u64, 50]
        .iter()
        .filter_map(|&t| pipeline.process(&burst, t, &mut NullSink).beat)
        .count();
    assert_eq!(beats, 1);
}

#[test]
fn test_bursts_250ms_apart_yield_two_beats() {
    let mut pipeline = pipeline(AnalysisMode::OnlyBeats);
    let burst = sine(100.0, 1.0, N);
    let silence = [0i16; N];

    let mut beats = 0;
    for (t, raw) in [(0u64, &burst[..]), (100, &silence[..]), (250, &burst[..])] {
        if pipeline.process(raw, t, &mut NullSink).beat.is_some() {
            beats += 1;
        }
    }
    assert_eq!(beats, 2);
    assert_eq!(pipeline.beat_state().last_beat_ms, Some(250));
}

#[test]
fn test_short_and_long_reads() {
    let mut pipeline = pipeline(AnalysisMode::MidRangeVocals);

    let short = pipeline.process(&sine(1000.0, 0.5, 100), 0, &mut NullSink);
    assert!(short.energy > 0.0);

    // Energy covers every sample read, the spectrum only the first N
    let mut long = sine(1000.0, 0.5, N);
    long.extend(std::iter::repeat(0).take(N));
    let long_result = pipeline.process(&long, 1000, &mut NullSink);
    let head_energy = frame_energy(&long[..N]);
    assert!((long_result.energy - head_energy / 2.0).abs() < 1e-6);
}

#[test]
fn test_noise_keeps_intensities_bounded() {
    let mut rng = StdRng::seed_from_u64(0x00C0_FFEE);
    let mut pipeline = pipeline(AnalysisMode::BeatsHighFrequencyInstruments);

    for t in 0..50u64 {
        let raw: Vec<i16> = (0..N).map(|_| rng.gen()).collect();
        let result = pipeline.process(&raw, t * 23, &mut NullSink);
        for value in [result.bands.bass, result.bands.mid, result.bands.treble] {
            assert!((0.0..=1.0).contains(&value));
        }
        if let Some(beat) = result.beat {
            assert!((0.0..=1.0).contains(&beat));
        }
    }
    assert_eq!(pipeline.frames_processed(), 50);
}

#[test]
fn test_peak_tracks_largest_sample() {
    let mut pipeline = pipeline(AnalysisMode::OnlyBeats);
    let result = pipeline.process(&[10, -300, 200, i16::MIN], 0, &mut NullSink);
    assert_eq!(result.peak, 32768);
}
