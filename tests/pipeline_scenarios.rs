//! End-to-end scenarios for the frame pipeline
//!
//! These drive `AnalysisPipeline` directly with synthetic PCM and explicit
//! timestamps, so they are deterministic and need no audio device.

use haptic_beat::analysis::{AnalysisPipeline, HapticEvent, HapticEventKind};
use haptic_beat::audio::synthetic::sine_samples;
use haptic_beat::haptics::{PatternPlanner, PatternSink, RecordingActuator, VibrationPattern};
use haptic_beat::{AnalysisMode, AppConfig};

const SAMPLE_RATE: u32 = 44_100;
const FRAME: usize = 1024;

fn pipeline(mode: AnalysisMode) -> AnalysisPipeline {
    AnalysisPipeline::new(&AppConfig::default().with_mode(mode)).unwrap()
}

fn loud_bass() -> Vec<i16> {
    sine_samples(100.0, SAMPLE_RATE, 1.0, FRAME)
}

/// 100 Hz bursts of one frame length, `interval_ms` apart, over silence.
fn burst_track(bursts: usize, interval_ms: usize) -> Vec<i16> {
    let spacing = SAMPLE_RATE as usize * interval_ms / 1000;
    let mut track = vec![0i16; spacing * bursts + FRAME];
    for k in 0..bursts {
        let start = k * spacing;
        track[start..start + FRAME].copy_from_slice(&loud_bass());
    }
    track
}

#[test]
fn test_each_mode_dispatches_beat_plus_its_band() {
    let expected = [
        (AnalysisMode::OnlyBeats, vec![HapticEventKind::Beat]),
        (
            AnalysisMode::BeatsBass,
            vec![HapticEventKind::Beat, HapticEventKind::Bass],
        ),
        (
            AnalysisMode::MidRangeVocals,
            vec![HapticEventKind::Beat, HapticEventKind::Mid],
        ),
        (
            AnalysisMode::OnlyHighFrequencyInstruments,
            vec![HapticEventKind::Beat, HapticEventKind::Treble],
        ),
        (
            AnalysisMode::BeatsHighFrequencyInstruments,
            vec![HapticEventKind::Beat, HapticEventKind::Treble],
        ),
    ];

    for (mode, kinds) in expected {
        let mut events: Vec<HapticEvent> = Vec::new();
        let analysis = pipeline(mode).process(&loud_bass(), 0, &mut events);

        let got: Vec<HapticEventKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(got, kinds, "mode {:?}", mode);
        assert_eq!(analysis.events_emitted, kinds.len());
        assert!(events.iter().all(|e| e.timestamp_ms == 0));
        assert!(events.iter().all(|e| (0.0..=1.0).contains(&e.intensity)));
    }
}

#[test]
fn test_debounce_timeline() {
    let mut pipeline = pipeline(AnalysisMode::BeatsBass);
    let mut events: Vec<HapticEvent> = Vec::new();

    let fired: Vec<u64> = [0u64, 100, 200, 201, 450]
        .into_iter()
        .filter(|&now| pipeline.process(&loud_bass(), now, &mut events).beat.is_some())
        .collect();

    // 200 ms after the last beat is still inside the interval
    assert_eq!(fired, vec![0, 201, 450]);
    assert_eq!(pipeline.beat_state().last_beat_ms, Some(450));
    assert_eq!(pipeline.frames_processed(), 5);
}

#[test]
fn test_offline_track_with_sample_position_clock() {
    let track = burst_track(4, 300);
    let mut pipeline = pipeline(AnalysisMode::BeatsBass);
    let mut events: Vec<HapticEvent> = Vec::new();

    for (index, chunk) in track.chunks(FRAME).enumerate() {
        let now_ms = (index * FRAME) as u64 * 1000 / SAMPLE_RATE as u64;
        pipeline.process(chunk, now_ms, &mut events);
    }

    let beats: Vec<u64> = events
        .iter()
        .filter(|e| e.kind == HapticEventKind::Beat)
        .map(|e| e.timestamp_ms)
        .collect();
    assert_eq!(beats.len(), 4, "beats at {:?}", beats);
    assert!(beats.windows(2).all(|w| w[1] - w[0] > 200));

    // One bass event per frame, beat or not
    let bass = events
        .iter()
        .filter(|e| e.kind == HapticEventKind::Bass)
        .count();
    assert_eq!(bass as u64, pipeline.frames_processed());
}

#[test]
fn test_silence_produces_no_beats() {
    for mode in AnalysisMode::ALL {
        let mut pipeline = pipeline(mode);
        let mut events: Vec<HapticEvent> = Vec::new();
        for frame in 0..10u64 {
            let analysis = pipeline.process(&[0i16; FRAME], frame * 250, &mut events);
            assert_eq!(analysis.beat, None);
            assert_eq!(analysis.energy, 0.0);
        }
        assert!(events.iter().all(|e| e.kind != HapticEventKind::Beat));
        assert!(events.iter().all(|e| e.intensity == 0.0));
    }
}

#[test]
fn test_pipeline_drives_actuator_patterns() {
    let config = AppConfig::default().with_mode(AnalysisMode::BeatsBass);
    let mut pipeline = AnalysisPipeline::new(&config).unwrap();
    let mut sink = PatternSink::new(
        PatternPlanner::new(&config.haptics),
        RecordingActuator::default(),
    );

    pipeline.process(&loud_bass(), 0, &mut sink);

    let actuator = sink.into_actuator();
    assert_eq!(actuator.played.len(), 2);
    assert_eq!(actuator.cancels, 2);
    assert!(actuator
        .played
        .iter()
        .all(|pattern| pattern.peak_amplitude() > 0));
    assert!(matches!(actuator.played[0], VibrationPattern::OneShot { .. }));
}
