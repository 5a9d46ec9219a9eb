//! Configuration management for analysis sessions
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling calibration of thresholds and band layout without recompilation.
//! A configuration is validated once when a session is constructed and is
//! immutable for the lifetime of that session.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::analysis::bands::BandLayout;
use crate::analysis::mode::AnalysisMode;
use crate::error::ConfigError;
use crate::haptics::HapticStyle;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub analysis: AnalysisConfig,
    pub onset: OnsetDetectionConfig,
    pub haptics: HapticsConfig,
    /// Log raw peak and band intensities every N frames (0 disables)
    pub log_every_n_frames: u64,
}

/// Where the capture backend reads audio from
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    #[default]
    Mic,
    #[value(alias = "loopback")]
    SystemLoopback,
}

impl InputSource {
    pub fn name(self) -> &'static str {
        match self {
            InputSource::Mic => "mic",
            InputSource::SystemLoopback => "system_loopback",
        }
    }
}

/// Per-session capture parameters, supplied at session start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub mode: AnalysisMode,
    pub input_source: InputSource,
    /// Preferred capture read size in samples
    pub buffer_size_samples: usize,
    pub sample_rate_hz: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: AnalysisMode::OnlyBeats,
            input_source: InputSource::Mic,
            buffer_size_samples: 1024,
            sample_rate_hz: 44_100,
        }
    }
}

/// Window applied to each frame before the transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowFunction {
    #[default]
    Rectangular,
    Hann,
}

/// Spectral analysis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Transform size N (power of two)
    pub fft_size: usize,
    pub window: WindowFunction,
    pub bands: BandLayout,
    /// Mean band power mapped to full intensity
    pub max_intensity_level: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: 1024,
            window: WindowFunction::Rectangular,
            bands: BandLayout::default(),
            max_intensity_level: 500.0,
        }
    }
}

/// Beat detection thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnsetDetectionConfig {
    /// Bass intensity a beat must exceed in `OnlyBeats` mode
    pub bass_beat_threshold: f32,
    /// log10(energy + 1) a beat must exceed in every other mode
    pub general_beat_threshold: f32,
    /// Scales mean-square energy into the reported beat intensity
    pub energy_scale_factor: f32,
    /// Refractory interval between two accepted beats
    pub min_beat_interval_ms: u64,
}

impl Default for OnsetDetectionConfig {
    fn default() -> Self {
        Self {
            bass_beat_threshold: 0.90,
            general_beat_threshold: 0.005,
            energy_scale_factor: 100.0,
            min_beat_interval_ms: 200,
        }
    }
}

/// Haptic pattern shaping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HapticsConfig {
    /// Scales every event intensity (0-100)
    pub global_intensity_percent: u8,
    pub style: HapticStyle,
}

impl Default for HapticsConfig {
    fn default() -> Self {
        Self {
            global_intensity_percent: 50,
            style: HapticStyle::Normal,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// Missing files and invalid JSON fall back to the defaults with a
    /// warning; call [`AppConfig::validate`] before starting a session.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Check every invariant the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.session.validate()?;
        self.analysis.validate()?;
        self.onset.validate()?;
        self.haptics.validate()
    }

    pub fn with_mode(mut self, mode: AnalysisMode) -> Self {
        self.session.mode = mode;
        self
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate_hz == 0 {
            return Err(ConfigError::InvalidSampleRate);
        }
        if self.buffer_size_samples == 0 {
            return Err(ConfigError::InvalidBufferSize);
        }
        Ok(())
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fft_size < 2 || !self.fft_size.is_power_of_two() {
            return Err(ConfigError::FftSizeNotPowerOfTwo {
                size: self.fft_size,
            });
        }
        positive("max_intensity_level", self.max_intensity_level)?;
        self.bands.validate()
    }
}

impl OnsetDetectionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("bass_beat_threshold", self.bass_beat_threshold)?;
        non_negative("general_beat_threshold", self.general_beat_threshold)?;
        positive("energy_scale_factor", self.energy_scale_factor)
    }
}

impl HapticsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.global_intensity_percent > 100 {
            return Err(ConfigError::GlobalIntensityOutOfRange {
                percent: self.global_intensity_percent,
            });
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidCalibration { name, value })
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidCalibration { name, value })
    }
}
