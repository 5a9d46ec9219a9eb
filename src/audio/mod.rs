// Audio module - capture sources feeding the analysis session
//
// Backends:
// - cpal (desktop): microphone or system loopback through an rtrb ring
// - oboe (Android): blocking mono i16 input stream
// - synthetic / scripted: generated or replayed samples
// - wav: files decoded with hound

#[cfg(not(target_os = "android"))]
pub mod cpal_source;
#[cfg(target_os = "android")]
pub mod oboe_source;
pub mod source;
pub mod synthetic;
pub mod wav;

pub use source::{CaptureBackend, CaptureSource, ReadError};
pub use synthetic::{ScriptEnd, ScriptStep, ScriptedBackend, SignalPattern, SyntheticBackend};
pub use wav::{read_wav_mono, WavBackend, WavClip};

/// The live capture backend for the current platform.
pub fn default_backend() -> Box<dyn CaptureBackend> {
    cfg_if::cfg_if! {
        if #[cfg(target_os = "android")] {
            Box::new(oboe_source::OboeBackend::new())
        } else {
            Box::new(cpal_source::CpalBackend::new())
        }
    }
}
