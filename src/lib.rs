// Haptic Beat Core - audio-reactive haptics engine
// Captures PCM audio, extracts band energies and beats, dispatches haptic events

// Module declarations
pub mod analysis;
pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod haptics;
pub mod managers;
pub mod telemetry;

// Re-exports for convenience
pub use analysis::{
    AnalysisMode, AnalysisPipeline, Band, BandIntensity, FrameAnalysis, HapticEvent,
    HapticEventKind, HapticSink,
};
pub use config::{AppConfig, InputSource};
pub use engine::{AnalysisSession, SessionBuilder};
pub use error::{AudioError, ConfigError};
pub use managers::SessionManager;
pub use telemetry::{SessionEvent, StatsSnapshot, StopReason};

use tracing::Level;

/// Install the process-wide tracing subscriber.
///
/// Safe to call more than once; later calls are ignored.
#[cfg(target_os = "android")]
pub fn init_logging(level: Level) {
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::prelude::*;

    let Ok(layer) = tracing_android::layer("HapticBeat") else {
        return;
    };
    let _ = tracing_subscriber::registry()
        .with(layer)
        .with(LevelFilter::from_level(level))
        .try_init();
}

/// Install the process-wide tracing subscriber.
///
/// Safe to call more than once; later calls are ignored.
#[cfg(not(target_os = "android"))]
pub fn init_logging(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// JNI_OnLoad is called when the native library is loaded by Android
/// This function initializes the Android context required by oboe-rs
#[cfg(target_os = "android")]
#[no_mangle]
pub extern "system" fn JNI_OnLoad(
    vm: jni::JavaVM,
    _reserved: *mut std::ffi::c_void,
) -> jni::sys::jint {
    init_logging(Level::DEBUG);

    tracing::info!("JNI_OnLoad called - initializing Android context");

    // Must run before any Oboe stream is opened. No Activity is available
    // here, so the context object is left null.
    // SAFETY: the JavaVM pointer handed to JNI_OnLoad stays valid for the
    // lifetime of the process
    unsafe {
        ndk_context::initialize_android_context(
            vm.get_java_vm_pointer().cast(),
            std::ptr::null_mut(),
        );
    }

    tracing::info!("Android context initialized successfully");

    jni::sys::JNI_VERSION_1_6
}
