// SessionManager: owns at most one analysis session at a time
//
// Hosts (CLI, service, JNI shell) go through this manager instead of holding
// an AnalysisSession directly. Changing mode or input source means
// stop + start with a new configuration; `restart` does both under one lock.

use std::sync::{Mutex, MutexGuard};

use crate::analysis::AnalysisMode;
use crate::engine::{AnalysisSession, SessionBuilder};
use crate::error::{log_audio_error, AudioError};
use crate::telemetry::{StatsSnapshot, StopReason};

#[derive(Default)]
pub struct SessionManager {
    session: Mutex<Option<AnalysisSession>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session.
    ///
    /// # Errors
    /// - `AlreadyRunning` if a session is still running
    /// - any error from building or opening the session
    pub fn start(&self, builder: SessionBuilder) -> Result<(), AudioError> {
        let mut guard = self.lock_session()?;
        Self::check_not_running(&guard)?;
        Self::reap_finished(&mut guard);

        *guard = Some(builder.start()?);
        Ok(())
    }

    /// Stop the current session and report why its loop ended.
    pub fn stop(&self) -> Result<StopReason, AudioError> {
        let mut guard = self.lock_session()?;
        let mut session = guard.take().ok_or_else(|| {
            let err = AudioError::NotRunning;
            log_audio_error(&err, "stop_session");
            err
        })?;
        session.stop()
    }

    /// Replace the current session (if any) with a new one.
    pub fn restart(&self, builder: SessionBuilder) -> Result<(), AudioError> {
        let mut guard = self.lock_session()?;
        if let Some(mut session) = guard.take() {
            let reason = session.stop()?;
            tracing::debug!(?reason, "previous session stopped for restart");
        }

        *guard = Some(builder.start()?);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.lock_session()
            .map(|guard| guard.as_ref().is_some_and(AnalysisSession::is_running))
            .unwrap_or(false)
    }

    pub fn mode(&self) -> Option<AnalysisMode> {
        self.lock_session()
            .ok()
            .and_then(|guard| guard.as_ref().map(AnalysisSession::mode))
    }

    pub fn stats(&self) -> Option<StatsSnapshot> {
        self.lock_session()
            .ok()
            .and_then(|guard| guard.as_ref().map(AnalysisSession::stats))
    }

    fn lock_session(&self) -> Result<MutexGuard<'_, Option<AnalysisSession>>, AudioError> {
        self.session.lock().map_err(|_| {
            let err = AudioError::LockPoisoned {
                component: "analysis_session".to_string(),
            };
            log_audio_error(&err, "lock_session");
            err
        })
    }

    fn check_not_running(guard: &Option<AnalysisSession>) -> Result<(), AudioError> {
        if guard.as_ref().is_some_and(AnalysisSession::is_running) {
            let err = AudioError::AlreadyRunning;
            log_audio_error(&err, "check_not_running");
            return Err(err);
        }
        Ok(())
    }

    /// Join a session whose worker already ended on its own.
    fn reap_finished(guard: &mut Option<AnalysisSession>) {
        if let Some(mut session) = guard.take() {
            match session.stop() {
                Ok(reason) => tracing::debug!(?reason, "reaped finished session"),
                Err(err) => log_audio_error(&err, "reap_finished"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{ReadError, ScriptStep, ScriptedBackend};
    use crate::config::AppConfig;
    use std::time::{Duration, Instant};

    fn builder(mode: AnalysisMode) -> SessionBuilder {
        SessionBuilder::new(AppConfig::default().with_mode(mode))
            .backend(Box::new(ScriptedBackend::new(vec![])))
    }

    #[test]
    fn test_start_stop_cycle() {
        let manager = SessionManager::new();
        assert!(!manager.is_running());
        assert_eq!(manager.stop(), Err(AudioError::NotRunning));

        manager.start(builder(AnalysisMode::OnlyBeats)).unwrap();
        assert!(manager.is_running());
        assert_eq!(manager.mode(), Some(AnalysisMode::OnlyBeats));

        assert_eq!(manager.stop(), Ok(StopReason::Requested));
        assert!(!manager.is_running());
        assert_eq!(manager.mode(), None);
    }

    #[test]
    fn test_second_start_is_rejected() {
        let manager = SessionManager::new();
        manager.start(builder(AnalysisMode::OnlyBeats)).unwrap();
        assert_eq!(
            manager.start(builder(AnalysisMode::BeatsBass)),
            Err(AudioError::AlreadyRunning)
        );
        assert_eq!(manager.mode(), Some(AnalysisMode::OnlyBeats));
        manager.stop().unwrap();
    }

    #[test]
    fn test_restart_switches_mode() {
        let manager = SessionManager::new();
        manager.start(builder(AnalysisMode::OnlyBeats)).unwrap();
        manager.restart(builder(AnalysisMode::MidRangeVocals)).unwrap();

        assert!(manager.is_running());
        assert_eq!(manager.mode(), Some(AnalysisMode::MidRangeVocals));
        manager.stop().unwrap();

        // Restart from idle just starts
        manager.restart(builder(AnalysisMode::BeatsBass)).unwrap();
        assert!(manager.is_running());
        manager.stop().unwrap();
    }

    #[test]
    fn test_start_after_device_loss() {
        let manager = SessionManager::new();
        let failing = SessionBuilder::new(AppConfig::default()).backend(Box::new(
            ScriptedBackend::new(vec![ScriptStep::Error(ReadError::DeviceGone)])
                .with_read_delay(Duration::ZERO),
        ));
        manager.start(failing).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while manager.is_running() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(2));
        }
        assert!(!manager.is_running());

        // The dead session does not block a new one
        manager.start(builder(AnalysisMode::BeatsBass)).unwrap();
        assert!(manager.is_running());
        assert_eq!(manager.stop(), Ok(StopReason::Requested));
    }

    #[test]
    fn test_failed_start_leaves_manager_idle() {
        let manager = SessionManager::new();
        let builder = SessionBuilder::new(AppConfig::default()).backend(Box::new(
            ScriptedBackend::failing(AudioError::StreamOpenFailed {
                reason: "busy".to_string(),
            }),
        ));
        assert!(manager.start(builder).is_err());
        assert!(!manager.is_running());
        assert_eq!(manager.stop(), Err(AudioError::NotRunning));
    }
}
