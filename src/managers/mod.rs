// Managers Module
//
// Host-facing owners of long-lived state:
// - SessionManager: at most one analysis session, start/stop/restart

pub mod session_manager;

pub use session_manager::SessionManager;
