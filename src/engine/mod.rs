//! Engine module: the session worker loop and its clock.
//!
//! `session` owns the capture → analysis → dispatch loop for one session;
//! `clock` abstracts the millisecond time source used for beat debouncing.

pub mod clock;
pub mod session;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use session::{AnalysisSession, SessionBuilder};
