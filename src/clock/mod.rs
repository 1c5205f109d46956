//! Time sources and the session clock every subsystem reads elapsed time from.

pub mod session;
pub mod source;

pub use session::SessionClock;
pub use source::{ManualTimeSource, SystemTimeSource, TimeSource};
