//! The playback session: composition root and real-time host.

pub mod frame_loop;
pub mod playback;

pub use frame_loop::{FrameLoop, FrameLoopStats};
pub use playback::{Advisory, PlaybackSession, PlaybackSessionBuilder, SessionState, TickOutput};
