//! Timed narration: a cue list fired against elapsed session time, delivered to a caption sink
//! and an optional speech narrator.

pub mod cue;
pub mod driver;
pub mod narrator;
pub mod sink;

pub use cue::{CueList, NarrationCue};
pub use driver::{DriverState, NarrationCursor, NarrationDriver};
pub use narrator::{CommandNarrator, LogNarrator, Narrator};
pub use sink::{CaptionEvent, CaptionLog, CaptionSink};
