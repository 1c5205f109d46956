use std::ops::ControlFlow;
use std::time::{Duration, Instant};

use crate::session::playback::{PlaybackSession, TickOutput};

/// Summary of a [`FrameLoop::run`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameLoopStats {
    /// Ticks that produced a frame.
    pub frames: u64,
    /// Frame slots skipped because a tick overran its budget.
    pub dropped: u64,
    /// Wall time spent in the loop.
    pub wall: Duration,
}

/// Real-time host that ticks a session at a fixed frame rate on the current thread.
///
/// Frames are pure functions of elapsed time, so a late tick skips the missed slots instead of
/// bursting to catch up.
#[derive(Clone, Copy, Debug)]
pub struct FrameLoop {
    frame_duration: Duration,
}

impl FrameLoop {
    pub const DEFAULT_FPS: u32 = 60;

    /// Tick at `fps` frames per second (clamped to `1..=240`).
    pub fn new(fps: u32) -> Self {
        let fps = fps.clamp(1, 240);
        Self {
            frame_duration: Duration::from_secs_f64(1.0 / f64::from(fps)),
        }
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    /// Tick `session` until `duration` has passed, the session stops, or `on_frame` breaks.
    pub fn run(
        &self,
        session: &mut PlaybackSession,
        duration: Duration,
        mut on_frame: impl FnMut(&mut PlaybackSession, &TickOutput) -> ControlFlow<()>,
    ) -> FrameLoopStats {
        let begin = Instant::now();
        let mut stats = FrameLoopStats::default();
        let mut next_deadline = begin;

        while begin.elapsed() < duration {
            let tick_start = Instant::now();
            let Some(out) = session.tick() else {
                tracing::debug!("session stopped; leaving frame loop");
                break;
            };
            stats.frames += 1;
            if on_frame(session, &out).is_break() {
                break;
            }

            let tick_time = tick_start.elapsed();
            if tick_time > self.frame_duration {
                tracing::warn!(
                    "tick took {:?}, exceeds frame budget of {:?}",
                    tick_time,
                    self.frame_duration
                );
            }

            next_deadline += self.frame_duration;
            let now = Instant::now();
            while next_deadline < now {
                next_deadline += self.frame_duration;
                stats.dropped += 1;
            }
            let remaining = duration.saturating_sub(begin.elapsed());
            std::thread::sleep((next_deadline - now).min(remaining));
        }

        stats.wall = begin.elapsed();
        stats
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FPS)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/frame_loop.rs"]
mod tests;
