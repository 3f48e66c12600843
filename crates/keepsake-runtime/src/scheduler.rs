#![forbid(unsafe_code)]

//! Frame-coalesced render scheduling.
//!
//! Mutations call [`FrameScheduler::request`]; the host's frame callback
//! calls [`FrameScheduler::take`]. Any number of requests between two frames
//! collapse into one render.
//!
//! # Invariants
//!
//! - **Latest-wins**: a render taken at a frame sees every mutation that
//!   requested it.
//! - **At most one per frame**: `take` clears the pending flag.
//! - **Deferred, not dropped**: [`FrameScheduler::defer`] re-arms the flag so
//!   the next frame retries.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | `take` with nothing pending | Returns `false`, no render |
//! | Render fails with a transient error | `defer` keeps it pending |

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Calls to [`FrameScheduler::request`].
    pub requests: u64,
    /// Frames that rendered.
    pub frames: u64,
    /// Frames that were deferred.
    pub deferrals: u64,
}

impl SchedulerStats {
    /// Requests that did not produce their own frame.
    #[must_use]
    pub fn coalesced(&self) -> u64 {
        self.requests.saturating_sub(self.frames)
    }
}

/// One pending flag plus counters.
#[derive(Debug, Clone, Default)]
pub struct FrameScheduler {
    pending: bool,
    stats: SchedulerStats,
}

impl FrameScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a render at the next frame.
    ///
    /// Returns `true` when this call armed the frame, `false` when one was
    /// already pending.
    pub fn request(&mut self) -> bool {
        self.stats.requests += 1;
        let armed = !self.pending;
        self.pending = true;
        armed
    }

    /// Consume the pending flag at a frame boundary.
    pub fn take(&mut self) -> bool {
        if !self.pending {
            return false;
        }
        self.pending = false;
        self.stats.frames += 1;
        true
    }

    /// Put a taken frame back because it could not render yet.
    pub fn defer(&mut self) {
        self.pending = true;
        self.stats.frames = self.stats.frames.saturating_sub(1);
        self.stats.deferrals += 1;
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_coalesces_into_one_frame() {
        let mut scheduler = FrameScheduler::new();
        assert!(scheduler.request());
        assert!(!scheduler.request());
        assert!(!scheduler.request());
        assert!(scheduler.take());
        assert!(!scheduler.take());
        let stats = scheduler.stats();
        assert_eq!(stats.requests, 3);
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.coalesced(), 2);
    }

    #[test]
    fn deferred_frame_retries() {
        let mut scheduler = FrameScheduler::new();
        scheduler.request();
        assert!(scheduler.take());
        scheduler.defer();
        assert!(scheduler.is_pending());
        assert!(scheduler.take());
        assert_eq!(scheduler.stats().frames, 1);
        assert_eq!(scheduler.stats().deferrals, 1);
    }

    #[test]
    fn idle_frames_do_nothing() {
        let mut scheduler = FrameScheduler::new();
        assert!(!scheduler.take());
        assert_eq!(scheduler.stats(), SchedulerStats::default());
    }
}
