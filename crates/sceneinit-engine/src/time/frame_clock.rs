use std::time::{Duration, Instant};

/// Largest delta reported, so a stall (debugger, minimized window) does not
/// turn into one huge step of auto-rotation.
const MAX_DT: Duration = Duration::from_millis(250);

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick; zero on the first tick.
    pub dt: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter, starting at 0.
    pub frame_index: u64,
}

/// Produces one [`FrameTime`] per presented frame.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last: Option<Instant>,
    frame_index: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock using the current time.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Advances the clock to `now`.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = self
            .last
            .map(|last| now.saturating_duration_since(last).min(MAX_DT))
            .unwrap_or(Duration::ZERO);

        self.last = Some(now);

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }

    /// Frames ticked so far.
    pub fn frames(&self) -> u64 {
        self.frame_index
    }
}
