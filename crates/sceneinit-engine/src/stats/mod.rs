//! Frame-timing overlay.
//!
//! Two panels:
//! - MS: time between consecutive `update` calls, per frame
//! - FPS: frames per second, refreshed once a second
//!
//! The overlay does not draw itself. Hosts present the text readout
//! (see `host::Host::set_overlay_text`) and may graph the panel history.

mod panel;

use std::time::{Duration, Instant};

pub use panel::Panel;

const FPS_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct Stats {
    begin_time: Instant,
    prev_time: Instant,
    frames: u32,

    ms: Panel,
    fps: Panel,

    pending_readout: bool,
}

impl Stats {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Creates an overlay whose clock starts at `now`.
    pub fn starting_at(now: Instant) -> Self {
        Self {
            begin_time: now,
            prev_time: now,
            frames: 0,
            ms: Panel::new("MS"),
            fps: Panel::new("FPS"),
            pending_readout: false,
        }
    }

    /// Marks the start of a measured section.
    pub fn begin_at(&mut self, now: Instant) {
        self.begin_time = now;
    }

    /// Marks the end of a measured section and counts one frame.
    pub fn end_at(&mut self, now: Instant) -> Instant {
        self.frames += 1;
        self.ms.push(ms_between(self.begin_time, now));

        let elapsed = now.saturating_duration_since(self.prev_time);
        if elapsed >= FPS_INTERVAL {
            let fps = self.frames as f32 * 1000.0 / ms_between(self.prev_time, now);
            self.fps.push(fps);
            self.prev_time = now;
            self.frames = 0;
            self.pending_readout = true;
        }

        now
    }

    /// Per-frame update: ends the previous frame and begins the next.
    pub fn update(&mut self) {
        self.tick(Instant::now());
    }

    /// [`update`](Self::update) with an explicit timestamp.
    pub fn tick(&mut self, now: Instant) {
        self.begin_time = self.end_at(now);
    }

    pub fn ms(&self) -> &Panel {
        &self.ms
    }

    pub fn fps(&self) -> &Panel {
        &self.fps
    }

    /// Frames counted since the last FPS refresh.
    pub fn frames_since_refresh(&self) -> u32 {
        self.frames
    }

    /// Combined readout of both panels.
    pub fn readout(&self) -> String {
        format!("{} | {}", self.fps.label(), self.ms.label())
    }

    /// Returns the readout once after every FPS refresh.
    pub fn take_readout(&mut self) -> Option<String> {
        if !self.pending_readout {
            return None;
        }
        self.pending_readout = false;
        Some(self.readout())
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

fn ms_between(from: Instant, to: Instant) -> f32 {
    to.saturating_duration_since(from).as_micros() as f32 / 1000.0
}
