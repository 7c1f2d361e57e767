//! Frame-rate accounting for the render loop.

use std::time::{Duration, Instant};

/// Frame statistics gathered over one reporting window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// Frames completed in the window.
    pub frames: u32,
    /// Length of the window.
    pub elapsed: Duration,
}

impl FrameStats {
    /// Average frames per second over the window.
    pub fn fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            f64::from(self.frames) / secs
        } else {
            0.0
        }
    }

    /// Average frame time in milliseconds.
    pub fn frame_time_ms(&self) -> f64 {
        if self.frames == 0 {
            return 0.0;
        }
        self.elapsed.as_secs_f64() * 1000.0 / f64::from(self.frames)
    }
}

/// Counts presented frames and yields [`FrameStats`] once per interval.
#[derive(Debug)]
pub struct FrameTimer {
    interval: Duration,
    window_start: Instant,
    frames: u32,
}

impl FrameTimer {
    /// Creates a timer that reports every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            window_start: Instant::now(),
            frames: 0,
        }
    }

    /// Records one frame finished now.
    pub fn record_frame(&mut self) -> Option<FrameStats> {
        self.record_frame_at(Instant::now())
    }

    /// Records one frame finished at `now`, returning stats when the
    /// interval has elapsed and starting a new window.
    pub fn record_frame_at(&mut self, now: Instant) -> Option<FrameStats> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.interval {
            return None;
        }

        let stats = FrameStats {
            frames: self.frames,
            elapsed,
        };
        self.window_start = now;
        self.frames = 0;
        Some(stats)
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_report_before_interval() {
        let mut timer = FrameTimer::new(Duration::from_secs(1));
        let start = timer.window_start;
        assert!(timer.record_frame_at(start + Duration::from_millis(10)).is_none());
        assert!(timer.record_frame_at(start + Duration::from_millis(20)).is_none());
    }

    #[test]
    fn test_report_after_interval_resets_window() {
        let mut timer = FrameTimer::new(Duration::from_secs(1));
        let start = timer.window_start;
        for i in 1..60 {
            assert!(timer.record_frame_at(start + Duration::from_millis(i * 16)).is_none());
        }
        let stats = timer
            .record_frame_at(start + Duration::from_secs(1))
            .expect("interval elapsed");
        assert_eq!(stats.frames, 60);
        assert!((stats.fps() - 60.0).abs() < 1e-9);
        assert_eq!(timer.frames, 0);
    }

    #[test]
    fn test_stats_zero_cases() {
        let stats = FrameStats {
            frames: 0,
            elapsed: Duration::ZERO,
        };
        assert_eq!(stats.fps(), 0.0);
        assert_eq!(stats.frame_time_ms(), 0.0);
    }
}
