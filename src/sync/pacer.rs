use std::time::{Duration, Instant};

/// Fixed-rate frame pacing for playback.
///
/// Callers ask how long to wait before the next frame (and use that time to
/// poll for input), then report each presented frame.
pub struct FramePacer {
    target_fps: f64,
    frame_duration: Duration,
    next_frame_time: Instant,
    frames_presented: u64,
    resyncs: u64,
}

impl FramePacer {
    pub fn new(fps: f64) -> Self {
        let frame_duration = Duration::from_secs_f64(1.0 / fps);
        Self {
            target_fps: fps,
            frame_duration,
            next_frame_time: Instant::now() + frame_duration,
            frames_presented: 0,
            resyncs: 0,
        }
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    /// Time left until the next frame is due. Zero when late.
    pub fn remaining(&self) -> Duration {
        self.remaining_at(Instant::now())
    }

    fn remaining_at(&self, now: Instant) -> Duration {
        self.next_frame_time.saturating_duration_since(now)
    }

    /// Records a presented frame and schedules the next one.
    pub fn frame_presented(&mut self) {
        self.frame_presented_at(Instant::now());
    }

    fn frame_presented_at(&mut self, now: Instant) {
        self.frames_presented += 1;

        // More than three frames behind: restart the schedule from now
        // instead of rushing through the backlog.
        if now > self.next_frame_time + self.frame_duration * 3 {
            self.next_frame_time = now + self.frame_duration;
            self.resyncs += 1;
            return;
        }
        self.next_frame_time += self.frame_duration;
    }

    /// Restarts the schedule, e.g. after the first frame is on screen.
    pub fn reset(&mut self) {
        self.next_frame_time = Instant::now() + self.frame_duration;
        self.frames_presented = 0;
        self.resyncs = 0;
    }

    pub fn stats(&self) -> PacerStats {
        PacerStats {
            frames_presented: self.frames_presented,
            resyncs: self.resyncs,
            target_fps: self.target_fps,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PacerStats {
    pub frames_presented: u64,
    pub resyncs: u64,
    pub target_fps: f64,
}

impl PacerStats {
    pub fn effective_fps(&self, elapsed: Duration) -> f64 {
        if elapsed.as_secs_f64() > 0.0 {
            self.frames_presented as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}
