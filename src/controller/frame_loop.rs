use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::Settings;
use crate::controller::input::InputState;
use crate::model::{FrameBuffer, ShaderParams, SourceImage, TransformState};

/// Fixed-rate frame limiter. Deadlines advance by whole periods; a loop
/// that falls a full period behind restarts the schedule instead of
/// rendering a burst of catch-up frames.
#[derive(Debug, Clone)]
pub struct FrameClock {
    period: Duration,
    next: Instant,
}

impl FrameClock {
    pub fn new(frames_per_second: u32, now: Instant) -> Self {
        Self {
            period: Duration::from_secs(1) / frames_per_second.max(1),
            next: now,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn deadline(&self) -> Instant {
        self.next
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next
    }

    /// Mark a frame as started at `now` and return the next deadline
    pub fn tick(&mut self, now: Instant) -> Instant {
        self.next += self.period;
        if self.next <= now {
            debug!(behind = ?(now - self.next), "frame deadline missed");
            self.next = now + self.period;
        }
        self.next
    }
}

/// Everything the view needs to present one frame
pub struct FrameOutput<'a> {
    pub title: String,
    pub params: ShaderParams,
    pub frame: &'a FrameBuffer,
}

/// Per-frame state and update logic
pub struct FrameLoopContext {
    pub state: TransformState,
    pub input: InputState,
    pub clock: FrameClock,
    image: SourceImage,
    frame: FrameBuffer,
}

impl FrameLoopContext {
    pub fn new(settings: &Settings, image: SourceImage, now: Instant) -> Self {
        Self {
            state: TransformState::new(settings.initial_speed),
            input: InputState::new(),
            clock: FrameClock::new(settings.frames_per_second, now),
            image,
            frame: FrameBuffer::new(settings.window_width, settings.window_height),
        }
    }

    /// Apply queued input (plus held-key repeats due by `now`), advance the
    /// transform and composite the frame. Returns `None` once a quit has been
    /// requested.
    pub fn update(&mut self, now: Instant) -> Option<FrameOutput<'_>> {
        if self.input.quit_requested() {
            return None;
        }

        self.input.repeat_held(now);
        for action in self.input.drain() {
            self.state.apply(action);
        }

        // Caption reflects the state before this frame's step
        let title = self.state.title();
        self.state.step();

        self.frame.composite(&self.image);

        Some(FrameOutput {
            title,
            params: self.state.shader_params(),
            frame: &self.frame,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FRAMES_PER_SECOND;
    use crate::controller::input::{InputEvent, Key};
    use std::path::PathBuf;

    fn settings(initial_speed: f64) -> Settings {
        Settings {
            image_path: PathBuf::from("unused.png"),
            initial_speed,
            window_width: 4,
            window_height: 4,
            frames_per_second: FRAMES_PER_SECOND,
        }
    }

    fn context(initial_speed: f64) -> FrameLoopContext {
        let image = SourceImage::from_rgba(2, 2, [255u8; 4].repeat(4));
        FrameLoopContext::new(&settings(initial_speed), image, Instant::now())
    }

    #[test]
    fn test_clock_period_is_40ms_at_25fps() {
        let clock = FrameClock::new(25, Instant::now());
        assert_eq!(clock.period(), Duration::from_millis(40));
    }

    #[test]
    fn test_clock_advances_by_period() {
        let start = Instant::now();
        let mut clock = FrameClock::new(25, start);
        assert!(clock.is_due(start));

        let next = clock.tick(start);
        assert_eq!(next, start + Duration::from_millis(40));
        assert!(!clock.is_due(start + Duration::from_millis(39)));
        assert!(clock.is_due(start + Duration::from_millis(40)));

        // Slightly late frames keep the original cadence
        let next = clock.tick(start + Duration::from_millis(45));
        assert_eq!(next, start + Duration::from_millis(80));
    }

    #[test]
    fn test_clock_resets_after_stall() {
        let start = Instant::now();
        let mut clock = FrameClock::new(25, start);
        clock.tick(start);
        let late = start + Duration::from_millis(500);
        assert_eq!(clock.tick(late), late + Duration::from_millis(40));
    }

    #[test]
    fn test_three_left_presses_then_frame() {
        let now = Instant::now();
        let mut ctx = context(0.0);
        for _ in 0..3 {
            ctx.input.process_event(&InputEvent::KeyDown(Key::ArrowLeft), now);
            ctx.input.process_event(&InputEvent::KeyUp(Key::ArrowLeft), now);
        }
        let out = ctx.update(now).expect("frame");
        assert_eq!(out.title, "Zoom 1.000 rotation speed -1.5 deg zoom_speed 0.0");
        assert_eq!(ctx.state.speed, 1.5);
        assert_eq!(ctx.state.angle, 1.5);

        ctx.update(now + Duration::from_millis(40));
        assert_eq!(ctx.state.angle, 3.0);
    }

    #[test]
    fn test_held_key_repeats_across_frames() {
        let start = Instant::now();
        let mut ctx = context(0.0);
        ctx.input.process_event(&InputEvent::KeyDown(Key::ArrowLeft), start);
        // Frames at 0, 40, ... 440 ms: the press plus repeats at 150, 300
        for frame in 0..12u32 {
            ctx.update(start + Duration::from_millis(40) * frame);
        }
        assert_eq!(ctx.state.speed, 1.5);

        ctx.update(start + Duration::from_millis(450));
        assert_eq!(ctx.state.speed, 2.0);

        ctx.input.process_event(&InputEvent::KeyUp(Key::ArrowLeft), start + Duration::from_millis(460));
        ctx.update(start + Duration::from_millis(2000));
        assert_eq!(ctx.state.speed, 2.0);
    }

    #[test]
    fn test_frame_is_composited() {
        let mut ctx = context(0.0);
        let out = ctx.update(Instant::now()).expect("frame");
        assert_eq!(out.frame.pixel(1, 1), [255, 255, 255, 255]);
        assert_eq!(out.frame.pixel(2, 2), [0, 0, 0, 255]);
        assert_eq!(out.params.scale, 1.0);
    }

    #[test]
    fn test_initial_speed_rotates_from_first_frame() {
        let mut ctx = context(-2.0);
        ctx.update(Instant::now());
        assert_eq!(ctx.state.angle, -2.0);
    }

    #[test]
    fn test_quit_stops_updates() {
        let now = Instant::now();
        let mut ctx = context(0.0);
        ctx.input.process_event(&InputEvent::KeyDown(Key::ArrowLeft), now);
        ctx.input.process_event(&InputEvent::CloseRequested, now);
        assert!(ctx.update(now).is_none());
        assert_eq!(ctx.state.speed, 0.0);
    }
}
