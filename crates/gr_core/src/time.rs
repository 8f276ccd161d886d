//! Millisecond clocks, interval timers and the two-cadence loop pacing built
//! on top of them.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::config::LoopConfig;

const FPS_SAMPLE_COUNT: usize = 60;

/// Monotonic millisecond clock with a blocking sleep.
pub trait Clock {
    fn now_ms(&self) -> u64;
    fn sleep_ms(&self, ms: u64);
}

/// Wall clock measured from its own creation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn sleep_ms(&self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

/// Hand-driven clock for tests and headless replays. Clones share the same
/// time; sleeping advances it.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn sleep_ms(&self, ms: u64) {
        self.advance(ms);
    }
}

/// Interval gate and elapsed-time accumulator over a [`Clock`].
///
/// The gate (`triggered`, `wait_until_next_trigger`) and the accumulator
/// (`time_since_last_call`) keep separate reference points, both starting at
/// construction time.
#[derive(Debug, Clone)]
pub struct Timer<C: Clock> {
    clock: C,
    interval_ms: u32,
    last_trigger_ms: u64,
    last_call_ms: u64,
}

impl<C: Clock> Timer<C> {
    pub fn new(clock: C, interval_ms: u32) -> Self {
        let now = clock.now_ms();
        Self {
            clock,
            interval_ms,
            last_trigger_ms: now,
            last_call_ms: now,
        }
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub fn set_interval(&mut self, interval_ms: u32) {
        self.interval_ms = interval_ms;
    }

    /// True at most once per interval. Re-arms from now on true.
    pub fn triggered(&mut self) -> bool {
        let now = self.clock.now_ms();
        if now.saturating_sub(self.last_trigger_ms) >= u64::from(self.interval_ms) {
            self.last_trigger_ms = now;
            true
        } else {
            false
        }
    }

    /// Block until one interval has passed since the last trigger, then
    /// re-arm. Returns immediately when already overdue.
    pub fn wait_until_next_trigger(&mut self) {
        let elapsed = self.clock.now_ms().saturating_sub(self.last_trigger_ms);
        let remaining = u64::from(self.interval_ms).saturating_sub(elapsed);
        if remaining > 0 {
            self.clock.sleep_ms(remaining);
        }
        self.last_trigger_ms = self.clock.now_ms();
    }

    /// Milliseconds since the previous call (or construction).
    pub fn time_since_last_call(&mut self) -> u32 {
        let now = self.clock.now_ms();
        let elapsed = now.saturating_sub(self.last_call_ms);
        self.last_call_ms = now;
        u32::try_from(elapsed).unwrap_or(u32::MAX)
    }
}

/// Model and render cadences for the main loop.
///
/// Each iteration: `begin_tick` yields the model dt, `render_due` gates the
/// draw, and `end_tick` sleeps out the rest of the model interval.
pub struct LoopTiming<C: Clock + Clone> {
    clock: C,
    model: Timer<C>,
    frame: Timer<C>,
    pub max_dt_ms: u32,
    pub tick_count: u64,
    pub frame_count: u64,
    pub last_dt_ms: u32,
    last_frame_at_ms: u64,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl<C: Clock + Clone> LoopTiming<C> {
    pub fn new(clock: C, config: &LoopConfig) -> Self {
        let frame_ms = f64::from(config.frame_interval_ms());
        let now = clock.now_ms();
        Self {
            model: Timer::new(clock.clone(), config.model_interval_ms()),
            frame: Timer::new(clock.clone(), config.frame_interval_ms()),
            clock,
            max_dt_ms: config.max_dt_ms,
            tick_count: 0,
            frame_count: 0,
            last_dt_ms: 0,
            last_frame_at_ms: now,
            fps_samples: [frame_ms; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: f64::from(config.frame_rate),
            smoothed_frame_time_ms: frame_ms,
        }
    }

    /// Swap in new rates without resetting counters.
    pub fn apply(&mut self, config: &LoopConfig) {
        self.model.set_interval(config.model_interval_ms());
        self.frame.set_interval(config.frame_interval_ms());
        self.max_dt_ms = config.max_dt_ms;
    }

    /// Start a model tick and return its dt in milliseconds.
    pub fn begin_tick(&mut self) -> u32 {
        let mut dt = self.model.time_since_last_call();

        // Spiral-of-death cap
        if dt > self.max_dt_ms {
            log::warn!(
                "Tick took {}ms, capping model dt to {}ms",
                dt,
                self.max_dt_ms
            );
            dt = self.max_dt_ms;
        }

        self.tick_count += 1;
        self.last_dt_ms = dt;
        dt
    }

    /// True when a frame should be drawn this iteration.
    pub fn render_due(&mut self) -> bool {
        if !self.frame.triggered() {
            return false;
        }
        let now = self.clock.now_ms();
        let frame_ms = now.saturating_sub(self.last_frame_at_ms) as f64;
        self.last_frame_at_ms = now;
        self.frame_count += 1;

        // FPS smoothing
        self.fps_samples[self.fps_sample_index] = frame_ms;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_ms = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_ms;
        self.smoothed_fps = if avg_ms > 0.0 { 1000.0 / avg_ms } else { 0.0 };
        true
    }

    pub fn end_tick(&mut self) {
        self.model.wait_until_next_trigger();
    }

    pub fn model_interval_ms(&self) -> u32 {
        self.model.interval_ms()
    }

    pub fn frame_interval_ms(&self) -> u32 {
        self.frame.interval_ms()
    }
}
