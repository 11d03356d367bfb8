// SPDX-License-Identifier: MIT
//
// Frame pacing for the logic and render loops.
//
// `thread::sleep` alone overshoots by up to a scheduler quantum, which at
// 60 Hz is a visible fraction of the frame. Spinning alone burns a core.
// The pacer does both: it sleeps in 1 ms steps while the deadline is
// comfortably far away and spins on `hint::spin_loop` for the last stretch
// below the spin threshold.
//
// Deadlines advance by a fixed interval so rounding does not accumulate.
// A loop that falls more than one interval behind drops the missed ticks
// and re-anchors on the current time instead of racing to catch up.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Sleep granularity while far from the deadline.
const SLEEP_STEP: Duration = Duration::from_millis(1);

/// What to do with `remaining` time left before a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    Sleep,
    Spin,
    Done,
}

impl Wait {
    #[must_use]
    pub fn for_remaining(remaining: Duration, spin_threshold: Duration) -> Self {
        if remaining.is_zero() {
            Self::Done
        } else if remaining > spin_threshold {
            Self::Sleep
        } else {
            Self::Spin
        }
    }
}

/// Keeps a loop at a fixed tick interval.
#[derive(Debug)]
pub struct FramePacer {
    interval: Duration,
    spin_threshold: Duration,
    deadline: Instant,
    last_tick: Instant,
}

impl FramePacer {
    #[must_use]
    pub fn new(interval: Duration, spin_threshold: Duration) -> Self {
        let now = Instant::now();
        Self {
            interval,
            spin_threshold,
            deadline: now + interval,
            last_tick: now,
        }
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Seconds since the previous call (or since construction).
    pub fn tick(&mut self) -> f64 {
        let now = Instant::now();
        let dt = now.duration_since(self.last_tick).as_secs_f64();
        self.last_tick = now;
        dt
    }

    /// Block until the next deadline, or until `cancel` is raised.
    pub fn wait(&mut self, cancel: &AtomicBool) {
        loop {
            if cancel.load(Ordering::Acquire) {
                return;
            }
            let remaining = self.deadline.saturating_duration_since(Instant::now());
            match Wait::for_remaining(remaining, self.spin_threshold) {
                Wait::Sleep => std::thread::sleep(SLEEP_STEP),
                Wait::Spin => std::hint::spin_loop(),
                Wait::Done => break,
            }
        }

        let now = Instant::now();
        self.deadline += self.interval;
        if self.deadline + self.interval < now {
            self.deadline = now + self.interval;
        }
    }
}

// ─── RateMeter ───────────────────────────────────────────────────────────────

/// A ticks-per-second reading shared across threads.
///
/// Stored as raw `f64` bits in an atomic so readers never block the loop
/// that writes it.
#[derive(Debug, Default)]
pub struct RateMeter(AtomicU64);

impl RateMeter {
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Record one tick that took `dt` seconds.
    pub fn record(&self, dt: f64) {
        let rate = if dt > 0.0 { 1.0 / dt } else { 0.0 };
        self.0.store(rate.to_bits(), Ordering::Relaxed);
    }

    /// Most recent rate; 0 before the first tick.
    #[must_use]
    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
