// SPDX-License-Identifier: MIT
//
// Animation — a clock that reports progress to a callback.
//
// An animation owns no target. It accumulates time from `update(dt)`,
// turns it into progress in [0, 1], and hands that to `on_update`; what
// the progress *means* (a position, a visibility toggle, a color) lives in
// the callback. The builders in `tween.rs` produce the common ones.
//
// Looping animations wrap their clock and never complete. One-shot
// animations clamp at the end, report progress 1.0 one last time, fire
// `on_complete` once, and then ignore further updates so the owner can
// drop them. A zero or negative duration has nothing to loop over: it
// completes on its first update, looping or not.

use std::fmt;

type UpdateFn = Box<dyn FnMut(f64) + Send>;
type CompleteFn = Box<dyn FnOnce() + Send>;

/// A timed progress callback.
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use tess_ui::animation::Animation;
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let log = Arc::clone(&seen);
/// let mut anim = Animation::new(1.0, move |p| log.lock().unwrap().push(p));
///
/// anim.update(0.25);
/// anim.update(0.75);
/// assert!(anim.is_complete());
/// assert_eq!(*seen.lock().unwrap(), vec![0.25, 1.0]);
/// ```
pub struct Animation {
    duration: f64,
    elapsed: f64,
    looping: bool,
    done: bool,
    on_update: UpdateFn,
    on_complete: Option<CompleteFn>,
}

impl Animation {
    /// An animation lasting `duration` seconds.
    pub fn new(duration: f64, on_update: impl FnMut(f64) + Send + 'static) -> Self {
        Self {
            duration,
            elapsed: 0.0,
            looping: false,
            done: false,
            on_update: Box::new(on_update),
            on_complete: None,
        }
    }

    /// Restart from zero instead of completing.
    ///
    /// A zero or negative duration has nothing to loop over: the animation
    /// still reports 1.0 once and completes on its first update.
    #[must_use]
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Run `f` once, right after the final progress report.
    #[must_use]
    pub fn on_complete(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Advance the clock by `dt` seconds and report progress.
    ///
    /// Negative or NaN `dt` counts as zero. Does nothing once complete.
    pub fn update(&mut self, dt: f64) {
        if self.done {
            return;
        }

        if self.duration <= 0.0 {
            self.done = true;
            (self.on_update)(1.0);
            self.fire_complete();
            return;
        }

        self.elapsed += if dt.is_nan() { 0.0 } else { dt.max(0.0) };
        if self.elapsed >= self.duration {
            if self.looping {
                self.elapsed %= self.duration;
            } else {
                self.elapsed = self.duration;
                self.done = true;
            }
        }

        let progress = self.progress();
        (self.on_update)(progress);

        if self.done {
            self.fire_complete();
        }
    }

    fn fire_complete(&mut self) {
        if let Some(done) = self.on_complete.take() {
            done();
        }
    }

    /// Whether the animation has run to its end.
    #[inline]
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.done
    }

    /// Progress in [0, 1].
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            return if self.done { 1.0 } else { 0.0 };
        }
        (self.elapsed / self.duration).min(1.0)
    }

    /// Seconds on the clock.
    #[inline]
    #[must_use]
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Configured length in seconds.
    #[inline]
    #[must_use]
    pub const fn duration(&self) -> f64 {
        self.duration
    }

    #[inline]
    #[must_use]
    pub const fn is_looping(&self) -> bool {
        self.looping
    }
}

impl fmt::Debug for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animation")
            .field("duration", &self.duration)
            .field("elapsed", &self.elapsed)
            .field("looping", &self.looping)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    fn recording(duration: f64) -> (Animation, Arc<Mutex<Vec<f64>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        (Animation::new(duration, move |p| log.lock().push(p)), seen)
    }

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    // ── One-shot ────────────────────────────────────────────────────────

    #[test]
    fn reports_progress_fractions() {
        let (mut anim, seen) = recording(2.0);
        anim.update(0.5);
        anim.update(0.5);
        assert_eq!(*seen.lock(), vec![0.25, 0.5]);
        assert!(!anim.is_complete());
    }

    #[test]
    fn completes_once_after_final_update() {
        let (count, done) = counter();
        let order = Arc::new(Mutex::new(Vec::new()));
        let on_update = Arc::clone(&order);
        let on_done = Arc::clone(&order);
        let mut anim = Animation::new(1.0, move |p| on_update.lock().push(format!("update {p}")))
            .on_complete(move || {
                on_done.lock().push("complete".to_owned());
                done();
            });

        for _ in 0..4 {
            anim.update(0.25);
        }
        anim.update(0.25);
        anim.update(1.0);

        assert!(anim.is_complete());
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(
            *order.lock(),
            vec!["update 0.25", "update 0.5", "update 0.75", "update 1", "complete"]
        );
    }

    #[test]
    fn overshoot_clamps_to_one() {
        let (mut anim, seen) = recording(1.0);
        anim.update(5.0);
        assert_eq!(*seen.lock(), vec![1.0]);
        assert_eq!(anim.elapsed(), 1.0);
    }

    #[test]
    fn negative_and_nan_dt_count_as_zero() {
        let (mut anim, seen) = recording(1.0);
        anim.update(-1.0);
        anim.update(f64::NAN);
        assert_eq!(*seen.lock(), vec![0.0, 0.0]);
        assert_eq!(anim.elapsed(), 0.0);
    }

    // ── Zero duration ───────────────────────────────────────────────────

    #[test]
    fn zero_duration_completes_on_first_update() {
        let (count, done) = counter();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let mut anim = Animation::new(0.0, move |p| log.lock().push(p))
            .looping(true)
            .on_complete(done);

        assert_eq!(anim.progress(), 0.0);
        anim.update(0.0);
        anim.update(1.0);
        assert!(anim.is_complete());
        assert_eq!(anim.progress(), 1.0);
        assert_eq!(*seen.lock(), vec![1.0]);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    // ── Looping ─────────────────────────────────────────────────────────

    #[test]
    fn looping_wraps_and_never_completes() {
        let (count, done) = counter();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let mut anim = Animation::new(1.0, move |p| log.lock().push(p))
            .looping(true)
            .on_complete(done);

        anim.update(0.75);
        anim.update(0.5);
        assert!(!anim.is_complete());
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(*seen.lock(), vec![0.75, 0.25]);
    }
}
