// SPDX-License-Identifier: MIT
//
// Tweens — ready-made animations for components.
//
// Each builder returns a plain `Animation` whose callback holds only a
// weak handle to its target. The usual home for the result is the
// target's own animation list, and a strong handle there would keep the
// component alive through itself. When the target is gone a tick does
// nothing, and the animation runs out its clock harmlessly.

use tess_term::Color;

use crate::animation::Animation;
use crate::component::Component;
use crate::easing::{Easing, lerp_i32};
use crate::geometry::Point;

/// Move `target` from where it is now to relative position `end`.
///
/// The start point is captured when the tween is built, not when it first
/// ticks.
#[must_use]
pub fn move_to(target: &Component, end: Point, duration: f64, easing: Easing) -> Animation {
    let start = target.position();
    let weak = target.downgrade();
    Animation::new(duration, move |t| {
        if let Some(target) = weak.upgrade() {
            let e = easing.apply(t);
            target.set_position(Point::new(
                lerp_i32(start.x, end.x, e),
                lerp_i32(start.y, end.y, e),
            ));
        }
    })
}

/// Move `target` by `offset` relative to where it is now.
#[must_use]
pub fn slide_by(target: &Component, offset: Point, duration: f64, easing: Easing) -> Animation {
    move_to(target, target.position() + offset, duration, easing)
}

/// Toggle visibility: shown for the first half of each `interval`,
/// hidden for the second.
///
/// A one-shot blink leaves the target visible when it finishes.
#[must_use]
pub fn blink(target: &Component, interval: f64, looping: bool) -> Animation {
    let weak = target.downgrade();
    let restore = weak.clone();
    Animation::new(interval, move |t| {
        if let Some(target) = weak.upgrade() {
            target.set_visible(t < 0.5);
        }
    })
    .looping(looping)
    .on_complete(move || {
        if let Some(target) = restore.upgrade() {
            target.set_visible(true);
        }
    })
}

/// Switch the foreground from `from` to `to` halfway through.
///
/// Sixteen console colors have no in-between, so the fade is a step.
#[must_use]
pub fn fade_color(target: &Component, from: Color, to: Color, duration: f64) -> Animation {
    let weak = target.downgrade();
    Animation::new(duration, move |t| {
        if let Some(target) = weak.upgrade() {
            target.set_fg(if t < 0.5 { from } else { to });
        }
    })
}

/// Report eased progress to `callback`.
#[must_use]
pub fn progress(
    duration: f64,
    easing: Easing,
    mut callback: impl FnMut(f64) + Send + 'static,
) -> Animation {
    Animation::new(duration, move |t| callback(easing.apply(t)))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    // ── Movement ────────────────────────────────────────────────────────

    #[test]
    fn move_to_interpolates_from_creation_point() {
        let c = Component::label(Point::new(0, 10), "x");
        let mut anim = move_to(&c, Point::new(10, 0), 1.0, Easing::Linear);

        anim.update(0.5);
        assert_eq!(c.position(), Point::new(5, 5));
        anim.update(0.5);
        assert_eq!(c.position(), Point::new(10, 0));
        assert!(anim.is_complete());
    }

    #[test]
    fn move_to_applies_easing() {
        let c = Component::label(Point::ORIGIN, "x");
        let mut anim = move_to(&c, Point::new(100, 0), 1.0, Easing::EaseOutQuad);
        anim.update(0.5);
        assert_eq!(c.position(), Point::new(75, 0));
    }

    #[test]
    fn slide_by_is_relative() {
        let c = Component::label(Point::new(3, 3), "x");
        let mut anim = slide_by(&c, Point::new(-3, 2), 0.2, Easing::Linear);
        anim.update(1.0);
        assert_eq!(c.position(), Point::new(0, 5));
    }

    // ── Blink ───────────────────────────────────────────────────────────

    #[test]
    fn one_shot_blink_restores_visibility() {
        let c = Component::label(Point::ORIGIN, "x");
        let mut anim = blink(&c, 1.0, false);

        anim.update(0.25);
        assert!(c.is_visible());
        anim.update(0.5);
        assert!(!c.is_visible());
        anim.update(0.5);
        assert!(anim.is_complete());
        assert!(c.is_visible());
    }

    #[test]
    fn looping_blink_keeps_toggling() {
        let c = Component::label(Point::ORIGIN, "x");
        let mut anim = blink(&c, 1.0, true);
        anim.update(0.75);
        assert!(!c.is_visible());
        anim.update(0.5);
        assert!(c.is_visible());
        assert!(!anim.is_complete());
    }

    // ── Color ───────────────────────────────────────────────────────────

    #[test]
    fn fade_switches_at_half() {
        let c = Component::label(Point::ORIGIN, "x");
        let mut anim = fade_color(&c, Color::Red, Color::Blue, 1.0);
        anim.update(0.4);
        assert_eq!(c.fg(), Color::Red);
        anim.update(0.1);
        assert_eq!(c.fg(), Color::Blue);
    }

    // ── Generic ─────────────────────────────────────────────────────────

    #[test]
    fn progress_reports_eased_values() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let mut anim = progress(2.0, Easing::EaseOutQuad, move |p| log.lock().push(p));
        anim.update(1.0);
        anim.update(1.0);
        assert_eq!(*seen.lock(), vec![0.75, 1.0]);
    }

    // ── Dropped target ──────────────────────────────────────────────────

    #[test]
    fn dropped_target_is_a_no_op() {
        let c = Component::label(Point::ORIGIN, "x");
        let mut moving = move_to(&c, Point::new(5, 5), 1.0, Easing::Linear);
        let mut blinking = blink(&c, 1.0, false);
        drop(c);

        moving.update(0.5);
        blinking.update(2.0);
        assert!(blinking.is_complete());
    }
}
