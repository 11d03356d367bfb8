// SPDX-License-Identifier: MIT
//
// Easing curves and interpolation.
//
// Each curve maps normalized time in [0, 1] to eased progress in [0, 1].
// Input outside the range is clamped first, so callers can pass raw
// `elapsed / duration` without guarding.

/// A timing curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Easing {
    #[default]
    Linear,
    /// Fast start, gentle stop.
    EaseOutQuad,
    /// Gentle start and stop.
    EaseInOutQuad,
    /// Overshoot the end and settle with decaying bounces.
    EaseOutBounce,
}

impl Easing {
    /// Eased progress for normalized time `t`.
    ///
    /// ```
    /// use tess_ui::easing::Easing;
    ///
    /// assert_eq!(Easing::EaseOutQuad.apply(0.5), 0.75);
    /// assert_eq!(Easing::Linear.apply(2.0), 1.0);
    /// ```
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Self::Linear => t,
            Self::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0f64).mul_add(t, 2.0).powi(2) / 2.0
                }
            }
            Self::EaseOutBounce => bounce(t),
        }
    }
}

fn bounce(t: f64) -> f64 {
    const N1: f64 = 7.5625;
    const D1: f64 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        (N1 * t).mul_add(t, 0.75)
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        (N1 * t).mul_add(t, 0.9375)
    } else {
        let t = t - 2.625 / D1;
        (N1 * t).mul_add(t, 0.984_375)
    }
}

/// Linear interpolation from `a` to `b`.
#[inline]
#[must_use]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    (b - a).mul_add(t, a)
}

/// [`lerp`] between integers, truncated toward zero.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Result lies between a and b.
pub fn lerp_i32(a: i32, b: i32, t: f64) -> i32 {
    lerp(f64::from(a), f64::from(b), t) as i32
}

// ─── Tests ───────────────────────────────────────────────────────────────────
