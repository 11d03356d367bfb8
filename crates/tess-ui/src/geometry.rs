// SPDX-License-Identifier: MIT
//
// Geometry — integer points and sizes in cell units, plus a camera.
//
// Everything in the scene graph is laid out on the character grid, so
// positions and sizes are plain `i32`. Signed on purpose: a component can
// sit partly above or left of its parent, and the frame buffer drops
// whatever lands off screen.

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

// ─── Point ───────────────────────────────────────────────────────────────────

/// A position on the cell grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// `(0, 0)`.
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Clamp each coordinate into `[min, max]` independently.
    ///
    /// If `min` exceeds `max` on an axis, `max` wins on that axis.
    #[must_use]
    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self {
            x: self.x.max(min.x).min(max.x),
            y: self.y.max(min.y).min(max.y),
        }
    }
}

impl Add for Point {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x.saturating_add(rhs.x), self.y.saturating_add(rhs.y))
    }
}

impl Sub for Point {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}

impl AddAssign for Point {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Point {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Point {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(self.x.saturating_neg(), self.y.saturating_neg())
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

// ─── Size ────────────────────────────────────────────────────────────────────

/// Width and height in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    #[inline]
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Whether either side is zero or negative.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

impl From<(i32, i32)> for Size {
    fn from((width, height): (i32, i32)) -> Self {
        Self::new(width, height)
    }
}

// ─── Camera ──────────────────────────────────────────────────────────────────

/// A window onto a larger world, in cell units.
///
/// ```
/// use tess_ui::geometry::{Camera, Point, Size};
///
/// let cam = Camera::new(Point::new(10, 5), Size::new(20, 10));
/// assert_eq!(cam.transform(Point::new(15, 7)), Point::new(5, 2));
/// // Points outside the view stick to its edge.
/// assert_eq!(cam.transform(Point::new(0, 100)), Point::new(0, 9));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Camera {
    /// World position of the view's top-left corner.
    pub origin: Point,
    /// Extent of the view.
    pub size: Size,
}

impl Camera {
    #[must_use]
    pub const fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    /// World space to camera space, clamped into the view.
    #[must_use]
    pub fn transform(&self, world: Point) -> Point {
        let max = Point::new(
            (self.size.width - 1).max(0),
            (self.size.height - 1).max(0),
        );
        (world - self.origin).clamp(Point::ORIGIN, max)
    }

    /// Whether a world point falls inside the view.
    #[must_use]
    pub const fn contains(&self, world: Point) -> bool {
        let x = world.x - self.origin.x;
        let y = world.y - self.origin.y;
        x >= 0 && y >= 0 && x < self.size.width && y < self.size.height
    }

    /// Move the view by `delta`.
    pub fn pan(&mut self, delta: Point) {
        self.origin += delta;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
