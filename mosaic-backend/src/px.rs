//! Physical pixel coordinate types for the binding layer.
//!
//! Everything the binding positions (peer bounds, clip rectangles, dirty
//! regions) is expressed in physical pixels. The coordinate system has its
//! origin at the top-left corner, x growing right and y growing down.
//! Negative values are allowed so that peers scrolled partially off-screen
//! keep meaningful coordinates.

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// A single physical pixel coordinate value.
///
/// A thin wrapper over `i32` so pixel arithmetic cannot silently mix with
/// other integer quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Px(pub i32);

impl Px {
    /// Zero pixels.
    pub const ZERO: Px = Px(0);

    /// Creates a pixel value from a raw `i32`.
    pub const fn new(value: i32) -> Self {
        Px(value)
    }

    /// Returns the raw value.
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Returns the value clamped to `0..` as a `u32`, for buffer indexing.
    pub fn positive(self) -> u32 {
        self.0.max(0) as u32
    }

    /// Absolute value.
    pub fn abs(self) -> Px {
        Px(self.0.abs())
    }

    /// Component-wise minimum.
    pub fn min(self, other: Px) -> Px {
        Px(self.0.min(other.0))
    }

    /// Component-wise maximum.
    pub fn max(self, other: Px) -> Px {
        Px(self.0.max(other.0))
    }

    /// Lossy conversion to `f32`, used by distance calculations.
    pub fn to_f32(self) -> f32 {
        self.0 as f32
    }
}

impl Add for Px {
    type Output = Px;
    fn add(self, rhs: Px) -> Px {
        Px(self.0 + rhs.0)
    }
}

impl Sub for Px {
    type Output = Px;
    fn sub(self, rhs: Px) -> Px {
        Px(self.0 - rhs.0)
    }
}

impl AddAssign for Px {
    fn add_assign(&mut self, rhs: Px) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Px {
    fn sub_assign(&mut self, rhs: Px) {
        self.0 -= rhs.0;
    }
}

impl Neg for Px {
    type Output = Px;
    fn neg(self) -> Px {
        Px(-self.0)
    }
}

impl From<i32> for Px {
    fn from(value: i32) -> Self {
        Px(value)
    }
}

impl From<u32> for Px {
    fn from(value: u32) -> Self {
        Px(value as i32)
    }
}

/// A 2D position in physical pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PxPosition {
    /// Horizontal coordinate.
    pub x: Px,
    /// Vertical coordinate.
    pub y: Px,
}

impl PxPosition {
    /// Creates a position from two pixel values.
    pub const fn new(x: Px, y: Px) -> Self {
        Self { x, y }
    }

    /// Returns this position shifted by the given deltas.
    pub fn offset(self, dx: Px, dy: Px) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Euclidean distance to another position.
    pub fn distance_to(self, other: PxPosition) -> f32 {
        let dx = (self.x - other.x).to_f32();
        let dy = (self.y - other.y).to_f32();
        (dx * dx + dy * dy).sqrt()
    }
}

/// A 2D size in physical pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PxSize {
    /// Horizontal extent.
    pub width: Px,
    /// Vertical extent.
    pub height: Px,
}

impl PxSize {
    /// Creates a size from two pixel values.
    pub const fn new(width: Px, height: Px) -> Self {
        Self { width, height }
    }

    /// True if either dimension is zero or negative.
    pub fn is_empty(self) -> bool {
        self.width.0 <= 0 || self.height.0 <= 0
    }
}

/// An axis-aligned rectangle in physical pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PxRect {
    /// Left edge.
    pub x: Px,
    /// Top edge.
    pub y: Px,
    /// Horizontal extent.
    pub width: Px,
    /// Vertical extent.
    pub height: Px,
}

impl PxRect {
    /// Creates a rectangle from raw coordinates.
    pub const fn new(x: Px, y: Px, width: Px, height: Px) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle from a position and a size.
    pub fn from_pos_size(pos: PxPosition, size: PxSize) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            width: size.width,
            height: size.height,
        }
    }

    /// The rectangle's top-left corner.
    pub fn position(self) -> PxPosition {
        PxPosition::new(self.x, self.y)
    }

    /// The rectangle's dimensions.
    pub fn size(self) -> PxSize {
        PxSize::new(self.width, self.height)
    }

    /// Exclusive right edge.
    pub fn right(self) -> Px {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> Px {
        self.y + self.height
    }

    /// True if the rectangle has no area.
    pub fn is_empty(self) -> bool {
        self.width.0 <= 0 || self.height.0 <= 0
    }

    /// True if the point lies inside the rectangle.
    pub fn contains(self, pos: PxPosition) -> bool {
        pos.x >= self.x && pos.x < self.right() && pos.y >= self.y && pos.y < self.bottom()
    }

    /// Smallest rectangle covering both `self` and `other`.
    pub fn union(self, other: PxRect) -> PxRect {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        PxRect::new(x, y, right - x, bottom - y)
    }

    /// Overlap of `self` and `other`, or `None` when they are disjoint.
    pub fn intersection(self, other: PxRect) -> Option<PxRect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return None;
        }
        Some(PxRect::new(x, y, right - x, bottom - y))
    }

    /// Returns this rectangle translated by the given deltas.
    pub fn offset(self, dx: Px, dy: Px) -> PxRect {
        PxRect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Clamps the rectangle to `0,0 .. bounds`, dropping any off-surface part.
    pub fn clamp_to(self, bounds: PxSize) -> Option<PxRect> {
        self.intersection(PxRect::new(Px::ZERO, Px::ZERO, bounds.width, bounds.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_px_arithmetic() {
        assert_eq!(Px(10) + Px(5), Px(15));
        assert_eq!(Px(10) - Px(25), Px(-15));
        assert_eq!(-Px(3), Px(-3));
        assert_eq!(Px(-7).abs(), Px(7));
        assert_eq!(Px(-7).positive(), 0);
        assert_eq!(Px(7).positive(), 7);
    }

    #[test]
    fn test_position_offset_and_distance() {
        let pos = PxPosition::new(Px(10), Px(20));
        assert_eq!(pos.offset(Px(-10), Px(5)), PxPosition::new(Px(0), Px(25)));
        assert_eq!(
            PxPosition::new(Px(0), Px(0)).distance_to(PxPosition::new(Px(3), Px(4))),
            5.0
        );
    }

    #[test]
    fn test_rect_contains() {
        let rect = PxRect::new(Px(10), Px(10), Px(5), Px(5));
        assert!(rect.contains(PxPosition::new(Px(10), Px(10))));
        assert!(rect.contains(PxPosition::new(Px(14), Px(14))));
        assert!(!rect.contains(PxPosition::new(Px(15), Px(10))));
        assert!(!rect.contains(PxPosition::new(Px(9), Px(12))));
    }

    #[test]
    fn test_rect_union() {
        let a = PxRect::new(Px(0), Px(0), Px(10), Px(10));
        let b = PxRect::new(Px(20), Px(5), Px(10), Px(10));
        assert_eq!(a.union(b), PxRect::new(Px(0), Px(0), Px(30), Px(15)));
        // Empty rects do not contribute.
        let empty = PxRect::default();
        assert_eq!(a.union(empty), a);
        assert_eq!(empty.union(b), b);
    }

    #[test]
    fn test_rect_intersection() {
        let a = PxRect::new(Px(0), Px(0), Px(10), Px(10));
        let b = PxRect::new(Px(5), Px(5), Px(10), Px(10));
        assert_eq!(
            a.intersection(b),
            Some(PxRect::new(Px(5), Px(5), Px(5), Px(5)))
        );
        let c = PxRect::new(Px(10), Px(0), Px(5), Px(5));
        assert_eq!(a.intersection(c), None);
    }

    #[test]
    fn test_rect_clamp_to_surface() {
        let bounds = PxSize::new(Px(100), Px(100));
        let partly_off = PxRect::new(Px(-10), Px(90), Px(30), Px(30));
        assert_eq!(
            partly_off.clamp_to(bounds),
            Some(PxRect::new(Px(0), Px(90), Px(20), Px(10)))
        );
        let fully_off = PxRect::new(Px(200), Px(0), Px(10), Px(10));
        assert_eq!(fully_off.clamp_to(bounds), None);
    }
}
