//! Axis-aligned rectangle geometry
//!
//! Everything in the arcade model is a rectangle: body bounds, the swept hulls
//! used for tile tests, tiles themselves and quad-tree nodes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle, top-left origin, y grows downward
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning two corner points
    pub fn from_corners(min: Vec2, max: Vec2) -> Self {
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.right(), self.bottom())
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// True if the rectangle covers no area (also true for NaN sizes)
    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Overlap test with inclusive edges
    ///
    /// Two rectangles that share an edge count as intersecting; a rectangle
    /// without area never intersects anything.
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        !(self.right() < other.x
            || self.bottom() < other.y
            || self.x > other.right()
            || self.y > other.bottom())
    }

    /// True if `other` lies entirely inside this rectangle
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_corners(self.min().min(other.min()), self.max().max(other.max()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersects_inclusive_edges() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        let c = Rect::new(10.5, 0.0, 10.0, 10.0);

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_zero_area_never_intersects() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let line = Rect::new(5.0, 0.0, 0.0, 10.0);

        assert!(!a.intersects(&line));
        assert!(!line.intersects(&a));
        assert!(line.is_empty());
    }

    #[test]
    fn test_union_covers_both() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, -5.0, 20.0, 5.0);
        let u = a.union(&b);

        assert_eq!(u, Rect::new(0.0, -5.0, 25.0, 15.0));
        assert!(u.contains(&a));
        assert!(u.contains(&b));
    }
}
