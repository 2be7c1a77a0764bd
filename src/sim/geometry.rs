//! Geometric primitives shared by the detector, the grid and the world
//!
//! Screen coordinates: x grows right, y grows down. A rectangle's "top" edge
//! is therefore its minimum y.

use serde::{Deserialize, Serialize};

use crate::Vector2;

/// An axis-aligned rectangle (paddle, block or field segment)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Negative sizes collapse to zero
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Rectangle spanning two corners (any order)
    pub fn from_corners(a: Vector2, b: Vector2) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn min(&self) -> Vector2 {
        Vector2::new(self.x, self.y)
    }

    #[inline]
    pub fn max(&self) -> Vector2 {
        Vector2::new(self.right(), self.bottom())
    }

    pub fn center(&self) -> Vector2 {
        Vector2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Grow outward by `amount` on all four sides
    pub fn expand(&self, amount: f64) -> Self {
        Self::new(
            self.x - amount,
            self.y - amount,
            self.width + 2.0 * amount,
            self.height + 2.0 * amount,
        )
    }

    /// Closest point of the rectangle to `p`
    #[inline]
    pub fn clamp_point(&self, p: Vector2) -> Vector2 {
        Vector2::new(
            p.x.clamp(self.left(), self.right()),
            p.y.clamp(self.top(), self.bottom()),
        )
    }

    /// Inclusive containment (edges count)
    pub fn contains_point(&self, p: Vector2) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }

    /// Inclusive overlap: rectangles sharing only an edge overlap
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() <= other.right()
            && other.left() <= self.right()
            && self.top() <= other.bottom()
            && other.top() <= self.bottom()
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Self {
        Self::from_corners(self.min().min(other.min()), self.max().max(other.max()))
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// A circle; the geometric projection of a moving body
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Circle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl Circle {
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        Self { x, y, radius }
    }

    pub fn at(center: Vector2, radius: f64) -> Self {
        Self::new(center.x, center.y, radius)
    }

    #[inline]
    pub fn center(&self) -> Vector2 {
        Vector2::new(self.x, self.y)
    }

    /// Axis-aligned bounding box
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.x - self.radius,
            self.y - self.radius,
            2.0 * self.radius,
            2.0 * self.radius,
        )
    }
}
