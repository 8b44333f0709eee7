//! Collision primitives
//!
//! Runner entities collide as axis-aligned boxes; stealth entities use plain
//! distance checks between their anchor points.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Box from its top-left corner and size
    pub fn from_corner(corner: Vec2, size: Vec2) -> Self {
        Self {
            min: corner,
            max: corner + size,
        }
    }

    /// Box from its centre and size
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self::from_corner(center - size / 2.0, size)
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Strict overlap: boxes that only share an edge do not overlap
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// True if two anchor points are closer than `radius`
#[inline]
pub fn within(a: Vec2, b: Vec2, radius: f32) -> bool {
    a.distance_squared(b) < radius * radius
}
