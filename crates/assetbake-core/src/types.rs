//! Common types used across assetbake
//!
//! Small math value types shared by the mesh model and the codec.

use serde::{Deserialize, Serialize};

/// 3D vector (position, normal, tangent, extents corner)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };
    pub const UP: Self = Self { x: 0.0, y: 1.0, z: 0.0 };
    pub const FORWARD: Self = Self { x: 0.0, y: 0.0, z: 1.0 };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Componentwise minimum
    pub fn min(&self, other: &Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Componentwise maximum
    pub fn max(&self, other: &Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// 2D vector (UV coordinates, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Default for Vec2 {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Axis-aligned min/max extents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extents {
    pub min: Vec3,
    pub max: Vec3,
}

impl Extents {
    pub const ZERO: Self = Self {
        min: Vec3::ZERO,
        max: Vec3::ZERO,
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Degenerate extents enclosing a single point
    pub fn from_point(point: Vec3) -> Self {
        Self { min: point, max: point }
    }

    /// Running min/max over a set of points, seeded from the first one.
    /// Returns `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut iter = points.into_iter();
        let mut extents = Self::from_point(iter.next()?);
        for point in iter {
            extents.expand(point);
        }
        Some(extents)
    }

    pub fn expand(&mut self, point: Vec3) {
        self.min = self.min.min(&point);
        self.max = self.max.max(&point);
    }

    /// Merge with another set of extents
    pub fn merge(&mut self, other: &Extents) {
        self.min = self.min.min(&other.min);
        self.max = self.max.max(&other.max);
    }
}

impl Default for Extents {
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let v1 = Vec3::new(1.0, 2.0, 3.0);
        let v2 = Vec3::new(4.0, 5.0, 6.0);

        assert!((v1.dot(&v2) - 32.0).abs() < 0.001);

        let cross = v1.cross(&v2);
        assert!((cross.x - (-3.0)).abs() < 0.001);
        assert!((cross.y - 6.0).abs() < 0.001);
        assert!((cross.z - (-3.0)).abs() < 0.001);
    }

    #[test]
    fn test_vec3_neg() {
        assert_eq!(-Vec3::new(1.0, -2.0, 0.5), Vec3::new(-1.0, 2.0, -0.5));
    }

    #[test]
    fn test_extents_expand() {
        let mut extents = Extents::new(Vec3::ZERO, Vec3::ZERO);
        extents.expand(Vec3::new(1.0, 2.0, 3.0));
        extents.expand(Vec3::new(-1.0, -2.0, -3.0));

        assert_eq!(extents.min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(extents.max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_extents_from_points_seeds_from_first() {
        // Seeding from ZERO would wrongly pull min up to the origin here
        let extents = Extents::from_points([
            Vec3::new(5.0, 5.0, 5.0),
            Vec3::new(6.0, 7.0, 8.0),
        ])
        .unwrap();

        assert_eq!(extents.min, Vec3::new(5.0, 5.0, 5.0));
        assert_eq!(extents.max, Vec3::new(6.0, 7.0, 8.0));
        assert!(Extents::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_extents_merge() {
        let mut a = Extents::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let b = Extents::new(Vec3::new(-2.0, 0.5, 0.0), Vec3::new(0.5, 3.0, 1.0));
        a.merge(&b);

        assert_eq!(a.min, Vec3::new(-2.0, 0.0, 0.0));
        assert_eq!(a.max, Vec3::new(1.0, 3.0, 1.0));
    }
}
