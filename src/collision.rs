//! Simplified hit-test proxies attached to pieces.

use crate::math::aabb::Aabb;
use crate::math::vec3::Vec3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum VolumeShape {
    #[default]
    Box,
    Ellipsoid,
    /// Cylinder with its axis along Z.
    Cylinder,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum HitTest {
    Discrete,
    #[default]
    Continuous,
}

/// A collision volume: full extents (`scales`) around a center that sits
/// `offset` away from the owner's origin.
///
/// Cloning yields an independent volume; instances resize their copy
/// without touching the canonical piece.
#[derive(Clone, Debug, PartialEq)]
pub struct CollisionVolume {
    shape: VolumeShape,
    scales: Vec3,
    offset: Vec3,
    hit_test: HitTest,
}

impl CollisionVolume {
    pub fn new(shape: VolumeShape, scales: Vec3, offset: Vec3, hit_test: HitTest) -> Self {
        Self {
            shape,
            scales: scales.max(Vec3::ZERO),
            offset,
            hit_test,
        }
    }

    /// Continuous-test box.
    pub fn new_box(scales: Vec3, offset: Vec3) -> Self {
        Self::new(VolumeShape::Box, scales, offset, HitTest::Continuous)
    }

    /// Box spanning `bounds`, recentered on `origin`.
    pub fn enclosing(bounds: &Aabb, origin: Vec3) -> Self {
        Self::new_box(bounds.size(), bounds.center() - origin)
    }

    pub fn shape(&self) -> VolumeShape {
        self.shape
    }

    pub fn scales(&self) -> Vec3 {
        self.scales
    }

    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    pub fn hit_test(&self) -> HitTest {
        self.hit_test
    }

    pub fn half_extents(&self) -> Vec3 {
        self.scales * 0.5
    }

    pub fn resize(&mut self, scales: Vec3) {
        self.scales = scales.max(Vec3::ZERO);
    }

    pub fn set_offset(&mut self, offset: Vec3) {
        self.offset = offset;
    }

    /// Radius of the sphere around the volume center enclosing the volume.
    pub fn bounding_radius(&self) -> f32 {
        let h = self.half_extents();
        match self.shape {
            VolumeShape::Box => h.length(),
            VolumeShape::Ellipsoid => h.x.max(h.y).max(h.z),
            VolumeShape::Cylinder => {
                let r = h.x.max(h.y);
                (r * r + h.z * h.z).sqrt()
            }
        }
    }

    /// Whether `point`, given in the owner's local space, lies inside.
    pub fn contains(&self, point: Vec3) -> bool {
        let d = point - self.offset;
        let h = self.half_extents();
        match self.shape {
            VolumeShape::Box => d.x.abs() <= h.x && d.y.abs() <= h.y && d.z.abs() <= h.z,
            VolumeShape::Ellipsoid => ratio_sq(d.x, h.x) + ratio_sq(d.y, h.y) + ratio_sq(d.z, h.z) <= 1.0,
            VolumeShape::Cylinder => {
                ratio_sq(d.x, h.x) + ratio_sq(d.y, h.y) <= 1.0 && d.z.abs() <= h.z
            }
        }
    }
}

/// `(d / h)^2`; a flat axis only admits `d == 0`.
fn ratio_sq(d: f32, h: f32) -> f32 {
    if h > 0.0 {
        (d / h) * (d / h)
    } else if d == 0.0 {
        0.0
    } else {
        f32::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn enclosing_box_recenters_on_origin() {
        let volume = CollisionVolume::enclosing(&Aabb::UNIT, Vec3::ZERO);
        assert_eq!(volume.scales(), Vec3::ONE);
        assert_eq!(volume.offset(), Vec3::splat(0.5));
        assert_eq!(volume.shape(), VolumeShape::Box);
        assert_eq!(volume.hit_test(), HitTest::Continuous);
    }

    #[test]
    fn box_contains_its_corners_only() {
        let volume = CollisionVolume::new_box(Vec3::splat(2.0), Vec3::ZERO);
        assert!(volume.contains(Vec3::ONE));
        assert!(!volume.contains(Vec3::new(1.1, 0.0, 0.0)));
    }

    #[test]
    fn ellipsoid_excludes_box_corners() {
        let volume = CollisionVolume::new(
            VolumeShape::Ellipsoid,
            Vec3::splat(2.0),
            Vec3::ZERO,
            HitTest::Discrete,
        );
        assert!(volume.contains(Vec3::new(0.0, 0.99, 0.0)));
        assert!(!volume.contains(Vec3::splat(0.9)));
    }

    #[test]
    fn clones_resize_independently() {
        let original = CollisionVolume::new_box(Vec3::ONE, Vec3::ZERO);
        let mut copy = original.clone();
        copy.resize(Vec3::splat(4.0));
        assert_eq!(original.scales(), Vec3::ONE);
        assert_eq!(copy.scales(), Vec3::splat(4.0));
    }

    #[test]
    fn negative_scales_clamp_to_zero() {
        let volume = CollisionVolume::new_box(Vec3::new(-1.0, 2.0, 2.0), Vec3::ZERO);
        assert_eq!(volume.scales().x, 0.0);
        assert!(volume.contains(Vec3::new(0.0, 0.5, 0.5)));
        assert!(!volume.contains(Vec3::new(0.1, 0.0, 0.0)));
    }

    #[test]
    fn bounding_radius_per_shape() {
        let scales = Vec3::new(2.0, 4.0, 6.0);
        let radius = |shape| {
            CollisionVolume::new(shape, scales, Vec3::ZERO, HitTest::Continuous).bounding_radius()
        };

        assert_relative_eq!(radius(VolumeShape::Box), 14.0f32.sqrt());
        assert_relative_eq!(radius(VolumeShape::Ellipsoid), 3.0);
        assert_relative_eq!(radius(VolumeShape::Cylinder), 13.0f32.sqrt());
    }

    #[test]
    fn moving_the_offset_moves_the_volume() {
        let mut volume = CollisionVolume::new_box(Vec3::splat(2.0), Vec3::ZERO);
        volume.set_offset(Vec3::new(5.0, 0.0, 0.0));

        assert_eq!(volume.offset(), Vec3::new(5.0, 0.0, 0.0));
        assert!(volume.contains(Vec3::new(5.5, 0.0, 0.0)));
        assert!(!volume.contains(Vec3::ZERO));
        assert_eq!(volume.scales(), Vec3::splat(2.0));
    }
}
