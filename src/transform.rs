//! Placement of a piece relative to its parent.
//!
//! Provides a [`Transform`] struct with a fluent API for managing position,
//! rotation (per-axis radian angles) and scale. Canonical pieces keep one as
//! their default placement; every instance piece owns a mutable copy.

use crate::math::{mat4::Mat4, vec3::Vec3};

/// A 3D transform with position, rotation (radians about X, Y, Z) and scale.
///
/// Provides a fluent API where mutating methods return `&mut Self` for chaining:
///
/// ```ignore
/// transform
///     .set_position(Vec3::new(5.0, 2.0, 0.0))
///     .rotate_y(0.1)
///     .set_scale_uniform(2.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    position: Vec3,
    rotation: Vec3, // x = bank, y = heading, z = attitude; see math::quat
    scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform with default values (position=0, rotation=0, scale=1).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform from its three parts.
    pub fn from_parts(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    // ============ Position ============

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) -> &mut Self {
        self.position = position;
        self
    }

    /// Translate by a delta vector.
    pub fn translate(&mut self, delta: Vec3) -> &mut Self {
        self.position += delta;
        self
    }

    // ============ Rotation ============

    /// Get the rotation (radians about X, Y and Z).
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Vec3) -> &mut Self {
        self.rotation = rotation;
        self
    }

    /// Add a delta rotation (radians).
    pub fn rotate(&mut self, delta: Vec3) -> &mut Self {
        self.rotation += delta;
        self
    }

    pub fn rotate_x(&mut self, angle: f32) -> &mut Self {
        self.rotation.x += angle;
        self
    }

    pub fn rotate_y(&mut self, angle: f32) -> &mut Self {
        self.rotation.y += angle;
        self
    }

    pub fn rotate_z(&mut self, angle: f32) -> &mut Self {
        self.rotation.z += angle;
        self
    }

    // ============ Scale ============

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vec3) -> &mut Self {
        self.scale = scale;
        self
    }

    /// Set uniform scale (same value for x, y, z).
    pub fn set_scale_uniform(&mut self, s: f32) -> &mut Self {
        self.scale = Vec3::splat(s);
        self
    }

    /// Multiply the current scale by a factor vector.
    pub fn scale_by(&mut self, factor: Vec3) -> &mut Self {
        self.scale = self.scale.mul_elem(factor);
        self
    }

    // ============ Matrix Generation ============

    /// Generate the matrix relative to the parent.
    ///
    /// Order: Translation * RotationY * RotationZ * RotationX * Scale
    /// (scale applied first, then bank, attitude, heading, then translation)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::translation(self.position)
            * Mat4::rotation_y(self.rotation.y)
            * Mat4::rotation_z(self.rotation.z)
            * Mat4::rotation_x(self.rotation.x)
            * Mat4::scaling(self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::quat::Quat;
    use approx::assert_relative_eq;

    #[test]
    fn test_default() {
        let t = Transform::default();
        assert_eq!(t.position(), Vec3::ZERO);
        assert_eq!(t.rotation(), Vec3::ZERO);
        assert_eq!(t.scale(), Vec3::ONE);
    }

    #[test]
    fn test_fluent_api() {
        let mut t = Transform::new();
        t.set_position(Vec3::new(1.0, 2.0, 3.0))
            .rotate_y(0.5)
            .set_scale_uniform(2.0);

        assert_eq!(t.position(), Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(t.rotation().y, 0.5);
        assert_eq!(t.scale(), Vec3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn test_scale_by() {
        let mut t = Transform::new();
        t.set_scale(Vec3::new(2.0, 3.0, 4.0)).scale_by(Vec3::splat(2.0));
        assert_eq!(t.scale(), Vec3::new(4.0, 6.0, 8.0));
    }

    #[test]
    fn test_to_matrix_identity() {
        assert_eq!(Transform::default().to_matrix(), Mat4::identity());
    }

    #[test]
    fn decomposed_rotation_rebuilds_quat_matrix() {
        let q = Quat::from_axis_angle(Vec3::new(1.0, 2.0, 0.5).normalize(), 1.1);
        let t = Transform::from_parts(Vec3::ZERO, q.to_radian_angles(), Vec3::ONE);

        let a = t.to_matrix();
        let b = Mat4::from_quat(q);
        for row in 0..3 {
            for col in 0..3 {
                assert_relative_eq!(a.get(row, col), b.get(row, col), epsilon = 1e-5);
            }
        }
    }
}
