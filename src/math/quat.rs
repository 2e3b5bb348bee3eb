//! Rotation quaternions and their conversion to per-axis radian angles.
//!
//! # Angle convention
//! Angles are stored in a [`Vec3`] indexed by the axis they rotate about:
//! `x` is bank (about X), `y` is heading (about Y) and `z` is attitude
//! (about Z). They are applied heading first, then attitude, then bank:
//! `q = q_y(heading) * q_z(attitude) * q_x(bank)`. [`Mat4::from_quat`] and
//! [`Transform::to_matrix`] use the same order.
//!
//! [`Mat4::from_quat`]: super::mat4::Mat4::from_quat
//! [`Transform::to_matrix`]: crate::transform::Transform::to_matrix

use std::f32::consts::FRAC_PI_2;
use std::ops::Mul;

use super::vec3::Vec3;

/// Attitude is pinned to the pole once `|xy + zw|` exceeds this share of the squared norm.
pub const SINGULARITY_THRESHOLD: f32 = 0.499;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians about a unit `axis`.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let (s, c) = (angle * 0.5).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    /// Compose per-axis radian angles back into a rotation.
    pub fn from_radian_angles(angles: Vec3) -> Self {
        let (s1, c1) = (angles.y * 0.5).sin_cos();
        let (s2, c2) = (angles.z * 0.5).sin_cos();
        let (s3, c3) = (angles.x * 0.5).sin_cos();

        Self::new(
            s1 * s2 * c3 + c1 * c2 * s3,
            s1 * c2 * c3 + c1 * s2 * s3,
            c1 * s2 * c3 - s1 * c2 * s3,
            c1 * c2 * c3 - s1 * s2 * s3,
        )
    }

    /// Decompose into per-axis radian angles.
    ///
    /// Near the poles (attitude of ±90°) the general formula blows up, so the
    /// attitude is fixed at exactly `±π/2`, the remaining rotation is folded
    /// into the heading and bank is zero. Unnormalized input is tolerated.
    pub fn to_radian_angles(self) -> Vec3 {
        let sqx = self.x * self.x;
        let sqy = self.y * self.y;
        let sqz = self.z * self.z;
        let sqw = self.w * self.w;
        let unit = sqx + sqy + sqz + sqw;
        let test = self.x * self.y + self.z * self.w;

        if test > SINGULARITY_THRESHOLD * unit {
            return Vec3::new(0.0, 2.0 * self.x.atan2(self.w), FRAC_PI_2);
        }
        if test < -SINGULARITY_THRESHOLD * unit {
            return Vec3::new(0.0, -2.0 * self.x.atan2(self.w), -FRAC_PI_2);
        }

        let heading = (2.0 * self.y * self.w - 2.0 * self.x * self.z).atan2(sqx - sqy - sqz + sqw);
        let attitude = (2.0 * test / unit).clamp(-1.0, 1.0).asin();
        let bank = (2.0 * self.x * self.w - 2.0 * self.y * self.z).atan2(-sqx + sqy - sqz + sqw);
        Vec3::new(bank, heading, attitude)
    }

    pub fn norm_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    pub fn normalize(&self) -> Self {
        let norm = self.norm_squared().sqrt();
        if norm > 0.0 {
            Self::new(self.x / norm, self.y / norm, self.z / norm, self.w / norm)
        } else {
            Self::IDENTITY
        }
    }

    /// True when the decomposition of this rotation takes the pole branch.
    pub fn is_near_pole(&self) -> bool {
        (self.x * self.y + self.z * self.w).abs() > SINGULARITY_THRESHOLD * self.norm_squared()
    }
}

impl From<[f32; 4]> for Quat {
    /// Builds from `[x, y, z, w]`, the order glTF stores rotations in.
    fn from(q: [f32; 4]) -> Self {
        Self::new(q[0], q[1], q[2], q[3])
    }
}

/// Hamilton product: `a * b` applies `b` first, then `a`.
impl Mul<Quat> for Quat {
    type Output = Quat;

    fn mul(self, rhs: Quat) -> Self::Output {
        Quat::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }
}
