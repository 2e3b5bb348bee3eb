//! Axis-aligned bounding boxes.

use super::mat4::Mat4;
use super::vec3::Vec3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub mins: Vec3,
    pub maxs: Vec3,
}

impl Aabb {
    /// `[0,0,0]-[1,1,1]`, the seed for piece extents.
    pub const UNIT: Self = Self::new(Vec3::ZERO, Vec3::ONE);

    pub const fn new(mins: Vec3, maxs: Vec3) -> Self {
        Self { mins, maxs }
    }

    /// Grow to contain `point`.
    pub fn include(&mut self, point: Vec3) {
        self.mins = self.mins.min(point);
        self.maxs = self.maxs.max(point);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.mins.min(other.mins), self.maxs.max(other.maxs))
    }

    pub fn size(&self) -> Vec3 {
        self.maxs - self.mins
    }

    pub fn center(&self) -> Vec3 {
        (self.mins + self.maxs) * 0.5
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.mins, self.maxs);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Box enclosing all eight corners after `m`.
    pub fn transformed(&self, m: &Mat4) -> Aabb {
        let corners = self.corners();
        let first = *m * corners[0];
        corners[1..]
            .iter()
            .fold(Aabb::new(first, first), |mut acc, &corner| {
                acc.include(*m * corner);
                acc
            })
    }
}
