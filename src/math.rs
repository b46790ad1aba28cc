//! Small math layer shared by generators, deformers and processing kernels.
//!
//! The heavy lifting is [`glam`]; this module re-exports the vector and
//! matrix types the attribute system is built on and adds the few helpers
//! the operators need on top: an axis-aligned bounding box, the ZYX Euler
//! rotation used by the Transform operator, and plane reflection used by
//! Mirror.

pub use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

/// Cardinal axis selector used by Bend, Twist, Color ramps and Sort keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Map a combo-parameter index (0=X, 1=Y, 2=Z) to an axis, clamping
    /// out-of-range values to Z.
    pub fn from_index(index: i32) -> Self {
        match index {
            0 => Axis::X,
            1 => Axis::Y,
            _ => Axis::Z,
        }
    }

    /// Unit vector along this axis.
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }

    /// Component of `v` along this axis.
    pub fn component(self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }
}

/// Axis-aligned bounding box over a point set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Empty box: min at +inf, max at -inf, so any `grow` produces a valid
    /// box and `is_empty` holds until then.
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.grow(*p);
        }
        aabb
    }

    pub fn grow(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extent(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    /// Containment test with a symmetric epsilon margin.
    pub fn contains(&self, p: Vec3, epsilon: f32) -> bool {
        p.x >= self.min.x - epsilon
            && p.y >= self.min.y - epsilon
            && p.z >= self.min.z - epsilon
            && p.x <= self.max.x + epsilon
            && p.y <= self.max.y + epsilon
            && p.z <= self.max.z + epsilon
    }
}

/// Rotation matrix from Euler angles in degrees, applied in ZYX order
/// (matches the Transform operator contract: scale, then rotate ZYX, then
/// translate).
pub fn rotation_zyx_degrees(angles: Vec3) -> Mat3 {
    let r = angles * std::f32::consts::PI / 180.0;
    Mat3::from_rotation_z(r.z) * Mat3::from_rotation_y(r.y) * Mat3::from_rotation_x(r.x)
}

/// Compose the standard SRT transform (scale, rotate ZYX degrees, translate).
pub fn srt_matrix(translate: Vec3, rotate_degrees: Vec3, scale: Vec3) -> Mat4 {
    Mat4::from_translation(translate)
        * Mat4::from_mat3(rotation_zyx_degrees(rotate_degrees))
        * Mat4::from_scale(scale)
}

/// Reflect `p` across the plane through `origin` with unit normal `normal`.
pub fn reflect_across_plane(p: Vec3, origin: Vec3, normal: Vec3) -> Vec3 {
    let d = (p - origin).dot(normal);
    p - normal * (2.0 * d)
}

/// Rotate `p` around `axis` (through `origin`) by `angle_radians`.
pub fn rotate_around_axis(p: Vec3, origin: Vec3, axis: Vec3, angle_radians: f32) -> Vec3 {
    let rot = Mat3::from_axis_angle(axis.normalize(), angle_radians);
    origin + rot * (p - origin)
}
