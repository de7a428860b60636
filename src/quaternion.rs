//! Hamilton quaternions with the logarithm/exponential maps needed for
//! axis-angle extraction.
//!
//! `glam::Quat` assumes unit length almost everywhere. The turtle needs the
//! general algebra (pure-vector quaternions, non-unit reciprocals, `ln`/`exp`),
//! so this is a small standalone value type that interoperates with
//! `glam::Vec3`.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A quaternion `w + xi + yj + zk`.
///
/// Unit quaternions represent rotations. Any other value (including pure
/// vectors with `w == 0`) is legal input for every operation here.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    /// The multiplicative identity (no rotation).
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 0.0);

    /// The additive identity.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// A pure quaternion (`w == 0`) carrying `v` in its vector part.
    pub const fn from_vector(v: Vec3) -> Self {
        Self::new(0.0, v.x, v.y, v.z)
    }

    pub const fn from_scalar_vector(w: f32, v: Vec3) -> Self {
        Self::new(w, v.x, v.y, v.z)
    }

    /// The vector (imaginary) part.
    pub fn vector(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Rotation of `angle` radians about `axis`.
    ///
    /// `axis` is normalized here. A zero-length axis yields NaN components.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let (sin, cos) = (angle / 2.0).sin_cos();
        Self::from_scalar_vector(cos, axis.normalize() * sin)
    }

    /// Hamilton product `self * that`.
    ///
    /// Non-commutative: `delta.times(orientation)` applies `delta` in world
    /// axes on top of the accumulated `orientation`.
    pub fn times(self, that: Self) -> Self {
        let (a, b) = (self.vector(), that.vector());
        Self::from_scalar_vector(
            self.w * that.w - a.dot(b),
            b * self.w + a * that.w + a.cross(b),
        )
    }

    pub fn scale(self, s: f32) -> Self {
        Self::new(self.w * s, self.x * s, self.y * s, self.z * s)
    }

    pub fn plus(self, that: Self) -> Self {
        Self::new(self.w + that.w, self.x + that.x, self.y + that.y, self.z + that.z)
    }

    pub fn minus(self, that: Self) -> Self {
        self.plus(that.negate())
    }

    /// Adds `s` to the scalar part only.
    pub fn plus_scalar(self, s: f32) -> Self {
        Self::new(self.w + s, self.x, self.y, self.z)
    }

    /// Right division: `self * that⁻¹`.
    pub fn over(self, that: Self) -> Self {
        self.times(that.reciprocal())
    }

    pub fn negate(self) -> Self {
        Self::new(-self.w, -self.x, -self.y, -self.z)
    }

    pub fn dot(self, that: Self) -> f32 {
        self.w * that.w + self.x * that.x + self.y * that.y + self.z * that.z
    }

    pub fn magnitude_squared(self) -> f32 {
        self.dot(self)
    }

    pub fn magnitude(self) -> f32 {
        self.magnitude_squared().sqrt()
    }

    pub fn normalized(self) -> Self {
        self.scale(1.0 / self.magnitude())
    }

    pub fn conjugate(self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Multiplicative inverse, valid for non-unit quaternions too.
    pub fn reciprocal(self) -> Self {
        self.conjugate().scale(1.0 / self.magnitude_squared())
    }

    /// Natural logarithm.
    ///
    /// A zero vector part normalizes to zero, so `ln(IDENTITY)` is `ZERO`.
    /// The result is undefined (non-finite) for the zero quaternion.
    pub fn ln(self) -> Self {
        let magnitude = self.magnitude();
        let axis = self.vector().normalize_or_zero();
        let angle = (self.w / magnitude).clamp(-1.0, 1.0).acos();
        Self::from_scalar_vector(magnitude.ln(), axis * angle)
    }

    /// Exponential map, the inverse of [`ln`](Self::ln).
    pub fn exp(self) -> Self {
        let v = self.vector();
        let theta = v.length();
        let (sin, cos) = theta.sin_cos();
        Self::from_scalar_vector(cos, v.normalize_or_zero() * sin).scale(self.w.exp())
    }

    /// Angle and axis packed as `(w = angle, xyz = axis)`.
    ///
    /// Computed from `2 ln(q)`. The identity rotation has no axis and
    /// returns the sentinel `(0, 1, 0, 0)`.
    pub fn to_axis_angle(self) -> Self {
        let logarithm = self.ln();
        let magnitude = logarithm.magnitude();
        if magnitude == 0.0 {
            Self::new(0.0, 1.0, 0.0, 0.0)
        } else {
            logarithm.scale(1.0 / magnitude).plus_scalar(2.0 * magnitude)
        }
    }

    /// Rotates `v` by the sandwich product `q v q⁻¹`.
    pub fn transform(self, v: Vec3) -> Vec3 {
        self.times(Self::from_vector(v))
            .times(self.reciprocal())
            .vector()
    }
}

impl Mul for Quaternion {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.times(rhs)
    }
}

impl Mul<f32> for Quaternion {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        self.scale(rhs)
    }
}

impl Div<f32> for Quaternion {
    type Output = Self;

    fn div(self, rhs: f32) -> Self {
        self.scale(1.0 / rhs)
    }
}

impl Add for Quaternion {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.plus(rhs)
    }
}

impl Sub for Quaternion {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.minus(rhs)
    }
}

impl Neg for Quaternion {
    type Output = Self;

    fn neg(self) -> Self {
        self.negate()
    }
}

impl From<Quat> for Quaternion {
    fn from(q: Quat) -> Self {
        Self::new(q.w, q.x, q.y, q.z)
    }
}

impl From<Quaternion> for Quat {
    fn from(q: Quaternion) -> Self {
        Quat::from_xyzw(q.x, q.y, q.z, q.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    const EPS: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPS
    }

    fn quat_approx_eq(a: Quaternion, b: Quaternion) -> bool {
        approx_eq(a.w, b.w) && approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    #[test]
    fn test_basis_products() {
        let i = Quaternion::new(0.0, 1.0, 0.0, 0.0);
        let j = Quaternion::new(0.0, 0.0, 1.0, 0.0);
        let k = Quaternion::new(0.0, 0.0, 0.0, 1.0);

        assert_eq!(i * j, k);
        assert_eq!(j * i, -k);
        assert_eq!(j * k, i);
        assert_eq!(i * i, Quaternion::new(-1.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_from_axis_angle_normalizes_axis() {
        let q = Quaternion::from_axis_angle(Vec3::new(0.0, 0.0, 5.0), PI);
        assert!(quat_approx_eq(q, Quaternion::new(0.0, 0.0, 0.0, 1.0)));
        assert!(approx_eq(q.magnitude(), 1.0));
    }

    #[test]
    fn test_reciprocal_of_non_unit() {
        let q = Quaternion::new(2.0, -1.0, 0.5, 3.0);
        assert!(quat_approx_eq(q * q.reciprocal(), Quaternion::IDENTITY));
        assert!(quat_approx_eq(q.over(q), Quaternion::IDENTITY));
    }

    #[test]
    fn test_transform_quarter_turn() {
        let q = Quaternion::from_axis_angle(Vec3::Z, FRAC_PI_2);
        let v = q.transform(Vec3::X);
        assert!(v.abs_diff_eq(Vec3::Y, EPS));
    }

    #[test]
    fn test_transform_round_trip() {
        let axis = Vec3::new(1.0, -2.0, 0.5);
        let v = Vec3::new(3.0, 4.0, -7.0);
        for angle in [0.1, 1.0, 2.5, -3.0] {
            let forward = Quaternion::from_axis_angle(axis, angle);
            let back = Quaternion::from_axis_angle(axis, -angle);
            assert!(back.transform(forward.transform(v)).abs_diff_eq(v, 1e-4));
        }
    }

    #[test]
    fn test_transform_scaled_quaternion_still_rotates() {
        let q = Quaternion::from_axis_angle(Vec3::Y, 0.7);
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert!(q.scale(3.0).transform(v).abs_diff_eq(q.transform(v), 1e-4));
    }

    #[test]
    fn test_identity_axis_angle_is_sentinel() {
        assert_eq!(
            Quaternion::default().to_axis_angle(),
            Quaternion::new(0.0, 1.0, 0.0, 0.0)
        );
    }

    #[test]
    fn test_axis_angle_recovers_rotation() {
        let q = Quaternion::from_axis_angle(Vec3::new(0.0, 3.0, 4.0), 1.2);
        let aa = q.to_axis_angle();
        assert!(approx_eq(aa.w, 1.2));
        assert!(aa.vector().abs_diff_eq(Vec3::new(0.0, 0.6, 0.8), EPS));
    }

    #[test]
    fn test_ln_exp_inverse() {
        let q = Quaternion::new(0.5, 1.0, -0.25, 2.0);
        assert!(quat_approx_eq(q.ln().exp(), q));
        assert_eq!(Quaternion::IDENTITY.ln(), Quaternion::ZERO);
    }

    #[test]
    fn test_glam_conversion_agrees() {
        let ours = Quaternion::from_axis_angle(Vec3::new(1.0, 1.0, 0.0), 0.9);
        let theirs: Quat = ours.into();
        let v = Vec3::new(0.3, -2.0, 1.5);
        assert!((theirs * v).abs_diff_eq(ours.transform(v), 1e-4));
        assert_eq!(Quaternion::from(theirs), ours);
    }
}
