use std::ops::{Mul, MulAssign};

use super::{EPSILON, Vec3, approx_eq};

/// Row-major 4x4 affine matrix with the translation in the fourth row.
///
/// Points transform as row vectors: `p' = p * M`, so the concatenation
/// `a * b` applies `a` first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub x_axis: [f32; 4],
    pub y_axis: [f32; 4],
    pub z_axis: [f32; 4],
    pub translation: [f32; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat4 {
    pub const fn identity() -> Self {
        Self {
            x_axis: [1., 0., 0., 0.],
            y_axis: [0., 1., 0., 0.],
            z_axis: [0., 0., 1., 0.],
            translation: [0., 0., 0., 1.],
        }
    }

    /// Rotation around the X axis, `angle` in degrees.
    pub fn rotate_x(angle: f32) -> Self {
        let (sin, cos) = angle.to_radians().sin_cos();
        let mut m = Self::identity();
        m.y_axis[1] = cos;
        m.y_axis[2] = -sin;
        m.z_axis[1] = sin;
        m.z_axis[2] = cos;
        m
    }

    /// Rotation around the Y axis, `angle` in degrees.
    pub fn rotate_y(angle: f32) -> Self {
        let (sin, cos) = angle.to_radians().sin_cos();
        let mut m = Self::identity();
        m.x_axis[0] = cos;
        m.x_axis[2] = -sin;
        m.z_axis[0] = sin;
        m.z_axis[2] = cos;
        m
    }

    /// Rotation around the Z axis, `angle` in degrees.
    pub fn rotate_z(angle: f32) -> Self {
        let (sin, cos) = angle.to_radians().sin_cos();
        let mut m = Self::identity();
        m.x_axis[0] = cos;
        m.x_axis[1] = sin;
        m.y_axis[0] = -sin;
        m.y_axis[1] = cos;
        m
    }

    pub fn scale(amount: f32) -> Self {
        Self::scale_xyz(amount, amount, amount)
    }

    pub fn scale_xyz(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::identity();
        m.x_axis[0] = x;
        m.y_axis[1] = y;
        m.z_axis[2] = z;
        m
    }

    pub fn translate(v: Vec3) -> Self {
        let mut m = Self::identity();
        m.translation[0] = v.x;
        m.translation[1] = v.y;
        m.translation[2] = v.z;
        m
    }

    fn to_array(self) -> [f32; 16] {
        let mut m = [0.; 16];
        m[0..4].copy_from_slice(&self.x_axis);
        m[4..8].copy_from_slice(&self.y_axis);
        m[8..12].copy_from_slice(&self.z_axis);
        m[12..16].copy_from_slice(&self.translation);
        m
    }

    fn from_array(m: [f32; 16]) -> Self {
        Self {
            x_axis: [m[0], m[1], m[2], m[3]],
            y_axis: [m[4], m[5], m[6], m[7]],
            z_axis: [m[8], m[9], m[10], m[11]],
            translation: [m[12], m[13], m[14], m[15]],
        }
    }

    pub fn transpose(&self) -> Self {
        let m = self.to_array();
        Self {
            x_axis: [m[0], m[4], m[8], m[12]],
            y_axis: [m[1], m[5], m[9], m[13]],
            z_axis: [m[2], m[6], m[10], m[14]],
            translation: [m[3], m[7], m[11], m[15]],
        }
    }

    pub fn determinant(&self) -> f32 {
        let m = self.to_array();
        // 3x3 minor over the given rows and columns.
        let minor = |r: [usize; 3], c: [usize; 3]| {
            m[r[0] * 4 + c[0]] * (m[r[1] * 4 + c[1]] * m[r[2] * 4 + c[2]]
                - m[r[1] * 4 + c[2]] * m[r[2] * 4 + c[1]])
                - m[r[0] * 4 + c[1]]
                    * (m[r[1] * 4 + c[0]] * m[r[2] * 4 + c[2]]
                        - m[r[1] * 4 + c[2]] * m[r[2] * 4 + c[0]])
                + m[r[0] * 4 + c[2]]
                    * (m[r[1] * 4 + c[0]] * m[r[2] * 4 + c[1]]
                        - m[r[1] * 4 + c[1]] * m[r[2] * 4 + c[0]])
        };
        m[0] * minor([1, 2, 3], [1, 2, 3]) - m[1] * minor([1, 2, 3], [0, 2, 3])
            + m[2] * minor([1, 2, 3], [0, 1, 3])
            - m[3] * minor([1, 2, 3], [0, 1, 2])
    }

    /// True when the three axis rows are unit length and mutually
    /// perpendicular. The translation row is not considered.
    pub fn is_orthonormal(&self) -> bool {
        let x = Vec3::new(self.x_axis[0], self.x_axis[1], self.x_axis[2]);
        let y = Vec3::new(self.y_axis[0], self.y_axis[1], self.y_axis[2]);
        let z = Vec3::new(self.z_axis[0], self.z_axis[1], self.z_axis[2]);

        approx_eq(x.dot(y), 0.)
            && approx_eq(y.dot(z), 0.)
            && approx_eq(x.dot(z), 0.)
            && approx_eq(x.magnitude(), 1.)
            && approx_eq(y.magnitude(), 1.)
            && approx_eq(z.magnitude(), 1.)
    }

    fn has_translation(&self) -> bool {
        !approx_eq(self.translation[0], 0.)
            || !approx_eq(self.translation[1], 0.)
            || !approx_eq(self.translation[2], 0.)
    }

    /// Inverse by cofactor expansion. A pure rotation inverts as its
    /// transpose, which keeps repeated camera inversions exact.
    pub fn inverse(&self) -> Self {
        if self.is_orthonormal() && !self.has_translation() {
            return self.transpose();
        }

        let m = self.to_array();
        let mut inv = [0.; 16];

        inv[0] = m[5] * m[10] * m[15] - m[5] * m[11] * m[14] - m[9] * m[6] * m[15]
            + m[9] * m[7] * m[14]
            + m[13] * m[6] * m[11]
            - m[13] * m[7] * m[10];
        inv[4] = -m[4] * m[10] * m[15] + m[4] * m[11] * m[14] + m[8] * m[6] * m[15]
            - m[8] * m[7] * m[14]
            - m[12] * m[6] * m[11]
            + m[12] * m[7] * m[10];
        inv[8] = m[4] * m[9] * m[15] - m[4] * m[11] * m[13] - m[8] * m[5] * m[15]
            + m[8] * m[7] * m[13]
            + m[12] * m[5] * m[11]
            - m[12] * m[7] * m[9];
        inv[12] = -m[4] * m[9] * m[14] + m[4] * m[10] * m[13] + m[8] * m[5] * m[14]
            - m[8] * m[6] * m[13]
            - m[12] * m[5] * m[10]
            + m[12] * m[6] * m[9];
        inv[1] = -m[1] * m[10] * m[15] + m[1] * m[11] * m[14] + m[9] * m[2] * m[15]
            - m[9] * m[3] * m[14]
            - m[13] * m[2] * m[11]
            + m[13] * m[3] * m[10];
        inv[5] = m[0] * m[10] * m[15] - m[0] * m[11] * m[14] - m[8] * m[2] * m[15]
            + m[8] * m[3] * m[14]
            + m[12] * m[2] * m[11]
            - m[12] * m[3] * m[10];
        inv[9] = -m[0] * m[9] * m[15] + m[0] * m[11] * m[13] + m[8] * m[1] * m[15]
            - m[8] * m[3] * m[13]
            - m[12] * m[1] * m[11]
            + m[12] * m[3] * m[9];
        inv[13] = m[0] * m[9] * m[14] - m[0] * m[10] * m[13] - m[8] * m[1] * m[14]
            + m[8] * m[2] * m[13]
            + m[12] * m[1] * m[10]
            - m[12] * m[2] * m[9];
        inv[2] = m[1] * m[6] * m[15] - m[1] * m[7] * m[14] - m[5] * m[2] * m[15]
            + m[5] * m[3] * m[14]
            + m[13] * m[2] * m[7]
            - m[13] * m[3] * m[6];
        inv[6] = -m[0] * m[6] * m[15] + m[0] * m[7] * m[14] + m[4] * m[2] * m[15]
            - m[4] * m[3] * m[14]
            - m[12] * m[2] * m[7]
            + m[12] * m[3] * m[6];
        inv[10] = m[0] * m[5] * m[15] - m[0] * m[7] * m[13] - m[4] * m[1] * m[15]
            + m[4] * m[3] * m[13]
            + m[12] * m[1] * m[7]
            - m[12] * m[3] * m[5];
        inv[14] = -m[0] * m[5] * m[14] + m[0] * m[6] * m[13] + m[4] * m[1] * m[14]
            - m[4] * m[2] * m[13]
            - m[12] * m[1] * m[6]
            + m[12] * m[2] * m[5];
        inv[3] = -m[1] * m[6] * m[11] + m[1] * m[7] * m[10] + m[5] * m[2] * m[11]
            - m[5] * m[3] * m[10]
            - m[9] * m[2] * m[7]
            + m[9] * m[3] * m[6];
        inv[7] = m[0] * m[6] * m[11] - m[0] * m[7] * m[10] - m[4] * m[2] * m[11]
            + m[4] * m[3] * m[10]
            + m[8] * m[2] * m[7]
            - m[8] * m[3] * m[6];
        inv[11] = -m[0] * m[5] * m[11] + m[0] * m[7] * m[9] + m[4] * m[1] * m[11]
            - m[4] * m[3] * m[9]
            - m[8] * m[1] * m[7]
            + m[8] * m[3] * m[5];
        inv[15] = m[0] * m[5] * m[10] - m[0] * m[6] * m[9] - m[4] * m[1] * m[10]
            + m[4] * m[2] * m[9]
            + m[8] * m[1] * m[6]
            - m[8] * m[2] * m[5];

        let det = m[0] * inv[0] + m[1] * inv[4] + m[2] * inv[8] + m[3] * inv[12];
        if det.abs() < EPSILON {
            debug_assert!(false, "inverting a singular matrix");
            log::error!("matrix inverse requested for a singular matrix");
            return Self::identity();
        }

        let det_inv = 1. / det;
        for value in inv.iter_mut() {
            *value *= det_inv;
        }
        Self::from_array(inv)
    }

    /// Transform a point, applying the translation row.
    pub fn transform_point(&self, v: Vec3) -> Vec3 {
        Vec3 {
            x: v.x * self.x_axis[0]
                + v.y * self.y_axis[0]
                + v.z * self.z_axis[0]
                + self.translation[0],
            y: v.x * self.x_axis[1]
                + v.y * self.y_axis[1]
                + v.z * self.z_axis[1]
                + self.translation[1],
            z: v.x * self.x_axis[2]
                + v.y * self.y_axis[2]
                + v.z * self.z_axis[2]
                + self.translation[2],
        }
    }

    /// Transform a direction, ignoring the translation row. For normals.
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        Vec3 {
            x: v.x * self.x_axis[0] + v.y * self.y_axis[0] + v.z * self.z_axis[0],
            y: v.x * self.x_axis[1] + v.y * self.y_axis[1] + v.z * self.z_axis[1],
            z: v.x * self.x_axis[2] + v.y * self.y_axis[2] + v.z * self.z_axis[2],
        }
    }

    pub fn approx_eq(&self, other: &Self) -> bool {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .all(|(a, b)| approx_eq(*a, *b))
    }
}

impl Mul for Mat4 {
    type Output = Self;

    fn mul(self, other: Self) -> Self::Output {
        let a = self.to_array();
        let b = other.to_array();
        let mut out = [0.; 16];
        for row in 0..4 {
            for col in 0..4 {
                out[row * 4 + col] = a[row * 4] * b[col]
                    + a[row * 4 + 1] * b[4 + col]
                    + a[row * 4 + 2] * b[8 + col]
                    + a[row * 4 + 3] * b[12 + col];
            }
        }
        Self::from_array(out)
    }
}

impl MulAssign for Mat4 {
    fn mul_assign(&mut self, other: Self) {
        *self = *self * other;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maths::approx_eq;

    #[test]
    fn identity_transforms_nothing() {
        let p = Vec3::new(1., 2., 3.);
        assert_eq!(Mat4::identity().transform_point(p), p);
    }

    #[test]
    fn translate_moves_points_not_vectors() {
        let m = Mat4::translate(Vec3::new(1., 2., 3.));
        assert_eq!(
            m.transform_point(Vec3::new(1., 1., 1.)),
            Vec3::new(2., 3., 4.)
        );
        assert_eq!(
            m.transform_vector(Vec3::new(1., 1., 1.)),
            Vec3::new(1., 1., 1.)
        );
    }

    #[test]
    fn rotation_inverse_is_transpose() {
        let m = Mat4::rotate_y(37.);
        assert!(m.is_orthonormal());
        assert!(m.inverse().approx_eq(&m.transpose()));
    }

    #[test]
    fn composed_inverse_round_trips_to_identity() {
        let m = Mat4::rotate_x(30.)
            * Mat4::rotate_z(-75.)
            * Mat4::scale_xyz(2., 3., 0.5)
            * Mat4::translate(Vec3::new(4., -1., 9.));
        assert!(m.determinant().abs() > EPSILON);
        assert!((m * m.inverse()).approx_eq(&Mat4::identity()));
        assert!((m.inverse() * m).approx_eq(&Mat4::identity()));
    }

    #[test]
    fn rotate_z_by_90_degrees() {
        let m = Mat4::rotate_z(90.);
        let p = m.transform_point(Vec3::new(1., 0., 0.));
        assert!(approx_eq(p.x, 0.));
        assert!(approx_eq(p.y, 1.));
    }

    #[test]
    fn determinant_of_scale() {
        let m = Mat4::scale_xyz(2., 3., 4.);
        assert!(approx_eq(m.determinant(), 24.));
    }
}
