use std::ops::Sub;

/// A point/vector in R3.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn dot(&self, other: Point3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn norm(&self) -> f64 {
        self.dot(*self).sqrt()
    }

    pub fn add(&self, other: Point3) -> Point3 {
        Point3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn scale(&self, k: f64) -> Point3 {
        Point3::new(self.x * k, self.y * k, self.z * k)
    }

    pub fn lerp(&self, other: Point3, t: f64) -> Point3 {
        self.add(other.sub(*self).scale(t))
    }
}

impl Sub for Point3 {
    type Output = Point3;
    fn sub(self, rhs: Point3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// A 3x3 matrix stored row-major, used for rotation/scale composition.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Mat3([[f64; 3]; 3]);

impl Mat3 {
    fn identity() -> Self {
        Mat3([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    fn mul_vec(&self, v: Point3) -> Point3 {
        let m = &self.0;
        Point3::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        )
    }

    fn mul_mat(&self, other: &Mat3) -> Mat3 {
        let a = &self.0;
        let b = &other.0;
        let mut out = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                out[i][j] = (0..3).map(|k| a[i][k] * b[k][j]).sum();
            }
        }
        Mat3(out)
    }

    fn scale(sx: f64, sy: f64, sz: f64) -> Mat3 {
        Mat3([[sx, 0.0, 0.0], [0.0, sy, 0.0], [0.0, 0.0, sz]])
    }

    fn rotate_z(theta: f64) -> Mat3 {
        let (s, c) = theta.sin_cos();
        Mat3([[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Inverse via the adjugate/determinant formula — fine for the small,
    /// well-conditioned rotate/scale/translate compositions built here.
    fn inverse(&self) -> Mat3 {
        let m = &self.0;
        let det = m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);
        let inv_det = 1.0 / det;
        let mut out = [[0.0; 3]; 3];
        out[0][0] = (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det;
        out[0][1] = (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det;
        out[0][2] = (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det;
        out[1][0] = (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det;
        out[1][1] = (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det;
        out[1][2] = (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det;
        out[2][0] = (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det;
        out[2][1] = (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det;
        out[2][2] = (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det;
        Mat3(out)
    }
}

/// An affine transform (rotation/scale + translation) with its inverse
/// cached, as spec.md §3 requires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    linear: Mat3,
    inverse_linear: Mat3,
    translation: Point3,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            linear: Mat3::identity(),
            inverse_linear: Mat3::identity(),
            translation: Point3::zero(),
        }
    }

    pub fn translated(&self, by: Point3) -> Self {
        Self {
            linear: self.linear,
            inverse_linear: self.inverse_linear,
            translation: self.translation.add(self.linear.mul_vec(by)),
        }
    }

    pub fn rotated_z(&self, theta: f64) -> Self {
        let rot = Mat3::rotate_z(theta);
        Self {
            linear: self.linear.mul_mat(&rot),
            inverse_linear: rot.inverse().mul_mat(&self.inverse_linear),
            translation: self.translation,
        }
    }

    pub fn scaled(&self, sx: f64, sy: f64, sz: f64) -> Self {
        let scale = Mat3::scale(sx, sy, sz);
        Self {
            linear: self.linear.mul_mat(&scale),
            inverse_linear: scale.inverse().mul_mat(&self.inverse_linear),
            translation: self.translation,
        }
    }

    /// Maps a point from local into world coordinates.
    pub fn apply(&self, p: Point3) -> Point3 {
        self.linear.mul_vec(p).add(self.translation)
    }

    /// Maps a point from world back into local coordinates.
    pub fn apply_inverse(&self, p: Point3) -> Point3 {
        self.inverse_linear.mul_vec(p.sub(self.translation))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
