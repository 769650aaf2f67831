//! Affine transformation matrices.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A 2D affine matrix `[a b c d e f]`.
///
/// Points are transformed as `x' = a·x + b·y + e`, `y' = c·x + d·y + f`,
/// matching the coordinates produced by the glyph stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    /// The identity matrix.
    pub const IDENTITY: Matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    /// Create a matrix from its six coefficients.
    pub const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Uniform scale factor, `sqrt(|ad - bc|)`.
    pub fn expansion(&self) -> f32 {
        (self.a * self.d - self.b * self.c).abs().sqrt()
    }

    /// Transform a point including translation.
    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.b * y + self.e,
            self.c * x + self.d * y + self.f,
        )
    }

    /// Transform a direction vector as a row vector: `(a·x + c·y, b·x + d·y)`.
    pub fn transform_vector(&self, x: f32, y: f32) -> (f32, f32) {
        (self.a * x + self.c * y, self.b * x + self.d * y)
    }

    /// Flow angle in radians, `atan2(-c, a)`.
    pub fn angle(&self) -> f32 {
        (-self.c).atan2(self.a)
    }

    /// Rotation angle in radians as seen by the text box emitter.
    pub fn rotation(&self) -> f32 {
        self.b.atan2(self.a)
    }

    /// Lexicographic sign comparison of `a, b, c, d`, ignoring translation.
    pub fn cmp4(&self, other: &Matrix) -> Ordering {
        let pairs = [
            (self.a, other.a),
            (self.b, other.b),
            (self.c, other.c),
            (self.d, other.d),
        ];
        for (lhs, rhs) in pairs {
            let diff = lhs - rhs;
            if diff > 0.0 {
                return Ordering::Greater;
            }
            if diff < 0.0 {
                return Ordering::Less;
            }
        }
        Ordering::Equal
    }

    /// True if the linear parts are identical.
    pub fn same_linear(&self, other: &Matrix) -> bool {
        self.cmp4(other) == Ordering::Equal
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{} {} {} {} {} {}}}",
            self.a, self.b, self.c, self.d, self.e, self.f
        )
    }
}

impl FromStr for Matrix {
    type Err = Error;

    /// Parse six whitespace-separated floats.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut values = [0f32; 6];
        let mut parts = s.split_whitespace();
        for value in values.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| Error::malformed(format!("matrix needs 6 values: '{}'", s)))?;
            *value = part
                .parse()
                .map_err(|_| Error::malformed(format!("bad matrix value '{}' in '{}'", part, s)))?;
        }
        if parts.next().is_some() {
            return Err(Error::malformed(format!("matrix has extra values: '{}'", s)));
        }
        let [a, b, c, d, e, f] = values;
        Ok(Matrix::new(a, b, c, d, e, f))
    }
}
