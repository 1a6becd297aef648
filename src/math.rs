//! Types, aliases and helper operations for doing math with `ultraviolet`.
use std::f64::consts::PI;
pub use ultraviolet as uv;

pub mod dense;
pub use dense::{MatMN, VecN};

pub type Vec2 = uv::DVec2;

/// An angle in either degrees or radians.
/// Default conversion from f64 is in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub enum Angle {
    Rad(f64),
    Deg(f64),
}
impl Angle {
    /// Get the angle as degrees.
    #[inline]
    pub fn deg(&self) -> f64 {
        match self {
            Angle::Rad(rad) => rad * 180.0 / PI,
            Angle::Deg(deg) => *deg,
        }
    }

    /// Get the angle as radians.
    #[inline]
    pub fn rad(&self) -> f64 {
        match self {
            Angle::Rad(rad) => *rad,
            Angle::Deg(deg) => deg * PI / 180.0,
        }
    }
}
impl Default for Angle {
    fn default() -> Self {
        Angle::Rad(0.0)
    }
}
impl From<f64> for Angle {
    #[inline]
    fn from(deg: f64) -> Self {
        Angle::Deg(deg)
    }
}

// Vec2 utils

#[inline]
pub fn left_normal(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}
#[inline]
pub fn right_normal(v: Vec2) -> Vec2 {
    Vec2::new(v.y, -v.x)
}

/// The scalar 2D cross product, i.e. the z component of the 3D cross product
/// of the two vectors extended with z = 0.
#[inline]
pub fn cross(a: Vec2, b: Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Normalize a vector, returning it unchanged if it has zero length.
///
/// Unlike `Vec2::normalized` this never produces NaNs.
#[inline]
pub fn normalize(v: Vec2) -> Vec2 {
    let len = v.mag();
    if len != 0.0 {
        v / len
    } else {
        v
    }
}

/// Unit normal of a polygon edge pointing outwards,
/// given vertices wound counterclockwise in a y-up frame.
#[inline]
pub fn edge_normal(edge: Vec2) -> Vec2 {
    normalize(right_normal(edge))
}

/// Rotate a vector by the given angle in radians.
#[inline]
pub fn rotate(v: Vec2, angle: f64) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

#[inline]
pub fn clamp(val: f64, min: f64, max: f64) -> f64 {
    if val < min {
        min
    } else if val > max {
        max
    } else {
        val
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn approx_eq(a: Vec2, b: Vec2) -> bool {
        (a - b).mag() < 1e-9
    }

    #[test]
    fn normalize_zero_is_zero() {
        let n = normalize(Vec2::zero());
        assert_eq!(n.x, 0.0);
        assert_eq!(n.y, 0.0);
        assert!(approx_eq(normalize(Vec2::new(3.0, 4.0)), Vec2::new(0.6, 0.8)));
    }

    #[test]
    fn rotate_quarter_turn() {
        assert!(approx_eq(
            rotate(Vec2::new(1.0, 0.0), FRAC_PI_2),
            Vec2::new(0.0, 1.0)
        ));
        assert!(approx_eq(
            rotate(Vec2::new(2.0, 3.0), Angle::Deg(180.0).rad()),
            Vec2::new(-2.0, -3.0)
        ));
    }

    #[test]
    fn cross_and_normals() {
        let x = Vec2::unit_x();
        let y = Vec2::unit_y();
        assert_eq!(cross(x, y), 1.0);
        assert_eq!(cross(y, x), -1.0);
        assert!(approx_eq(edge_normal(Vec2::new(4.0, 0.0)), Vec2::new(0.0, -1.0)));
        assert!(approx_eq(left_normal(x), y));
    }

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp(5.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-5.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.5, 0.0, 1.0), 0.5);
    }
}
