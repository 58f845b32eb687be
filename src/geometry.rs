use crate::{ParallaxError, Result};
use std::ops::{Add, Mul, Sub};

/// World-space vector in scene units.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const X: Vec3 = Vec3::new(1.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance(self, other: Vec3) -> f64 {
        (other - self).length()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Unit vector in the same direction, or `None` for a zero or non-finite vector.
    pub fn normalized(self) -> Option<Vec3> {
        let len = self.length();
        if len > f64::EPSILON && len.is_finite() {
            Some(self * (1.0 / len))
        } else {
            None
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f64) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(v: [f64; 3]) -> Self {
        Vec3::new(v[0], v[1], v[2])
    }
}

/// Fixed baseline the viewpoint travels along.
///
/// Computed once from the initial viewpoint and never changed for the
/// lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    center: Vec3,
    move_dir: Vec3,
    distance: f64,
    left: Vec3,
    right: Vec3,
}

impl Geometry {
    /// Build the baseline centred on `center`, `distance` long, along `move_dir`.
    pub fn new(center: Vec3, move_dir: Vec3, distance: f64) -> Result<Geometry> {
        if !center.is_finite() {
            return Err(ParallaxError::invalid("center", "must be finite"));
        }
        if !(distance > 0.0 && distance.is_finite()) {
            return Err(ParallaxError::invalid(
                "distance",
                format!("must be a finite value > 0, got {}", distance),
            ));
        }
        let move_dir = move_dir
            .normalized()
            .ok_or(ParallaxError::DegenerateGeometry)?;
        let half = move_dir * (distance / 2.0);

        Ok(Geometry {
            center,
            move_dir,
            distance,
            left: center - half,
            right: center + half,
        })
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn move_dir(&self) -> Vec3 {
        self.move_dir
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn left_limit(&self) -> Vec3 {
        self.left
    }

    pub fn right_limit(&self) -> Vec3 {
        self.right
    }

    /// Viewpoint position for a normalized travel `y` in [0, 1].
    ///
    /// Weighted between both limits so `y == 0` and `y == 1` land exactly on
    /// the left and right limit.
    pub fn position(&self, y: f64) -> Vec3 {
        self.left * (1.0 - y) + self.right * y
    }

    /// Fraction of the baseline covered between the left limit and `pos`.
    pub fn progress(&self, pos: Vec3) -> f64 {
        self.left.distance(pos) / self.left.distance(self.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_straddle_center() {
        let g = Geometry::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(2.0, 0.0, 0.0), 0.5).unwrap();
        assert_eq!(g.move_dir(), Vec3::X);
        assert_eq!(g.left_limit(), Vec3::new(0.75, 2.0, 3.0));
        assert_eq!(g.right_limit(), Vec3::new(1.25, 2.0, 3.0));
    }

    #[test]
    fn position_hits_limits_exactly() {
        let g = Geometry::new(Vec3::new(0.3, -1.7, 5.1), Vec3::new(0.6, 0.0, 0.8), 0.02).unwrap();
        assert_eq!(g.position(0.0), g.left_limit());
        assert_eq!(g.position(1.0), g.right_limit());
        assert!((g.progress(g.position(0.5)) - 0.5).abs() < 1e-9);
        assert_eq!(g.progress(g.right_limit()), 1.0);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(matches!(
            Geometry::new(Vec3::ZERO, Vec3::ZERO, 1.0),
            Err(ParallaxError::DegenerateGeometry)
        ));
        assert!(matches!(
            Geometry::new(Vec3::ZERO, Vec3::X, 0.0),
            Err(ParallaxError::InvalidConfig { field: "distance", .. })
        ));
        assert!(Geometry::new(Vec3::new(f64::NAN, 0.0, 0.0), Vec3::X, 1.0).is_err());
    }
}
