// core/geometry.rs

// Minimal 2D value types shared by the planner, the executor and the plan files.
// Heavier vector math (dot and perp products) goes through nalgebra at the call
// site; these types stay plain so they serialize cleanly into plans and configs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Div, DivAssign, Sub, SubAssign};

/// Tolerance used when comparing coordinates to each other or to zero.
///
/// Absolute, so it holds for coordinates far from the origin too.
pub const EPSILON: f64 = 1e-9;

/// A 2D point or direction, in meters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

/// Waypoints are plain points the navigation loop drives to.
pub type Waypoint = Vector2;

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Vector2 { x, y }
    }

    /// Euclidean length of the vector.
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction, or `None` for a (near) zero-length vector.
    pub fn normalized(&self) -> Option<Vector2> {
        let magnitude = self.magnitude();
        if !magnitude.is_finite() || magnitude < EPSILON {
            return None;
        }
        Some(*self / magnitude)
    }

    /// Component-wise equality within [`EPSILON`].
    pub fn approx_eq(&self, other: &Vector2) -> bool {
        (self.x - other.x).abs() < EPSILON && (self.y - other.y).abs() < EPSILON
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Sub for Vector2 {
    type Output = Vector2;

    fn sub(self, subtrahend: Vector2) -> Vector2 {
        Vector2::new(self.x - subtrahend.x, self.y - subtrahend.y)
    }
}

impl SubAssign for Vector2 {
    fn sub_assign(&mut self, subtrahend: Vector2) {
        self.x -= subtrahend.x;
        self.y -= subtrahend.y;
    }
}

impl Div<f64> for Vector2 {
    type Output = Vector2;

    fn div(self, divisor: f64) -> Vector2 {
        Vector2::new(self.x / divisor, self.y / divisor)
    }
}

impl DivAssign<f64> for Vector2 {
    fn div_assign(&mut self, divisor: f64) {
        self.x /= divisor;
        self.y /= divisor;
    }
}

impl From<Vector2> for nalgebra::Vector2<f64> {
    fn from(v: Vector2) -> Self {
        nalgebra::Vector2::new(v.x, v.y)
    }
}

impl From<nalgebra::Vector2<f64>> for Vector2 {
    fn from(v: nalgebra::Vector2<f64>) -> Self {
        Vector2::new(v.x, v.y)
    }
}

impl fmt::Display for Vector2 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}
