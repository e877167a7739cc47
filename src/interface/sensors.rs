// src/interface/sensors.rs
// Sensor snapshots and actuator commands exchanged with the robot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bumper contacts, read fresh every control tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BumperState {
    pub left: bool,
    pub right: bool,
}

impl BumperState {
    pub const RELEASED: BumperState = BumperState { left: false, right: false };

    pub fn new(left: bool, right: bool) -> Self {
        BumperState { left, right }
    }

    pub fn any(&self) -> bool {
        self.left || self.right
    }

    pub fn both(&self) -> bool {
        self.left && self.right
    }
}

impl fmt::Display for BumperState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "left={} right={}", self.left, self.right)
    }
}

/// Velocity command for the robot. Negative linear drives in reverse,
/// negative angular turns clockwise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VelocityCommand {
    /// Linear velocity (m/s)
    pub linear: f64,
    /// Angular velocity (rad/s)
    pub angular: f64,
}

impl VelocityCommand {
    pub const STOP: VelocityCommand = VelocityCommand { linear: 0.0, angular: 0.0 };

    pub fn new(linear: f64, angular: f64) -> Self {
        VelocityCommand { linear, angular }
    }

    pub fn is_stop(&self) -> bool {
        self.linear == 0.0 && self.angular == 0.0
    }

    /// Both components multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        VelocityCommand::new(self.linear * factor, self.angular * factor)
    }
}

/// One colour blob reported by the camera's blob finder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Blob {
    pub id: u32,
    /// Colour channel the blob was matched on
    pub color: u32,
    /// Area in pixels
    pub area: u32,
    /// Centroid, in image pixels from the left edge
    pub x: u32,
    /// Centroid, in image pixels from the top edge
    pub y: u32,
}

impl fmt::Display for Blob {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "blob {} color={} area={} at ({}, {})",
            self.id, self.color, self.area, self.x, self.y
        )
    }
}

/// One laser scan, reduced to what the controller uses.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LaserReading {
    /// Closest return on the left half of the scan
    pub min_left: f64,
    /// Closest return on the right half of the scan
    pub min_right: f64,
    pub max_range: f64,
    pub ranges: Vec<f64>,
    pub bearings: Vec<f64>,
}

impl LaserReading {
    /// Reading with only the left/right minima populated.
    ///
    /// The sensor limit is not known from two minima, so `max_range` is
    /// infinite until set with [`LaserReading::with_max_range`].
    pub fn from_minima(min_left: f64, min_right: f64) -> Self {
        LaserReading {
            min_left,
            min_right,
            max_range: f64::INFINITY,
            ..Default::default()
        }
    }

    pub fn with_max_range(mut self, max_range: f64) -> Self {
        self.max_range = max_range;
        self
    }

    /// Whether the sensor limit is known
    pub fn has_max_range(&self) -> bool {
        self.max_range.is_finite()
    }

    pub fn count(&self) -> usize {
        self.ranges.len()
    }

    pub fn range(&self, index: usize) -> Option<f64> {
        self.ranges.get(index).copied()
    }

    pub fn bearing(&self, index: usize) -> Option<f64> {
        self.bearings.get(index).copied()
    }
}
