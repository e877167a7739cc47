//! Sensor/actuator interface
//!
//! Everything the controller needs from the robot goes through [`RobotIo`]:
//! - a blocking refresh of sensor state
//! - odometry and localizer hypotheses
//! - bumpers, the optional laser and the optional blob-finding camera
//! - velocity and motor commands
//!
//! Transport to the robot or simulator lives behind implementations of this
//! trait; the crate ships only the kinematic dry-run driver in [`crate::sim`].

mod sensors;

pub use sensors::*;

use crate::RoamerError;
use crate::core::{Hypothesis, Pose};

/// Sensor/actuator collaborator driven by the control loop.
///
/// Getters report the state captured by the most recent [`RobotIo::read`];
/// nothing is refreshed implicitly.
#[cfg_attr(test, mockall::automock)]
pub trait RobotIo {
    /// Block until fresh sensor data has arrived.
    fn read(&mut self) -> Result<(), RoamerError>;

    /// Pose integrated from wheel odometry. Yaw may be unbounded.
    fn odometric_pose(&self) -> Pose;

    /// Candidate poses from the localizer. Empty while it is starting up.
    fn hypotheses(&self) -> Vec<Hypothesis>;

    fn bumpers(&self) -> BumperState;

    /// Latest laser reading, or `None` if no laser is configured.
    fn laser(&self) -> Option<LaserReading>;

    /// Blobs seen by the camera, or `None` if no camera is configured.
    fn blobs(&self) -> Option<Vec<Blob>> {
        None
    }

    fn set_velocity(&mut self, command: VelocityCommand);

    fn set_motor_enabled(&mut self, enabled: bool);
}
