//! Robot wrapper
//!
//! [`Robot`] owns the sensor/actuator collaborator, the tuning configuration
//! and the navigation session state. Motion, recovery and navigation
//! operations are implemented on it in the `navigation` modules.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::RoamerError;
use crate::core::{localized_pose, NavigationSession, Pose, PositionMethod, Vector2};
use crate::interface::{BumperState, LaserReading, RobotIo, VelocityCommand};
use crate::navigation::TurnDirection;

/// Per-robot tuning, fixed for the lifetime of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    /// Seconds per control tick
    pub tick_interval: f64,
    /// Multiplier on translation tick counts (1.35 on the real robot)
    pub movement_scale: f64,
    /// Multiplier on rotation tick counts
    pub rotation_scale: f64,
    /// Pose source used by navigation
    pub position_method: PositionMethod,
    /// Ramp commanded velocity down linearly over each move
    pub ramp_velocity: bool,
    /// Tick budget multiplier applied when ramping
    pub ramp_tick_factor: f64,
}

impl Default for RobotConfig {
    fn default() -> Self {
        RobotConfig {
            tick_interval: 0.1,
            movement_scale: 1.0,
            rotation_scale: 1.0,
            position_method: PositionMethod::Localization,
            ramp_velocity: false,
            ramp_tick_factor: 2.0,
        }
    }
}

/// A robot driven through a [`RobotIo`] collaborator.
pub struct Robot<R: RobotIo> {
    pub(crate) io: R,
    pub(crate) config: RobotConfig,
    pub(crate) session: NavigationSession,
    pub(crate) last_command: VelocityCommand,
}

impl<R: RobotIo> Robot<R> {
    pub fn new(io: R, config: RobotConfig) -> Self {
        Robot {
            io,
            config,
            session: NavigationSession::new(),
            last_command: VelocityCommand::STOP,
        }
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    pub fn session(&self) -> &NavigationSession {
        &self.session
    }

    pub fn io(&self) -> &R {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut R {
        &mut self.io
    }

    pub fn into_inner(self) -> R {
        self.io
    }

    /// Last velocity sent to the collaborator
    pub fn last_command(&self) -> VelocityCommand {
        self.last_command
    }

    /// Blocking refresh of all sensor state
    pub fn read(&mut self) -> Result<(), RoamerError> {
        self.io.read()
    }

    /// Odometric pose with yaw wrapped into (-π, π]
    pub fn odometer_pose(&self) -> Pose {
        self.io.odometric_pose().normalized()
    }

    /// Best-weighted localizer pose, or the zero pose while it has no hypotheses
    pub fn localized_pose(&self) -> Pose {
        localized_pose(&self.io.hypotheses())
    }

    /// Pose from the configured [`PositionMethod`], as of the last read
    pub fn pose(&self) -> Pose {
        match self.config.position_method {
            PositionMethod::Odometry => self.odometer_pose(),
            PositionMethod::Localization => self.localized_pose(),
        }
    }

    pub fn position(&self) -> Vector2 {
        self.pose().position()
    }

    pub fn yaw(&self) -> f64 {
        self.pose().yaw
    }

    pub fn bumpers(&self) -> BumperState {
        self.io.bumpers()
    }

    pub fn is_any_bumper_pressed(&self) -> bool {
        self.io.bumpers().any()
    }

    pub fn laser(&self) -> Option<LaserReading> {
        self.io.laser()
    }

    pub fn set_motor_enabled(&mut self, enabled: bool) {
        info!("Motor {}", if enabled { "enabled" } else { "disabled" });
        self.io.set_motor_enabled(enabled);
    }

    /// Send a raw velocity command
    pub fn set_velocity(&mut self, command: VelocityCommand) {
        self.last_command = command;
        self.io.set_velocity(command);
    }

    pub fn stop(&mut self) {
        self.set_velocity(VelocityCommand::STOP);
    }

    /// Send a velocity command with the angular sign forced by `direction`:
    /// Left turns counter-clockwise, Right clockwise, None goes straight and
    /// Random leaves the sign alone.
    pub fn set_speed(&mut self, forward: f64, angular: f64, direction: TurnDirection) {
        let angular = match direction {
            TurnDirection::Left => angular.abs(),
            TurnDirection::Right => -angular.abs(),
            TurnDirection::None => 0.0,
            TurnDirection::Random => angular,
        };
        self.set_velocity(VelocityCommand::new(forward, angular));
    }

    /// Spin in place until the localizer settles on a single hypothesis.
    ///
    /// Returns true if it converged within `max_ticks`. Always stops the robot.
    pub fn localize(&mut self, angular_velocity: f64, max_ticks: u32) -> Result<bool, RoamerError> {
        self.set_velocity(VelocityCommand::new(0.0, angular_velocity));
        let mut converged = false;
        for tick in 0..max_ticks {
            if let Err(e) = self.io.read() {
                self.stop();
                return Err(e);
            }
            let count = self.io.hypotheses().len();
            debug!("localize tick {}: {} hypotheses", tick, count);
            if count == 1 {
                converged = true;
                break;
            }
        }
        self.stop();
        if converged {
            info!("Localized at {:?}", self.localized_pose());
        } else {
            warn!("Localizer did not converge within {} ticks", max_ticks);
        }
        Ok(converged)
    }

    /// Run `maneuver` with the session in bump-recovery mode.
    ///
    /// Returns `Ok(None)` without running anything if a recovery is already in
    /// progress. The session leaves recovery mode even if the maneuver fails.
    pub fn recovering<T>(
        &mut self,
        maneuver: impl FnOnce(&mut Self) -> Result<T, RoamerError>,
    ) -> Result<Option<T>, RoamerError> {
        if !self.session.enter_recovery() {
            return Ok(None);
        }
        let result = maneuver(self);
        self.session.exit_recovery();
        result.map(Some)
    }

    /// Log position, bumpers and laser state at info level
    pub fn log_status(&self) {
        let odom = self.odometer_pose();
        info!("Odometer: x={:.3} y={:.3} yaw={:.3}", odom.x, odom.y, odom.yaw);
        let hypotheses = self.io.hypotheses();
        for (i, h) in hypotheses.iter().enumerate() {
            debug!(
                "Hypothesis {}: x={:.3} y={:.3} yaw={:.3} w={:.3}",
                i, h.pose.x, h.pose.y, h.pose.yaw, h.weight
            );
        }
        if !hypotheses.is_empty() {
            let pose = self.localized_pose();
            info!("Localized: x={:.3} y={:.3} yaw={:.3}", pose.x, pose.y, pose.yaw);
        }
        info!("Bumpers: {}", self.bumpers());
        if let Some(laser) = self.io.laser() {
            info!(
                "Laser: {} readings, max {:.2}, min left {:.2}, min right {:.2}",
                laser.count(),
                laser.max_range,
                laser.min_left,
                laser.min_right
            );
        }
    }
}
