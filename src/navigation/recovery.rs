//! Bump recovery strategies
//!
//! When a bumper press interrupts a move, the waypoint loop hands the robot to
//! a [`BumpRecovery`] strategy before planning again. Both strategies run
//! their sub-moves inside [`Robot::recovering`], so the bumper contact they
//! cause themselves does not cut those moves short.

use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::autopilot::AutoPilotConfig;
use crate::interface::{BumperState, RobotIo};
use crate::robot::Robot;
use crate::RoamerError;

/// Direction to turn away from an obstacle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnDirection {
    Left,
    Right,
    Random,
    None,
}

/// Capability to get the robot unstuck after a bump.
pub trait BumpRecovery {
    /// Run the maneuver if a bumper is pressed. Returns whether anything ran.
    fn handle_bump<R: RobotIo>(&mut self, robot: &mut Robot<R>) -> Result<bool, RoamerError>;
}

/// Parameters of the back-up / rotate / advance maneuver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BumpRecoveryConfig {
    /// Turn used when both bumpers are pressed
    pub both: TurnDirection,
    /// Turn used when only the left bumper is pressed
    pub left: TurnDirection,
    /// Turn used when only the right bumper is pressed
    pub right: TurnDirection,
    /// Rotation magnitude in radians
    pub angle: f64,
    /// Back-up and advance distance in meters
    pub distance: f64,
    pub velocity: f64,
    pub angular_velocity: f64,
    /// Seed for resolving `Random` turns; entropy when absent
    pub seed: Option<u64>,
}

impl Default for BumpRecoveryConfig {
    fn default() -> Self {
        BumpRecoveryConfig {
            both: TurnDirection::Random,
            left: TurnDirection::Right,
            right: TurnDirection::Left,
            angle: 5.0 * PI / 12.0, // ~75 degrees
            distance: 0.75,
            velocity: 1.0,
            angular_velocity: 1.0,
            seed: None,
        }
    }
}

impl BumpRecoveryConfig {
    /// Configured turn for the given contact, or `None` if nothing is pressed
    pub fn direction_for(&self, bumpers: BumperState) -> Option<TurnDirection> {
        match (bumpers.left, bumpers.right) {
            (true, true) => Some(self.both),
            (true, false) => Some(self.left),
            (false, true) => Some(self.right),
            (false, false) => None,
        }
    }
}

/// Parameters of the back-up-then-autopilot maneuver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoPilotRecoveryConfig {
    /// Autopilot tick budget
    pub ticks: u32,
    /// Back-up distance in meters
    pub distance: f64,
    pub velocity: f64,
    pub angular_velocity: f64,
}

impl Default for AutoPilotRecoveryConfig {
    fn default() -> Self {
        AutoPilotRecoveryConfig {
            ticks: 50,
            distance: 0.5,
            velocity: 0.5,
            angular_velocity: 1.0,
        }
    }
}

/// Strategy selection, as read from configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum RecoveryConfig {
    Simple(BumpRecoveryConfig),
    AutoPilot(AutoPilotRecoveryConfig),
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        RecoveryConfig::Simple(BumpRecoveryConfig::default())
    }
}

/// Back up, rotate away from the contact, and drive forward again.
#[derive(Debug, Clone)]
pub struct SimpleBumper {
    config: BumpRecoveryConfig,
    rng: StdRng,
}

impl SimpleBumper {
    pub fn new(config: BumpRecoveryConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        SimpleBumper { config, rng }
    }

    /// Bumper with an explicit random source, for reproducible `Random` turns
    pub fn with_rng(config: BumpRecoveryConfig, rng: StdRng) -> Self {
        SimpleBumper { config, rng }
    }

    pub fn config(&self) -> &BumpRecoveryConfig {
        &self.config
    }

    /// Turn for the given contact with `Random` resolved to `Left` or `Right`
    pub fn resolve_direction(&mut self, bumpers: BumperState) -> Option<TurnDirection> {
        self.config.direction_for(bumpers).map(|dir| match dir {
            TurnDirection::Random => {
                if self.rng.gen_bool(0.5) {
                    TurnDirection::Left
                } else {
                    TurnDirection::Right
                }
            }
            other => other,
        })
    }

    /// Rotation for a resolved direction: Right is clockwise, None is zero.
    pub fn signed_angle(&self, direction: TurnDirection) -> f64 {
        match direction {
            TurnDirection::Left | TurnDirection::Random => self.config.angle,
            TurnDirection::Right => -self.config.angle,
            TurnDirection::None => 0.0,
        }
    }
}

impl BumpRecovery for SimpleBumper {
    fn handle_bump<R: RobotIo>(&mut self, robot: &mut Robot<R>) -> Result<bool, RoamerError> {
        robot.read()?;
        let bumpers = robot.bumpers();
        let Some(direction) = self.resolve_direction(bumpers) else {
            return Ok(false);
        };
        let angle = self.signed_angle(direction);
        info!("Bump ({}): backing up and turning {:?} by {:.3} rad", bumpers, direction, angle);

        let (distance, velocity, angular_velocity) =
            (self.config.distance, self.config.velocity, self.config.angular_velocity);
        let ran = robot.recovering(|robot| {
            robot.move_forward_by(-distance, velocity)?;
            robot.rotate_by(angle, angular_velocity)?;
            robot.move_forward_by(distance, velocity)?;
            Ok(())
        })?;
        Ok(ran.is_some())
    }
}

/// Back up, then let the laser autopilot steer for a bounded number of ticks.
#[derive(Debug, Clone, Default)]
pub struct AutoPilot {
    config: AutoPilotRecoveryConfig,
    // dead-end and clear-lane thresholds; speeds come from `config`
    steering: AutoPilotConfig,
}

impl AutoPilot {
    /// Recovery steering with the default autopilot thresholds
    pub fn new(config: AutoPilotRecoveryConfig) -> Self {
        AutoPilot::with_steering(config, AutoPilotConfig::default())
    }

    pub fn with_steering(config: AutoPilotRecoveryConfig, steering: AutoPilotConfig) -> Self {
        let steering = AutoPilotConfig {
            forward_velocity: config.velocity,
            angular_velocity: config.angular_velocity,
            ..steering
        };
        AutoPilot { config, steering }
    }

    pub fn config(&self) -> &AutoPilotRecoveryConfig {
        &self.config
    }

    pub fn steering(&self) -> &AutoPilotConfig {
        &self.steering
    }
}

impl BumpRecovery for AutoPilot {
    fn handle_bump<R: RobotIo>(&mut self, robot: &mut Robot<R>) -> Result<bool, RoamerError> {
        robot.read()?;
        let bumpers = robot.bumpers();
        if !bumpers.any() {
            return Ok(false);
        }
        if robot.laser().is_none() {
            warn!("Bump ({}) but no laser configured; autopilot recovery skipped", bumpers);
            return Ok(false);
        }
        info!("Bump ({}): backing up and engaging autopilot for {} ticks", bumpers, self.config.ticks);

        let (config, steering) = (&self.config, &self.steering);
        let ran = robot.recovering(|robot| {
            robot.dislodge_from_obstacle(config.distance, config.velocity)?;
            robot.auto_pilot_with(Some(config.ticks), steering)
        })?;
        if let Some(outcome) = ran {
            info!("Autopilot recovery finished: {:?}", outcome);
        }
        Ok(ran.is_some())
    }
}

/// Either strategy, chosen at session start
#[derive(Debug, Clone)]
pub enum Recovery {
    Simple(SimpleBumper),
    AutoPilot(AutoPilot),
}

impl Recovery {
    /// Build the configured strategy. The autopilot strategy steers with the
    /// thresholds in `autopilot`.
    pub fn from_config(config: &RecoveryConfig, autopilot: &AutoPilotConfig) -> Self {
        match config {
            RecoveryConfig::Simple(c) => Recovery::Simple(SimpleBumper::new(c.clone())),
            RecoveryConfig::AutoPilot(c) => {
                Recovery::AutoPilot(AutoPilot::with_steering(c.clone(), autopilot.clone()))
            }
        }
    }
}

impl BumpRecovery for Recovery {
    fn handle_bump<R: RobotIo>(&mut self, robot: &mut Robot<R>) -> Result<bool, RoamerError> {
        match self {
            Recovery::Simple(s) => s.handle_bump(robot),
            Recovery::AutoPilot(a) => a.handle_bump(robot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::{LaserReading, MockRobotIo, VelocityCommand};
    use crate::robot::RobotConfig;
    use rstest::rstest;
    use std::sync::{Arc, Mutex};

    #[rstest]
    #[case(BumperState::new(true, false), Some(TurnDirection::Right))]
    #[case(BumperState::new(false, true), Some(TurnDirection::Left))]
    #[case(BumperState::new(true, true), Some(TurnDirection::None))]
    #[case(BumperState::RELEASED, None)]
    fn test_direction_mapping(#[case] bumpers: BumperState, #[case] expected: Option<TurnDirection>) {
        let config = BumpRecoveryConfig {
            both: TurnDirection::None,
            ..Default::default()
        };
        assert_eq!(config.direction_for(bumpers), expected);
    }

    #[test]
    fn test_random_resolution_is_reproducible_with_seed() {
        let config = BumpRecoveryConfig { seed: Some(7), ..Default::default() };
        let both = BumperState::new(true, true);
        let mut a = SimpleBumper::new(config.clone());
        let mut b = SimpleBumper::new(config);
        for _ in 0..16 {
            let da = a.resolve_direction(both).unwrap();
            assert!(matches!(da, TurnDirection::Left | TurnDirection::Right));
            assert_eq!(Some(da), b.resolve_direction(both));
        }
    }

    #[test]
    fn test_signed_angle() {
        let bumper = SimpleBumper::new(BumpRecoveryConfig { angle: 1.2, ..Default::default() });
        assert_eq!(bumper.signed_angle(TurnDirection::Left), 1.2);
        assert_eq!(bumper.signed_angle(TurnDirection::Right), -1.2);
        assert_eq!(bumper.signed_angle(TurnDirection::None), 0.0);
    }

    #[test]
    fn test_no_bump_is_noop() {
        let mut io = MockRobotIo::new();
        io.expect_read().times(1).returning(|| Ok(()));
        io.expect_bumpers().return_const(BumperState::RELEASED);
        io.expect_set_velocity().never();

        let mut robot = Robot::new(io, RobotConfig::default());
        let mut bumper = SimpleBumper::new(BumpRecoveryConfig::default());
        assert!(!bumper.handle_bump(&mut robot).unwrap());
    }

    #[test]
    fn test_autopilot_without_laser_is_noop() {
        let mut io = MockRobotIo::new();
        io.expect_read().returning(|| Ok(()));
        io.expect_bumpers().return_const(BumperState::new(true, true));
        io.expect_laser().returning(|| None);
        io.expect_set_velocity().never();

        let mut robot = Robot::new(io, RobotConfig::default());
        let mut recovery = Recovery::from_config(
            &RecoveryConfig::AutoPilot(Default::default()),
            &AutoPilotConfig::default(),
        );
        assert!(!recovery.handle_bump(&mut robot).unwrap());
        assert!(!robot.session().is_handling_bump());
    }

    #[test]
    fn test_autopilot_recovery_backs_up_then_steers() {
        let commands = Arc::new(Mutex::new(Vec::new()));
        let log = commands.clone();
        let mut io = MockRobotIo::new();
        io.expect_read().returning(|| Ok(()));
        io.expect_bumpers().return_const(BumperState::new(false, true));
        io.expect_laser().returning(|| Some(LaserReading::from_minima(2.0, 0.5)));
        io.expect_set_velocity().returning(move |cmd| log.lock().unwrap().push(cmd));

        let mut robot = Robot::new(io, RobotConfig::default());
        let mut recovery = AutoPilot::new(AutoPilotRecoveryConfig { ticks: 3, ..Default::default() });
        assert!(recovery.handle_bump(&mut robot).unwrap());

        let commands = commands.lock().unwrap();
        // back up 0.5 m at 0.5 m/s, stop, three autopilot ticks turning left, stop
        assert_eq!(commands[0], VelocityCommand::new(-0.5, 0.0));
        assert!(commands[1].is_stop());
        assert_eq!(&commands[2..5], &[VelocityCommand::new(0.5, 1.0); 3]);
        assert!(commands[5].is_stop());
        assert_eq!(commands.len(), 6);
        assert!(!robot.session().is_handling_bump());
        assert_eq!(robot.session().recoveries(), 1);
    }

    #[test]
    fn test_autopilot_recovery_honours_configured_dead_end() {
        let commands = Arc::new(Mutex::new(Vec::new()));
        let log = commands.clone();
        let mut io = MockRobotIo::new();
        io.expect_read().returning(|| Ok(()));
        io.expect_bumpers().return_const(BumperState::new(true, true));
        io.expect_laser().returning(|| Some(LaserReading::from_minima(0.5, 0.5)));
        io.expect_set_velocity().returning(move |cmd| log.lock().unwrap().push(cmd));

        let steering = AutoPilotConfig { dead_end_threshold: 0.6, ..Default::default() };
        let recovery_config = AutoPilotRecoveryConfig { ticks: 5, ..Default::default() };
        let mut recovery = Recovery::from_config(&RecoveryConfig::AutoPilot(recovery_config), &steering);

        let mut robot = Robot::new(io, RobotConfig::default());
        assert!(recovery.handle_bump(&mut robot).unwrap());

        // back up and stop, then the autopilot halts at once
        let commands = commands.lock().unwrap();
        assert_eq!(*commands, vec![VelocityCommand::new(-0.5, 0.0), VelocityCommand::STOP, VelocityCommand::STOP]);
    }
}
