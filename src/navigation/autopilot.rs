// src/navigation/autopilot.rs
// Laser autopilot: drive forward steering away from the closer side until a
// dead end or the tick budget runs out.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::recovery::TurnDirection;
use crate::interface::RobotIo;
use crate::robot::Robot;
use crate::RoamerError;

/// Thresholds and speeds for laser steering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoPilotConfig {
    /// Both minima below this: nowhere to go
    pub dead_end_threshold: f64,
    /// Both minima above this: lane is clear, go straight
    pub clear_lane_threshold: f64,
    pub forward_velocity: f64,
    pub angular_velocity: f64,
}

impl Default for AutoPilotConfig {
    fn default() -> Self {
        AutoPilotConfig {
            dead_end_threshold: 0.30,
            clear_lane_threshold: 1.225,
            forward_velocity: 0.5,
            angular_velocity: 1.0,
        }
    }
}

/// Steering decision for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steering {
    Halt,
    Drive(TurnDirection),
}

/// How an autopilot run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoPilotOutcome {
    DeadEnd { ticks: u32 },
    BudgetExhausted { ticks: u32 },
    /// No laser configured; nothing was done
    NoLaser,
}

/// Decide how to steer from the left/right minimum ranges.
///
/// Turns away from the closer obstacle. With equal minima the previous
/// direction is kept.
pub fn steer(min_left: f64, min_right: f64, config: &AutoPilotConfig, previous: TurnDirection) -> Steering {
    if min_left < config.dead_end_threshold && min_right < config.dead_end_threshold {
        Steering::Halt
    } else if min_left > config.clear_lane_threshold && min_right > config.clear_lane_threshold {
        Steering::Drive(TurnDirection::None)
    } else if min_right < min_left {
        Steering::Drive(TurnDirection::Left)
    } else if min_left < min_right {
        Steering::Drive(TurnDirection::Right)
    } else {
        Steering::Drive(previous)
    }
}

impl<R: RobotIo> Robot<R> {
    /// Drive on laser ranges alone. `budget` of `None` runs until a dead end.
    ///
    /// Uses the default thresholds; see [`Robot::auto_pilot_with`].
    pub fn auto_pilot_laser(
        &mut self,
        budget: Option<u32>,
        forward_velocity: f64,
        angular_velocity: f64,
    ) -> Result<AutoPilotOutcome, RoamerError> {
        let config = AutoPilotConfig {
            forward_velocity,
            angular_velocity,
            ..AutoPilotConfig::default()
        };
        self.auto_pilot_with(budget, &config)
    }

    pub fn auto_pilot_with(
        &mut self,
        budget: Option<u32>,
        config: &AutoPilotConfig,
    ) -> Result<AutoPilotOutcome, RoamerError> {
        if self.laser().is_none() {
            warn!("Autopilot requested without a laser");
            return Ok(AutoPilotOutcome::NoLaser);
        }

        self.session.start_autopilot();
        let result = self.steer_until_done(budget, config);
        self.stop();
        self.session.stop();

        let outcome = result?;
        info!("Autopilot ended: {:?}", outcome);
        Ok(outcome)
    }

    fn steer_until_done(
        &mut self,
        budget: Option<u32>,
        config: &AutoPilotConfig,
    ) -> Result<AutoPilotOutcome, RoamerError> {
        let mut direction = TurnDirection::None;
        let mut ticks = 0u32;
        loop {
            if budget.is_some_and(|b| ticks >= b) {
                return Ok(AutoPilotOutcome::BudgetExhausted { ticks });
            }
            // steer on the last reading, then hold the command for one tick
            let Some(laser) = self.io.laser() else {
                return Ok(AutoPilotOutcome::NoLaser);
            };

            match steer(laser.min_left, laser.min_right, config, direction) {
                Steering::Halt => return Ok(AutoPilotOutcome::DeadEnd { ticks }),
                Steering::Drive(dir) => {
                    if dir != direction {
                        debug!(
                            "Autopilot turning {:?} (left {:.2}, right {:.2})",
                            dir, laser.min_left, laser.min_right
                        );
                    }
                    direction = dir;
                    self.set_speed(config.forward_velocity, config.angular_velocity, dir);
                }
            }
            self.io.read()?;
            ticks = ticks.saturating_add(1);
        }
    }
}
