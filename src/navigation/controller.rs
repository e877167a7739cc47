// src/navigation/controller.rs
// Tick-driven motion executor: runs a velocity command for a fixed number of
// control ticks, polling sensors every tick, and always finishes with a stop.

use log::{debug, trace};

use super::planner::{has_reached, scale_ticks, ticks_and_velocity};
use crate::core::Vector2;
use crate::interface::{RobotIo, VelocityCommand};
use crate::robot::Robot;
use crate::RoamerError;

/// How a motion ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionOutcome {
    /// Ran the whole tick budget
    Completed,
    /// Stopped early on bumper contact
    Interrupted,
    /// Stopped early because the target waypoint came within range
    Arrived,
}

/// Result of one executed motion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionReport {
    pub ticks_planned: u32,
    pub ticks_run: u32,
    pub outcome: MotionOutcome,
}

impl MotionReport {
    pub fn was_interrupted(&self) -> bool {
        self.outcome == MotionOutcome::Interrupted
    }
}

/// Stop a translation early once the pose is within `error_range` of `target`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrivalCheck {
    pub target: Vector2,
    pub error_range: f64,
}

/// One velocity command held for a number of ticks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionRequest {
    pub command: VelocityCommand,
    pub ticks: u32,
    /// Bumper contact ends the motion (ignored while recovering from a bump)
    pub interruptible: bool,
    pub arrival: Option<ArrivalCheck>,
}

impl MotionRequest {
    pub fn new(command: VelocityCommand, ticks: u32) -> Self {
        MotionRequest {
            command,
            ticks,
            interruptible: true,
            arrival: None,
        }
    }

    pub fn uninterruptible(mut self) -> Self {
        self.interruptible = false;
        self
    }

    pub fn stop_on_arrival(mut self, target: Vector2, error_range: f64) -> Self {
        self.arrival = Some(ArrivalCheck { target, error_range });
        self
    }
}

impl<R: RobotIo> Robot<R> {
    /// Hold `request.command` for `request.ticks` control ticks.
    ///
    /// With velocity ramping enabled the tick budget is multiplied by
    /// `ramp_tick_factor` and the command shrinks linearly to 1/n of its
    /// magnitude on the last tick. The robot is always commanded to stop before
    /// this returns, including when a sensor read fails.
    pub fn execute_motion(&mut self, request: &MotionRequest) -> Result<MotionReport, RoamerError> {
        let ramp = self.config.ramp_velocity;
        let ticks = if ramp {
            scale_ticks(request.ticks, self.config.ramp_tick_factor)
        } else {
            request.ticks
        };

        let result = self.run_ticks(request, ticks, ramp);
        self.stop();

        let (ticks_run, outcome) = result?;
        debug!(
            "Motion {:?} for {}/{} ticks: {:?}",
            request.command, ticks_run, ticks, outcome
        );
        Ok(MotionReport {
            ticks_planned: ticks,
            ticks_run,
            outcome,
        })
    }

    fn run_ticks(
        &mut self,
        request: &MotionRequest,
        ticks: u32,
        ramp: bool,
    ) -> Result<(u32, MotionOutcome), RoamerError> {
        if ticks == 0 {
            return Ok((0, MotionOutcome::Completed));
        }
        if !ramp {
            self.set_velocity(request.command);
        }

        for tick in 0..ticks {
            if ramp {
                let factor = (ticks - tick) as f64 / ticks as f64;
                self.set_velocity(request.command.scaled(factor));
            }

            self.io.read()?;

            if request.interruptible && !self.session.is_handling_bump() && self.is_any_bumper_pressed() {
                trace!("Bumper pressed on tick {}", tick);
                return Ok((tick + 1, MotionOutcome::Interrupted));
            }
            if let Some(check) = request.arrival {
                if has_reached(self.position(), check.target, check.error_range) {
                    trace!("Reached {} on tick {}", check.target, tick);
                    return Ok((tick + 1, MotionOutcome::Arrived));
                }
            }
        }
        Ok((ticks, MotionOutcome::Completed))
    }

    /// Drive straight for `distance` meters. Negative distances back up.
    pub fn move_forward_by(&mut self, distance: f64, velocity: f64) -> Result<MotionReport, RoamerError> {
        let request = self.translation(distance, velocity);
        self.execute_motion(&request)
    }

    /// Rotate in place by `radians`. Positive is counter-clockwise.
    pub fn rotate_by(&mut self, radians: f64, angular_velocity: f64) -> Result<MotionReport, RoamerError> {
        let request = self.rotation(radians, angular_velocity);
        self.execute_motion(&request)
    }

    /// Back straight up by `distance`, ignoring the bumpers.
    pub fn dislodge_from_obstacle(&mut self, distance: f64, velocity: f64) -> Result<MotionReport, RoamerError> {
        let request = self.translation(-distance.abs(), velocity.abs()).uninterruptible();
        self.execute_motion(&request)
    }

    pub(crate) fn translation(&self, distance: f64, velocity: f64) -> MotionRequest {
        let (ticks, velocity) = ticks_and_velocity(distance, velocity, self.config.tick_interval);
        let ticks = scale_ticks(ticks, self.config.movement_scale);
        MotionRequest::new(VelocityCommand::new(velocity, 0.0), ticks)
    }

    pub(crate) fn rotation(&self, radians: f64, angular_velocity: f64) -> MotionRequest {
        let (ticks, angular_velocity) = ticks_and_velocity(radians, angular_velocity, self.config.tick_interval);
        let ticks = scale_ticks(ticks, self.config.rotation_scale);
        MotionRequest::new(VelocityCommand::new(0.0, angular_velocity), ticks)
    }
}
