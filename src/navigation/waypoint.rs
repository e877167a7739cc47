// src/navigation/waypoint.rs
// Waypoint navigation loop: plan, rotate, translate, recover, repeat until the
// pose is inside the error box around the target.

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use super::planner::{has_reached, plan_distance, plan_rotation, PlanningError};
use super::recovery::BumpRecovery;
use crate::core::{Pose, Vector2};
use crate::interface::RobotIo;
use crate::mapping::Plan;
use crate::robot::Robot;
use crate::RoamerError;

/// Speeds and tolerances for driving to a waypoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaypointParams {
    /// Forward speed (m/s)
    pub linear_speed: f64,
    /// Rotation speed (rad/s)
    pub angular_speed: f64,
    /// Half-width of the arrival box around the waypoint (m)
    pub error_range: f64,
    /// Plan/rotate/translate rounds before giving up on a waypoint
    pub max_iterations: u32,
    /// Heading tolerance for `rotate_to_face_waypoint` (rad)
    pub facing_tolerance: f64,
}

impl Default for WaypointParams {
    fn default() -> Self {
        WaypointParams {
            linear_speed: 0.5,
            angular_speed: 0.5,
            error_range: 0.25,
            max_iterations: 200,
            facing_tolerance: 0.0175,
        }
    }
}

/// How a waypoint attempt ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavigationOutcome {
    Arrived { iterations: u32 },
    /// Iteration cap hit before arrival
    Timeout { iterations: u32 },
    /// Target or pose not finite; nothing sensible to plan
    InvalidInput,
}

impl NavigationOutcome {
    pub fn is_arrived(&self) -> bool {
        matches!(self, NavigationOutcome::Arrived { .. })
    }
}

/// One visited plan point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaypointReport {
    pub waypoint: Vector2,
    pub outcome: NavigationOutcome,
    /// Pose after the attempt
    pub final_pose: Pose,
}

impl<R: RobotIo> Robot<R> {
    /// Drive to `target`, recovering from bumps with `recovery`, until within
    /// `params.error_range` on both axes or `params.max_iterations` rounds.
    pub fn move_to_waypoint<B: BumpRecovery>(
        &mut self,
        target: Vector2,
        recovery: &mut B,
        params: &WaypointParams,
    ) -> Result<NavigationOutcome, RoamerError> {
        if !target.is_finite() {
            error!("Refusing non-finite waypoint {:?}", target);
            return Ok(NavigationOutcome::InvalidInput);
        }

        self.session.start_navigating();
        let result = self.navigate_rounds(target, recovery, params);
        self.stop();
        self.session.stop();
        result
    }

    fn navigate_rounds<B: BumpRecovery>(
        &mut self,
        target: Vector2,
        recovery: &mut B,
        params: &WaypointParams,
    ) -> Result<NavigationOutcome, RoamerError> {
        let mut iterations = 0;
        loop {
            self.read()?;
            let pose = self.pose();
            if !pose.is_finite() {
                error!("Pose source returned {:?}; abandoning waypoint {}", pose, target);
                return Ok(NavigationOutcome::InvalidInput);
            }
            let position = pose.position();
            if has_reached(position, target, params.error_range) {
                return Ok(NavigationOutcome::Arrived { iterations });
            }
            if iterations >= params.max_iterations {
                warn!("Gave up on {} after {} rounds, at {}", target, iterations, position);
                return Ok(NavigationOutcome::Timeout { iterations });
            }
            iterations += 1;

            let angle = match plan_rotation(pose.yaw, target, position) {
                Ok(angle) => angle,
                Err(PlanningError::ZeroLengthDirection) => 0.0,
                Err(PlanningError::NonFinite) => {
                    error!("Planner produced a non-finite rotation towards {}", target);
                    return Ok(NavigationOutcome::InvalidInput);
                }
            };
            let distance = plan_distance(position, target);
            debug!(
                "Round {}: at ({:.3}, {:.3}, {:.3}), turn {:.3} rad, travel {:.3} m",
                iterations, pose.x, pose.y, pose.yaw, angle, distance
            );

            self.rotate_by(angle, params.angular_speed)?;
            let translation = self
                .translation(distance, params.linear_speed)
                .stop_on_arrival(target, params.error_range);
            self.execute_motion(&translation)?;

            recovery.handle_bump(self)?;
        }
    }

    /// Rotate in place until facing `target` within `tolerance` radians.
    ///
    /// Returns the remaining heading error. Bounded by `max_rounds` corrections.
    pub fn rotate_to_face_waypoint(
        &mut self,
        target: Vector2,
        angular_velocity: f64,
        tolerance: f64,
        max_rounds: u32,
    ) -> Result<f64, RoamerError> {
        let mut remaining = f64::INFINITY;
        for _ in 0..=max_rounds {
            self.read()?;
            let pose = self.pose();
            remaining = match plan_rotation(pose.yaw, target, pose.position()) {
                Ok(angle) => angle,
                Err(PlanningError::ZeroLengthDirection) => return Ok(0.0),
                Err(e) => return Err(e.into()),
            };
            if remaining.abs() <= tolerance {
                break;
            }
            let report = self.rotate_by(remaining, angular_velocity)?;
            if report.ticks_run == 0 {
                // correction smaller than one tick of rotation
                break;
            }
        }
        Ok(remaining)
    }

    /// Visit every point of `plan` in order.
    ///
    /// Stops at the first waypoint that is not reached and returns the reports
    /// gathered so far, including the failed one.
    pub fn follow_plan<B: BumpRecovery>(
        &mut self,
        plan: &Plan,
        recovery: &mut B,
        params: &WaypointParams,
    ) -> Result<Vec<WaypointReport>, RoamerError> {
        let mut reports = Vec::with_capacity(plan.len());
        for (i, &waypoint) in plan.waypoints().iter().enumerate() {
            info!("Now moving to coordinate {} ({}/{})", waypoint, i + 1, plan.len());
            let outcome = self.move_to_waypoint(waypoint, recovery, params)?;
            let final_pose = self.pose();
            info!(
                "Now at x={:.3} y={:.3} yaw={:.3} ({:?})",
                final_pose.x, final_pose.y, final_pose.yaw, outcome
            );
            reports.push(WaypointReport { waypoint, outcome, final_pose });
            if !outcome.is_arrived() {
                warn!("Stopping plan at waypoint {}", i + 1);
                break;
            }
        }
        Ok(reports)
    }
}
