//! Navigation for Roamer
//!
//! This module turns waypoints into rotate-then-translate moves, runs those
//! moves over discrete control ticks, recovers from bumper contact and steers
//! on laser ranges when no waypoint is given. It can also chase a coloured
//! beacon seen by the camera.

pub mod autopilot;
pub mod beacon;
pub mod controller;
pub mod planner;
pub mod recovery;
pub mod waypoint;

pub use autopilot::{steer, AutoPilotConfig, AutoPilotOutcome, Steering};
pub use beacon::{BeaconConfig, BeaconOutcome};
pub use controller::{ArrivalCheck, MotionOutcome, MotionReport, MotionRequest};
pub use planner::{
    has_reached, plan_distance, plan_rotation, scale_ticks, ticks_and_velocity, PlanningError,
};
pub use recovery::{
    AutoPilot, AutoPilotRecoveryConfig, BumpRecovery, BumpRecoveryConfig, Recovery, RecoveryConfig,
    SimpleBumper, TurnDirection,
};
pub use waypoint::{NavigationOutcome, WaypointParams, WaypointReport};
