//! Roamer - waypoint navigation for wheeled robots
//!
//! This library drives a differential-drive robot through a sensor/actuator
//! collaborator ([`RobotIo`]): it turns waypoints into rotate-then-translate
//! moves executed over discrete control ticks, interrupts motion on bumper
//! contact, recovers with a pluggable strategy, and can steer on laser ranges
//! alone.

#![warn(unused_extern_crates)]

pub mod core;
pub mod interface;
pub mod mapping;
pub mod navigation;
pub mod robot;
pub mod sim;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Re-export commonly used items for easier access
pub use crate::core::{Hypothesis, Mode, NavigationSession, Pose, PositionMethod, Vector2, Waypoint};
pub use interface::{BumperState, LaserReading, RobotIo, VelocityCommand};
pub use mapping::{OccupancyGrid, Plan, PlanError};
pub use interface::Blob;
pub use navigation::{
    AutoPilot, AutoPilotConfig, AutoPilotOutcome, BeaconConfig, BeaconOutcome, BumpRecovery, BumpRecoveryConfig,
    MotionOutcome, MotionReport, NavigationOutcome, PlanningError, Recovery, RecoveryConfig,
    SimpleBumper, TurnDirection, WaypointParams,
};
pub use robot::{Robot, RobotConfig};
pub use sim::{KinematicSim, Obstacle, SimConfig};

/// Top-level configuration, usually loaded from a YAML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoamerConfig {
    /// Tick timing, scale factors and pose source
    pub robot: RobotConfig,
    /// Waypoint loop parameters
    pub navigation: WaypointParams,
    /// Which bump recovery strategy to run, and its parameters
    pub recovery: RecoveryConfig,
    /// Laser autopilot thresholds and speeds
    pub autopilot: AutoPilotConfig,
    /// Camera beacon chase
    pub beacon: BeaconConfig,
    /// What the binary should do and which files it uses
    pub mission: MissionConfig,
    /// Dry-run driver world
    pub sim: SimConfig,
}

/// What the `roamer` binary runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// Load a plan file and drive through it
    #[default]
    FollowPlan,
    /// Build a plan from the map with the wavefront planner, save it, then follow it
    MakePlan,
    /// Laser autopilot until a dead end
    AutoPilot,
    /// Find the camera beacon and drive up to it
    ChaseBeacon,
}

/// Files and mission settings for the binary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    pub mode: RunMode,
    pub plan_path: PathBuf,
    pub plan_out_path: PathBuf,
    pub map_path: PathBuf,
    /// Cells per side of the (square) map
    pub map_size: usize,
    /// Side length of a map cell in meters
    pub cell_size: f64,
    /// World coordinates of the centre of cell (0, 0)
    pub map_origin: Vector2,
    /// (row, col) of the start cell for the wavefront planner
    pub start_cell: (usize, usize),
    /// (row, col) of the goal cell for the wavefront planner
    pub goal_cell: (usize, usize),
    /// Tick budget for standalone autopilot; absent means run until a dead end
    pub autopilot_ticks: Option<u32>,
    /// Tick budget for the beacon chase; absent means run until it is reached
    pub beacon_ticks: Option<u32>,
}

impl Default for MissionConfig {
    fn default() -> Self {
        MissionConfig {
            mode: RunMode::FollowPlan,
            plan_path: PathBuf::from("plan.txt"),
            plan_out_path: PathBuf::from("plan-out.txt"),
            map_path: PathBuf::from("map.txt"),
            map_size: 32,
            cell_size: 1.0,
            map_origin: Vector2::ZERO,
            start_cell: (0, 0),
            goal_cell: (0, 0),
            autopilot_ticks: None,
            beacon_ticks: None,
        }
    }
}

impl RoamerConfig {
    /// Load and validate a YAML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RoamerError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let config: RoamerConfig = serde_yaml::from_reader(file)?;
        config.validate()?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to the defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, RoamerError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            log::warn!("No configuration at {}, using defaults", path.display());
            Ok(RoamerConfig::default())
        }
    }

    /// Reject values the control loop cannot work with
    pub fn validate(&self) -> Result<(), RoamerError> {
        fn positive(name: &str, value: f64) -> Result<(), RoamerError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(RoamerError::Config(format!("{} must be positive, got {}", name, value)))
            }
        }

        positive("robot.tick_interval", self.robot.tick_interval)?;
        positive("robot.movement_scale", self.robot.movement_scale)?;
        positive("robot.rotation_scale", self.robot.rotation_scale)?;
        positive("robot.ramp_tick_factor", self.robot.ramp_tick_factor)?;
        positive("navigation.linear_speed", self.navigation.linear_speed)?;
        positive("navigation.angular_speed", self.navigation.angular_speed)?;
        if !(self.navigation.error_range.is_finite() && self.navigation.error_range >= 0.0) {
            return Err(RoamerError::Config(format!(
                "navigation.error_range must be non-negative, got {}",
                self.navigation.error_range
            )));
        }
        if self.autopilot.dead_end_threshold > self.autopilot.clear_lane_threshold {
            return Err(RoamerError::Config(
                "autopilot.dead_end_threshold must not exceed clear_lane_threshold".to_string(),
            ));
        }
        positive("mission.cell_size", self.mission.cell_size)?;
        if self.mission.map_size == 0 {
            return Err(RoamerError::Config("mission.map_size must be at least 1".to_string()));
        }
        if self.beacon.image_width == 0 {
            return Err(RoamerError::Config("beacon.image_width must be at least 1".to_string()));
        }
        if !(self.beacon.min_speed <= self.beacon.max_speed
            && self.beacon.min_rot_speed <= self.beacon.max_rot_speed)
        {
            return Err(RoamerError::Config(
                "beacon minimum speeds must not exceed the maximums".to_string(),
            ));
        }
        Ok(())
    }
}

/// Roamer error types
#[derive(Debug)]
pub enum RoamerError {
    /// File or device I/O failure
    Io(std::io::Error),
    /// Invalid configuration
    Config(String),
    /// Plan or map file rejected
    Plan(PlanError),
    /// Planner received degenerate geometry
    Planning(PlanningError),
    /// Collaborator failed to deliver sensor data
    Sensor(String),
}

impl std::fmt::Display for RoamerError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            RoamerError::Io(e) => write!(f, "I/O error: {}", e),
            RoamerError::Config(msg) => write!(f, "Configuration error: {}", msg),
            RoamerError::Plan(e) => write!(f, "Plan error: {}", e),
            RoamerError::Planning(e) => write!(f, "Planning error: {}", e),
            RoamerError::Sensor(msg) => write!(f, "Sensor error: {}", msg),
        }
    }
}

impl std::error::Error for RoamerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RoamerError::Io(e) => Some(e),
            RoamerError::Plan(e) => Some(e),
            RoamerError::Planning(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RoamerError {
    fn from(e: std::io::Error) -> Self {
        RoamerError::Io(e)
    }
}

impl From<serde_yaml::Error> for RoamerError {
    fn from(e: serde_yaml::Error) -> Self {
        RoamerError::Config(e.to_string())
    }
}

impl From<PlanError> for RoamerError {
    fn from(e: PlanError) -> Self {
        RoamerError::Plan(e)
    }
}

impl From<PlanningError> for RoamerError {
    fn from(e: PlanningError) -> Self {
        RoamerError::Planning(e)
    }
}
