// src/main.rs
// Entry point for Roamer: loads the configuration, then follows a plan, makes
// one from a map, runs the laser autopilot or chases the camera beacon against
// the dry-run driver.

use log::{error, info, warn};
use roamer::mapping::{make_plan, GridFrame};
use roamer::{
    KinematicSim, NavigationOutcome, OccupancyGrid, Plan, Recovery, Robot, RoamerConfig, RunMode,
};
use std::error::Error;

/// Runs one mission as configured. The only argument is the config path.
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "roamer.yaml".to_string());
    let config = RoamerConfig::load_or_default(&config_path)?;
    config.validate()?;
    info!("Starting Roamer in {:?} mode", config.mission.mode);

    let sim = KinematicSim::new(config.sim.clone(), config.robot.tick_interval);
    let mut robot = Robot::new(sim, config.robot.clone());
    robot.set_motor_enabled(true);
    robot.read()?;
    robot.log_status();

    let plan = match config.mission.mode {
        RunMode::FollowPlan => Some(Plan::load(&config.mission.plan_path)?),
        RunMode::MakePlan => {
            let mission = &config.mission;
            let grid = OccupancyGrid::load(&mission.map_path, mission.map_size)?;
            info!("Map:\n{}", grid.render());
            let frame = GridFrame {
                origin: mission.map_origin,
                cell_size: mission.cell_size,
            };
            let plan = make_plan(&grid, mission.start_cell, mission.goal_cell, &frame)?;
            plan.write(&mission.plan_out_path)?;
            Some(plan)
        }
        RunMode::AutoPilot | RunMode::ChaseBeacon => None,
    };

    match plan {
        Some(plan) => {
            info!("Plan:\n{}", plan.render_table());
            let mut recovery = Recovery::from_config(&config.recovery, &config.autopilot);
            let reports = robot.follow_plan(&plan, &mut recovery, &config.navigation)?;
            let reached = reports.iter().filter(|r| r.outcome.is_arrived()).count();
            info!("Reached {}/{} waypoints", reached, plan.len());
            if let Some(failed) = reports.iter().find(|r| !r.outcome.is_arrived()) {
                match failed.outcome {
                    NavigationOutcome::InvalidInput => error!("Invalid waypoint {}", failed.waypoint),
                    _ => warn!("Could not reach {}", failed.waypoint),
                }
            }
        }
        None if config.mission.mode == RunMode::ChaseBeacon => {
            let outcome = robot.chase_beacon(config.mission.beacon_ticks, &config.beacon)?;
            info!("Beacon chase finished: {:?}", outcome);
        }
        None => {
            let outcome = robot.auto_pilot_with(config.mission.autopilot_ticks, &config.autopilot)?;
            info!("Autopilot finished: {:?}", outcome);
        }
    }

    robot.log_status();
    robot.set_motor_enabled(false);
    info!("Roamer shutdown complete");
    Ok(())
}
