// Integration tests for waypoint navigation, recovery and the autopilot,
// driven through the kinematic dry-run driver or a mocked collaborator.

use mockall::mock;
use roamer::mapping::{make_plan, GridFrame};
use roamer::navigation::{has_reached, plan_distance};
use roamer::{
    AutoPilotConfig, AutoPilotOutcome, BeaconConfig, BeaconOutcome, BumpRecovery, BumpRecoveryConfig, BumperState, Hypothesis, KinematicSim,
    LaserReading, NavigationOutcome, Obstacle, OccupancyGrid, Plan, Pose, Robot, RobotConfig,
    RobotIo, RoamerError, SimConfig, SimpleBumper, TurnDirection, Vector2, VelocityCommand,
    WaypointParams,
};
use std::sync::{Arc, Mutex};

mock! {
    pub Io {}
    impl RobotIo for Io {
        fn read(&mut self) -> Result<(), RoamerError>;
        fn odometric_pose(&self) -> Pose;
        fn hypotheses(&self) -> Vec<Hypothesis>;
        fn bumpers(&self) -> BumperState;
        fn laser(&self) -> Option<LaserReading>;
        fn set_velocity(&mut self, command: VelocityCommand);
        fn set_motor_enabled(&mut self, enabled: bool);
    }
}

/// Dry-run driver that records the distance to a target at every stop command
struct Tracking {
    sim: KinematicSim,
    target: Vector2,
    at_stops: Vec<f64>,
}

impl RobotIo for Tracking {
    fn read(&mut self) -> Result<(), RoamerError> {
        self.sim.read()
    }
    fn odometric_pose(&self) -> Pose {
        self.sim.odometric_pose()
    }
    fn hypotheses(&self) -> Vec<Hypothesis> {
        self.sim.hypotheses()
    }
    fn bumpers(&self) -> BumperState {
        self.sim.bumpers()
    }
    fn laser(&self) -> Option<LaserReading> {
        self.sim.laser()
    }
    fn set_velocity(&mut self, command: VelocityCommand) {
        if command.is_stop() {
            let here = self.sim.true_pose().position();
            self.at_stops.push(plan_distance(here, self.target));
        }
        self.sim.set_velocity(command);
    }
    fn set_motor_enabled(&mut self, enabled: bool) {
        self.sim.set_motor_enabled(enabled);
    }
}

fn open_sim() -> KinematicSim {
    KinematicSim::new(SimConfig::default(), 0.1)
}

fn seeded_bumper() -> SimpleBumper {
    SimpleBumper::new(BumpRecoveryConfig { seed: Some(11), ..Default::default() })
}

#[test]
fn test_converges_to_waypoint_without_backtracking() {
    let target = Vector2::new(2.0, 1.0);
    let io = Tracking { sim: open_sim(), target, at_stops: Vec::new() };
    let mut robot = Robot::new(io, RobotConfig::default());
    let params = WaypointParams::default();

    let outcome = robot.move_to_waypoint(target, &mut seeded_bumper(), &params).unwrap();

    assert!(outcome.is_arrived(), "got {:?}", outcome);
    assert!(has_reached(robot.position(), target, params.error_range));
    let distances = &robot.io().at_stops;
    assert!(distances.len() >= 3);
    assert!(
        distances.windows(2).all(|w| w[1] <= w[0] + 1e-9),
        "distance grew: {:?}",
        distances
    );
    assert!(robot.last_command().is_stop());
}

#[test]
fn test_left_bump_runs_one_recovery_triple() {
    let commands = Arc::new(Mutex::new(Vec::new()));
    let log = commands.clone();
    let mut io = MockIo::new();
    io.expect_read().returning(|| Ok(()));
    // bumper stays pressed for the whole maneuver
    io.expect_bumpers().return_const(BumperState::new(true, false));
    io.expect_set_velocity().returning(move |cmd| log.lock().unwrap().push(cmd));

    let config = BumpRecoveryConfig {
        both: TurnDirection::Right,
        left: TurnDirection::Right,
        right: TurnDirection::Left,
        ..Default::default()
    };
    let mut bumper = SimpleBumper::new(config);
    let mut robot = Robot::new(io, RobotConfig::default());

    assert!(bumper.handle_bump(&mut robot).unwrap());

    let commands = commands.lock().unwrap();
    assert_eq!(
        *commands,
        vec![
            VelocityCommand::new(-1.0, 0.0),
            VelocityCommand::STOP,
            VelocityCommand::new(0.0, -1.0),
            VelocityCommand::STOP,
            VelocityCommand::new(1.0, 0.0),
            VelocityCommand::STOP,
        ]
    );
    assert_eq!(robot.session().recoveries(), 1);
    assert!(!robot.session().is_handling_bump());
}

#[test]
fn test_moves_always_end_with_stop() {
    let mut robot = Robot::new(open_sim(), RobotConfig::default());
    robot.move_forward_by(0.4, 0.5).unwrap();
    robot.rotate_by(-1.0, 0.5).unwrap();
    let sim = robot.into_inner();
    let stops = sim.commands().iter().filter(|c| c.is_stop()).count();
    assert_eq!(stops, 2);
    assert_eq!(sim.commands().last(), Some(&VelocityCommand::STOP));
}

#[test]
fn test_ramped_move_lands_within_one_tick_step() {
    let mut plain = Robot::new(open_sim(), RobotConfig::default());
    plain.move_forward_by(1.0, 0.5).unwrap();

    let config = RobotConfig { ramp_velocity: true, ..RobotConfig::default() };
    let mut ramped = Robot::new(open_sim(), config);
    ramped.move_forward_by(1.0, 0.5).unwrap();

    let plain_x = plain.io().true_pose().x;
    let ramped_x = ramped.io().true_pose().x;
    let tick_step = 0.5 * 0.1;
    assert!((plain_x - 1.0).abs() < 1e-9);
    assert!((ramped_x - plain_x).abs() <= tick_step, "plain {plain_x}, ramped {ramped_x}");
}

#[test]
fn test_unreachable_target_times_out() {
    let config = SimConfig {
        obstacles: vec![Obstacle::new(Vector2::new(1.5, -3.0), Vector2::new(3.0, 3.0))],
        laser: false,
        ..Default::default()
    };
    let mut robot = Robot::new(KinematicSim::new(config, 0.1), RobotConfig::default());
    let params = WaypointParams { max_iterations: 5, ..Default::default() };

    let outcome = robot
        .move_to_waypoint(Vector2::new(2.5, 0.0), &mut seeded_bumper(), &params)
        .unwrap();

    assert_eq!(outcome, NavigationOutcome::Timeout { iterations: 5 });
    assert!(robot.session().recoveries() >= 1);
    assert!(!robot.session().is_handling_bump());
    assert!(robot.last_command().is_stop());
}

#[test]
fn test_follows_wavefront_plan_through_file() {
    let map = "\
0 0 0 0 0
0 0 0 0 0
1 1 1 0 0
0 0 0 0 0
0 0 0 0 0
";
    let grid = OccupancyGrid::parse(map, 5).unwrap();
    let frame = GridFrame { origin: Vector2::ZERO, cell_size: 1.0 };
    let plan = make_plan(&grid, (0, 0), (4, 0), &frame).unwrap();
    assert_eq!(plan.start(), Some(Vector2::ZERO));
    assert_eq!(plan.points().last(), Some(&Vector2::new(0.0, 4.0)));

    let path = std::env::temp_dir().join(format!("roamer-plan-{}.txt", std::process::id()));
    plan.write(&path).unwrap();
    let loaded = Plan::load(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(loaded, plan);

    // the map is not an obstacle to the dry-run driver; only the route matters
    let mut robot = Robot::new(open_sim(), RobotConfig::default());
    let reports = robot
        .follow_plan(&loaded, &mut seeded_bumper(), &WaypointParams::default())
        .unwrap();
    assert_eq!(reports.len(), loaded.len());
    assert!(reports.iter().all(|r| r.outcome.is_arrived()));
}

#[test]
fn test_autopilot_open_floor_and_dead_end() {
    let mut robot = Robot::new(open_sim(), RobotConfig::default());
    let outcome = robot.auto_pilot_with(Some(10), &AutoPilotConfig::default()).unwrap();
    assert_eq!(outcome, AutoPilotOutcome::BudgetExhausted { ticks: 10 });
    assert!((robot.io().true_pose().x - 0.5).abs() < 1e-9);

    let wall = SimConfig {
        obstacles: vec![Obstacle::new(Vector2::new(0.25, -3.0), Vector2::new(1.0, 3.0))],
        ..Default::default()
    };
    let mut robot = Robot::new(KinematicSim::new(wall, 0.1), RobotConfig::default());
    let outcome = robot.auto_pilot_laser(None, 0.5, 1.0).unwrap();
    assert_eq!(outcome, AutoPilotOutcome::DeadEnd { ticks: 0 });
    assert!(robot.last_command().is_stop());
}

#[test]
fn test_beacon_chase_needs_a_camera() {
    let mut robot = Robot::new(open_sim(), RobotConfig::default());
    let outcome = robot.chase_beacon(Some(10), &BeaconConfig::default()).unwrap();
    assert_eq!(outcome, BeaconOutcome::NoCamera);
    assert!(robot.into_inner().commands().is_empty());
}

#[test]
fn test_localize_converges_on_single_hypothesis() {
    let mut robot = Robot::new(open_sim(), RobotConfig::default());
    assert!(robot.localize(0.5, 20).unwrap());
    assert!(robot.last_command().is_stop());
}
