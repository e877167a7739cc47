//! Kinematic dry-run driver
//!
//! [`KinematicSim`] implements [`RobotIo`] with an ideal unicycle: every
//! [`RobotIo::read`] advances the pose by one tick of the last velocity
//! command. Axis-aligned boxes block motion and press the bumpers, and an
//! optional half-plane laser reports ranges to them. There is no noise and no
//! dynamics; it exists so the binary and the tests have something to drive.

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};

use crate::RoamerError;
use crate::core::{Hypothesis, Pose, Vector2};
use crate::interface::{BumperState, LaserReading, RobotIo, VelocityCommand};

/// Axis-aligned rectangular obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub min: Vector2,
    pub max: Vector2,
}

impl Obstacle {
    pub fn new(min: Vector2, max: Vector2) -> Self {
        Obstacle {
            min: Vector2::new(min.x.min(max.x), min.y.min(max.y)),
            max: Vector2::new(min.x.max(max.x), min.y.max(max.y)),
        }
    }

    pub fn contains(&self, p: Vector2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Whether a disc of `radius` around `centre` touches the box
    pub fn overlaps_disc(&self, centre: Vector2, radius: f64) -> bool {
        let nearest = Vector2::new(
            centre.x.clamp(self.min.x, self.max.x),
            centre.y.clamp(self.min.y, self.max.y),
        );
        (centre - nearest).magnitude() < radius
    }

    /// Distance along the ray to the box boundary, if the ray hits it
    pub fn ray_hit(&self, origin: Vector2, angle: f64) -> Option<f64> {
        let dir = (angle.cos(), angle.sin());
        let mut t_near = 0.0f64;
        let mut t_far = f64::INFINITY;
        for (o, d, lo, hi) in [
            (origin.x, dir.0, self.min.x, self.max.x),
            (origin.y, dir.1, self.min.y, self.max.y),
        ] {
            if d.abs() < 1e-12 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let (t0, t1) = ((lo - o) / d, (hi - o) / d);
            t_near = t_near.max(t0.min(t1));
            t_far = t_far.min(t0.max(t1));
            if t_near > t_far {
                return None;
            }
        }
        Some(t_near)
    }
}

/// Dry-run world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// True pose at start
    pub start: Pose,
    pub obstacles: Vec<Obstacle>,
    /// Attach a laser spanning the front half-plane
    pub laser: bool,
    pub laser_max_range: f64,
    pub laser_rays: usize,
    pub robot_radius: f64,
    /// Extra reach of the bumper shell beyond the robot radius
    pub bumper_reach: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            start: Pose::default(),
            obstacles: Vec::new(),
            laser: true,
            laser_max_range: 5.0,
            laser_rays: 181,
            robot_radius: 0.17,
            bumper_reach: 0.02,
        }
    }
}

/// Ideal unicycle implementing [`RobotIo`]
pub struct KinematicSim {
    config: SimConfig,
    tick_interval: f64,
    // yaw is integrated without wrapping, like raw odometry
    pose: Pose,
    command: VelocityCommand,
    motor_enabled: bool,
    bumpers: BumperState,
    laser: Option<LaserReading>,
    reads: u64,
    commands: Vec<VelocityCommand>,
}

impl KinematicSim {
    pub fn new(config: SimConfig, tick_interval: f64) -> Self {
        let mut sim = KinematicSim {
            pose: config.start,
            config,
            tick_interval,
            command: VelocityCommand::STOP,
            motor_enabled: true,
            bumpers: BumperState::RELEASED,
            laser: None,
            reads: 0,
            commands: Vec::new(),
        };
        sim.sense();
        sim
    }

    /// True pose, yaw unwrapped
    pub fn true_pose(&self) -> Pose {
        self.pose
    }

    /// Every velocity command received, in order
    pub fn commands(&self) -> &[VelocityCommand] {
        &self.commands
    }

    pub fn reads(&self) -> u64 {
        self.reads
    }

    fn blocked(&self, position: Vector2) -> bool {
        self.config
            .obstacles
            .iter()
            .any(|o| o.overlaps_disc(position, self.config.robot_radius))
    }

    fn integrate(&mut self) {
        if !self.motor_enabled || self.command.is_stop() {
            return;
        }
        let dt = self.tick_interval;
        let VelocityCommand { linear, angular } = self.command;
        let Pose { x, y, yaw } = self.pose;

        let (nx, ny, nyaw) = if angular.abs() < 1e-9 {
            (x + linear * yaw.cos() * dt, y + linear * yaw.sin() * dt, yaw)
        } else {
            let r = linear / angular;
            let nyaw = yaw + angular * dt;
            (x + r * (nyaw.sin() - yaw.sin()), y + r * (yaw.cos() - nyaw.cos()), nyaw)
        };

        if self.blocked(Vector2::new(nx, ny)) {
            // advance along the step up to the point of contact
            let (mut free, mut hit) = (0.0, 1.0);
            for _ in 0..24 {
                let mid = 0.5 * (free + hit);
                if self.blocked(Vector2::new(x + (nx - x) * mid, y + (ny - y) * mid)) {
                    hit = mid;
                } else {
                    free = mid;
                }
            }
            self.pose = Pose::new(x + (nx - x) * free, y + (ny - y) * free, nyaw);
            trace!("Sim: contact at ({:.3}, {:.3})", self.pose.x, self.pose.y);
        } else {
            self.pose = Pose::new(nx, ny, nyaw);
        }
    }

    fn sense(&mut self) {
        self.bumpers = self.sense_bumpers();
        self.laser = self.config.laser.then(|| self.scan());
    }

    fn sense_bumpers(&self) -> BumperState {
        const SAMPLES: usize = 16;
        let reach = self.config.robot_radius + self.config.bumper_reach;
        let centre = self.pose.position();
        let zone_hit = |start: f64| {
            (0..=SAMPLES).any(|i| {
                let angle = self.pose.yaw + start + FRAC_PI_2 * i as f64 / SAMPLES as f64;
                let p = Vector2::new(centre.x + reach * angle.cos(), centre.y + reach * angle.sin());
                self.config.obstacles.iter().any(|o| o.contains(p))
            })
        };
        // left shell covers bearings [0, π/2], right covers [-π/2, 0]
        BumperState::new(zone_hit(0.0), zone_hit(-FRAC_PI_2))
    }

    fn scan(&self) -> LaserReading {
        let rays = self.config.laser_rays.max(2);
        let max_range = self.config.laser_max_range;
        let origin = self.pose.position();
        let mut ranges = Vec::with_capacity(rays);
        let mut bearings = Vec::with_capacity(rays);
        let (mut min_left, mut min_right) = (max_range, max_range);

        for i in 0..rays {
            // right to left, as scans are indexed
            let bearing = -FRAC_PI_2 + (TAU / 2.0) * i as f64 / (rays - 1) as f64;
            let angle = self.pose.yaw + bearing;
            let range = self
                .config
                .obstacles
                .iter()
                .filter_map(|o| o.ray_hit(origin, angle))
                .fold(max_range, f64::min);
            if bearing < 0.0 {
                min_right = min_right.min(range);
            } else {
                min_left = min_left.min(range);
            }
            ranges.push(range);
            bearings.push(bearing);
        }

        LaserReading {
            min_left,
            min_right,
            max_range,
            ranges,
            bearings,
        }
    }
}

impl RobotIo for KinematicSim {
    fn read(&mut self) -> Result<(), RoamerError> {
        self.integrate();
        self.sense();
        self.reads += 1;
        Ok(())
    }

    fn odometric_pose(&self) -> Pose {
        self.pose
    }

    fn hypotheses(&self) -> Vec<Hypothesis> {
        vec![Hypothesis {
            pose: self.pose.normalized(),
            weight: 1.0,
        }]
    }

    fn bumpers(&self) -> BumperState {
        self.bumpers
    }

    fn laser(&self) -> Option<LaserReading> {
        self.laser.clone()
    }

    fn set_velocity(&mut self, command: VelocityCommand) {
        self.command = command;
        self.commands.push(command);
    }

    fn set_motor_enabled(&mut self, enabled: bool) {
        debug!("Sim: motor {}", if enabled { "on" } else { "off" });
        self.motor_enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const TOL: f64 = 1e-9;

    fn open_world() -> KinematicSim {
        KinematicSim::new(SimConfig { laser: false, ..Default::default() }, 0.1)
    }

    #[test]
    fn test_straight_and_rotation_integration() {
        let mut sim = open_world();
        sim.set_velocity(VelocityCommand::new(0.5, 0.0));
        for _ in 0..10 {
            sim.read().unwrap();
        }
        assert!((sim.true_pose().x - 0.5).abs() < TOL);
        assert!(sim.true_pose().y.abs() < TOL);

        sim.set_velocity(VelocityCommand::new(0.0, PI));
        for _ in 0..15 {
            sim.read().unwrap();
        }
        // 1.5π unwrapped in odometry, -π/2 once normalized
        assert!((sim.odometric_pose().yaw - 1.5 * PI).abs() < 1e-6);
        assert!((sim.hypotheses()[0].pose.yaw + FRAC_PI_2).abs() < 1e-6);
        assert!((sim.true_pose().x - 0.5).abs() < TOL);
    }

    #[test]
    fn test_disabled_motor_holds_pose() {
        let mut sim = open_world();
        sim.set_motor_enabled(false);
        sim.set_velocity(VelocityCommand::new(1.0, 0.0));
        sim.read().unwrap();
        assert_eq!(sim.true_pose(), Pose::default());
    }

    #[test]
    fn test_wall_blocks_and_presses_both_bumpers() {
        let config = SimConfig {
            obstacles: vec![Obstacle::new(Vector2::new(1.0, -1.0), Vector2::new(1.5, 1.0))],
            laser: false,
            ..Default::default()
        };
        let mut sim = KinematicSim::new(config, 0.1);
        sim.set_velocity(VelocityCommand::new(1.0, 0.0));
        for _ in 0..20 {
            sim.read().unwrap();
        }
        let x = sim.true_pose().x;
        assert!(x <= 0.83 + TOL && x > 0.82, "stopped at {x}");
        assert!(sim.bumpers().both());

        sim.set_velocity(VelocityCommand::new(-1.0, 0.0));
        sim.read().unwrap();
        assert!(!sim.bumpers().any());
    }

    #[test]
    fn test_corner_presses_one_bumper() {
        // box ahead and to the left only
        let config = SimConfig {
            obstacles: vec![Obstacle::new(Vector2::new(0.15, 0.1), Vector2::new(1.0, 1.0))],
            laser: false,
            ..Default::default()
        };
        let sim = KinematicSim::new(config, 0.1);
        assert_eq!(sim.bumpers(), BumperState::new(true, false));
    }

    #[test]
    fn test_laser_minima_in_corridor() {
        let config = SimConfig {
            obstacles: vec![
                Obstacle::new(Vector2::new(-5.0, 0.5), Vector2::new(5.0, 0.6)),
                Obstacle::new(Vector2::new(-5.0, -2.1), Vector2::new(5.0, -2.0)),
            ],
            ..Default::default()
        };
        let sim = KinematicSim::new(config, 0.1);
        let laser = sim.laser().unwrap();
        assert_eq!(laser.count(), 181);
        assert!((laser.min_left - 0.5).abs() < 1e-6);
        assert!((laser.min_right - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_ray_hit() {
        let o = Obstacle::new(Vector2::new(2.0, -1.0), Vector2::new(3.0, 1.0));
        assert!((o.ray_hit(Vector2::ZERO, 0.0).unwrap() - 2.0).abs() < TOL);
        assert_eq!(o.ray_hit(Vector2::ZERO, PI), None);
        assert_eq!(o.ray_hit(Vector2::new(0.0, 5.0), 0.0), None);
    }
}
