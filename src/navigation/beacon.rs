// src/navigation/beacon.rs
// Beacon chaser: turn until a blob of the beacon colour sits in the middle of
// the camera image, then drive at it, slowing as it fills more of the image.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::interface::{Blob, RobotIo, VelocityCommand};
use crate::robot::Robot;
use crate::RoamerError;

/// Camera geometry and speeds for the beacon chase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaconConfig {
    /// Image width in pixels
    pub image_width: u32,
    /// How far the blob centroid may sit from the image centre and still count as facing
    pub center_offset: u32,
    /// Turn rate at the image edge, and while searching
    pub max_rot_speed: f64,
    /// Turn rate just outside the facing band
    pub min_rot_speed: f64,
    /// Blob area at which the beacon counts as reached
    pub arrival_area: u32,
    pub max_speed: f64,
    pub min_speed: f64,
    /// Blob colour channel of the beacon
    pub color: u32,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        BeaconConfig {
            image_width: 320,
            center_offset: 25,
            max_rot_speed: 0.1,
            min_rot_speed: 0.05,
            arrival_area: 4500,
            max_speed: 0.5,
            min_speed: 0.1,
            color: 0,
        }
    }
}

impl BeaconConfig {
    fn center(&self) -> f64 {
        f64::from(self.image_width) / 2.0
    }

    pub fn is_beacon(&self, blob: &Blob) -> bool {
        blob.color == self.color
    }

    /// Blob centroid within `center_offset` of the image centre
    pub fn is_facing(&self, blob: &Blob) -> bool {
        let offset = f64::from(self.center_offset);
        (f64::from(blob.x) - self.center()).abs() <= offset
    }

    /// Turn rate that brings the blob to the image centre.
    ///
    /// Scales from `max_rot_speed` at either edge down to `min_rot_speed` at the
    /// centre. Positive turns left, towards a blob left of centre. Zero when
    /// already facing.
    pub fn angular_velocity_to(&self, blob: &Blob) -> f64 {
        if self.is_facing(blob) {
            return 0.0;
        }
        let center = self.center();
        let x = f64::from(blob.x);
        // distance from the nearer edge
        let from_edge = (if x > center { f64::from(self.image_width) - x } else { x }).max(0.0);
        let w = (from_edge / center) * (self.min_rot_speed - self.max_rot_speed) + self.max_rot_speed;
        if x > center { -w } else { w }
    }

    /// Forward speed towards a centred blob, inversely proportional to its area
    /// and held within `[min_speed, max_speed]`. Zero once it is reached.
    pub fn velocity_to(&self, blob: &Blob) -> f64 {
        if blob.area >= self.arrival_area {
            return 0.0;
        }
        if blob.area == 0 {
            return self.max_speed;
        }
        let v = self.min_speed * f64::from(self.arrival_area) / f64::from(blob.area);
        if v < self.min_speed {
            self.min_speed
        } else if v > self.max_speed {
            self.max_speed
        } else {
            v
        }
    }
}

/// How a beacon chase ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeaconOutcome {
    /// Centred beacon reached the arrival area
    Reached { ticks: u32 },
    BudgetExhausted { ticks: u32 },
    /// No camera configured; nothing was done
    NoCamera,
}

impl<R: RobotIo> Robot<R> {
    /// Search for, centre on and approach the beacon. `budget` of `None` runs
    /// until the beacon is reached.
    ///
    /// A pressed bumper holds the robot still for that tick. The robot is
    /// always stopped at the end.
    pub fn chase_beacon(
        &mut self,
        budget: Option<u32>,
        config: &BeaconConfig,
    ) -> Result<BeaconOutcome, RoamerError> {
        if self.io.blobs().is_none() {
            warn!("Beacon chase requested without a camera");
            return Ok(BeaconOutcome::NoCamera);
        }

        self.session.start_chasing_beacon();
        let result = self.chase_until_done(budget, config);
        self.stop();
        self.session.stop();

        let outcome = result?;
        info!("Beacon chase ended: {:?}", outcome);
        Ok(outcome)
    }

    fn chase_until_done(
        &mut self,
        budget: Option<u32>,
        config: &BeaconConfig,
    ) -> Result<BeaconOutcome, RoamerError> {
        let mut ticks = 0u32;
        loop {
            if budget.is_some_and(|b| ticks >= b) {
                return Ok(BeaconOutcome::BudgetExhausted { ticks });
            }
            let Some(blobs) = self.io.blobs() else {
                return Ok(BeaconOutcome::NoCamera);
            };

            let command = if self.is_any_bumper_pressed() {
                VelocityCommand::STOP
            } else {
                match blobs.iter().find(|b| config.is_beacon(b)) {
                    // nothing in view: turn in place and keep looking
                    None => VelocityCommand::new(0.0, config.max_rot_speed),
                    Some(blob) => {
                        debug!("Beacon {}", blob);
                        if !config.is_facing(blob) {
                            VelocityCommand::new(0.0, config.angular_velocity_to(blob))
                        } else if blob.area >= config.arrival_area {
                            return Ok(BeaconOutcome::Reached { ticks });
                        } else {
                            VelocityCommand::new(config.velocity_to(blob), 0.0)
                        }
                    }
                }
            };
            self.set_velocity(command);
            self.io.read()?;
            ticks = ticks.saturating_add(1);
        }
    }
}
