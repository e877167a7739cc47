// core/localization.rs

// Pose types and the helpers that turn raw collaborator data into a usable pose:
// yaw wrapping, and picking the best-weighted hypothesis out of the localizer's
// candidate set. The localizer itself is a black box behind `RobotIo`.

use log::warn;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

use super::geometry::Vector2;

/// Robot position (meters) and heading (radians, CCW from +X)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose {
    pub const fn new(x: f64, y: f64, yaw: f64) -> Self {
        Pose { x, y, yaw }
    }

    pub fn position(&self) -> Vector2 {
        Vector2::new(self.x, self.y)
    }

    /// Same pose with yaw wrapped into (-π, π]
    pub fn normalized(&self) -> Pose {
        Pose { yaw: clamp_yaw_to_pi(self.yaw), ..*self }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.yaw.is_finite()
    }
}

/// One candidate pose from the localizer, with its confidence weight.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub pose: Pose,
    pub weight: f64,
}

/// Where the robot gets its pose from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionMethod {
    /// Wheel odometry integration
    Odometry,
    /// Best hypothesis of the probabilistic localizer
    #[default]
    Localization,
}

/// Wraps an unbounded yaw into (-π, π].
pub fn clamp_yaw_to_pi(yaw: f64) -> f64 {
    if !yaw.is_finite() {
        return yaw;
    }
    let wrapped = (yaw + PI).rem_euclid(TAU) - PI;
    // rem_euclid maps +π onto -π; the interval is closed at +π
    if wrapped <= -PI { PI } else { wrapped }
}

/// Highest-weight hypothesis, or `None` while the localizer has not produced any.
pub fn best_hypothesis(hypotheses: &[Hypothesis]) -> Option<Hypothesis> {
    hypotheses
        .iter()
        .filter(|h| h.weight.is_finite())
        .copied()
        .fold(None, |best: Option<Hypothesis>, h| match best {
            Some(b) if b.weight >= h.weight => Some(b),
            _ => Some(h),
        })
}

/// Pose reported by the localizer: best hypothesis, or the zero pose while the
/// localizer is still starting up.
pub fn localized_pose(hypotheses: &[Hypothesis]) -> Pose {
    match best_hypothesis(hypotheses) {
        Some(h) => h.pose.normalized(),
        None => {
            warn!("Localizer reported no hypotheses, using zero pose");
            Pose::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(PI, PI)]
    #[case(-PI, PI)]
    #[case(3.0 * PI, PI)]
    #[case(1.5 * PI, -0.5 * PI)]
    #[case(-1.5 * PI, 0.5 * PI)]
    #[case(TAU + 0.25, 0.25)]
    fn test_clamp_yaw(#[case] yaw: f64, #[case] expected: f64) {
        assert!((clamp_yaw_to_pi(yaw) - expected).abs() < 1e-9, "{yaw} -> {}", clamp_yaw_to_pi(yaw));
    }

    #[test]
    fn test_best_hypothesis_picks_highest_weight() {
        let hyps = [
            Hypothesis { pose: Pose::new(1.0, 0.0, 0.0), weight: 0.2 },
            Hypothesis { pose: Pose::new(2.0, 0.0, 0.0), weight: 0.7 },
            Hypothesis { pose: Pose::new(3.0, 0.0, 0.0), weight: 0.1 },
        ];
        assert_eq!(best_hypothesis(&hyps).unwrap().pose.x, 2.0);
    }

    #[test]
    fn test_no_hypotheses_gives_zero_pose() {
        assert!(best_hypothesis(&[]).is_none());
        assert_eq!(localized_pose(&[]), Pose::default());
    }

    #[test]
    fn test_localized_pose_wraps_yaw() {
        let hyps = [Hypothesis { pose: Pose::new(0.0, 0.0, 1.5 * PI), weight: 1.0 }];
        assert!((localized_pose(&hyps).yaw + 0.5 * PI).abs() < 1e-9);
    }
}
