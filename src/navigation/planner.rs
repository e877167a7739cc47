// src/navigation/planner.rs
// Kinematic planning: how far to rotate and travel to reach a waypoint, and how
// many control ticks a move takes at a given speed.

use nalgebra::Vector2 as NVector2;

use crate::core::{Vector2, EPSILON};

/// Geometry the planner cannot turn into a rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlanningError {
    /// Target coincides with the current position; there is no direction to face
    ZeroLengthDirection,
    /// An input or the computed angle is NaN or infinite
    NonFinite,
}

impl std::fmt::Display for PlanningError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            PlanningError::ZeroLengthDirection => write!(f, "target coincides with current position"),
            PlanningError::NonFinite => write!(f, "non-finite pose or target"),
        }
    }
}

impl std::error::Error for PlanningError {}

/// Signed angle (radians) to rotate so the robot faces `target`.
///
/// Positive angles are counter-clockwise. The magnitude is in [0, π].
pub fn plan_rotation(yaw: f64, target: Vector2, position: Vector2) -> Result<f64, PlanningError> {
    if !yaw.is_finite() || !target.is_finite() || !position.is_finite() {
        return Err(PlanningError::NonFinite);
    }

    let heading = NVector2::new(yaw.cos(), yaw.sin());
    let direction: NVector2<f64> = (target - position)
        .normalized()
        .ok_or(PlanningError::ZeroLengthDirection)?
        .into();

    // dot can land just outside [-1, 1] when the target is dead ahead or behind
    let mut angle = direction.dot(&heading).clamp(-1.0, 1.0).acos();

    // z of direction x heading: positive means the target is clockwise of us
    if direction.perp(&heading) > 0.0 {
        angle = -angle;
    }

    if angle.is_finite() { Ok(angle) } else { Err(PlanningError::NonFinite) }
}

/// Straight-line distance from `position` to `target`
pub fn plan_distance(position: Vector2, target: Vector2) -> f64 {
    (position - target).magnitude()
}

/// Ticks needed to cover `distance` at `velocity`, and the velocity signed to
/// match the direction of travel.
///
/// Distance or velocity at (near) zero is a no-op move: zero ticks and the
/// velocity unchanged. The tick count is truncated toward zero.
pub fn ticks_and_velocity(distance: f64, velocity: f64, tick_interval: f64) -> (u32, f64) {
    if distance.abs() < EPSILON || velocity.abs() < EPSILON {
        return (0, velocity);
    }

    let velocity = if distance < 0.0 { -velocity } else { velocity };
    let ticks = (distance / velocity / tick_interval).abs();
    // float -> int casts saturate, NaN becomes 0
    (ticks as u32, velocity)
}

/// Apply a robot-specific scale factor to a tick count, truncating.
pub fn scale_ticks(ticks: u32, scale: f64) -> u32 {
    (ticks as f64 * scale) as u32
}

/// Axis-aligned arrival test: within `error_range` on both axes.
pub fn has_reached(position: Vector2, target: Vector2, error_range: f64) -> bool {
    (position.x - target.x).abs() <= error_range && (position.y - target.y).abs() <= error_range
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::f64::consts::{FRAC_PI_2, PI};

    const TOL: f64 = 1e-9;

    #[rstest]
    #[case(0.0, (1.0, 0.0), 0.0)]
    #[case(0.0, (0.0, 1.0), FRAC_PI_2)]
    #[case(0.0, (0.0, -1.0), -FRAC_PI_2)]
    #[case(FRAC_PI_2, (1.0, 0.0), -FRAC_PI_2)]
    #[case(PI, (1.0, 1.0), -0.75 * PI)]
    fn test_plan_rotation_sign(#[case] yaw: f64, #[case] target: (f64, f64), #[case] expected: f64) {
        let angle = plan_rotation(yaw, Vector2::new(target.0, target.1), Vector2::ZERO).unwrap();
        assert!((angle - expected).abs() < TOL, "got {angle}, expected {expected}");
    }

    #[test]
    fn test_plan_rotation_target_behind() {
        let angle = plan_rotation(0.0, Vector2::new(-3.0, 0.0), Vector2::ZERO).unwrap();
        assert!((angle.abs() - PI).abs() < TOL);
    }

    #[test]
    fn test_plan_rotation_clamps_dead_ahead() {
        // heading and direction nearly identical; dot may round past 1.0
        let yaw = (1.0f64).atan2(3.0);
        let angle = plan_rotation(yaw, Vector2::new(3.0e6, 1.0e6), Vector2::ZERO).unwrap();
        assert!(angle.is_finite());
        assert!(angle.abs() < 1e-6);
    }

    #[test]
    fn test_plan_rotation_degenerate_inputs() {
        let p = Vector2::new(2.0, 2.0);
        assert_eq!(plan_rotation(0.3, p, p), Err(PlanningError::ZeroLengthDirection));
        assert_eq!(plan_rotation(f64::NAN, p, Vector2::ZERO), Err(PlanningError::NonFinite));
        assert_eq!(
            plan_rotation(0.0, Vector2::new(f64::INFINITY, 0.0), Vector2::ZERO),
            Err(PlanningError::NonFinite)
        );
    }

    #[test]
    fn test_plan_distance() {
        let p = Vector2::new(1.5, -2.0);
        assert_eq!(plan_distance(p, p), 0.0);
        assert!((plan_distance(Vector2::ZERO, Vector2::new(3.0, 4.0)) - 5.0).abs() < TOL);
    }

    #[rstest]
    #[case(0.0, 2.0)]
    #[case(0.0, -2.0)]
    #[case(5.0, 0.0)]
    #[case(-5.0, 0.0)]
    fn test_zero_distance_or_velocity_is_noop(#[case] distance: f64, #[case] velocity: f64) {
        assert_eq!(ticks_and_velocity(distance, velocity, 0.1), (0, velocity));
    }

    #[test]
    fn test_float_noise_distance_is_noop() {
        assert_eq!(ticks_and_velocity(1e-12, 0.5, 0.1), (0, 0.5));
        assert_eq!(ticks_and_velocity(-1e-12, 0.5, 0.1), (0, 0.5));
        assert_eq!(ticks_and_velocity(2.0, 1e-12, 0.1), (0, 1e-12));
    }

    #[test]
    fn test_negative_distance_flips_velocity() {
        assert_eq!(ticks_and_velocity(-5.0, 2.0, 0.1), (25, -2.0));
        assert_eq!(ticks_and_velocity(1.0, 0.1, 0.1), (100, 0.1));
        assert_eq!(ticks_and_velocity(-1.0, -0.5, 0.1), (20, 0.5));
    }

    #[test]
    fn test_ticks_truncate_toward_zero() {
        // 0.35 / 0.1 / 0.1 = 34.99..., not rounded up
        let (ticks, _) = ticks_and_velocity(0.35, 0.1, 0.1);
        assert_eq!(ticks, 34);
        assert_eq!(scale_ticks(10, 1.35), 13);
        assert_eq!(scale_ticks(0, 1.35), 0);
    }

    #[rstest]
    #[case((0.0, 0.0), (0.0, 0.0), 0.0, true)]
    #[case((1.0, 1.0), (1.2, 0.9), 0.25, true)]
    #[case((1.0, 1.0), (1.3, 1.0), 0.25, false)]
    #[case((1.0, 1.0), (1.0, 0.7), 0.25, false)]
    // box corner: outside a circle of the same radius but still reached
    #[case((0.0, 0.0), (0.2, 0.2), 0.25, true)]
    fn test_has_reached(
        #[case] pos: (f64, f64),
        #[case] wp: (f64, f64),
        #[case] error_range: f64,
        #[case] expected: bool,
    ) {
        let reached = has_reached(Vector2::new(pos.0, pos.1), Vector2::new(wp.0, wp.1), error_range);
        assert_eq!(reached, expected);
    }
}
