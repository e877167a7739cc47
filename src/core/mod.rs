// core/mod.rs

// Value types and session state shared by every navigation component:
// geometry, poses and localization helpers, and the session state machine.

pub mod geometry;
pub mod localization;
pub mod state;

// Re-export key types for a flat API
pub use geometry::{Vector2, Waypoint, EPSILON};
pub use localization::{
    best_hypothesis, clamp_yaw_to_pi, localized_pose, Hypothesis, Pose, PositionMethod,
};
pub use state::{Mode, NavigationSession};
