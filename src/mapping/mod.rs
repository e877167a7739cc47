// mapping/mod.rs

// Plan files, occupancy-grid maps and the wavefront planner that turns a map
// into a plan.

pub mod grid;
pub mod plan;
pub mod wavefront;

pub use grid::OccupancyGrid;
pub use plan::{Plan, PlanError};
pub use wavefront::{make_plan, wavefront_path, GridFrame};
