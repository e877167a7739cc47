// mapping/wavefront.rs

// Wavefront planner. A breadth-first wave spreads from the goal over free,
// 4-connected cells; the path then walks downhill from the start, keeping its
// current heading whenever the next lower cell lies straight ahead so the plan
// has as few turns as possible.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::grid::OccupancyGrid;
use super::plan::{Plan, PlanError};
use crate::core::Vector2;

/// (row, col) of a grid cell
pub type Cell = (usize, usize);

/// up, right, down, left as (row, col) steps; rows grow upward
const STEPS: [(isize, isize); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// Placement of the grid in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridFrame {
    /// World position of the centre of cell (0, 0)
    pub origin: Vector2,
    /// Cell side length in meters
    pub cell_size: f64,
}

impl GridFrame {
    pub fn to_world(&self, (row, col): Cell) -> Vector2 {
        Vector2::new(
            self.origin.x + col as f64 * self.cell_size,
            self.origin.y + row as f64 * self.cell_size,
        )
    }
}

impl Default for GridFrame {
    fn default() -> Self {
        GridFrame {
            origin: Vector2::ZERO,
            cell_size: 1.0,
        }
    }
}

fn neighbor(grid: &OccupancyGrid, (row, col): Cell, step: (isize, isize)) -> Option<Cell> {
    let row = row.checked_add_signed(step.0)?;
    let col = col.checked_add_signed(step.1)?;
    grid.contains(row, col).then_some((row, col))
}

/// Steps from every free cell to `goal`, `None` where unreachable
fn spread_wave(grid: &OccupancyGrid, goal: Cell) -> Vec<Option<u32>> {
    let size = grid.size();
    let mut distance = vec![None; size * size];
    let mut frontier = VecDeque::new();
    distance[goal.0 * size + goal.1] = Some(0);
    frontier.push_back(goal);

    while let Some(cell) = frontier.pop_front() {
        let d = distance[cell.0 * size + cell.1].unwrap_or(0);
        for step in STEPS {
            let Some(next) = neighbor(grid, cell, step) else { continue };
            let slot = &mut distance[next.0 * size + next.1];
            if slot.is_none() && !grid.is_occupied(next.0, next.1) {
                *slot = Some(d + 1);
                frontier.push_back(next);
            }
        }
    }
    distance
}

/// Every cell on the path from `start` to `goal`, both included
pub fn wavefront_path(grid: &OccupancyGrid, start: Cell, goal: Cell) -> Result<Vec<Cell>, PlanError> {
    for (row, col) in [start, goal] {
        if !grid.contains(row, col) {
            return Err(PlanError::CellOutOfBounds { row, col });
        }
    }
    if grid.is_occupied(goal.0, goal.1) || grid.is_occupied(start.0, start.1) {
        return Err(PlanError::NoPath);
    }

    let size = grid.size();
    let distance = spread_wave(grid, goal);
    let dist_at = |(row, col): Cell| distance[row * size + col];
    let Some(mut remaining) = dist_at(start) else {
        return Err(PlanError::NoPath);
    };
    debug!("Wave reached start {:?} at distance {}", start, remaining);

    let mut path = Vec::with_capacity(remaining as usize + 1);
    path.push(start);
    let mut cell = start;
    let mut heading: Option<usize> = None;
    while remaining > 0 {
        let downhill = |i: usize| {
            neighbor(grid, cell, STEPS[i]).filter(|&next| dist_at(next) == Some(remaining - 1))
        };
        let (i, next) = heading
            .and_then(|h| downhill(h).map(|next| (h, next)))
            .or_else(|| (0..STEPS.len()).find_map(|i| downhill(i).map(|next| (i, next))))
            .ok_or(PlanError::NoPath)?;
        heading = Some(i);
        cell = next;
        remaining -= 1;
        path.push(cell);
    }
    Ok(path)
}

/// Keep the endpoints and the cells where the path changes direction
pub fn turning_points(path: &[Cell]) -> Vec<Cell> {
    let step = |a: Cell, b: Cell| (b.0 as isize - a.0 as isize, b.1 as isize - a.1 as isize);
    let mut points = Vec::new();
    for (i, &cell) in path.iter().enumerate() {
        let is_end = i == 0 || i + 1 == path.len();
        if is_end || step(path[i - 1], cell) != step(cell, path[i + 1]) {
            points.push(cell);
        }
    }
    points
}

/// Plan from `start` to `goal` in world coordinates. The first point is the start.
pub fn make_plan(grid: &OccupancyGrid, start: Cell, goal: Cell, frame: &GridFrame) -> Result<Plan, PlanError> {
    let path = wavefront_path(grid, start, goal)?;
    let corners = turning_points(&path);
    info!(
        "Wavefront path {:?} -> {:?}: {} cells, {} waypoints",
        start,
        goal,
        path.len(),
        corners.len()
    );
    Ok(Plan::from_points(corners.into_iter().map(|c| frame.to_world(c)).collect()))
}
