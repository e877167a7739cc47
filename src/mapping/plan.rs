// mapping/plan.rs

// Plan files: a coordinate count followed by that many whitespace-separated
// numbers, read as (x, y) pairs. The first pair is where the robot is assumed
// to start.

use log::info;
use std::fmt::Write as _;
use std::path::Path;

use crate::core::Vector2;
use crate::RoamerError;

/// Plan or map text that could not be used
#[derive(Debug, Clone, PartialEq)]
pub enum PlanError {
    /// Coordinate count is not even, so x and y values are mismatched
    OddCoordinateCount(usize),
    /// Fewer values than the header or map size promised
    Truncated { expected: usize, found: usize },
    /// A token that is not a number
    Malformed(String),
    /// Map side so large that its cell count overflows
    MapTooLarge(usize),
    /// Start or goal cell lies outside the grid
    CellOutOfBounds { row: usize, col: usize },
    /// Goal cannot be reached from start over free cells
    NoPath,
}

impl std::fmt::Display for PlanError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            PlanError::OddCoordinateCount(n) => {
                write!(f, "plan has mismatched x and y coordinates ({} values)", n)
            }
            PlanError::Truncated { expected, found } => {
                write!(f, "expected {} values, found {}", expected, found)
            }
            PlanError::Malformed(token) => write!(f, "unparsable value '{}'", token),
            PlanError::MapTooLarge(size) => write!(f, "a {0}x{0} map is too large", size),
            PlanError::CellOutOfBounds { row, col } => {
                write!(f, "cell ({}, {}) is outside the map", row, col)
            }
            PlanError::NoPath => write!(f, "no path between start and goal"),
        }
    }
}

impl std::error::Error for PlanError {}

/// Ordered list of points to visit
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Plan {
    points: Vec<Vector2>,
}

impl Plan {
    pub fn from_points(points: Vec<Vector2>) -> Self {
        Plan { points }
    }

    /// Parse plan text. Values past the declared count are ignored.
    pub fn parse(text: &str) -> Result<Self, PlanError> {
        let mut tokens = text.split_whitespace();
        let header = tokens.next().ok_or(PlanError::Truncated { expected: 1, found: 0 })?;
        let count: usize = header
            .parse()
            .map_err(|_| PlanError::Malformed(header.to_string()))?;
        if count % 2 != 0 {
            return Err(PlanError::OddCoordinateCount(count));
        }

        // grows with the text, not with the header
        let mut values = Vec::new();
        for token in tokens.take(count) {
            let value: f64 = token
                .parse()
                .map_err(|_| PlanError::Malformed(token.to_string()))?;
            values.push(value);
        }
        if values.len() < count {
            return Err(PlanError::Truncated { expected: count, found: values.len() });
        }

        let points = values
            .chunks_exact(2)
            .map(|pair| Vector2::new(pair[0], pair[1]))
            .collect();
        Ok(Plan { points })
    }

    /// Read and parse a plan file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RoamerError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let plan = Plan::parse(&text)?;
        info!("Loaded plan with {} points from {}", plan.len(), path.display());
        Ok(plan)
    }

    /// Plan in file form: `"N v1 v2 ... vN "`
    pub fn to_file_string(&self) -> String {
        let mut out = format!("{} ", self.points.len() * 2);
        for p in &self.points {
            // infallible for String
            let _ = write!(out, "{} {} ", p.x, p.y);
        }
        out
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), RoamerError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_file_string())?;
        info!("Wrote plan with {} points to {}", self.len(), path.display());
        Ok(())
    }

    /// Two-column table of the plan, x then y
    pub fn render_table(&self) -> String {
        let mut out = String::from("    x     y\n");
        for p in &self.points {
            let _ = writeln!(out, "{:5} {:5}", p.x, p.y);
        }
        out
    }

    pub fn points(&self) -> &[Vector2] {
        &self.points
    }

    /// Every point in order, the start included
    pub fn waypoints(&self) -> &[Vector2] {
        &self.points
    }

    /// Assumed start position
    pub fn start(&self) -> Option<Vector2> {
        self.points.first().copied()
    }

    /// Points after the start
    pub fn destinations(&self) -> &[Vector2] {
        self.points.get(1..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
