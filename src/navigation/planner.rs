//! Global planner interface

use super::occupancy_grid::OccupancyGrid;
use super::path_planning::{AStarPlanner, RrtPlanner};
use crate::common::Point2d;
use crate::error::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Trait for planners that compute a path over an occupancy grid
pub trait GlobalPlanner: Send + Sync {
    /// Get the name of this planner
    fn name(&self) -> &str;

    /// Replace the map the planner searches
    fn set_map(&mut self, map: Arc<OccupancyGrid>);

    /// Configure the planner with parameters
    fn configure(&mut self, _params: &HashMap<String, f64>) -> Result<()> {
        Ok(())
    }

    /// Compute waypoints from `start` to `goal` in world coordinates
    ///
    /// Returns an empty path when no plan could be found.
    fn compute_plan(&self, start: &Point2d, goal: &Point2d) -> Vec<Point2d>;
}

/// The available planner implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlannerKind {
    /// A* search over 8-connected free cells
    #[default]
    AStar,
    /// Rapidly-exploring random tree
    Rrt,
}

impl PlannerKind {
    /// Create a planner of this kind over `map` with default settings
    pub fn build(self, map: Arc<OccupancyGrid>) -> Box<dyn GlobalPlanner> {
        match self {
            PlannerKind::AStar => Box::new(AStarPlanner::new(map)),
            PlannerKind::Rrt => Box::new(RrtPlanner::new(map)),
        }
    }
}
