//! Navigation module: occupancy grids and global planners
pub mod occupancy_grid;
pub mod path_planning;
pub mod planner;

use self::occupancy_grid::OccupancyGrid;
use self::planner::{GlobalPlanner, PlannerKind};
use crate::common::Point2d;
use crate::error::{PlanningError, Result};
use crate::lifecycle::{LifecycleNode, LifecycleNodeBase, State};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Navigation stack for the robot
///
/// Owns the current map and the selected global planner. The map is shared
/// with the planner and replaced wholesale on every update, so a planner never
/// sees a half-written grid.
pub struct NavigationStack {
    base: LifecycleNodeBase,
    map: Arc<OccupancyGrid>,
    planner_kind: PlannerKind,
    planner: Box<dyn GlobalPlanner>,
    current_path: Vec<Point2d>,
}

impl Default for NavigationStack {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationStack {
    /// Create a new navigation stack with an empty map and the A* planner
    pub fn new() -> Self {
        Self::with_planner(PlannerKind::default())
    }

    /// Create a new navigation stack with a specific planner
    pub fn with_planner(kind: PlannerKind) -> Self {
        let map = Arc::new(OccupancyGrid::default());
        NavigationStack {
            base: LifecycleNodeBase::new("navigation_stack"),
            planner: kind.build(Arc::clone(&map)),
            planner_kind: kind,
            map,
            current_path: Vec::new(),
        }
    }

    /// Swap the planner; the new one starts from default settings
    pub fn set_planner(&mut self, kind: PlannerKind) {
        self.planner = kind.build(Arc::clone(&self.map));
        self.planner_kind = kind;
    }

    /// Configure the current planner
    pub fn configure_planner(&mut self, params: &HashMap<String, f64>) -> Result<()> {
        self.planner.configure(params)
    }

    /// Replace the map from raw occupancy data
    pub fn update_map(
        &mut self,
        data: Vec<i8>,
        resolution: f64,
        width: usize,
        height: usize,
        origin: Point2d,
    ) -> Result<()> {
        let grid = OccupancyGrid::new(data, resolution, width, height, origin)?;
        self.set_map(Arc::new(grid));
        Ok(())
    }

    /// Replace the map with an existing grid
    pub fn set_map(&mut self, map: Arc<OccupancyGrid>) {
        debug!(
            "Updating map: {}x{} cells at {:.3} m",
            map.width(),
            map.height(),
            map.resolution()
        );
        self.planner.set_map(Arc::clone(&map));
        self.map = map;
    }

    /// The current map
    pub fn map(&self) -> Arc<OccupancyGrid> {
        Arc::clone(&self.map)
    }

    /// Plan a path from start to goal and keep it as the current path
    ///
    /// Fails only when the stack is not active; an unreachable goal gives an
    /// empty path.
    pub fn plan_path(&mut self, start: &Point2d, goal: &Point2d) -> Result<Vec<Point2d>> {
        if !self.base.is_active() {
            return Err(PlanningError::NotActive);
        }

        let path = self.planner.compute_plan(start, goal);
        if path.is_empty() {
            warn!(
                "{} found no path from ({:.2}, {:.2}) to ({:.2}, {:.2})",
                self.planner.name(),
                start.x(),
                start.y(),
                goal.x(),
                goal.y()
            );
        } else {
            debug!("{} planned path with {} points", self.planner.name(), path.len());
        }
        self.current_path = path.clone();
        Ok(path)
    }

    /// The last planned path
    pub fn current_path(&self) -> &[Point2d] {
        &self.current_path
    }

    /// Get the name of the current planner
    pub fn planner_name(&self) -> &str {
        self.planner.name()
    }

    /// Which planner is selected
    pub fn planner_kind(&self) -> PlannerKind {
        self.planner_kind
    }

    /// Finalize the stack; no further transitions are possible
    pub fn shutdown(&mut self) -> Result<()> {
        info!("Shutting down navigation stack");
        self.base.transition(State::Finalized)?;
        self.current_path.clear();
        Ok(())
    }
}

impl LifecycleNode for NavigationStack {
    fn on_configure(&mut self) -> Result<()> {
        info!("Configuring navigation stack");
        self.base.transition(State::Inactive)
    }

    fn on_activate(&mut self) -> Result<()> {
        info!("Activating navigation stack");
        self.base.transition(State::Active)
    }

    fn on_deactivate(&mut self) -> Result<()> {
        info!("Deactivating navigation stack");
        self.base.transition(State::Inactive)
    }

    fn on_cleanup(&mut self) -> Result<()> {
        info!("Cleaning up navigation stack");
        self.base.transition(State::Unconfigured)?;
        self.current_path.clear();
        Ok(())
    }

    fn state(&self) -> State {
        self.base.state()
    }
}
