//! Rapidly-exploring random tree planner
//!
//! Grows a tree of collision-checked, step-limited segments from the start
//! toward random samples (and periodically toward the goal itself). Tree nodes
//! are kept in a [`KdTree`] whose payload is the parent node, so the path is
//! recovered by walking parents back from the node closest to the goal.

use super::ray_trace::CollisionCheck;
use crate::common::Point2d;
use crate::error::{PlanningError, Result};
use crate::navigation::occupancy_grid::OccupancyGrid;
use crate::navigation::planner::GlobalPlanner;
use crate::spatial::{KdTree, NodeId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// RRT configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RrtConfig {
    /// Iteration budget
    pub max_iterations: usize,
    /// Maximum distance between a node and its parent
    pub max_step: f64,
    /// Every n-th sample is the goal itself
    pub goal_sample_period: usize,
    /// Samples per segment for [`CollisionCheck::Sampled`]
    pub collision_samples: usize,
    /// Region sampled uniformly as (min, max) corners; the grid extent when `None`
    pub sample_bounds: Option<(Point2d, Point2d)>,
    /// Segment validation strategy
    pub collision_check: CollisionCheck,
}

impl Default for RrtConfig {
    fn default() -> Self {
        RrtConfig {
            max_iterations: 100_000,
            max_step: 0.5,
            goal_sample_period: 10,
            collision_samples: 200,
            sample_bounds: None,
            collision_check: CollisionCheck::Sampled,
        }
    }
}

impl RrtConfig {
    /// Set the iteration budget
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the maximum edge length
    pub fn with_max_step(mut self, max_step: f64) -> Self {
        self.max_step = max_step;
        self
    }

    /// Sample from a fixed world-space box
    pub fn with_sample_bounds(mut self, min: Point2d, max: Point2d) -> Self {
        self.sample_bounds = Some((min, max));
        self
    }

    /// Choose the segment validation strategy
    pub fn with_collision_check(mut self, collision_check: CollisionCheck) -> Self {
        self.collision_check = collision_check;
        self
    }

    /// Update from a parameter map
    ///
    /// The sampling box needs all four of `sample_min_x`, `sample_max_x`,
    /// `sample_min_y` and `sample_max_y`. Unknown keys are ignored. On error the
    /// configuration is left unchanged.
    pub fn configure(&mut self, params: &HashMap<String, f64>) -> Result<()> {
        let mut updated = self.clone();

        if let Some(&max_iterations) = params.get("max_iterations") {
            updated.max_iterations = count_param("max_iterations", max_iterations)?;
        }

        if let Some(&max_step) = params.get("max_step") {
            if !(max_step.is_finite() && max_step > 0.0) {
                return Err(PlanningError::invalid_parameter("max_step", "must be positive"));
            }
            updated.max_step = max_step;
        }

        if let Some(&period) = params.get("goal_sample_period") {
            updated.goal_sample_period = count_param("goal_sample_period", period)?;
        }

        if let Some(&samples) = params.get("collision_samples") {
            updated.collision_samples = count_param("collision_samples", samples)?;
        }

        let bound_keys = ["sample_min_x", "sample_max_x", "sample_min_y", "sample_max_y"];
        let bounds: Vec<Option<f64>> = bound_keys.iter().map(|k| params.get(*k).copied()).collect();
        if bounds.iter().any(Option::is_some) {
            let [Some(min_x), Some(max_x), Some(min_y), Some(max_y)] = bounds[..] else {
                return Err(PlanningError::invalid_parameter(
                    "sample_bounds",
                    "sample_min_x, sample_max_x, sample_min_y and sample_max_y must be given together",
                ));
            };
            let (lo, hi) = (Point2d::new([min_x, min_y]), Point2d::new([max_x, max_y]));
            if !is_sampling_region(&lo, &hi) {
                return Err(PlanningError::invalid_parameter(
                    "sample_bounds",
                    "minimum must be below maximum on both axes with a finite extent",
                ));
            }
            updated.sample_bounds = Some((lo, hi));
        }

        if let Some(&rasterized) = params.get("rasterized_collision") {
            updated.collision_check = if rasterized != 0.0 {
                CollisionCheck::Rasterized
            } else {
                CollisionCheck::Sampled
            };
        }

        *self = updated;
        Ok(())
    }
}

fn count_param(name: &str, value: f64) -> Result<usize> {
    if !(value.is_finite() && value >= 1.0) {
        return Err(PlanningError::invalid_parameter(name, "must be at least 1"));
    }
    if value.fract() != 0.0 {
        return Err(PlanningError::invalid_parameter(name, "must be a whole number"));
    }
    Ok(value as usize)
}

/// A box uniform sampling can draw from: non-empty with a finite width on both axes
fn is_sampling_region(lo: &Point2d, hi: &Point2d) -> bool {
    let extent = *hi - *lo;
    lo.x() < hi.x() && lo.y() < hi.y() && extent.x().is_finite() && extent.y().is_finite()
}

/// Result of an RRT run
#[derive(Debug, Clone, PartialEq)]
pub struct RrtOutcome {
    /// Waypoints from start toward the goal; empty if planning was refused
    pub path: Vec<Point2d>,
    /// Whether the path ends at the goal
    pub reached_goal: bool,
    /// Iterations spent growing the tree
    pub iterations: usize,
    /// Nodes in the tree when growth stopped
    pub tree_size: usize,
}

impl RrtOutcome {
    fn refused() -> Self {
        RrtOutcome {
            path: Vec::new(),
            reached_goal: false,
            iterations: 0,
            tree_size: 0,
        }
    }
}

/// Tree nodes carry their parent in the tree; the root has none.
type RrtTree = KdTree<f64, 2, Option<NodeId>>;

/// RRT planner for 2D occupancy grids
#[derive(Debug, Clone)]
pub struct RrtPlanner {
    map: Arc<OccupancyGrid>,
    config: RrtConfig,
}

impl RrtPlanner {
    /// Create a planner over `map` with default settings
    pub fn new(map: Arc<OccupancyGrid>) -> Self {
        Self::with_config(map, RrtConfig::default())
    }

    /// Create a planner over `map` with the given settings
    pub fn with_config(map: Arc<OccupancyGrid>, config: RrtConfig) -> Self {
        RrtPlanner { map, config }
    }

    /// Current configuration
    pub fn config(&self) -> &RrtConfig {
        &self.config
    }

    /// Replace the configuration
    pub fn set_config(&mut self, config: RrtConfig) {
        self.config = config;
    }

    /// Plan with the given random source, reporting whether the goal was reached
    ///
    /// The path is ordered start to goal. When the iteration budget runs out
    /// first, it ends at the tree node closest to the goal and `reached_goal`
    /// is false. The goal is appended after the closest node when it lies within
    /// `max_step` of it, unless that node already sits exactly on the goal.
    /// Start or goal outside free space, or a sampling region that is empty or
    /// not finite, yields an empty path.
    pub fn plan<R: Rng + ?Sized>(&self, start: &Point2d, goal: &Point2d, rng: &mut R) -> RrtOutcome {
        let map = &*self.map;
        let config = &self.config;

        if !map.is_free_at(start) || !map.is_free_at(goal) {
            debug!("[RRT] FAILED: start or goal is outside free space");
            return RrtOutcome::refused();
        }

        let (lo, hi) = config.sample_bounds.unwrap_or_else(|| map.world_bounds());
        if !is_sampling_region(&lo, &hi) {
            warn!("[RRT] FAILED: sampling region is empty or unbounded");
            return RrtOutcome::refused();
        }
        let period = config.goal_sample_period.max(1);

        let mut tree = RrtTree::new();
        tree.insert(*start, None);
        let mut distance_to_goal = start.distance_to(goal);

        let mut iterations = 0;
        while distance_to_goal > config.max_step && iterations < config.max_iterations {
            let sample = if iterations % period == period - 1 {
                *goal
            } else {
                Point2d::new([rng.gen_range(lo.x()..hi.x()), rng.gen_range(lo.y()..hi.y())])
            };

            if let Some((nearest_id, _)) = tree.nearest(&sample) {
                let nearest = *tree.point(nearest_id);
                let target = steer(&nearest, &sample, config.max_step);
                let reached = config
                    .collision_check
                    .trace(map, &nearest, &target, config.collision_samples);
                if reached != nearest {
                    tree.insert(reached, Some(nearest_id));
                }
            }

            if let Some((_, distance)) = tree.nearest(goal) {
                distance_to_goal = distance;
            }
            iterations += 1;
        }

        let outcome = Self::extract_path(&tree, goal, config.max_step, iterations);
        if outcome.reached_goal {
            debug!(
                "[RRT] reached goal: {} waypoints, {} nodes, {} iterations",
                outcome.path.len(),
                outcome.tree_size,
                iterations
            );
        } else {
            debug!(
                "[RRT] iteration budget exhausted: closest node {:.3} from goal, {} nodes",
                distance_to_goal, outcome.tree_size
            );
        }
        outcome
    }

    /// Plan with the given random source, returning only the waypoints
    pub fn compute_plan_with_rng<R: Rng + ?Sized>(
        &self,
        start: &Point2d,
        goal: &Point2d,
        rng: &mut R,
    ) -> Vec<Point2d> {
        self.plan(start, goal, rng).path
    }

    fn extract_path(tree: &RrtTree, goal: &Point2d, max_step: f64, iterations: usize) -> RrtOutcome {
        let Some((closest, distance)) = tree.nearest(goal) else {
            return RrtOutcome::refused();
        };

        let reached_goal = distance <= max_step;
        let mut path = Vec::new();
        if reached_goal && distance > 0.0 {
            path.push(*goal);
        }
        let mut cursor = Some(closest);
        while let Some(id) = cursor {
            path.push(*tree.point(id));
            cursor = *tree.value(id);
        }
        path.reverse();

        RrtOutcome {
            path,
            reached_goal,
            iterations,
            tree_size: tree.len(),
        }
    }
}

/// Point at most `max_step` from `from` on the way to `to`
fn steer(from: &Point2d, to: &Point2d, max_step: f64) -> Point2d {
    let distance = from.distance_to(to);
    if distance <= max_step {
        *to
    } else {
        *from + (*to - *from) * (max_step / distance)
    }
}

impl GlobalPlanner for RrtPlanner {
    fn name(&self) -> &str {
        "RrtPlanner"
    }

    fn set_map(&mut self, map: Arc<OccupancyGrid>) {
        self.map = map;
    }

    fn configure(&mut self, params: &HashMap<String, f64>) -> Result<()> {
        self.config.configure(params)
    }

    fn compute_plan(&self, start: &Point2d, goal: &Point2d) -> Vec<Point2d> {
        trace!(
            "[RRT] compute_plan: start=({:.2},{:.2}) goal=({:.2},{:.2})",
            start.x(),
            start.y(),
            goal.x(),
            goal.y()
        );
        let mut rng = StdRng::from_entropy();
        self.plan(start, goal, &mut rng).path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::occupancy_grid::{occupancy_values, GridCell};
    use approx::assert_relative_eq;

    fn free_map(size: usize) -> Arc<OccupancyGrid> {
        Arc::new(OccupancyGrid::filled(occupancy_values::FREE, 1.0, size, size, Point2d::zero()).unwrap())
    }

    fn assert_steps_within(path: &[Point2d], max_step: f64) {
        for pair in path.windows(2) {
            assert!(
                pair[0].distance_to(&pair[1]) <= max_step + 1e-9,
                "step {:?} -> {:?} too long",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_steer() {
        let from = Point2d::new([0.0, 0.0]);
        let near = Point2d::new([0.3, 0.4]);
        assert_eq!(steer(&from, &near, 0.5), near);

        let far = steer(&from, &Point2d::new([3.0, 4.0]), 0.5);
        assert_relative_eq!(far.x(), 0.3, epsilon = 1e-12);
        assert_relative_eq!(far.y(), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_open_map_reaches_goal_quickly() {
        let planner = RrtPlanner::new(free_map(20));
        let start = Point2d::new([1.0, 1.0]);
        let goal = Point2d::new([18.0, 18.0]);
        let mut rng = StdRng::seed_from_u64(42);

        let outcome = planner.plan(&start, &goal, &mut rng);
        assert!(outcome.reached_goal);
        // every 10th sample is the goal and extends the closest node by a full step
        assert!(outcome.iterations <= 10 * 49, "took {} iterations", outcome.iterations);
        assert_eq!(outcome.path.first(), Some(&start));
        assert_eq!(outcome.path.last(), Some(&goal));
        assert_steps_within(&outcome.path, 0.5);
    }

    #[test]
    fn test_same_seed_same_path() {
        let planner = RrtPlanner::new(free_map(10));
        let start = Point2d::new([1.0, 1.0]);
        let goal = Point2d::new([8.0, 2.0]);
        let a = planner.compute_plan_with_rng(&start, &goal, &mut StdRng::seed_from_u64(7));
        let b = planner.compute_plan_with_rng(&start, &goal, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_start_near_goal() {
        let planner = RrtPlanner::new(free_map(10));
        let start = Point2d::new([1.0, 1.0]);
        let goal = Point2d::new([1.3, 1.0]);
        let outcome = planner.plan(&start, &goal, &mut StdRng::seed_from_u64(1));
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.path, vec![start, goal]);

        let same = planner.plan(&start, &start, &mut StdRng::seed_from_u64(1));
        assert_eq!(same.path, vec![start]);
        assert!(same.reached_goal);
    }

    #[test]
    fn test_blocked_endpoints_refused() {
        let mut grid = OccupancyGrid::filled(occupancy_values::FREE, 1.0, 10, 10, Point2d::zero()).unwrap();
        grid.set(&GridCell::new(8, 8), occupancy_values::OCCUPIED);
        let planner = RrtPlanner::new(Arc::new(grid));
        let mut rng = StdRng::seed_from_u64(3);

        let start = Point2d::new([1.0, 1.0]);
        assert!(planner.plan(&start, &Point2d::new([8.5, 8.5]), &mut rng).path.is_empty());
        assert!(planner.plan(&start, &Point2d::new([10.5, 1.0]), &mut rng).path.is_empty());
        assert!(planner.plan(&Point2d::new([8.2, 8.2]), &start, &mut rng).path.is_empty());
    }

    #[test]
    fn test_enclosed_goal_reports_partial_progress() {
        // goal sits in a free pocket sealed off by a ring of occupied cells
        let mut grid = OccupancyGrid::filled(occupancy_values::FREE, 1.0, 12, 12, Point2d::zero()).unwrap();
        for i in 6..=10 {
            for cell in [
                GridCell::new(6, i),
                GridCell::new(10, i),
                GridCell::new(i, 6),
                GridCell::new(i, 10),
            ] {
                grid.set(&cell, occupancy_values::OCCUPIED);
            }
        }
        let map = Arc::new(grid);
        let config = RrtConfig::default().with_max_iterations(2_000);
        let planner = RrtPlanner::with_config(Arc::clone(&map), config);
        let start = Point2d::new([1.0, 1.0]);
        let goal = Point2d::new([8.5, 8.5]);

        let outcome = planner.plan(&start, &goal, &mut StdRng::seed_from_u64(11));
        assert!(!outcome.reached_goal);
        assert_eq!(outcome.iterations, 2_000);
        assert_eq!(outcome.path.first(), Some(&start));
        assert_ne!(outcome.path.last(), Some(&goal));
        assert!(outcome.path.iter().all(|p| map.is_free_at(p)));
        assert_steps_within(&outcome.path, 0.5);
    }

    #[test]
    fn test_rasterized_check_plans_around_wall() {
        let mut grid = OccupancyGrid::filled(occupancy_values::FREE, 1.0, 20, 20, Point2d::zero()).unwrap();
        for col in 0..14 {
            grid.set(&GridCell::new(10, col), occupancy_values::OCCUPIED);
        }
        let map = Arc::new(grid);
        let config = RrtConfig::default().with_collision_check(CollisionCheck::Rasterized);
        let planner = RrtPlanner::with_config(Arc::clone(&map), config);
        let start = Point2d::new([2.0, 2.0]);
        let goal = Point2d::new([17.0, 2.0]);

        let outcome = planner.plan(&start, &goal, &mut StdRng::seed_from_u64(5));
        assert!(outcome.reached_goal);
        assert!(outcome.path.iter().all(|p| map.is_free_at(p)));
        assert!(map.is_path_free(&outcome.path));
        assert_steps_within(&outcome.path, 0.5);
    }

    #[test]
    fn test_configure_from_params() {
        let mut config = RrtConfig::default();
        let params: HashMap<String, f64> = [
            ("max_step", 0.25),
            ("max_iterations", 500.0),
            ("sample_min_x", -5.0),
            ("sample_max_x", 5.0),
            ("sample_min_y", -2.0),
            ("sample_max_y", 2.0),
            ("rasterized_collision", 1.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        config.configure(&params).unwrap();

        assert_eq!(config.max_step, 0.25);
        assert_eq!(config.max_iterations, 500);
        assert_eq!(
            config.sample_bounds,
            Some((Point2d::new([-5.0, -2.0]), Point2d::new([5.0, 2.0])))
        );
        assert_eq!(config.collision_check, CollisionCheck::Rasterized);
    }

    #[test]
    fn test_configure_rejects_bad_params() {
        let mut config = RrtConfig::default();
        let bad = |k: &str, v: f64| HashMap::from([(k.to_string(), v)]);

        assert!(config.configure(&bad("max_step", 0.0)).is_err());
        assert!(config.configure(&bad("goal_sample_period", 0.0)).is_err());
        assert!(config.configure(&bad("sample_min_x", 1.0)).is_err());

        let mut inverted = bad("sample_min_x", 3.0);
        inverted.insert("sample_max_x".to_string(), 1.0);
        inverted.insert("sample_min_y".to_string(), 0.0);
        inverted.insert("sample_max_y".to_string(), 1.0);
        assert!(matches!(
            config.configure(&inverted),
            Err(PlanningError::InvalidParameter { .. })
        ));
        assert_eq!(config, RrtConfig::default());
    }

    #[test]
    fn test_configure_rejects_unbounded_sampling_region() {
        let region = |min_x: f64, max_x: f64| {
            HashMap::from([
                ("sample_min_x".to_string(), min_x),
                ("sample_max_x".to_string(), max_x),
                ("sample_min_y".to_string(), 0.0),
                ("sample_max_y".to_string(), 1.0),
            ])
        };
        let mut config = RrtConfig::default();

        for (min_x, max_x) in [
            (f64::NEG_INFINITY, f64::INFINITY),
            (0.0, f64::INFINITY),
            (-1e308, 1e308),
            (f64::NAN, 1.0),
        ] {
            assert!(
                matches!(
                    config.configure(&region(min_x, max_x)),
                    Err(PlanningError::InvalidParameter { .. })
                ),
                "accepted {min_x}..{max_x}"
            );
        }
        assert_eq!(config, RrtConfig::default());
        assert!(config.configure(&region(-1e300, 1e300)).is_ok());
    }

    #[test]
    fn test_unbounded_sampling_region_refused() {
        let start = Point2d::new([1.0, 1.0]);
        let goal = Point2d::new([8.0, 8.0]);
        for (lo, hi) in [
            (Point2d::new([f64::NEG_INFINITY, 0.0]), Point2d::new([f64::INFINITY, 10.0])),
            (Point2d::new([-1e308, 0.0]), Point2d::new([1e308, 10.0])),
        ] {
            let config = RrtConfig::default().with_sample_bounds(lo, hi);
            let planner = RrtPlanner::with_config(free_map(10), config);
            let outcome = planner.plan(&start, &goal, &mut StdRng::seed_from_u64(4));
            assert_eq!(outcome, RrtOutcome::refused());
        }
    }

    #[test]
    fn test_configure_rejects_fractional_counts() {
        let mut config = RrtConfig::default();
        for key in ["max_iterations", "goal_sample_period", "collision_samples"] {
            let params = HashMap::from([(key.to_string(), 2.7)]);
            assert!(config.configure(&params).is_err(), "{key} accepted 2.7");
        }
        assert_eq!(config, RrtConfig::default());

        let params = HashMap::from([("max_iterations".to_string(), 250.0)]);
        config.configure(&params).unwrap();
        assert_eq!(config.max_iterations, 250);
    }
}
