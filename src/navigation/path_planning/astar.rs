//! A* planner over the occupancy grid
//!
//! Searches 8-connected free cells with a Euclidean heuristic. Queue order is
//! total cost ascending, and on equal totals the entry that has travelled
//! further is expanded first, so results are reproducible.

use crate::common::Point2d;
use crate::navigation::occupancy_grid::{GridCell, OccupancyGrid};
use crate::navigation::planner::GlobalPlanner;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Per-cell search record
#[derive(Debug, Clone, Copy)]
struct SearchNode {
    parent: Option<usize>,
    cost_to_reach: f64,
    heuristic: f64,
    cost: f64,
}

impl Default for SearchNode {
    fn default() -> Self {
        SearchNode {
            parent: None,
            cost_to_reach: f64::INFINITY,
            heuristic: f64::INFINITY,
            cost: f64::INFINITY,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    cell: GridCell,
    cost: f64,
    cost_to_reach: f64,
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse on total cost for min-heap behavior, then prefer the larger cost-to-reach
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| self.cost_to_reach.total_cmp(&other.cost_to_reach))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

/// A* planner for 2D occupancy grids
#[derive(Debug, Clone)]
pub struct AStarPlanner {
    map: Arc<OccupancyGrid>,
}

impl AStarPlanner {
    /// Create a planner over `map`
    pub fn new(map: Arc<OccupancyGrid>) -> Self {
        AStarPlanner { map }
    }

    /// The map being searched
    pub fn map(&self) -> &OccupancyGrid {
        &self.map
    }

    /// Search between two cells, returning the cell path start..=goal
    ///
    /// Empty when either cell is outside the grid or not free, or when the
    /// goal cannot be reached.
    pub fn plan_cells(&self, start: GridCell, goal: GridCell) -> Vec<GridCell> {
        let map = &*self.map;
        if !map.is_free(&start) || !map.is_free(&goal) {
            debug!(
                "[AStar] FAILED: start ({},{}) or goal ({},{}) is not a free cell",
                start.row, start.col, goal.row, goal.col
            );
            return Vec::new();
        }

        let mut nodes = vec![SearchNode::default(); map.width() * map.height()];
        let mut queue = BinaryHeap::new();

        let start_index = map.index_of(&start);
        let heuristic = goal.distance_to(&start);
        nodes[start_index] = SearchNode {
            parent: None,
            cost_to_reach: 0.0,
            heuristic,
            cost: heuristic,
        };
        queue.push(QueueEntry {
            cell: start,
            cost: heuristic,
            cost_to_reach: 0.0,
        });

        let mut expanded = 0usize;
        let mut goal_reached = false;
        while let Some(current) = queue.pop() {
            if current.cell == goal {
                goal_reached = true;
                break;
            }

            let current_index = map.index_of(&current.cell);
            let current_cost = nodes[current_index].cost_to_reach;
            if current.cost_to_reach > current_cost {
                // superseded by a cheaper entry that was already expanded
                continue;
            }
            expanded += 1;

            for neighbor in current.cell.neighbors_8() {
                if !map.is_free(&neighbor) {
                    continue;
                }
                let index = map.index_of(&neighbor);
                let cost_to_reach = current_cost + neighbor.distance_to(&current.cell);
                let heuristic = goal.distance_to(&neighbor);
                let cost = cost_to_reach + heuristic;
                if cost < nodes[index].cost {
                    nodes[index] = SearchNode {
                        parent: Some(current_index),
                        cost_to_reach,
                        heuristic,
                        cost,
                    };
                    queue.push(QueueEntry {
                        cell: neighbor,
                        cost,
                        cost_to_reach,
                    });
                }
            }
        }

        if !goal_reached {
            debug!("[AStar] FAILED: NoPath after expanding {} nodes", expanded);
            return Vec::new();
        }

        let goal_node = nodes[map.index_of(&goal)];
        trace!(
            "[AStar] reached goal: cost={:.3} (h at goal {:.3}), expanded={}",
            goal_node.cost_to_reach,
            goal_node.heuristic,
            expanded
        );

        let mut path = vec![goal];
        let mut cursor = goal_node.parent;
        while let Some(index) = cursor {
            path.push(map.cell_at_index(index));
            cursor = nodes[index].parent;
        }
        path.reverse();
        path
    }
}

impl GlobalPlanner for AStarPlanner {
    fn name(&self) -> &str {
        "AStarPlanner"
    }

    fn set_map(&mut self, map: Arc<OccupancyGrid>) {
        self.map = map;
    }

    fn compute_plan(&self, start: &Point2d, goal: &Point2d) -> Vec<Point2d> {
        trace!(
            "[AStar] compute_plan: start=({:.2},{:.2}) goal=({:.2},{:.2})",
            start.x(),
            start.y(),
            goal.x(),
            goal.y()
        );

        let (Some(start_cell), Some(goal_cell)) = (
            self.map.world_to_cell(start.x(), start.y()),
            self.map.world_to_cell(goal.x(), goal.y()),
        ) else {
            debug!("[AStar] FAILED: OutOfBounds - start or goal outside grid");
            return Vec::new();
        };

        self.plan_cells(start_cell, goal_cell)
            .iter()
            .map(|cell| self.map.cell_to_world(cell))
            .collect()
    }
}
