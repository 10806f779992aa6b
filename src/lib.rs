//! Spatial indexing and global path planning for the Prometheus robot
//!
//! - [`common`]: fixed-dimension points
//! - [`spatial`]: k-d tree for nearest-neighbor and radius queries
//! - [`navigation`]: occupancy grids, the A* and RRT planners, and the
//!   [`NavigationStack`] that ties a map to a planner
//! - [`lifecycle`]: configure/activate state machine shared by components

pub mod common;
pub mod error;
pub mod lifecycle;
pub mod navigation;
pub mod spatial;

pub use crate::common::{Point, Point2d, Point2f, Point2i, Point3d, Point3f, Point3i};
pub use crate::error::{PlanningError, Result};
pub use crate::lifecycle::{LifecycleNode, State};
pub use crate::navigation::occupancy_grid::{occupancy_values, GridCell, OccupancyGrid};
pub use crate::navigation::path_planning::{AStarPlanner, CollisionCheck, RrtConfig, RrtOutcome, RrtPlanner};
pub use crate::navigation::planner::{GlobalPlanner, PlannerKind};
pub use crate::navigation::NavigationStack;
pub use crate::spatial::{KdTree, NodeId};
