//! Global path planners
pub mod astar;
pub mod ray_trace;
pub mod rrt;

pub use self::astar::AStarPlanner;
pub use self::ray_trace::CollisionCheck;
pub use self::rrt::{RrtConfig, RrtOutcome, RrtPlanner};
