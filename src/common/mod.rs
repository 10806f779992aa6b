//! Common utilities and types for Prometheus planning

pub mod point;

pub use point::{Coordinate, Point, Point2d, Point2f, Point2i, Point3d, Point3f, Point3i};
