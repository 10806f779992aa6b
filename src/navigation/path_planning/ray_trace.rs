//! Segment validation against the occupancy grid

use crate::common::Point2d;
use crate::navigation::occupancy_grid::OccupancyGrid;

/// Strategy used to validate a straight extension through the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionCheck {
    /// Walk a fixed number of equally spaced samples along the segment.
    /// Obstacles thinner than the sample spacing can be skipped.
    #[default]
    Sampled,
    /// Visit every cell crossed by the integer line between the endpoints
    /// and accept the segment only if all of them are free.
    Rasterized,
}

impl CollisionCheck {
    /// Farthest valid point from `start` toward `end` under this strategy
    pub fn trace(self, grid: &OccupancyGrid, start: &Point2d, end: &Point2d, samples: usize) -> Point2d {
        match self {
            CollisionCheck::Sampled => ray_trace_sampled(grid, start, end, samples),
            CollisionCheck::Rasterized => ray_trace_rasterized(grid, start, end),
        }
    }
}

/// Walk `samples` equal steps from `start` to `end`, stopping at the first
/// sample outside the grid or in a non-free cell
///
/// Returns the last sample reached before stopping, which is `start` itself
/// when the first step is already blocked.
pub fn ray_trace_sampled(grid: &OccupancyGrid, start: &Point2d, end: &Point2d, samples: usize) -> Point2d {
    let samples = samples.max(1);
    let diff = *end - *start;
    let mut reached = *start;
    for k in 0..=samples {
        let sample = if k == samples {
            *end
        } else {
            *start + diff * (k as f64 / samples as f64)
        };
        if !grid.is_free_at(&sample) {
            break;
        }
        reached = sample;
    }
    reached
}

/// All-or-nothing check of every cell on the integer line from `start` to `end`
///
/// Returns `end` when every crossed cell is free, otherwise `start`.
pub fn ray_trace_rasterized(grid: &OccupancyGrid, start: &Point2d, end: &Point2d) -> Point2d {
    let (Some(from), Some(to)) = (
        grid.world_to_cell(start.x(), start.y()),
        grid.world_to_cell(end.x(), end.y()),
    ) else {
        return *start;
    };

    if from.line_to(&to).iter().all(|cell| grid.is_free(cell)) {
        *end
    } else {
        *start
    }
}
