//! Occupancy grid for navigation
//!
//! A 2D map stored row-major as occupancy codes. World `x` maps to the row
//! index (bounded by `height`) and world `y` to the column index (bounded by
//! `width`); `origin` is the world coordinate of cell (0, 0).

use crate::common::Point2d;
use crate::error::{PlanningError, Result};

/// Occupancy codes for grid cells
pub mod occupancy_values {
    /// Free space
    pub const FREE: i8 = 0;
    /// Occupied; any positive value is treated as blocked
    pub const OCCUPIED: i8 = 100;
    /// Unknown; never considered free
    pub const UNKNOWN: i8 = -1;
}

/// Cell coordinate in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub row: i32,
    pub col: i32,
}

impl GridCell {
    pub const fn new(row: i32, col: i32) -> Self {
        GridCell { row, col }
    }

    /// Euclidean distance between cell indices
    pub fn distance_to(&self, other: &GridCell) -> f64 {
        let dr = (self.row as f64) - (other.row as f64);
        let dc = (self.col as f64) - (other.col as f64);
        (dr * dr + dc * dc).sqrt()
    }

    /// The 8 surrounding cells, row offset major
    pub fn neighbors_8(&self) -> [GridCell; 8] {
        let (r, c) = (self.row, self.col);
        [
            GridCell::new(r - 1, c - 1),
            GridCell::new(r - 1, c),
            GridCell::new(r - 1, c + 1),
            GridCell::new(r, c - 1),
            GridCell::new(r, c + 1),
            GridCell::new(r + 1, c - 1),
            GridCell::new(r + 1, c),
            GridCell::new(r + 1, c + 1),
        ]
    }

    /// Cells crossed by the integer line from `self` to `end`, in order
    ///
    /// Both endpoints are included.
    pub fn line_to(&self, end: &GridCell) -> Vec<GridCell> {
        let (mut r, mut c) = (self.row as i64, self.col as i64);
        let (r1, c1) = (end.row as i64, end.col as i64);
        let dr = (r1 - r).abs();
        let dc = -(c1 - c).abs();
        let sr = if r < r1 { 1 } else { -1 };
        let sc = if c < c1 { 1 } else { -1 };
        let mut err = dr + dc;

        let mut cells = Vec::with_capacity((dr.max(-dc) + 1) as usize);
        loop {
            cells.push(GridCell::new(r as i32, c as i32));
            if r == r1 && c == c1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dc {
                err += dc;
                r += sr;
            }
            if e2 <= dr {
                err += dr;
                c += sc;
            }
        }
        cells
    }
}

/// A 2D occupancy grid map
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    data: Vec<i8>,
    resolution: f64,
    width: usize,
    height: usize,
    origin: Point2d,
}

impl Default for OccupancyGrid {
    fn default() -> Self {
        OccupancyGrid {
            data: Vec::new(),
            resolution: 1.0,
            width: 0,
            height: 0,
            origin: Point2d::zero(),
        }
    }
}

impl OccupancyGrid {
    /// Create a grid, validating the data length and resolution
    pub fn new(
        data: Vec<i8>,
        resolution: f64,
        width: usize,
        height: usize,
        origin: Point2d,
    ) -> Result<Self> {
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(PlanningError::InvalidResolution(resolution));
        }
        // an unrepresentable cell count can never match the data
        let expected = width.checked_mul(height);
        if expected != Some(data.len()) {
            return Err(PlanningError::GridSizeMismatch {
                expected: expected.unwrap_or(usize::MAX),
                actual: data.len(),
            });
        }
        Ok(OccupancyGrid {
            data,
            resolution,
            width,
            height,
            origin,
        })
    }

    /// Create a grid with every cell set to `value`
    pub fn filled(value: i8, resolution: f64, width: usize, height: usize, origin: Point2d) -> Result<Self> {
        let cells = width.checked_mul(height).ok_or(PlanningError::GridSizeMismatch {
            expected: usize::MAX,
            actual: 0,
        })?;
        Self::new(vec![value; cells], resolution, width, height, origin)
    }

    /// Replace all grid state
    ///
    /// `data.len()` must equal `width * height`; this is the caller's contract
    /// and is only checked in debug builds. Use [`OccupancyGrid::new`] for
    /// validated input.
    pub fn configure(&mut self, data: Vec<i8>, resolution: f64, width: usize, height: usize, origin: Point2d) {
        debug_assert_eq!(data.len(), width * height, "grid data length must be width * height");
        self.data = data;
        self.resolution = resolution;
        self.width = width;
        self.height = height;
        self.origin = origin;
    }

    /// Cell size in world units
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.height
    }

    /// World coordinate of cell (0, 0)
    pub fn origin(&self) -> Point2d {
        self.origin
    }

    /// Raw row-major occupancy codes
    pub fn data(&self) -> &[i8] {
        &self.data
    }

    /// World-space box covered by the grid, as (min, max) corners
    pub fn world_bounds(&self) -> (Point2d, Point2d) {
        let extent = Point2d::new([
            self.height as f64 * self.resolution,
            self.width as f64 * self.resolution,
        ]);
        (self.origin, self.origin + extent)
    }

    /// Whether a cell lies inside the grid
    pub fn contains(&self, cell: &GridCell) -> bool {
        cell.row >= 0 && (cell.row as usize) < self.height && cell.col >= 0 && (cell.col as usize) < self.width
    }

    /// Convert world coordinates to the containing cell without a bounds check
    pub fn world_to_cell_unchecked(&self, x: f64, y: f64) -> GridCell {
        let row = ((x - self.origin.x()) / self.resolution).floor() as i32;
        let col = ((y - self.origin.y()) / self.resolution).floor() as i32;
        GridCell::new(row, col)
    }

    /// Convert world coordinates to a cell, `None` when outside the grid
    pub fn world_to_cell(&self, x: f64, y: f64) -> Option<GridCell> {
        if !(x.is_finite() && y.is_finite()) {
            return None;
        }
        let cell = self.world_to_cell_unchecked(x, y);
        self.contains(&cell).then_some(cell)
    }

    /// World coordinate of a cell's (0, 0) corner
    pub fn cell_to_world(&self, cell: &GridCell) -> Point2d {
        Point2d::new([
            cell.row as f64 * self.resolution + self.origin.x(),
            cell.col as f64 * self.resolution + self.origin.y(),
        ])
    }

    /// Flat row-major index of an in-bounds cell
    pub fn index_of(&self, cell: &GridCell) -> usize {
        cell.row as usize * self.width + cell.col as usize
    }

    /// Cell at a flat row-major index
    pub fn cell_at_index(&self, index: usize) -> GridCell {
        GridCell::new((index / self.width) as i32, (index % self.width) as i32)
    }

    /// Occupancy code of an in-bounds cell
    pub fn get(&self, cell: &GridCell) -> i8 {
        self.data[self.index_of(cell)]
    }

    /// Overwrite the occupancy code of an in-bounds cell
    pub fn set(&mut self, cell: &GridCell, value: i8) {
        let index = self.index_of(cell);
        self.data[index] = value;
    }

    /// Occupancy code at a flat index
    pub fn get_index(&self, index: usize) -> i8 {
        self.data[index]
    }

    /// Overwrite the occupancy code at a flat index
    pub fn set_index(&mut self, index: usize, value: i8) {
        self.data[index] = value;
    }

    /// Whether a cell is inside the grid and free
    pub fn is_free(&self, cell: &GridCell) -> bool {
        self.contains(cell) && self.get(cell) == occupancy_values::FREE
    }

    /// Whether a world point falls in a free cell
    pub fn is_free_at(&self, point: &Point2d) -> bool {
        self.world_to_cell(point.x(), point.y())
            .is_some_and(|cell| self.get(&cell) == occupancy_values::FREE)
    }

    /// Check that every cell crossed by the polyline is free
    pub fn is_path_free(&self, path: &[Point2d]) -> bool {
        let Some(first) = path.first() else {
            return true;
        };
        if !self.is_free_at(first) {
            return false;
        }

        path.windows(2).all(|segment| {
            let from = self.world_to_cell_unchecked(segment[0].x(), segment[0].y());
            let to = self.world_to_cell_unchecked(segment[1].x(), segment[1].y());
            self.contains(&to) && from.line_to(&to).iter().all(|cell| self.is_free(cell))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid_5x4() -> OccupancyGrid {
        // 4 rows x 5 columns, resolution 0.5, origin (-1, 2)
        OccupancyGrid::filled(0, 0.5, 5, 4, Point2d::new([-1.0, 2.0])).unwrap()
    }

    #[test]
    fn test_new_validates_input() {
        let origin = Point2d::zero();
        assert_eq!(
            OccupancyGrid::new(vec![0; 5], 1.0, 2, 3, origin).unwrap_err(),
            PlanningError::GridSizeMismatch {
                expected: 6,
                actual: 5
            }
        );
        assert!(matches!(
            OccupancyGrid::new(vec![0; 6], 0.0, 2, 3, origin),
            Err(PlanningError::InvalidResolution(_))
        ));
        assert!(OccupancyGrid::new(vec![0; 6], f64::NAN, 2, 3, origin).is_err());
    }

    #[test]
    fn test_overflowing_dimensions_are_a_size_mismatch() {
        let origin = Point2d::zero();
        assert_eq!(
            OccupancyGrid::new(vec![0; 4], 1.0, usize::MAX, 2, origin).unwrap_err(),
            PlanningError::GridSizeMismatch {
                expected: usize::MAX,
                actual: 4
            }
        );
        assert!(matches!(
            OccupancyGrid::filled(0, 1.0, usize::MAX / 2, 3, origin),
            Err(PlanningError::GridSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_world_to_cell_row_is_x() {
        let grid = grid_5x4();
        assert_eq!(grid.world_to_cell(-1.0, 2.0), Some(GridCell::new(0, 0)));
        assert_eq!(grid.world_to_cell(0.74, 2.1), Some(GridCell::new(3, 0)));
        assert_eq!(grid.world_to_cell(-0.9, 4.4), Some(GridCell::new(0, 4)));
        // x bounded by height (4 rows), y by width (5 columns)
        assert_eq!(grid.world_to_cell(1.0, 2.0), None);
        assert_eq!(grid.world_to_cell(-1.0, 4.5), None);
        assert_eq!(grid.world_to_cell(-1.01, 2.0), None);
        assert_eq!(grid.world_to_cell(f64::NAN, 2.0), None);
    }

    #[test]
    fn test_cell_to_world_round_trip() {
        let grid = grid_5x4();
        for &(x, y) in &[(-1.0, 2.0), (-0.3, 3.7), (0.99, 4.49), (0.2, 2.25)] {
            let cell = grid.world_to_cell(x, y).unwrap();
            let p = grid.cell_to_world(&cell);
            assert!((p.x() - x).abs() < grid.resolution());
            assert!((p.y() - y).abs() < grid.resolution());
        }
        assert_relative_eq!(grid.cell_to_world(&GridCell::new(2, 3)).x(), 0.0);
        assert_relative_eq!(grid.cell_to_world(&GridCell::new(2, 3)).y(), 3.5);
    }

    #[test]
    fn test_zero_extent_grid_rejects_everything() {
        let grid = OccupancyGrid::default();
        assert_eq!(grid.world_to_cell(0.0, 0.0), None);
        assert!(!grid.is_free_at(&Point2d::zero()));
    }

    #[test]
    fn test_cell_access() {
        let mut grid = grid_5x4();
        let cell = GridCell::new(2, 4);
        assert_eq!(grid.index_of(&cell), 14);
        assert_eq!(grid.cell_at_index(14), cell);

        grid.set(&cell, occupancy_values::OCCUPIED);
        assert_eq!(grid.get_index(14), occupancy_values::OCCUPIED);
        assert!(!grid.is_free(&cell));

        grid.set_index(3, occupancy_values::UNKNOWN);
        assert!(!grid.is_free(&GridCell::new(0, 3)));
        assert!(grid.is_free(&GridCell::new(0, 2)));
        assert!(!grid.is_free(&GridCell::new(-1, 2)));
    }

    #[test]
    fn test_configure_replaces_state() {
        let mut grid = grid_5x4();
        grid.configure(vec![0, 1, 0, 0], 2.0, 2, 2, Point2d::new([1.0, 1.0]));
        assert_eq!((grid.width(), grid.height()), (2, 2));
        assert_eq!(grid.world_to_cell(3.5, 3.0), Some(GridCell::new(1, 1)));
        assert!(!grid.is_free(&GridCell::new(0, 1)));
        let (min, max) = grid.world_bounds();
        assert_eq!(min, Point2d::new([1.0, 1.0]));
        assert_eq!(max, Point2d::new([5.0, 5.0]));
    }

    #[test]
    fn test_line_to_is_ordered_and_connected() {
        let from = GridCell::new(4, 1);
        let to = GridCell::new(0, 7);
        let cells = from.line_to(&to);
        assert_eq!(cells.first(), Some(&from));
        assert_eq!(cells.last(), Some(&to));
        for pair in cells.windows(2) {
            assert!((pair[0].row - pair[1].row).abs() <= 1);
            assert!((pair[0].col - pair[1].col).abs() <= 1);
        }
        assert_eq!(from.line_to(&from), vec![from]);
    }

    #[test]
    fn test_is_path_free() {
        let mut grid = OccupancyGrid::filled(0, 1.0, 10, 10, Point2d::zero()).unwrap();
        for row in 0..8 {
            grid.set(&GridCell::new(row, 5), occupancy_values::OCCUPIED);
        }
        let blocked = [Point2d::new([0.5, 0.5]), Point2d::new([0.5, 9.5])];
        let around = [
            Point2d::new([0.5, 0.5]),
            Point2d::new([9.5, 0.5]),
            Point2d::new([9.5, 9.5]),
        ];
        assert!(!grid.is_path_free(&blocked));
        assert!(grid.is_path_free(&around));
        assert!(grid.is_path_free(&[]));
        assert!(!grid.is_path_free(&[Point2d::new([0.5, 5.5])]));
    }
}
