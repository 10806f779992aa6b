//! Fixed-dimension point value type
//!
//! `Point<T, D>` is a plain value: `D` components of a numeric type `T`, with
//! component-wise arithmetic and Euclidean metrics. Distances are always
//! computed in `f64` so integer points can be compared against real radii.

use crate::error::{PlanningError, Result};
use nalgebra::SVector;
use std::fmt::Debug;
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Neg, Sub};

/// Numeric component type of a [`Point`].
pub trait Coordinate:
    Copy
    + Debug
    + Default
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + AddAssign
{
    /// Widen the component to `f64`.
    fn to_f64(self) -> f64;
}

macro_rules! impl_coordinate {
    ($($t:ty),*) => {
        $(
            impl Coordinate for $t {
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_coordinate!(i32, i64, f32, f64);

/// A `D`-dimensional point with components of type `T`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point<T, const D: usize> {
    coords: [T; D],
}

/// 2D integer point (grid cells)
pub type Point2i = Point<i32, 2>;
/// 2D single-precision point
pub type Point2f = Point<f32, 2>;
/// 2D double-precision point (world coordinates)
pub type Point2d = Point<f64, 2>;
/// 3D integer point
pub type Point3i = Point<i32, 3>;
/// 3D single-precision point
pub type Point3f = Point<f32, 3>;
/// 3D double-precision point
pub type Point3d = Point<f64, 3>;

impl<T: Coordinate, const D: usize> Point<T, D> {
    /// Create a point from its components
    pub const fn new(coords: [T; D]) -> Self {
        Point { coords }
    }

    /// The point with every component zero
    pub fn zero() -> Self {
        Point {
            coords: [T::default(); D],
        }
    }

    /// Number of components
    pub const fn dimension(&self) -> usize {
        D
    }

    /// Borrow the components
    pub fn as_array(&self) -> &[T; D] {
        &self.coords
    }

    /// Read component `i`, failing outside `[0, D)`
    pub fn get(&self, i: usize) -> Result<T> {
        self.coords
            .get(i)
            .copied()
            .ok_or(PlanningError::IndexOutOfRange {
                index: i,
                dimension: D,
            })
    }

    /// Overwrite component `i`, failing outside `[0, D)`
    pub fn set(&mut self, i: usize, value: T) -> Result<()> {
        let slot = self
            .coords
            .get_mut(i)
            .ok_or(PlanningError::IndexOutOfRange {
                index: i,
                dimension: D,
            })?;
        *slot = value;
        Ok(())
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Self) -> f64 {
        self.coords
            .iter()
            .zip(other.coords.iter())
            .map(|(a, b)| {
                let d = a.to_f64() - b.to_f64();
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }

    /// Euclidean norm (distance to the origin)
    pub fn magnitude(&self) -> f64 {
        self.distance_to(&Self::zero())
    }

    /// Dot product
    pub fn dot(&self, other: &Self) -> T {
        self.coords
            .iter()
            .zip(other.coords.iter())
            .fold(T::default(), |acc, (&a, &b)| acc + a * b)
    }

    /// Mean of a batch of points, `None` for an empty batch
    pub fn centroid(points: &[Self]) -> Option<Point<f64, D>> {
        if points.is_empty() {
            return None;
        }
        let mut sum = Point::<f64, D>::zero();
        for p in points {
            for (acc, c) in sum.coords.iter_mut().zip(p.coords.iter()) {
                *acc += c.to_f64();
            }
        }
        Some(sum * (1.0 / points.len() as f64))
    }

    /// Convert to an `nalgebra` column vector
    pub fn to_vector(&self) -> SVector<f64, D> {
        SVector::<f64, D>::from_fn(|i, _| self.coords[i].to_f64())
    }
}

impl<T: Coordinate> Point<T, 2> {
    /// First component
    pub fn x(&self) -> T {
        self.coords[0]
    }

    /// Second component
    pub fn y(&self) -> T {
        self.coords[1]
    }
}

impl<T: Coordinate, const D: usize> Default for Point<T, D> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<T: Coordinate, const D: usize> From<[T; D]> for Point<T, D> {
    fn from(coords: [T; D]) -> Self {
        Point::new(coords)
    }
}

impl<const D: usize> From<SVector<f64, D>> for Point<f64, D> {
    fn from(v: SVector<f64, D>) -> Self {
        Point::new(std::array::from_fn(|i| v[i]))
    }
}

impl<T: Coordinate, const D: usize> Index<usize> for Point<T, D> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        match self.coords.get(i) {
            Some(v) => v,
            None => panic!(
                "{}",
                PlanningError::IndexOutOfRange {
                    index: i,
                    dimension: D
                }
            ),
        }
    }
}

impl<T: Coordinate, const D: usize> IndexMut<usize> for Point<T, D> {
    fn index_mut(&mut self, i: usize) -> &mut T {
        match self.coords.get_mut(i) {
            Some(v) => v,
            None => panic!(
                "{}",
                PlanningError::IndexOutOfRange {
                    index: i,
                    dimension: D
                }
            ),
        }
    }
}

impl<T: Coordinate, const D: usize> Add for Point<T, D> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Point::new(std::array::from_fn(|i| self.coords[i] + rhs.coords[i]))
    }
}

impl<T: Coordinate, const D: usize> Sub for Point<T, D> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Point::new(std::array::from_fn(|i| self.coords[i] - rhs.coords[i]))
    }
}

impl<T: Coordinate, const D: usize> Neg for Point<T, D> {
    type Output = Self;

    fn neg(self) -> Self {
        Point::new(self.coords.map(|c| -c))
    }
}

impl<T: Coordinate, const D: usize> Mul<T> for Point<T, D> {
    type Output = Self;

    fn mul(self, k: T) -> Self {
        Point::new(self.coords.map(|c| k * c))
    }
}

impl<T: Coordinate, const D: usize> AddAssign for Point<T, D> {
    fn add_assign(&mut self, rhs: Self) {
        for (a, b) in self.coords.iter_mut().zip(rhs.coords) {
            *a += b;
        }
    }
}
