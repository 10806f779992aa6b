//! Error types for the planning stack

use crate::lifecycle::State;
use thiserror::Error;

/// Result type for planning operations.
pub type Result<T> = std::result::Result<T, PlanningError>;

/// Errors raised by points, grids, planner configuration and the navigation stack.
///
/// Planning failure itself is not an error: planners report it as an empty path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanningError {
    /// Component index outside `[0, dimension)`.
    #[error("index {index} out of range for {dimension}-dimensional point")]
    IndexOutOfRange {
        /// Requested component index.
        index: usize,
        /// Dimension of the point.
        dimension: usize,
    },

    /// Occupancy data length does not match `width * height`.
    #[error("grid data has {actual} cells, expected {expected}")]
    GridSizeMismatch {
        /// `width * height`.
        expected: usize,
        /// Length of the supplied data.
        actual: usize,
    },

    /// Grid resolution must be finite and positive.
    #[error("invalid grid resolution {0}")]
    InvalidResolution(f64),

    /// A planner parameter was rejected.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter key.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Lifecycle transition not allowed from the current state.
    #[error("cannot transition from {from:?} to {to:?}")]
    InvalidTransition {
        /// Current state.
        from: State,
        /// Requested state.
        to: State,
    },

    /// Operation requires an active component.
    #[error("component is not active")]
    NotActive,
}

impl PlanningError {
    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        PlanningError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
