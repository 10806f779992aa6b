//! Lifecycle management for planning components

use crate::error::{PlanningError, Result};
use tracing::debug;

/// Trait for components that follow a lifecycle pattern
pub trait LifecycleNode: Send + Sync {
    /// Configure the node
    fn on_configure(&mut self) -> Result<()>;

    /// Activate the node
    fn on_activate(&mut self) -> Result<()>;

    /// Deactivate the node
    fn on_deactivate(&mut self) -> Result<()>;

    /// Clean up the node
    fn on_cleanup(&mut self) -> Result<()>;

    /// Current lifecycle state
    fn state(&self) -> State;
}

/// State of a lifecycle node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unconfigured,
    Inactive,
    Active,
    Finalized,
}

impl State {
    /// Whether a node may move from `self` to `to`
    ///
    /// Finalized is terminal and reachable from every other state.
    pub fn can_transition_to(self, to: State) -> bool {
        matches!(
            (self, to),
            (State::Unconfigured, State::Inactive)
                | (State::Inactive, State::Active)
                | (State::Active, State::Inactive)
                | (State::Inactive, State::Unconfigured)
                | (State::Unconfigured | State::Inactive | State::Active, State::Finalized)
        )
    }
}

/// Base implementation for lifecycle nodes
#[derive(Debug, Clone)]
pub struct LifecycleNodeBase {
    pub name: String,
    state: State,
}

impl LifecycleNodeBase {
    /// Create a new lifecycle node base
    pub fn new(name: &str) -> Self {
        LifecycleNodeBase {
            name: name.to_string(),
            state: State::Unconfigured,
        }
    }

    /// Get the current state
    pub fn state(&self) -> State {
        self.state
    }

    /// Whether the node is active
    pub fn is_active(&self) -> bool {
        self.state == State::Active
    }

    /// Move to `to`, rejecting transitions the lifecycle does not allow
    pub fn transition(&mut self, to: State) -> Result<()> {
        if !self.state.can_transition_to(to) {
            return Err(PlanningError::InvalidTransition { from: self.state, to });
        }
        debug!("{}: {:?} -> {:?}", self.name, self.state, to);
        self.state = to;
        Ok(())
    }
}
