use std::time::Duration;

use thiserror::Error;
use voxnav_core::{PositionError, VoxelPos};

/// Opaque failure reported by a path planner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PlannerError {
    message: String,
}

impl PlannerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors surfaced by navigation calls.
///
/// Occupancy negotiation and cache problems are recovered locally and never
/// show up here.
#[derive(Debug, Error)]
pub enum NavError {
    /// The target could not be parsed; nothing was touched.
    #[error("invalid position: {0}")]
    InvalidPosition(#[from] PositionError),

    #[error("no path planner is available")]
    PlannerUnavailable,

    #[error("navigation to {target} timed out after {timeout:?}")]
    Timeout { target: VoxelPos, timeout: Duration },

    #[error(transparent)]
    Planner(#[from] PlannerError),

    #[error("agent {0} is not visible")]
    AgentNotVisible(String),
}
