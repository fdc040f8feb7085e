use std::time::Duration;

use voxnav_core::{IntoVoxelPos, VoxelPos};

use crate::{MovementProfile, NavError};

/// Movement profile to use for the duration of one request.
#[derive(Debug, Clone, Default)]
pub enum ProfileOverride {
    /// Keep whatever profile the planner currently has.
    #[default]
    Keep,
    /// Use this profile.
    Explicit(MovementProfile),
    /// Derive a scaffolding profile (from the provider when one is
    /// configured, otherwise the fixed fallback allow-list).
    Scaffolding { aggressive: bool },
}

#[derive(Debug, Clone, Default)]
pub struct NavigationOptions {
    pub profile: ProfileOverride,
}

/// One navigation call. Unset fields take the controller's configured
/// defaults.
#[derive(Debug, Clone)]
pub struct NavigationRequest {
    pub target: VoxelPos,
    pub timeout: Option<Duration>,
    pub label: Option<String>,
    pub acceptance_radius: Option<f64>,
    pub options: NavigationOptions,
}

impl NavigationRequest {
    /// Parse `target`; fails with [`NavError::InvalidPosition`] before
    /// anything else happens.
    pub fn new(target: impl IntoVoxelPos) -> Result<Self, NavError> {
        Ok(Self {
            target: target.into_voxel_pos()?,
            timeout: None,
            label: None,
            acceptance_radius: None,
            options: NavigationOptions::default(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_acceptance_radius(mut self, radius: f64) -> Self {
        self.acceptance_radius = Some(radius);
        self
    }

    pub fn with_profile(mut self, profile: ProfileOverride) -> Self {
        self.options.profile = profile;
        self
    }
}

/// What a successful navigation did.
#[derive(Debug, Clone, PartialEq)]
pub struct NavOutcome {
    /// Requested destination.
    pub target: VoxelPos,
    /// Destination actually navigated to after occupancy negotiation.
    pub effective_target: VoxelPos,
    /// Arrived by following a cached route.
    pub from_cache: bool,
    /// A freshly planned route was stored in the cache.
    pub cached: bool,
    /// Time spent in the planner, excluding the settle delay.
    pub elapsed: Duration,
}
