//! Navigation controller: negotiation, cache reuse, planning, cleanup.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, info, warn};
use voxnav_cache::{CacheDebugInfo, CacheStatsReport, RouteCache};
use voxnav_core::{AgentId, AgentWorld, BlockWorld, Clock, IntoVoxelPos, SystemClock, VoxelPos};

use crate::follow::FollowHandle;
use crate::profile::DiggingBiasFrame;
use crate::{
    Coordinator, DiggingBias, Gaze, Goal, MovementProfile, NavConfig, NavError, NavOutcome,
    NavigationRequest, NavigatorConfig, Planner, ProfileOverride, ScaffoldingProvider,
};

const DEFAULT_LABEL: &str = "goto";

/// Collaborators and per-agent state shared with background follow tasks.
pub(crate) struct NavShared {
    pub(crate) agent: AgentId,
    pub(crate) world: Arc<dyn AgentWorld>,
    pub(crate) planner: Option<Arc<dyn Planner>>,
    pub(crate) coordinator: Option<Arc<dyn Coordinator>>,
    gaze: Option<Arc<dyn Gaze>>,
    scaffolding: Option<Arc<dyn ScaffoldingProvider>>,
    pub(crate) config: NavigatorConfig,
    cache: Mutex<RouteCache>,
    digging: Mutex<Vec<DiggingBiasFrame>>,
}

impl NavShared {
    fn cache(&self) -> MutexGuard<'_, RouteCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn current_voxel(&self) -> Option<VoxelPos> {
        self.world.position()?.into_voxel_pos().ok()
    }

    /// Swap `target` for a free alternative when a peer already claims it.
    ///
    /// Best effort: without a coordinator, or when no alternative exists,
    /// the original target is kept.
    pub(crate) fn negotiate_target(&self, target: VoxelPos) -> VoxelPos {
        let Some(coordinator) = &self.coordinator else {
            return target;
        };
        if !coordinator.is_occupied(target, &self.agent, self.config.occupancy_proximity) {
            return target;
        }
        match coordinator.find_alternative(
            target,
            &self.agent,
            self.config.alternative_search_radius,
        ) {
            Some(alternative) => {
                info!(
                    "{}: target {} is occupied, using {} instead",
                    self.agent, target, alternative
                );
                alternative
            }
            None => {
                debug!(
                    "{}: target {} is occupied and no alternative was found",
                    self.agent, target
                );
                target
            }
        }
    }

    pub(crate) fn register_goal(&self, pos: VoxelPos, label: &str) -> bool {
        let Some(coordinator) = &self.coordinator else {
            return false;
        };
        coordinator.register_goal(&self.agent, pos, label);
        true
    }

    pub(crate) fn clear_goal(&self) {
        if let Some(coordinator) = &self.coordinator {
            coordinator.clear_goal(&self.agent);
        }
    }

    fn scaffolding_profile(&self, planner: &dyn Planner, aggressive: bool) -> MovementProfile {
        match &self.scaffolding {
            Some(provider) => provider.create_profile(aggressive),
            None => {
                debug!(
                    "{}: no scaffolding provider, using fallback allow-list",
                    self.agent
                );
                planner.movement_profile().with_fallback_scaffolding()
            }
        }
    }
}

/// Restores everything a navigation call changed, exactly once, however the
/// call ends (success, error, timeout, or the future being dropped).
struct NavigationScope<'a> {
    nav: &'a NavShared,
    paused_gaze: bool,
    registered: bool,
    saved_profile: Option<(Arc<dyn Planner>, MovementProfile)>,
}

impl<'a> NavigationScope<'a> {
    fn new(nav: &'a NavShared) -> Self {
        Self {
            nav,
            paused_gaze: false,
            registered: false,
            saved_profile: None,
        }
    }

    fn pause_gaze(&mut self) {
        if let Some(gaze) = &self.nav.gaze {
            if !gaze.is_paused() {
                gaze.pause();
                self.paused_gaze = true;
            }
        }
    }

    fn register(&mut self, pos: VoxelPos, label: &str) {
        self.registered = self.nav.register_goal(pos, label);
    }

    fn override_profile(&mut self, planner: &Arc<dyn Planner>, choice: ProfileOverride) {
        let profile = match choice {
            ProfileOverride::Keep => return,
            ProfileOverride::Explicit(profile) => profile,
            ProfileOverride::Scaffolding { aggressive } => {
                self.nav.scaffolding_profile(planner.as_ref(), aggressive)
            }
        };
        self.saved_profile = Some((planner.clone(), planner.movement_profile()));
        planner.set_movement_profile(profile);
    }
}

impl Drop for NavigationScope<'_> {
    fn drop(&mut self) {
        if let Some((planner, profile)) = self.saved_profile.take() {
            planner.set_movement_profile(profile);
        }
        if self.registered {
            self.nav.clear_goal();
        }
        if self.paused_gaze {
            if let Some(gaze) = &self.nav.gaze {
                gaze.resume();
            }
        }
    }
}

/// Per-agent navigation entry point.
///
/// Assumes at most one in-flight `goto` per agent: overlapping calls are not
/// serialized and would interleave profile overrides and goal registration.
pub struct NavigationController {
    shared: Arc<NavShared>,
}

impl NavigationController {
    pub fn builder<W>(agent: impl Into<AgentId>, world: Arc<W>) -> NavigationControllerBuilder
    where
        W: AgentWorld + 'static,
    {
        let block_world: Arc<dyn BlockWorld> = world.clone();
        NavigationControllerBuilder {
            agent: agent.into(),
            world,
            block_world,
            planner: None,
            coordinator: None,
            gaze: None,
            scaffolding: None,
            config: NavConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn agent(&self) -> &AgentId {
        &self.shared.agent
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.shared.config
    }

    /// Navigate to `target` with default timeout, label and arrival radius.
    pub async fn goto(&self, target: impl IntoVoxelPos) -> Result<NavOutcome, NavError> {
        self.navigate(NavigationRequest::new(target)?).await
    }

    /// Navigate next to a block (arrival radius 1.5 by default).
    pub async fn goto_block(
        &self,
        pos: impl IntoVoxelPos,
        timeout: Option<Duration>,
        label: Option<&str>,
    ) -> Result<NavOutcome, NavError> {
        let mut request = NavigationRequest::new(pos)?
            .with_acceptance_radius(self.shared.config.block_acceptance_radius);
        request.timeout = timeout;
        request.label = label.map(str::to_string);
        self.navigate(request).await
    }

    /// Navigate to within `radius` of a visible peer (3 blocks by default).
    pub async fn goto_agent(
        &self,
        name: &str,
        radius: Option<f64>,
    ) -> Result<NavOutcome, NavError> {
        let radius = radius.unwrap_or(self.shared.config.default_follow_radius);
        let pos = self
            .shared
            .world
            .peer_position(name)
            .ok_or_else(|| NavError::AgentNotVisible(name.to_string()))?;
        let request = NavigationRequest::new(pos)?
            .with_acceptance_radius(radius)
            .with_label(format!("goto_agent:{name}"));
        self.navigate(request).await
    }

    /// Run one navigation request end to end.
    pub async fn navigate(&self, request: NavigationRequest) -> Result<NavOutcome, NavError> {
        let nav = self.shared.as_ref();
        let target = request.target;
        let timeout = request
            .timeout
            .unwrap_or_else(|| nav.config.default_timeout());
        let acceptance_radius = request
            .acceptance_radius
            .unwrap_or(nav.config.default_acceptance_radius);
        let label = request.label.as_deref().unwrap_or(DEFAULT_LABEL);
        // Shared by the cached attempt and the fresh plan.
        let deadline = Instant::now() + timeout;

        let mut scope = NavigationScope::new(nav);
        scope.pause_gaze();

        let effective_target = nav.negotiate_target(target);
        scope.register(effective_target, label);

        let Some(planner) = nav.planner.clone() else {
            warn!("{}: cannot navigate to {}, no planner", nav.agent, target);
            return Err(NavError::PlannerUnavailable);
        };

        scope.override_profile(&planner, request.options.profile);

        let goal = Goal::near(effective_target, acceptance_radius);
        let start = nav.current_voxel();
        debug!(
            "{}: navigating to {} ({}, timeout {:?})",
            nav.agent, effective_target, label, timeout
        );

        if let Some(start) = start {
            let hit = nav.cache().get(start, effective_target).is_some();
            if hit {
                let started = Instant::now();
                match time::timeout_at(deadline, planner.goto(goal)).await {
                    Ok(Ok(())) => {
                        let elapsed = started.elapsed();
                        drop(scope);
                        time::sleep(nav.config.settle_delay()).await;
                        return Ok(NavOutcome {
                            target,
                            effective_target,
                            from_cache: true,
                            cached: false,
                            elapsed,
                        });
                    }
                    Ok(Err(err)) => {
                        debug!(
                            "{}: cached route to {} failed ({}), replanning",
                            nav.agent, effective_target, err
                        );
                    }
                    Err(_) => {
                        planner.stop();
                        debug!(
                            "{}: cached route to {} timed out, replanning",
                            nav.agent, effective_target
                        );
                    }
                }
                nav.cache()
                    .invalidate_near(start, nav.config.cache_failure_invalidation_radius);
            }
        }

        let started = Instant::now();
        match time::timeout_at(deadline, planner.goto(goal)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(
                    "{}: planner failed to reach {}: {}",
                    nav.agent, effective_target, err
                );
                return Err(err.into());
            }
            Err(_) => {
                planner.stop();
                warn!(
                    "{}: navigation to {} timed out after {:?}",
                    nav.agent, effective_target, timeout
                );
                return Err(NavError::Timeout {
                    target: effective_target,
                    timeout,
                });
            }
        }
        let elapsed = started.elapsed();

        let mut cached = false;
        if elapsed > nav.config.slow_plan_threshold() {
            if let (Some(start), Some(waypoints)) = (start, planner.last_path()) {
                let cost = elapsed.as_secs_f64() * 1000.0;
                cached = nav.cache().put(start, effective_target, waypoints, cost);
            }
        }

        drop(scope);
        time::sleep(nav.config.settle_delay()).await;
        Ok(NavOutcome {
            target,
            effective_target,
            from_cache: false,
            cached,
            elapsed,
        })
    }

    /// Keep pursuing a peer until cancelled or the peer disappears.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn follow_agent(
        &self,
        name: &str,
        radius: Option<f64>,
    ) -> Result<FollowHandle, NavError> {
        let radius = radius.unwrap_or(self.shared.config.default_follow_radius);
        let planner = self
            .shared
            .planner
            .clone()
            .ok_or(NavError::PlannerUnavailable)?;
        Ok(FollowHandle::spawn(
            self.shared.clone(),
            planner,
            name.to_string(),
            radius,
        ))
    }

    /// Clear the planner goal and the coordinator claim. Idempotent.
    pub fn stop(&self) {
        if let Some(planner) = &self.shared.planner {
            planner.stop();
        }
        self.shared.clear_goal();
    }

    /// Bias the planner against breaking terrain until the matching
    /// [`pop_digging_bias`](Self::pop_digging_bias). Returns the stack depth.
    pub fn push_conservative_digging(&self, bias: DiggingBias) -> usize {
        let nav = self.shared.as_ref();
        let mut stack = nav.digging.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(planner) = &nav.planner else {
            return stack.len();
        };
        let mut profile = planner.movement_profile();
        stack.push(DiggingBiasFrame::capture(&profile));
        bias.apply(&mut profile);
        planner.set_movement_profile(profile);
        debug!("{}: digging bias pushed (depth {})", nav.agent, stack.len());
        stack.len()
    }

    /// Undo the most recent digging bias. Popping an empty stack is a no-op.
    pub fn pop_digging_bias(&self) -> usize {
        let nav = self.shared.as_ref();
        let mut stack = nav.digging.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(frame) = stack.pop() else {
            return 0;
        };
        if let Some(planner) = &nav.planner {
            let mut profile = planner.movement_profile();
            frame.restore(&mut profile);
            planner.set_movement_profile(profile);
        }
        debug!("{}: digging bias popped (depth {})", nav.agent, stack.len());
        stack.len()
    }

    pub fn digging_bias_depth(&self) -> usize {
        self.shared
            .digging
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn cache_stats(&self) -> CacheStatsReport {
        self.shared.cache().stats()
    }

    pub fn cache_debug_info(&self) -> CacheDebugInfo {
        self.shared.cache().debug_info()
    }

    /// Use count of the cached route between two points, if one is stored.
    pub fn cached_use_count(&self, start: VoxelPos, end: VoxelPos) -> Option<u64> {
        let mut cache = self.shared.cache();
        cache.process_world_updates();
        cache.peek(start, end).map(|route| route.use_count)
    }

    pub fn invalidate_cache_near(&self, pos: VoxelPos, radius: f64) -> usize {
        self.shared.cache().invalidate_near(pos, radius)
    }

    /// Stop navigating and release the route cache (unsubscribes from block
    /// updates). Idempotent.
    pub fn dispose(&self) {
        self.stop();
        self.shared.cache().dispose();
    }
}

pub struct NavigationControllerBuilder {
    agent: AgentId,
    world: Arc<dyn AgentWorld>,
    block_world: Arc<dyn BlockWorld>,
    planner: Option<Arc<dyn Planner>>,
    coordinator: Option<Arc<dyn Coordinator>>,
    gaze: Option<Arc<dyn Gaze>>,
    scaffolding: Option<Arc<dyn ScaffoldingProvider>>,
    config: NavConfig,
    clock: Arc<dyn Clock>,
}

impl NavigationControllerBuilder {
    pub fn planner(mut self, planner: Arc<dyn Planner>) -> Self {
        self.planner = Some(planner);
        self
    }

    pub fn coordinator(mut self, coordinator: Arc<dyn Coordinator>) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    pub fn gaze(mut self, gaze: Arc<dyn Gaze>) -> Self {
        self.gaze = Some(gaze);
        self
    }

    pub fn scaffolding(mut self, provider: Arc<dyn ScaffoldingProvider>) -> Self {
        self.scaffolding = Some(provider);
        self
    }

    pub fn config(mut self, config: NavConfig) -> Self {
        self.config = config;
        self
    }

    /// Clock used by the route cache for expiry and recency.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> NavigationController {
        let cache = RouteCache::with_clock(self.config.cache, self.block_world, self.clock);
        NavigationController {
            shared: Arc::new(NavShared {
                agent: self.agent,
                world: self.world,
                planner: self.planner,
                coordinator: self.coordinator,
                gaze: self.gaze,
                scaffolding: self.scaffolding,
                config: self.config.navigation,
                cache: Mutex::new(cache),
                digging: Mutex::new(Vec::new()),
            }),
        }
    }
}
