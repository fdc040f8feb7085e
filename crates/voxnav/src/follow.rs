//! Cancellable periodic pursuit of a peer agent.

use core::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};
use voxnav_core::IntoVoxelPos;

use crate::controller::NavShared;
use crate::{Goal, Planner};

const FOLLOW_LABEL: &str = "follow";

struct FollowState {
    stopped: AtomicBool,
    /// Held for the duration of a tick so `cancel` never interleaves with
    /// a half-issued goal.
    tick_lock: Mutex<()>,
}

impl FollowState {
    fn lock_tick(&self) -> MutexGuard<'_, ()> {
        self.tick_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to a running `follow_agent` loop.
///
/// Dropping the handle cancels the loop.
pub struct FollowHandle {
    state: Arc<FollowState>,
    nav: Arc<NavShared>,
    planner: Arc<dyn Planner>,
    task: Option<JoinHandle<()>>,
}

impl FollowHandle {
    pub(crate) fn spawn(
        nav: Arc<NavShared>,
        planner: Arc<dyn Planner>,
        peer: String,
        radius: f64,
    ) -> Self {
        let state = Arc::new(FollowState {
            stopped: AtomicBool::new(false),
            tick_lock: Mutex::new(()),
        });
        info!("{}: following {} (radius {})", nav.agent, peer, radius);
        let task = tokio::spawn(follow_loop(
            state.clone(),
            nav.clone(),
            planner.clone(),
            peer,
            radius,
        ));
        Self {
            state,
            nav,
            planner,
            task: Some(task),
        }
    }

    /// Stop following: halt the tick, clear the planner goal and the
    /// coordinator claim. Safe to call any number of times.
    pub fn cancel(&self) {
        let _tick = self.state.lock_tick();
        if self.state.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(task) = &self.task {
            task.abort();
        }
        self.planner.stop();
        self.nav.clear_goal();
        debug!("{}: follow cancelled", self.nav.agent);
    }

    /// Whether the loop is still ticking.
    pub fn is_active(&self) -> bool {
        !self.state.stopped.load(Ordering::SeqCst)
    }

    /// Whether the background task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl fmt::Debug for FollowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FollowHandle")
            .field("agent", &self.nav.agent)
            .field("active", &self.is_active())
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl Drop for FollowHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn follow_loop(
    state: Arc<FollowState>,
    nav: Arc<NavShared>,
    planner: Arc<dyn Planner>,
    peer: String,
    radius: f64,
) {
    let mut interval = time::interval(nav.config.follow_tick());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let _tick = state.lock_tick();
        if state.stopped.load(Ordering::SeqCst) {
            break;
        }

        let Some(peer_pos) = nav.world.peer_position(&peer) else {
            if !state.stopped.swap(true, Ordering::SeqCst) {
                info!("{}: lost sight of {}, no longer following", nav.agent, peer);
                planner.stop();
                nav.clear_goal();
            }
            break;
        };

        let close_enough = nav
            .world
            .position()
            .is_some_and(|own| own.distance(peer_pos) <= radius + nav.config.follow_slack);
        if close_enough {
            continue;
        }

        let Ok(target) = peer_pos.into_voxel_pos() else {
            continue;
        };
        let target = nav.negotiate_target(target);
        nav.register_goal(target, FOLLOW_LABEL);
        debug!("{}: follow goal updated to {}", nav.agent, target);
        planner.set_goal(Goal::near(target, radius), true);
    }
}
