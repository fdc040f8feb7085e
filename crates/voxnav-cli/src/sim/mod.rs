//! In-process stand-ins for the world, planner and coordinator.

mod coordinator;
mod planner;
mod world;

pub use coordinator::LocalCoordinator;
pub use planner::AStarPlanner;
pub use world::{SimWorld, STONE};
