/// Idle look-around behavior that must not fight navigation for the head.
///
/// `pause` and `resume` are idempotent.
pub trait Gaze: Send + Sync {
    fn pause(&self);
    fn resume(&self);
    fn is_paused(&self) -> bool;
}
