/// Pure observer of walk trials. Invoked after every trial move with the
/// (possibly updated) current state; must not mutate anything the walker
/// can see.
pub trait WalkEvent: Send + Sync {
    fn on_trial(&self, x: &[f64], e: f64, accepted: bool);
}
