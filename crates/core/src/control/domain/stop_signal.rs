/// Cooperative stop request, polled once per frame-loop iteration.
pub trait StopSignal: Send + Sync {
    fn should_stop(&self) -> bool;
}
