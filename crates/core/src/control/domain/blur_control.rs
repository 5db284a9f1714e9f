/// Live source of the blur strength, typically a slider.
///
/// Written asynchronously by the control surface; the frame loop reads one
/// snapshot per frame. Reads must be non-blocking and never torn.
pub trait BlurControl: Send + Sync {
    fn current_strength(&self) -> i64;
}
