pub mod atomic_blur_control;
pub mod atomic_stop_signal;
pub mod interrupt_stop_signal;
pub mod stdin_control_surface;
