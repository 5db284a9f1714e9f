pub mod blur_control;
pub mod stop_signal;
