pub mod background_blurrer;
pub mod blur_strength;
pub mod composite_error;
pub mod compositor;
pub mod compositor_config;
