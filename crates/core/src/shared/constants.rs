/// Probability a mask value must strictly exceed to count as foreground.
pub const DEFAULT_FOREGROUND_THRESHOLD: f32 = 0.1;

/// Smallest blur kernel size the compositor will apply.
pub const MIN_BLUR_STRENGTH: u32 = 5;

/// Blur kernel size used until the control surface changes it.
pub const DEFAULT_BLUR_STRENGTH: u32 = 35;

/// Largest blur kernel size the control surface offers.
pub const MAX_BLUR_STRENGTH: u32 = 99;

/// Model input resolution used when the model's input shape is dynamic.
pub const DEFAULT_SEGMENTATION_INPUT_SIZE: u32 = 256;

/// Processing resolution requested from capture devices.
pub const CAPTURE_WIDTH: u32 = 640;
pub const CAPTURE_HEIGHT: u32 = 480;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
