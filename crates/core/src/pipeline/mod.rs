pub mod blur_background_image_use_case;
pub mod blur_background_use_case;
pub mod frame_processor;
pub mod infrastructure;
pub mod pipeline_executor;
pub mod pipeline_logger;
