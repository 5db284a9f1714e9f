pub mod compositing;
pub mod control;
pub mod pipeline;
pub mod segmentation;
pub mod shared;
pub mod video;
