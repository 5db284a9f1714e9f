pub mod foreground_mask;
pub mod probability_mask;
pub mod segmenter;
