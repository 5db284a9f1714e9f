use thiserror::Error;

/// Faults reported by a single compositing call.
///
/// Both variants are local to one frame: the frame loop logs them and moves
/// on to the next frame.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompositeError {
    #[error(
        "mask is {mask_width}x{mask_height} but frame is {frame_width}x{frame_height}"
    )]
    DimensionMismatch {
        frame_width: u32,
        frame_height: u32,
        mask_width: u32,
        mask_height: u32,
    },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
