use std::path::Path;

use crate::compositing::domain::compositor::Compositor;
use crate::control::domain::blur_control::BlurControl;
use crate::segmentation::domain::segmenter::Segmenter;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;

/// Single-image pipeline: read → segment → composite → write.
///
/// Unlike the frame loop there is no next frame to fall back on, so every
/// failure is returned to the caller.
pub struct BlurBackgroundImageUseCase {
    reader: Box<dyn VideoReader>,
    image_writer: Box<dyn ImageWriter>,
    segmenter: Box<dyn Segmenter>,
    compositor: Compositor,
}

impl BlurBackgroundImageUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        image_writer: Box<dyn ImageWriter>,
        segmenter: Box<dyn Segmenter>,
        compositor: Compositor,
    ) -> Self {
        Self {
            reader,
            image_writer,
            segmenter,
            compositor,
        }
    }

    pub fn execute(
        &mut self,
        input_path: &Path,
        output_path: &Path,
        control: &dyn BlurControl,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.reader.open(input_path)?;
        let frame = self.reader.frames().next().ok_or("No frames in image");
        self.reader.close();
        let frame = frame??;

        let mask = self.segmenter.segment(&frame)?;
        let output = self
            .compositor
            .composite(&frame, &mask, control.current_strength())?;
        self.image_writer.write(output_path, &output)?;

        Ok(())
    }
}
