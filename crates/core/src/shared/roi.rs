/// Axis-aligned pixel rectangle inside a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoiRect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl RoiRect {
    pub fn full(width: usize, height: usize) -> Self {
        Self {
            x: 0,
            y: 0,
            w: width,
            h: height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Grows the rectangle by `margin` on every side, clipped to the frame.
    pub fn expand(&self, margin: usize, frame_width: usize, frame_height: usize) -> Self {
        let x0 = self.x.saturating_sub(margin);
        let y0 = self.y.saturating_sub(margin);
        let x1 = (self.x + self.w).saturating_add(margin).min(frame_width);
        let y1 = (self.y + self.h).saturating_add(margin).min(frame_height);
        Self {
            x: x0,
            y: y0,
            w: x1.saturating_sub(x0),
            h: y1.saturating_sub(y0),
        }
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }
}

/// Copies a rectangular ROI out of interleaved frame data into `roi`.
pub fn extract_roi(data: &[u8], frame_width: usize, channels: usize, rect: RoiRect, roi: &mut Vec<u8>) {
    roi.resize(rect.w * rect.h * channels, 0);
    let row_len = rect.w * channels;
    for row in 0..rect.h {
        let src_offset = ((rect.y + row) * frame_width + rect.x) * channels;
        let dst_offset = row * row_len;
        roi[dst_offset..dst_offset + row_len].copy_from_slice(&data[src_offset..src_offset + row_len]);
    }
}
