use ndarray::ArrayView2;

/// Per-pixel foreground probability produced by a segmentation model.
///
/// Row-major, one `f32` per pixel, higher means "more likely subject".
/// Values are expected in `[0.0, 1.0]` but are not clamped here; the
/// threshold comparison is well defined for any value.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbabilityMask {
    values: Vec<f32>,
    width: u32,
    height: u32,
}

impl ProbabilityMask {
    pub fn new(values: Vec<f32>, width: u32, height: u32) -> Result<Self, String> {
        let expected = (width as usize) * (height as usize);
        if values.len() != expected {
            return Err(format!(
                "mask has {} values, expected {expected} for {width}x{height}",
                values.len()
            ));
        }
        Ok(Self {
            values,
            width,
            height,
        })
    }

    pub fn filled(width: u32, height: u32, value: f32) -> Self {
        Self {
            values: vec![value; (width as usize) * (height as usize)],
            width,
            height,
        }
    }

    /// Builds a mask by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> f32) -> Self {
        let mut values = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            for x in 0..width {
                values.push(f(x, y));
            }
        }
        Self {
            values,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn value(&self, x: u32, y: u32) -> f32 {
        self.values[(y as usize) * (self.width as usize) + x as usize]
    }

    pub fn as_ndarray(&self) -> ArrayView2<'_, f32> {
        ArrayView2::from_shape((self.height as usize, self.width as usize), &self.values)
            .expect("Mask length must match dimensions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        let err = ProbabilityMask::new(vec![0.5; 5], 2, 3).unwrap_err();
        assert!(err.contains("expected 6"));
    }

    #[test]
    fn test_filled_and_value() {
        let mask = ProbabilityMask::filled(3, 2, 0.25);
        assert_eq!(mask.values().len(), 6);
        assert_eq!(mask.value(2, 1), 0.25);
    }

    #[test]
    fn test_from_fn_is_row_major() {
        let mask = ProbabilityMask::from_fn(3, 2, |x, y| (y * 3 + x) as f32);
        assert_eq!(mask.values(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(mask.value(1, 1), 4.0);
    }

    #[test]
    fn test_as_ndarray_is_height_by_width() {
        let mask = ProbabilityMask::from_fn(4, 2, |x, _| x as f32);
        let view = mask.as_ndarray();
        assert_eq!(view.shape(), &[2, 4]);
        assert_eq!(view[[1, 3]], 3.0);
    }
}
