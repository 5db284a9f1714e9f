/// Person segmentation using ONNX Runtime via `ort`.
///
/// Accepts any single-input model producing one probability (or logit)
/// plane per pixel, e.g. selfie-segmentation models.
use std::path::Path;

use crate::segmentation::domain::probability_mask::ProbabilityMask;
use crate::segmentation::domain::segmenter::Segmenter;
use crate::shared::constants::DEFAULT_SEGMENTATION_INPUT_SIZE;
use crate::shared::frame::Frame;

use super::execution_provider::preferred_execution_providers;

/// Channel order of the model's image input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TensorLayout {
    /// `[1, 3, H, W]`
    Nchw,
    /// `[1, H, W, 3]`
    Nhwc,
}

/// Layout and resolution the model expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputSpec {
    pub layout: TensorLayout,
    pub width: u32,
    pub height: u32,
}

/// How the model's output plane maps to probabilities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputActivation {
    /// Decided from the first output plane, then kept for the model's lifetime.
    #[default]
    Auto,
    /// Values already are probabilities; they are only clamped to [0, 1].
    Probability,
    /// Values are logits and go through a sigmoid.
    Logits,
}

/// Probability outputs may overshoot [0, 1] by this much from float rounding.
const PROBABILITY_TOLERANCE: f32 = 0.01;

impl OutputActivation {
    /// Resolves `Auto` from an output plane. Fixed modes are returned as is.
    pub fn resolve(self, plane: &[f32]) -> Self {
        match self {
            Self::Auto => {
                let range = -PROBABILITY_TOLERANCE..=1.0 + PROBABILITY_TOLERANCE;
                if plane.iter().any(|v| !v.is_nan() && !range.contains(v)) {
                    Self::Logits
                } else {
                    Self::Probability
                }
            }
            fixed => fixed,
        }
    }

    /// Maps a plane to probabilities in [0, 1] in place.
    pub fn apply(self, plane: &mut [f32]) {
        if self == Self::Logits {
            plane.iter_mut().for_each(|v| *v = sigmoid(*v));
        }
        plane.iter_mut().for_each(|v| *v = v.clamp(0.0, 1.0));
    }
}

pub struct OnnxSegmenter {
    session: ort::session::Session,
    input: InputSpec,
    activation: OutputActivation,
}

impl OnnxSegmenter {
    /// Load a segmentation model; the input layout and resolution are read
    /// from the model's first input, falling back to a square
    /// [`DEFAULT_SEGMENTATION_INPUT_SIZE`] when they are dynamic.
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(model_path)?;

        let input = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    Some(input_spec_from_shape(&shape.to_vec()))
                } else {
                    None
                }
            })
            .unwrap_or_else(|| input_spec_from_shape(&[]));

        log::info!(
            "Loaded segmentation model {} ({:?}, {}x{})",
            model_path.display(),
            input.layout,
            input.width,
            input.height
        );

        Ok(Self {
            session,
            input,
            activation: OutputActivation::Auto,
        })
    }

    /// Fixes how outputs are interpreted instead of detecting it.
    pub fn with_output_activation(mut self, activation: OutputActivation) -> Self {
        self.activation = activation;
        self
    }

    pub fn input_spec(&self) -> InputSpec {
        self.input
    }

    pub fn output_activation(&self) -> OutputActivation {
        self.activation
    }
}

impl Segmenter for OnnxSegmenter {
    fn segment(&mut self, frame: &Frame) -> Result<ProbabilityMask, Box<dyn std::error::Error>> {
        let input_tensor = preprocess(frame, self.input)?;
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("Segmentation model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let data: Vec<f32> = tensor.iter().copied().collect();

        let (mut plane, mask_w, mask_h) = squeeze_mask(tensor.shape(), &data)?;
        if self.activation == OutputActivation::Auto {
            self.activation = self.activation.resolve(&plane);
            log::info!("Segmentation output treated as {:?}", self.activation);
        }
        self.activation.apply(&mut plane);

        let mut resized = resize_bilinear(
            &plane,
            mask_w,
            mask_h,
            frame.width() as usize,
            frame.height() as usize,
        );
        resized.iter_mut().for_each(|v| *v = v.clamp(0.0, 1.0));

        Ok(ProbabilityMask::new(resized, frame.width(), frame.height())?)
    }
}

fn positive_dim(d: i64) -> Option<u32> {
    (d > 0).then_some(d as u32)
}

/// Reads layout and resolution from a model input shape. A dimension of 3 in
/// position 1 means NCHW, in position 3 means NHWC; anything else is treated
/// as NCHW. Dynamic (non-positive) spatial dimensions use the fallback size.
pub fn input_spec_from_shape(shape: &[i64]) -> InputSpec {
    let fallback = DEFAULT_SEGMENTATION_INPUT_SIZE;
    if shape.len() != 4 {
        return InputSpec {
            layout: TensorLayout::Nchw,
            width: fallback,
            height: fallback,
        };
    }

    let (layout, h, w) = if shape[3] == 3 && shape[1] != 3 {
        (TensorLayout::Nhwc, shape[1], shape[2])
    } else {
        (TensorLayout::Nchw, shape[2], shape[3])
    };

    InputSpec {
        layout,
        width: positive_dim(w).unwrap_or(fallback),
        height: positive_dim(h).unwrap_or(fallback),
    }
}

/// Source sample position for destination index `i`, with corners aligned.
/// Returns the two neighbouring source indices and the blend weight.
fn source_coord(i: usize, src_len: usize, dst_len: usize) -> (usize, usize, f32) {
    let pos = i as f32 * (src_len as f32 - 1.0) / (dst_len as f32 - 1.0).max(1.0);
    let i0 = (pos.floor() as usize).min(src_len - 1);
    let i1 = (i0 + 1).min(src_len - 1);
    (i0, i1, pos - i0 as f32)
}

/// Bilinear resize of the frame to the model resolution, scaled to [0, 1].
pub fn preprocess(frame: &Frame, spec: InputSpec) -> Result<ndarray::Array4<f32>, String> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(format!(
            "Cannot segment an empty {}x{} frame",
            frame.width(),
            frame.height()
        ));
    }
    let (tw, th) = (spec.width as usize, spec.height as usize);
    let shape = match spec.layout {
        TensorLayout::Nchw => (1, 3, th, tw),
        TensorLayout::Nhwc => (1, th, tw, 3),
    };
    let mut tensor = ndarray::Array4::<f32>::zeros(shape);

    let src = frame.as_ndarray();
    let (sw, sh) = (frame.width() as usize, frame.height() as usize);

    for y in 0..th {
        let (y0, y1, fy) = source_coord(y, sh, th);
        for x in 0..tw {
            let (x0, x1, fx) = source_coord(x, sw, tw);
            for c in 0..3 {
                let v = src[[y0, x0, c]] as f32 * (1.0 - fx) * (1.0 - fy)
                    + src[[y0, x1, c]] as f32 * fx * (1.0 - fy)
                    + src[[y1, x0, c]] as f32 * (1.0 - fx) * fy
                    + src[[y1, x1, c]] as f32 * fx * fy;
                let v = v / 255.0;
                match spec.layout {
                    TensorLayout::Nchw => tensor[[0, c, y, x]] = v,
                    TensorLayout::Nhwc => tensor[[0, y, x, c]] = v,
                }
            }
        }
    }

    Ok(tensor)
}

/// Reduces a model output to a single `H x W` plane.
///
/// Accepts `[H, W]`, `[N, H, W]`, `[1, C, H, W]` and `[1, H, W, C]`. With
/// several channels the last one is taken (two-class models put the person
/// class last). Channels-last is assumed when the trailing dimension is
/// small (at most 4) and smaller than the second one.
pub fn squeeze_mask(shape: &[usize], data: &[f32]) -> Result<(Vec<f32>, usize, usize), String> {
    let expected: usize = shape.iter().product();
    if expected != data.len() || expected == 0 {
        return Err(format!(
            "Unexpected segmentation output: shape {shape:?} with {} values",
            data.len()
        ));
    }

    match *shape {
        [h, w] => Ok((data.to_vec(), w, h)),
        [n, h, w] => {
            let plane = h * w;
            Ok((data[(n - 1) * plane..].to_vec(), w, h))
        }
        [_, c, h, w] if !(w <= 4 && w < c) => {
            let plane = h * w;
            Ok((data[(c - 1) * plane..c * plane].to_vec(), w, h))
        }
        [_, h, w, c] => {
            let values = (0..h * w).map(|p| data[p * c + c - 1]).collect();
            Ok((values, w, h))
        }
        _ => Err(format!("Unsupported segmentation output rank: {shape:?}")),
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Bilinear resize of a single-channel float plane.
pub fn resize_bilinear(
    data: &[f32],
    width: usize,
    height: usize,
    target_w: usize,
    target_h: usize,
) -> Vec<f32> {
    if width == target_w && height == target_h {
        return data.to_vec();
    }
    if width == 0 || height == 0 {
        return vec![0.0; target_w * target_h];
    }

    let mut out = vec![0.0f32; target_w * target_h];
    for y in 0..target_h {
        let (y0, y1, fy) = source_coord(y, height, target_h);
        for x in 0..target_w {
            let (x0, x1, fx) = source_coord(x, width, target_w);
            out[y * target_w + x] = data[y0 * width + x0] * (1.0 - fx) * (1.0 - fy)
                + data[y0 * width + x1] * fx * (1.0 - fy)
                + data[y1 * width + x0] * (1.0 - fx) * fy
                + data[y1 * width + x1] * fx * fy;
        }
    }
    out
}
