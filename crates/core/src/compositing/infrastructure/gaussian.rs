/// Sigma for a given kernel size when none is specified.
///
/// Same rule OpenCV applies for `sigma = 0`, so a given slider value
/// produces the softness users of the classic demo expect.
pub fn default_sigma(kernel_size: usize) -> f64 {
    0.3 * ((kernel_size as f64 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Precompute a normalized 1D Gaussian kernel of the given size.
///
/// `kernel_size` must be odd and >= 1.
pub fn gaussian_kernel_1d(kernel_size: usize) -> Vec<f32> {
    debug_assert!(kernel_size >= 1 && kernel_size % 2 == 1);
    if kernel_size == 1 {
        return vec![1.0];
    }
    let sigma = default_sigma(kernel_size);
    let half = (kernel_size / 2) as f64;
    let mut kernel_f64: Vec<f64> = (0..kernel_size)
        .map(|i| {
            let x = i as f64 - half;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = kernel_f64.iter().sum();
    for v in &mut kernel_f64 {
        *v /= sum;
    }
    kernel_f64.iter().map(|&v| v as f32).collect()
}

/// Tail taps summed one by one before falling back to block sums.
const EXACT_TAIL_TAPS: usize = 1 << 16;

/// Kernel of `kernel_size` taps folded for buffers no longer than `max_len`.
///
/// Under edge replication every tap further than `max_len - 1` from the
/// centre samples the edge pixel, so those taps are summed into the two end
/// taps. The result has at most `2 * max_len - 1` taps and blurs identically
/// to the unfolded kernel, whatever `kernel_size` is.
pub fn folded_kernel_1d(kernel_size: usize, max_len: usize) -> Vec<f32> {
    debug_assert!(kernel_size >= 1 && kernel_size % 2 == 1);
    let half = kernel_size / 2;
    let reach = max_len.saturating_sub(1);
    if half <= reach {
        return gaussian_kernel_1d(kernel_size);
    }
    if reach == 0 {
        return vec![1.0];
    }

    let sigma = default_sigma(kernel_size);
    let weight = |d: usize| {
        let x = d as f64;
        (-x * x / (2.0 * sigma * sigma)).exp()
    };
    let tail = gaussian_tail_sum(reach + 1, half, &weight);

    let mut side: Vec<f64> = (0..=reach).map(weight).collect();
    side[reach] += tail;
    let sum = side[0] + 2.0 * side[1..].iter().sum::<f64>();

    (0..2 * reach + 1)
        .map(|i| (side[i.abs_diff(reach)] / sum) as f32)
        .collect()
}

/// Sum of `weight(d)` for `d` in `from..=to`.
///
/// Long tails are summed in equal blocks evaluated at their midpoint, which
/// keeps the cost bounded for arbitrarily large kernels.
fn gaussian_tail_sum(from: usize, to: usize, weight: &dyn Fn(usize) -> f64) -> f64 {
    if from > to {
        return 0.0;
    }
    let count = to - from + 1;
    if count <= EXACT_TAIL_TAPS {
        return (from..=to).map(weight).sum();
    }
    let block = count.div_ceil(EXACT_TAIL_TAPS);
    let mut sum = 0.0;
    let mut start = from;
    while start <= to {
        let len = block.min(to - start + 1);
        sum += len as f64 * weight(start + (len - 1) / 2);
        start += len;
    }
    sum
}

/// Apply a separable Gaussian blur in place using a pre-computed kernel,
/// reusing `temp` across calls.
///
/// Samples outside the buffer replicate the nearest edge pixel.
pub fn separable_gaussian_blur_with_kernel(
    data: &mut [u8],
    width: usize,
    height: usize,
    channels: usize,
    kernel: &[f32],
    temp: &mut Vec<f32>,
) {
    let kernel_size = kernel.len();
    if kernel_size <= 1 || width == 0 || height == 0 {
        return;
    }
    let half = kernel_size / 2;

    temp.resize(width * height * channels, 0.0);

    // Horizontal pass: data → temp
    for y in 0..height {
        let row = y * width;
        for x in 0..width {
            for c in 0..channels {
                let mut sum = 0.0f32;
                for (k, &w) in kernel.iter().enumerate() {
                    let sx = clamp_index(x as isize + k as isize - half as isize, width);
                    sum += data[(row + sx) * channels + c] as f32 * w;
                }
                temp[(row + x) * channels + c] = sum;
            }
        }
    }

    // Vertical pass: temp → data
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let mut sum = 0.0f32;
                for (k, &w) in kernel.iter().enumerate() {
                    let sy = clamp_index(y as isize + k as isize - half as isize, height);
                    sum += temp[(sy * width + x) * channels + c] * w;
                }
                data[(y * width + x) * channels + c] = sum.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    fn blur(data: &mut [u8], width: usize, height: usize, kernel_size: usize) {
        let kernel = gaussian_kernel_1d(kernel_size);
        separable_gaussian_blur_with_kernel(data, width, height, 3, &kernel, &mut Vec::new());
    }

    #[test]
    fn test_default_sigma_matches_opencv_rule() {
        assert_abs_diff_eq!(default_sigma(5), 1.1, epsilon = 1e-12);
        assert_abs_diff_eq!(default_sigma(35), 5.6, epsilon = 1e-12);
    }

    #[test]
    fn test_kernel_sums_to_one() {
        for size in [3, 5, 11, 35, 99] {
            let sum: f32 = gaussian_kernel_1d(size).iter().sum();
            assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_kernel_is_symmetric() {
        let k = gaussian_kernel_1d(7);
        for i in 0..k.len() / 2 {
            assert_abs_diff_eq!(k[i], k[k.len() - 1 - i], epsilon = 1e-7);
        }
    }

    #[test]
    fn test_kernel_center_is_largest() {
        let k = gaussian_kernel_1d(7);
        assert!(k.iter().all(|&v| v <= k[3]));
    }

    #[test]
    fn test_size_one_kernel_is_identity() {
        assert_eq!(gaussian_kernel_1d(1), vec![1.0]);
        let mut data = vec![42u8; 5 * 5 * 3];
        data[7] = 200;
        let original = data.clone();
        blur(&mut data, 5, 5, 1);
        assert_eq!(data, original);
    }

    #[test]
    fn test_blur_uniform_image_unchanged() {
        let mut data = vec![128u8; 10 * 10 * 3];
        blur(&mut data, 10, 10, 5);
        assert!(data.iter().all(|&v| v == 128));
    }

    #[test]
    fn test_blur_spreads_single_bright_pixel() {
        let mut data = vec![0u8; 10 * 10 * 3];
        let center = (5 * 10 + 5) * 3;
        data[center..center + 3].copy_from_slice(&[255, 255, 255]);

        blur(&mut data, 10, 10, 5);

        assert!(data[center] < 255);
        assert!(data[(5 * 10 + 6) * 3] > 0);
        assert_eq!(data[center], data[center + 1]);
    }

    #[test]
    fn test_folded_kernel_unchanged_when_it_fits() {
        assert_eq!(folded_kernel_1d(11, 6), gaussian_kernel_1d(11));
        assert_eq!(folded_kernel_1d(11, 100), gaussian_kernel_1d(11));
    }

    #[test]
    fn test_folded_kernel_moves_tail_into_end_taps() {
        let full = gaussian_kernel_1d(21);
        let folded = folded_kernel_1d(21, 4);
        assert_eq!(folded.len(), 7);
        assert_abs_diff_eq!(folded[3], full[10], epsilon = 1e-6);
        let tail: f32 = full[..8].iter().sum();
        assert_abs_diff_eq!(folded[0], tail, epsilon = 1e-5);
        let sum: f32 = folded.iter().sum();
        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_folded_kernel_blurs_like_full_kernel() {
        let original: Vec<u8> = (0..6 * 5 * 3).map(|i| (i * 37 % 256) as u8).collect();
        let mut expected = original.clone();
        blur(&mut expected, 6, 5, 41);

        let mut folded = original;
        let kernel = folded_kernel_1d(41, 6);
        separable_gaussian_blur_with_kernel(&mut folded, 6, 5, 3, &kernel, &mut Vec::new());

        for (a, b) in folded.iter().zip(&expected) {
            assert!(a.abs_diff(*b) <= 1, "{a} vs {b}");
        }
    }

    #[rstest]
    #[case(u32::MAX as usize)]
    #[case(200_000_001)]
    fn test_huge_kernel_folds_to_frame_size(#[case] kernel_size: usize) {
        let kernel = folded_kernel_1d(kernel_size, 4);
        assert_eq!(kernel.len(), 7);
        let sum: f32 = kernel.iter().sum();
        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-5);
        assert!(kernel.iter().all(|w| w.is_finite() && *w > 0.0));
    }

    #[test]
    fn test_single_pixel_buffer_gets_identity_kernel() {
        assert_eq!(folded_kernel_1d(99, 1), vec![1.0]);
    }

    #[test]
    fn test_kernel_wider_than_image_is_safe() {
        let mut data: Vec<u8> = (0..4 * 3 * 3).map(|i| (i * 7) as u8).collect();
        blur(&mut data, 4, 3, 51);
        assert_eq!(data.len(), 36);
    }
}
