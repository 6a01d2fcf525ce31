use crate::{ColorOrder, Image, Kernel, ThresholdSpec, TransformError, TransformResult, threshold};
use image::{GrayImage, ImageBuffer, Luma, Pixel, RgbImage};
use imageproc::kernel::Kernel as FilterKernel;
use log::debug;

// Fixed-point luma weights, Q14.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

#[inline]
fn saturate(value: f64) -> u8 {
    value.round_ties_even().clamp(0.0, 255.0) as u8
}

/// Square weights with the anchor in the middle cell. `filter` anchors at
/// `size / 2`, so even kernels get a leading zero row and column to keep the
/// floor-center anchor.
fn centered_weights(kernel: &Kernel) -> (Vec<f64>, u32) {
    let (size, anchor) = (kernel.size(), kernel.anchor());
    let padded = 2 * anchor.max(size - 1 - anchor) + 1;
    let lead = (padded - 1) / 2 - anchor;

    let mut weights = vec![0.0; padded * padded];
    for (row, values) in kernel.rows().enumerate() {
        let start = (row + lead) * padded + lead;
        weights[start..start + size].copy_from_slice(values);
    }
    (weights, padded as u32)
}

fn correlate<P>(buffer: &ImageBuffer<P, Vec<u8>>, weights: &[f64], size: u32) -> Vec<u8>
where
    P: Pixel<Subpixel = u8>,
{
    let kernel = FilterKernel::new(weights, size, size);
    imageproc::filter::filter::<P, f64, _, P>(buffer, kernel, saturate).into_raw()
}

/// Correlates every channel of `image` with `kernel`, keeping the size and the
/// color order of the input. Borders replicate the edge samples.
pub fn convolve(image: &Image, kernel: &Kernel) -> TransformResult<Image> {
    let (width, height) = (image.width(), image.height());
    let (weights, padded) = centered_weights(kernel);

    debug!(
        "convolving {width}x{height}x{channels} with a {size}x{size} kernel",
        channels = image.channels(),
        size = kernel.size()
    );

    let invalid = || TransformError::InvalidParameter("pixel buffer size mismatch".to_string());
    let output = match image.order() {
        ColorOrder::Gray => {
            let buffer = GrayImage::from_raw(width, height, image.data().to_vec()).ok_or_else(invalid)?;
            correlate(&buffer, &weights, padded)
        }
        // Channels are filtered independently, so BGR data can ride in an RGB buffer.
        ColorOrder::Rgb | ColorOrder::Bgr => {
            let buffer = RgbImage::from_raw(width, height, image.data().to_vec()).ok_or_else(invalid)?;
            correlate(&buffer, &weights, padded)
        }
    };

    Image::from_raw(width, height, image.order(), output)
}

/// Collapses a color image to one luma channel. Gray input is returned as is.
pub fn to_luma(image: &Image) -> Image {
    let (r, b) = match image.order() {
        ColorOrder::Gray => return image.clone(),
        ColorOrder::Rgb => (0, 2),
        ColorOrder::Bgr => (2, 0),
    };

    let data = image
        .data()
        .chunks_exact(3)
        .map(|px| {
            let y = px[r] as u32 * LUMA_R + px[1] as u32 * LUMA_G + px[b] as u32 * LUMA_B;
            ((y + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8
        })
        .collect();

    Image::gray(image.width(), image.height(), data)
}

/// Binarizes `image` with `spec`. The result is always single channel.
pub fn threshold(image: &Image, spec: &ThresholdSpec) -> TransformResult<Image> {
    let gray = to_luma(image);
    debug!("thresholding {}x{} with {spec:?}", gray.width(), gray.height());

    let data = threshold::binarize(&gray, spec);
    Image::from_raw(gray.width(), gray.height(), ColorOrder::Gray, data)
}

/// 1-D gaussian taps. A non-positive `sigma` is derived from `ksize`, and the
/// small odd sizes use the fixed binomial tables.
pub(crate) fn gaussian_taps(ksize: usize, sigma: f64) -> Vec<f64> {
    if sigma <= 0.0 {
        let fixed: Option<&[f64]> = match ksize {
            1 => Some(&[1.0]),
            3 => Some(&[0.25, 0.5, 0.25]),
            5 => Some(&[0.0625, 0.25, 0.375, 0.25, 0.0625]),
            7 => Some(&[
                0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125,
            ]),
            _ => None,
        };
        if let Some(taps) = fixed {
            return taps.to_vec();
        }
    }

    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((ksize as f64 - 1.0) * 0.5 - 1.0) + 0.8
    };
    let center = (ksize as f64 - 1.0) / 2.0;
    let raw: Vec<f64> = (0..ksize)
        .map(|i| {
            let d = i as f64 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|v| v / total).collect()
}

/// Applies the same 1-D taps horizontally, then vertically, to a single
/// channel buffer with replicated borders. Sums stay in `f64` until the final
/// rounding.
pub(crate) fn separable_filter(gray: &Image, taps: &[f64]) -> Vec<u8> {
    let samples = gray.data().iter().map(|&v| v as f64).collect();
    let Some(buffer) = ImageBuffer::<Luma<f64>, Vec<f64>>::from_raw(gray.width(), gray.height(), samples) else {
        return gray.data().to_vec();
    };

    imageproc::filter::separable_filter_equal(&buffer, taps)
        .into_raw()
        .into_iter()
        .map(saturate)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NamedKernel;

    fn gradient(width: u32, height: u32, order: ColorOrder) -> Image {
        let channels = order.channels() as u32;
        let data = (0..width * height * channels)
            .map(|i| ((i * 37) % 256) as u8)
            .collect();
        Image::from_raw(width, height, order, data).unwrap()
    }

    #[test]
    fn test_identity_is_noop() {
        for order in [ColorOrder::Rgb, ColorOrder::Bgr, ColorOrder::Gray] {
            let image = gradient(7, 5, order);
            assert_eq!(convolve(&image, &Kernel::identity()).unwrap(), image);
        }
    }

    #[test]
    fn test_blur_keeps_uniform_image() {
        let image = Image::filled(6, 6, ColorOrder::Rgb, 200);
        for named in [NamedKernel::AverageBlur, NamedKernel::GaussianBlur] {
            let blurred = convolve(&image, &named.kernel().unwrap()).unwrap();
            assert_eq!(blurred, image);
        }
    }

    #[test]
    fn test_edge_saturates() {
        // A single bright pixel in the middle of a dark gray image.
        let mut data = vec![0u8; 9];
        data[4] = 100;
        let image = Image::from_raw(3, 3, ColorOrder::Gray, data).unwrap();

        let edged = convolve(&image, &NamedKernel::Edge.kernel().unwrap()).unwrap();
        assert_eq!(edged.data()[4], 255);
        // Neighbours get -100, which saturates to zero.
        assert_eq!(edged.data()[1], 0);
        assert_eq!(edged.data()[0], 0);
    }

    #[test]
    fn test_replicated_border() {
        // Shift-right kernel: each output takes its left neighbour.
        let kernel = Kernel::parse_custom("[[0,0,0],[1,0,0],[0,0,0]]").unwrap();
        let image = Image::from_raw(3, 1, ColorOrder::Gray, vec![10, 20, 30]).unwrap();
        let shifted = convolve(&image, &kernel).unwrap();
        assert_eq!(shifted.data(), &[10, 10, 20]);
    }

    #[test]
    fn test_even_kernel_anchor() {
        // 2x2 with the weight on the lower-right cell reads (x+1, y+1).
        let kernel = Kernel::parse_custom("[[0,0],[0,1]]").unwrap();
        let image = Image::from_raw(2, 2, ColorOrder::Gray, vec![1, 2, 3, 4]).unwrap();
        let out = convolve(&image, &kernel).unwrap();
        assert_eq!(out.data(), &[4, 4, 4, 4]);
    }

    #[test]
    fn test_even_kernel_is_padded_around_anchor() {
        let kernel = Kernel::parse_custom("[[1,2],[3,4]]").unwrap();
        let (weights, size) = centered_weights(&kernel);
        assert_eq!(size, 3);
        assert_eq!(weights, vec![0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 0.0, 3.0, 4.0]);

        let (weights, size) = centered_weights(&Kernel::identity());
        assert_eq!(size, 3);
        assert_eq!(weights, NamedKernel::Identity.kernel().unwrap().rows().flatten().copied().collect::<Vec<_>>());
    }

    #[test]
    fn test_single_weight_kernel_scales() {
        let kernel = Kernel::parse_custom("[[0.5]]").unwrap();
        let image = Image::from_raw(4, 1, ColorOrder::Gray, vec![1, 3, 5, 200]).unwrap();
        // Halves round to even.
        assert_eq!(convolve(&image, &kernel).unwrap().data(), &[0, 2, 2, 100]);
    }

    #[test]
    fn test_convolve_keeps_order() {
        let image = gradient(4, 4, ColorOrder::Bgr);
        let sharpened = convolve(&image, &NamedKernel::Sharpen.kernel().unwrap()).unwrap();
        assert_eq!(sharpened.order(), ColorOrder::Bgr);
        assert_eq!(sharpened.data().len(), image.data().len());
    }

    #[test]
    fn test_luma_weights() {
        let rgb = Image::from_raw(3, 1, ColorOrder::Rgb, vec![255, 0, 0, 0, 255, 0, 0, 0, 255])
            .unwrap();
        assert_eq!(to_luma(&rgb).data(), &[76, 150, 29]);

        let bgr = Image::from_raw(1, 1, ColorOrder::Bgr, vec![0, 0, 255]).unwrap();
        assert_eq!(to_luma(&bgr).data(), &[76]);

        let gray = Image::filled(1, 1, ColorOrder::Gray, 7);
        assert_eq!(to_luma(&gray), gray);
    }

    #[test]
    fn test_luma_uniform() {
        let image = Image::filled(4, 4, ColorOrder::Rgb, 127);
        let gray = to_luma(&image);
        assert_eq!(gray.order(), ColorOrder::Gray);
        assert!(gray.data().iter().all(|&v| v == 127));
    }

    #[test]
    fn test_gaussian_taps() {
        assert_eq!(gaussian_taps(5, 0.0), vec![0.0625, 0.25, 0.375, 0.25, 0.0625]);

        let taps = gaussian_taps(11, 0.0);
        assert_eq!(taps.len(), 11);
        assert!((taps.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(taps[5] > taps[4] && taps[4] > taps[0]);
        assert!((taps[0] - taps[10]).abs() < 1e-15);
    }

    #[test]
    fn test_separable_filter_uniform() {
        let gray = Image::filled(5, 4, ColorOrder::Gray, 33);
        let taps = gaussian_taps(5, 0.0);
        assert!(separable_filter(&gray, &taps).iter().all(|&v| v == 33));
    }

    #[test]
    fn test_separable_box_rounds_once() {
        // Box mean of [0, 0, 1] is 1/3, of [0, 1, 1] is 2/3.
        let gray = Image::from_raw(3, 1, ColorOrder::Gray, vec![0, 0, 1]).unwrap();
        let taps = [1.0 / 3.0; 3];
        assert_eq!(separable_filter(&gray, &taps), vec![0, 0, 1]);

        let gray = Image::from_raw(3, 1, ColorOrder::Gray, vec![0, 3, 9]).unwrap();
        assert_eq!(separable_filter(&gray, &taps), vec![1, 4, 7]);
    }
}
