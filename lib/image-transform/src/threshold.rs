use crate::{
    Image, Transform, TransformError, TransformResult, kernel::normalize_name, pipeline,
};
use image::GrayImage;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::str::FromStr;

pub const ADAPTIVE_BLOCK_SIZE: usize = 11;
pub const ADAPTIVE_C: i32 = 2;
pub const PREFILTER_KSIZE: usize = 5;
pub const DEFAULT_CUTOFF: u8 = 127;

/// A thresholding strategy with only the parameters it uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdSpec {
    Global { cutoff: u8 },
    AdaptiveMean { block_size: usize, c: i32 },
    AdaptiveGaussian { block_size: usize, c: i32 },
    Otsu,
    OtsuWithGaussianPrefilter { ksize: usize },
}

impl ThresholdSpec {
    pub fn global(cutoff: u8) -> Self {
        ThresholdSpec::Global { cutoff }
    }

    pub fn adaptive_mean() -> Self {
        ThresholdSpec::AdaptiveMean {
            block_size: ADAPTIVE_BLOCK_SIZE,
            c: ADAPTIVE_C,
        }
    }

    pub fn adaptive_gaussian() -> Self {
        ThresholdSpec::AdaptiveGaussian {
            block_size: ADAPTIVE_BLOCK_SIZE,
            c: ADAPTIVE_C,
        }
    }

    pub fn otsu_with_prefilter() -> Self {
        ThresholdSpec::OtsuWithGaussianPrefilter {
            ksize: PREFILTER_KSIZE,
        }
    }

    pub fn method(&self) -> ThresholdMethod {
        match self {
            ThresholdSpec::Global { .. } => ThresholdMethod::Global,
            ThresholdSpec::AdaptiveMean { .. } => ThresholdMethod::AdaptiveMean,
            ThresholdSpec::AdaptiveGaussian { .. } => ThresholdMethod::AdaptiveGaussian,
            ThresholdSpec::Otsu => ThresholdMethod::Otsu,
            ThresholdSpec::OtsuWithGaussianPrefilter { .. } => {
                ThresholdMethod::OtsuWithGaussianPrefilter
            }
        }
    }
}

impl Transform for ThresholdSpec {
    fn transform(&self, image: &Image) -> TransformResult<Image> {
        pipeline::threshold(image, self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ThresholdMethod {
    Global = 0,
    AdaptiveMean,
    AdaptiveGaussian,
    Otsu,
    OtsuWithGaussianPrefilter,
}

impl Default for ThresholdMethod {
    fn default() -> Self {
        ThresholdMethod::Global
    }
}

impl ThresholdMethod {
    pub fn label(&self) -> &'static str {
        match self {
            ThresholdMethod::Global => "Global",
            ThresholdMethod::AdaptiveMean => "Adaptive (Mean)",
            ThresholdMethod::AdaptiveGaussian => "Adaptive (Gaussian)",
            ThresholdMethod::Otsu => "Otsu",
            ThresholdMethod::OtsuWithGaussianPrefilter => "Otsu (with Gaussian Filter)",
        }
    }

    /// Short name accepted by [`FromStr`].
    pub fn key(&self) -> &'static str {
        match self {
            ThresholdMethod::Global => "global",
            ThresholdMethod::AdaptiveMean => "adaptive-mean",
            ThresholdMethod::AdaptiveGaussian => "adaptive-gaussian",
            ThresholdMethod::Otsu => "otsu",
            ThresholdMethod::OtsuWithGaussianPrefilter => "otsu-gaussian",
        }
    }

    pub fn uses_cutoff(&self) -> bool {
        matches!(self, ThresholdMethod::Global)
    }

    pub fn spec(&self, cutoff: u8) -> ThresholdSpec {
        match self {
            ThresholdMethod::Global => ThresholdSpec::global(cutoff),
            ThresholdMethod::AdaptiveMean => ThresholdSpec::adaptive_mean(),
            ThresholdMethod::AdaptiveGaussian => ThresholdSpec::adaptive_gaussian(),
            ThresholdMethod::Otsu => ThresholdSpec::Otsu,
            ThresholdMethod::OtsuWithGaussianPrefilter => ThresholdSpec::otsu_with_prefilter(),
        }
    }

    pub fn all() -> &'static [ThresholdMethod] {
        &[
            ThresholdMethod::Global,
            ThresholdMethod::AdaptiveMean,
            ThresholdMethod::AdaptiveGaussian,
            ThresholdMethod::Otsu,
            ThresholdMethod::OtsuWithGaussianPrefilter,
        ]
    }
}

impl FromStr for ThresholdMethod {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        ThresholdMethod::all()
            .iter()
            .copied()
            .find(|m| normalize_name(m.key()) == wanted || normalize_name(m.label()) == wanted)
            .ok_or_else(|| {
                TransformError::InvalidParameter(format!("unknown threshold method `{s}`"))
            })
    }
}

fn binary(value: bool) -> u8 {
    if value { 255 } else { 0 }
}

fn above(gray: &[u8], cutoff: u8) -> Vec<u8> {
    gray.iter().map(|&v| binary(v > cutoff)).collect()
}

fn adaptive(gray: &Image, local: &[u8], c: i32) -> Vec<u8> {
    gray.data()
        .iter()
        .zip(local)
        .map(|(&v, &stat)| binary(v as i32 > stat as i32 - c))
        .collect()
}

fn otsu_level(gray: &Image) -> u8 {
    GrayImage::from_raw(gray.width(), gray.height(), gray.data().to_vec())
        .map(|image| imageproc::contrast::otsu_level(&image))
        .unwrap_or_default()
}

/// Binarizes a single-channel buffer. Every returned sample is 0 or 255.
pub(crate) fn binarize(gray: &Image, spec: &ThresholdSpec) -> Vec<u8> {
    match *spec {
        ThresholdSpec::Global { cutoff } => above(gray.data(), cutoff),
        ThresholdSpec::AdaptiveMean { block_size, c } => {
            let block_size = block_size.max(1);
            let taps = vec![1.0 / block_size as f64; block_size];
            adaptive(gray, &pipeline::separable_filter(gray, &taps), c)
        }
        ThresholdSpec::AdaptiveGaussian { block_size, c } => {
            let taps = pipeline::gaussian_taps(block_size.max(1), 0.0);
            adaptive(gray, &pipeline::separable_filter(gray, &taps), c)
        }
        ThresholdSpec::Otsu => above(gray.data(), otsu_level(gray)),
        ThresholdSpec::OtsuWithGaussianPrefilter { ksize } => {
            let taps = pipeline::gaussian_taps(ksize.max(1), 0.0);
            let smoothed = pipeline::separable_filter(gray, &taps);
            let blurred = Image::gray(gray.width(), gray.height(), smoothed);
            above(blurred.data(), otsu_level(&blurred))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ColorOrder;

    fn two_tone(width: u32, height: u32, dark: u8, light: u8) -> Image {
        let data = (0..width * height)
            .map(|i| if (i % width) < width / 2 { dark } else { light })
            .collect();
        Image::from_raw(width, height, ColorOrder::Gray, data).unwrap()
    }

    fn is_binary(data: &[u8]) -> bool {
        data.iter().all(|&v| v == 0 || v == 255)
    }

    #[test]
    fn test_global_cutoff_is_strict() {
        let gray = Image::from_raw(3, 1, ColorOrder::Gray, vec![99, 100, 101]).unwrap();
        assert_eq!(binarize(&gray, &ThresholdSpec::global(100)), vec![0, 0, 255]);
    }

    #[test]
    fn test_otsu_splits_two_tones() {
        let gray = two_tone(8, 4, 40, 200);
        let level = otsu_level(&gray);
        assert!((40..200).contains(&level), "level {level}");

        let out = binarize(&gray, &ThresholdSpec::Otsu);
        assert_eq!(out, above(gray.data(), 100));
    }

    #[test]
    fn test_otsu_uniform_image_is_white() {
        let gray = Image::filled(2, 2, ColorOrder::Gray, 127);
        assert_eq!(otsu_level(&gray), 0);
        assert_eq!(binarize(&gray, &ThresholdSpec::Otsu), vec![255; 4]);

        // Nothing lies above a level of 0 in an all-black image.
        let black = Image::filled(2, 2, ColorOrder::Gray, 0);
        assert_eq!(binarize(&black, &ThresholdSpec::Otsu), vec![0; 4]);
    }

    #[test]
    fn test_prefiltered_otsu_is_binary() {
        let gray = two_tone(16, 16, 30, 220);
        let out = binarize(&gray, &ThresholdSpec::otsu_with_prefilter());
        assert!(is_binary(&out));
        assert_eq!(out[0], 0);
        assert_eq!(out[15], 255);
    }

    #[test]
    fn test_adaptive_flat_region_is_white() {
        // v > mean - c holds everywhere on a flat image.
        let gray = Image::filled(20, 20, ColorOrder::Gray, 90);
        for spec in [ThresholdSpec::adaptive_mean(), ThresholdSpec::adaptive_gaussian()] {
            assert!(binarize(&gray, &spec).iter().all(|&v| v == 255));
        }
    }

    #[test]
    fn test_adaptive_marks_dark_spot() {
        let mut data = vec![200u8; 15 * 15];
        data[7 * 15 + 7] = 10;
        let gray = Image::from_raw(15, 15, ColorOrder::Gray, data).unwrap();

        for spec in [ThresholdSpec::adaptive_mean(), ThresholdSpec::adaptive_gaussian()] {
            let out = binarize(&gray, &spec);
            assert!(is_binary(&out));
            assert_eq!(out[7 * 15 + 7], 0);
            assert_eq!(out[0], 255);
        }
    }

    #[test]
    fn test_method_specs() {
        assert_eq!(ThresholdMethod::Global.spec(42), ThresholdSpec::Global { cutoff: 42 });
        assert_eq!(
            ThresholdMethod::AdaptiveGaussian.spec(42),
            ThresholdSpec::AdaptiveGaussian { block_size: 11, c: 2 }
        );
        assert_eq!(
            ThresholdMethod::OtsuWithGaussianPrefilter.spec(0),
            ThresholdSpec::OtsuWithGaussianPrefilter { ksize: 5 }
        );

        for method in ThresholdMethod::all() {
            assert_eq!(method.spec(1).method(), *method);
            assert_eq!(method.uses_cutoff(), *method == ThresholdMethod::Global);
        }
    }

    #[test]
    fn test_method_lookup() {
        assert_eq!("otsu".parse::<ThresholdMethod>().unwrap(), ThresholdMethod::Otsu);
        assert_eq!(
            "Adaptive (Mean)".parse::<ThresholdMethod>().unwrap(),
            ThresholdMethod::AdaptiveMean
        );
        assert_eq!(
            "otsu-gaussian".parse::<ThresholdMethod>().unwrap(),
            ThresholdMethod::OtsuWithGaussianPrefilter
        );
        assert!("bradley".parse::<ThresholdMethod>().is_err());
        assert_eq!(
            ThresholdMethod::try_from(4u8).unwrap(),
            ThresholdMethod::OtsuWithGaussianPrefilter
        );
        assert!(ThresholdMethod::try_from(9u8).is_err());
    }
}
