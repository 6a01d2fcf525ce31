use crate::{ColorOrder, Image};
use derivative::Derivative;
use derive_setters::Setters;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);
const GREEN: Rgb<u8> = Rgb([0, 128, 0]);
const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
const NEUTRAL: Rgb<u8> = Rgb([0, 0, 0]);

/// Size of the rendered histogram raster
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct HistogramConfig {
    #[derivative(Default(value = "640"))]
    pub width: u32,

    #[derivative(Default(value = "480"))]
    pub height: u32,

    #[derivative(Default(value = "16"))]
    pub margin: u32,
}

impl HistogramConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

pub(crate) fn channel_histograms(image: &Image) -> Vec<[u32; 256]> {
    let channels = image.channels();
    let mut bins = vec![[0u32; 256]; channels];

    for pixel in image.data().chunks_exact(channels) {
        for (channel, &value) in pixel.iter().enumerate() {
            bins[channel][value as usize] += 1;
        }
    }

    bins
}

fn curve_colors(order: ColorOrder) -> &'static [Rgb<u8>] {
    match order {
        ColorOrder::Bgr => &[BLUE, GREEN, RED],
        ColorOrder::Rgb => &[RED, GREEN, BLUE],
        ColorOrder::Gray => &[NEUTRAL],
    }
}

/// Plots one intensity curve per channel on a shared [0, 255] axis.
pub fn render(image: &Image, config: &HistogramConfig) -> RgbImage {
    let width = config.width.max(2);
    let height = config.height.max(2);
    // At least one pixel of plot area is left on each axis.
    let margin = config.margin.min((width.min(height) - 2) / 2);
    let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);

    let bins = channel_histograms(image);
    let peak = bins
        .iter()
        .flat_map(|channel| channel.iter().copied())
        .max()
        .unwrap_or(0)
        .max(1) as f32;

    let left = margin as f32;
    let bottom = (height - margin - 1) as f32;
    let plot_width = (width - 2 * margin - 1) as f32;
    let plot_height = (height - 2 * margin - 1) as f32;

    let point = |bin: usize, count: u32| {
        (
            left + bin as f32 * plot_width / 255.0,
            bottom - count as f32 / peak * plot_height,
        )
    };

    for (channel, color) in bins.iter().zip(curve_colors(image.order())) {
        for bin in 1..channel.len() {
            let start = point(bin - 1, channel[bin - 1]);
            let end = point(bin, channel[bin]);
            draw_line_segment_mut(&mut canvas, start, end, *color);
        }
    }

    canvas
}
