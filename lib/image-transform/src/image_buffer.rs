use crate::{TransformError, TransformResult};
use image::{DynamicImage, GrayImage, ImageFormat, ImageReader, RgbImage};
use log::{debug, info};
use std::path::Path;

/// Channel layout of an [`Image`] buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorOrder {
    Bgr,
    Rgb,
    Gray,
}

impl ColorOrder {
    pub fn channels(&self) -> usize {
        match self {
            ColorOrder::Bgr | ColorOrder::Rgb => 3,
            ColorOrder::Gray => 1,
        }
    }
}

/// An interleaved, row-major 8-bit pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    order: ColorOrder,
    data: Vec<u8>,
}

impl Image {
    pub fn from_raw(width: u32, height: u32, order: ColorOrder, data: Vec<u8>) -> TransformResult<Self> {
        let expected = width as usize * height as usize * order.channels();
        if data.len() != expected {
            return Err(TransformError::InvalidParameter(format!(
                "buffer holds {} samples, {width}x{height} {order:?} needs {expected}",
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            order,
            data,
        })
    }

    /// A single-color image, mostly useful for tests and demos.
    pub fn filled(width: u32, height: u32, order: ColorOrder, value: u8) -> Self {
        let len = width as usize * height as usize * order.channels();
        Self {
            width,
            height,
            order,
            data: vec![value; len],
        }
    }

    pub(crate) fn gray(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize);
        Self {
            width,
            height,
            order: ColorOrder::Gray,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.order.channels()
    }

    pub fn order(&self) -> ColorOrder {
        self.order
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn to_dynamic(&self) -> TransformResult<DynamicImage> {
        let invalid = || TransformError::InvalidParameter("pixel buffer size mismatch".to_string());

        match self.order {
            ColorOrder::Gray => GrayImage::from_raw(self.width, self.height, self.data.clone())
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(invalid),
            ColorOrder::Rgb => RgbImage::from_raw(self.width, self.height, self.data.clone())
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(invalid),
            ColorOrder::Bgr => {
                let mut data = self.data.clone();
                for pixel in data.chunks_exact_mut(3) {
                    pixel.swap(0, 2);
                }
                RgbImage::from_raw(self.width, self.height, data)
                    .map(DynamicImage::ImageRgb8)
                    .ok_or_else(invalid)
            }
        }
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        let rgb = image.into_rgb8();
        let (width, height) = rgb.dimensions();
        Self {
            width,
            height,
            order: ColorOrder::Rgb,
            data: rgb.into_raw(),
        }
    }
}

/// Reads an image file fully into memory as a 3-channel color buffer.
pub fn load(path: impl AsRef<Path>) -> TransformResult<Image> {
    let path = path.as_ref();
    let decoded = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    let image = Image::from_dynamic(decoded);

    info!(
        "loaded {} ({}x{}, {:?})",
        path.display(),
        image.width(),
        image.height(),
        image.order()
    );
    Ok(image)
}

/// Re-reads the source file, discarding every in-memory edit.
pub fn restore(path: impl AsRef<Path>) -> TransformResult<Image> {
    debug!("restoring from {}", path.as_ref().display());
    load(path)
}

/// Output encoding implied by the extension of `path`. Only PNG and JPEG are written.
pub(crate) fn output_format(path: &Path) -> TransformResult<ImageFormat> {
    let format = ImageFormat::from_path(path)?;
    if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
        return Err(TransformError::InvalidParameter(format!(
            "unsupported output format {format:?}, use .png or .jpg"
        )));
    }
    Ok(format)
}

/// Encodes `image` with the format implied by the extension of `path`.
pub fn save(image: &Image, path: impl AsRef<Path>) -> TransformResult<()> {
    let path = path.as_ref();
    let format = output_format(path)?;
    image.to_dynamic()?.save_with_format(path, format)?;
    info!("saved {}", path.display());
    Ok(())
}
