pub mod histogram;
pub mod image_buffer;
pub mod kernel;
pub mod pipeline;
pub mod session;
pub mod threshold;

pub use histogram::HistogramConfig;
pub use image_buffer::{ColorOrder, Image};
pub use kernel::{Kernel, KernelChoice, NamedKernel};
pub use session::Session;
pub use threshold::{ThresholdMethod, ThresholdSpec};

pub type TransformResult<T> = Result<T, TransformError>;

#[derive(thiserror::Error, Debug)]
pub enum TransformError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid matrix: {0}")]
    Parse(String),
    #[error("Non-square matrix: {rows} rows x {cols} columns")]
    Shape { rows: usize, cols: usize },
    #[error("Invalid state: {0}")]
    State(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl TransformError {
    pub(crate) fn no_image() -> Self {
        TransformError::State("no image loaded".to_string())
    }

    /// Errors the shell recovers from by asking for the kernel again.
    pub fn is_input_error(&self) -> bool {
        matches!(self, TransformError::Parse(_) | TransformError::Shape { .. })
    }
}

/// A transform over a working image. Implementations never mutate their input.
pub trait Transform {
    fn transform(&self, image: &Image) -> TransformResult<Image>;
}
