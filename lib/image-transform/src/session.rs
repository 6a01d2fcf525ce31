//! Single-image editing session.
//!
//! The session owns the working image and decides which results replace it. A
//! preview only changes what is displayed; a commit also becomes the base for
//! the next transform. Restoring re-reads the source file.

use crate::{
    HistogramConfig, Image, Kernel, KernelChoice, NamedKernel, ThresholdMethod, ThresholdSpec,
    Transform, TransformError, TransformResult, histogram, image_buffer,
    threshold::DEFAULT_CUTOFF,
};
use image::RgbImage;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
struct Loaded {
    source_path: PathBuf,
    working: Image,
    displayed: Image,
    histogram: RgbImage,
}

#[derive(Debug, Clone)]
pub struct Session {
    loaded: Option<Loaded>,
    kernel: KernelChoice,
    threshold_method: ThresholdMethod,
    cutoff: u8,
    histogram_config: HistogramConfig,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(HistogramConfig::default())
    }
}

impl Session {
    pub fn new(histogram_config: HistogramConfig) -> Self {
        Self {
            loaded: None,
            kernel: KernelChoice::default(),
            threshold_method: ThresholdMethod::default(),
            cutoff: DEFAULT_CUTOFF,
            histogram_config,
        }
    }

    /// Replaces the session image. On failure the previous state is kept.
    pub fn load(&mut self, path: impl AsRef<Path>) -> TransformResult<()> {
        let path = path.as_ref();
        let image = image_buffer::load(path)?;
        self.loaded = Some(self.fresh(path.to_path_buf(), image));
        Ok(())
    }

    /// Discards every edit by re-reading the source file.
    pub fn restore(&mut self) -> TransformResult<()> {
        let source_path = self.require()?.source_path.clone();
        let image = image_buffer::restore(&source_path)?;
        self.loaded = Some(self.fresh(source_path, image));
        info!("session restored from disk");
        Ok(())
    }

    fn fresh(&self, source_path: PathBuf, image: Image) -> Loaded {
        Loaded {
            source_path,
            histogram: histogram::render(&image, &self.histogram_config),
            displayed: image.clone(),
            working: image,
        }
    }

    fn require(&self) -> TransformResult<&Loaded> {
        self.loaded.as_ref().ok_or_else(|| {
            warn!("operation requested with no image loaded");
            TransformError::no_image()
        })
    }

    fn apply(&mut self, transform: &impl Transform, commit: bool) -> TransformResult<&Image> {
        let result = transform.transform(&self.require()?.working)?;
        let histogram = histogram::render(&result, &self.histogram_config);

        let loaded = self.loaded.as_mut().ok_or_else(TransformError::no_image)?;
        if commit {
            debug!("committing {:?} result to the working image", result.order());
            loaded.working = result.clone();
        }
        loaded.displayed = result;
        loaded.histogram = histogram;
        Ok(&loaded.displayed)
    }

    /// Shows the active kernel applied to the working image, leaving it untouched.
    pub fn apply_kernel_preview(&mut self) -> TransformResult<&Image> {
        let kernel = self.kernel.kernel();
        self.apply(&kernel, false)
    }

    /// Applies the active kernel and keeps the result as the working image.
    pub fn apply_kernel_commit(&mut self) -> TransformResult<&Image> {
        let kernel = self.kernel.kernel();
        self.apply(&kernel, true)
    }

    pub fn apply_threshold_preview(&mut self) -> TransformResult<&Image> {
        let spec = self.threshold_spec();
        self.apply(&spec, false)
    }

    /// Binarizes the working image. The session stays single channel until the
    /// next restore or load.
    pub fn apply_threshold_commit(&mut self) -> TransformResult<&Image> {
        let spec = self.threshold_spec();
        self.apply(&spec, true)
    }

    pub fn select_kernel(&mut self, kernel: NamedKernel) -> TransformResult<()> {
        self.kernel = KernelChoice::named(kernel)?;
        debug!("kernel set to {}", kernel.name());
        Ok(())
    }

    /// Parses and activates a custom kernel. The active kernel is unchanged
    /// when `text` is rejected.
    pub fn set_custom_kernel(&mut self, text: &str) -> TransformResult<()> {
        self.kernel = KernelChoice::custom(text)?;
        debug!("custom {0}x{0} kernel set", self.kernel.kernel().size());
        Ok(())
    }

    pub fn reset_kernel(&mut self) {
        self.kernel = KernelChoice::default();
    }

    pub fn kernel_choice(&self) -> &KernelChoice {
        &self.kernel
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel.kernel()
    }

    pub fn kernel_text(&self) -> String {
        self.kernel.kernel().to_string()
    }

    pub fn select_threshold(&mut self, method: ThresholdMethod) {
        self.threshold_method = method;
    }

    pub fn threshold_method(&self) -> ThresholdMethod {
        self.threshold_method
    }

    pub fn set_cutoff(&mut self, cutoff: u8) {
        self.cutoff = cutoff;
    }

    pub fn cutoff(&self) -> u8 {
        self.cutoff
    }

    pub fn threshold_spec(&self) -> ThresholdSpec {
        self.threshold_method.spec(self.cutoff)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.loaded.as_ref().map(|l| l.source_path.as_path())
    }

    pub fn working(&self) -> Option<&Image> {
        self.loaded.as_ref().map(|l| &l.working)
    }

    pub fn displayed(&self) -> Option<&Image> {
        self.loaded.as_ref().map(|l| &l.displayed)
    }

    pub fn histogram(&self) -> Option<&RgbImage> {
        self.loaded.as_ref().map(|l| &l.histogram)
    }

    pub fn save_displayed(&self, path: impl AsRef<Path>) -> TransformResult<()> {
        image_buffer::save(&self.require()?.displayed, path)
    }

    pub fn save_histogram(&self, path: impl AsRef<Path>) -> TransformResult<()> {
        let path = path.as_ref();
        let histogram = &self.require()?.histogram;
        let format = image_buffer::output_format(path)?;
        histogram.save_with_format(path, format)?;
        info!("saved histogram {}", path.display());
        Ok(())
    }
}
