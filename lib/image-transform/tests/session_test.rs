// cargo test -p image-transform --test session_test

use anyhow::Result;
use image_transform::{
    ColorOrder, Image, NamedKernel, Session, ThresholdMethod, TransformError, image_buffer,
};
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

fn write_image(dir: &Path, name: &str, image: &Image) -> Result<PathBuf> {
    let path = dir.join(name);
    image_buffer::save(image, &path)?;
    Ok(path)
}

fn gradient_file() -> Result<(TempDir, PathBuf)> {
    let dir = tempdir()?;
    let data = (0..24 * 16u32)
        .flat_map(|i| {
            let (x, y) = (i % 24, i / 24);
            [(x * 10) as u8, (y * 15) as u8, ((x + y) * 6) as u8]
        })
        .collect();
    let image = Image::from_raw(24, 16, ColorOrder::Rgb, data)?;
    let path = write_image(dir.path(), "gradient.png", &image)?;
    Ok((dir, path))
}

#[test]
fn test_uniform_gray_global_threshold_commit() -> Result<()> {
    let dir = tempdir()?;
    let path = write_image(dir.path(), "uniform.png", &Image::filled(100, 100, ColorOrder::Rgb, 127))?;

    let mut session = Session::default();
    session.load(&path)?;
    session.select_threshold(ThresholdMethod::Global);
    session.set_cutoff(100);

    let result = session.apply_threshold_commit()?;
    assert_eq!(result.order(), ColorOrder::Gray);
    assert_eq!(result.channels(), 1);
    assert_eq!(result.data().len(), 100 * 100);
    assert!(result.data().iter().all(|&v| v == 255));

    let working = session.working().unwrap();
    assert_eq!(working.order(), ColorOrder::Gray);
    assert!(working.data().iter().all(|&v| v == 255));
    Ok(())
}

#[test]
fn test_sharpen_preview_then_restore() -> Result<()> {
    let (_dir, path) = gradient_file()?;
    let original = image_buffer::load(&path)?;

    let mut session = Session::default();
    session.load(&path)?;
    session.select_kernel(NamedKernel::Sharpen)?;

    let preview = session.apply_kernel_preview()?.clone();
    assert_ne!(&preview, &original);
    assert_eq!(session.displayed(), Some(&preview));
    assert_eq!(session.working(), Some(&original));

    session.restore()?;
    assert_eq!(session.working(), Some(&original));
    assert_eq!(session.displayed(), Some(&original));
    Ok(())
}

#[test]
fn test_identity_commit_is_noop() -> Result<()> {
    let (_dir, path) = gradient_file()?;

    let mut session = Session::default();
    session.load(&path)?;
    let before = session.working().cloned();

    session.apply_kernel_commit()?;
    assert_eq!(session.working().cloned(), before);
    Ok(())
}

#[test]
fn test_commits_compose_and_restore_resets() -> Result<()> {
    let (_dir, path) = gradient_file()?;
    let original = image_buffer::load(&path)?;

    let mut session = Session::default();
    session.load(&path)?;

    session.select_kernel(NamedKernel::AverageBlur)?;
    let once = session.apply_kernel_commit()?.clone();
    let twice = session.apply_kernel_commit()?.clone();
    assert_ne!(once, twice);
    assert_eq!(session.working(), Some(&twice));

    session.select_threshold(ThresholdMethod::Otsu);
    session.apply_threshold_commit()?;
    assert_eq!(session.working().map(Image::order), Some(ColorOrder::Gray));

    // Kernels keep operating on the binarized session.
    session.select_kernel(NamedKernel::Edge)?;
    let edged = session.apply_kernel_commit()?;
    assert_eq!(edged.order(), ColorOrder::Gray);

    session.restore()?;
    let restored = session.working().unwrap();
    assert_eq!(restored.order(), ColorOrder::Rgb);
    assert_eq!(restored.data(), original.data());
    Ok(())
}

#[test]
fn test_every_threshold_is_binary() -> Result<()> {
    let (_dir, path) = gradient_file()?;

    let mut session = Session::default();
    session.load(&path)?;

    for method in ThresholdMethod::all() {
        session.select_threshold(*method);
        let result = session.apply_threshold_preview()?;
        assert_eq!(result.channels(), 1, "{}", method.label());
        assert!(
            result.data().iter().all(|&v| v == 0 || v == 255),
            "{} is not binary",
            method.label()
        );
    }

    // Previews never touch the working image.
    assert_eq!(session.working().map(Image::order), Some(ColorOrder::Rgb));
    Ok(())
}

#[test]
fn test_rejected_custom_kernel_keeps_active_kernel() -> Result<()> {
    let mut session = Session::default();
    session.select_kernel(NamedKernel::GaussianBlur)?;
    let before = session.kernel();

    let err = session.set_custom_kernel("[[1,0],[0,1],[1,1]]").unwrap_err();
    assert!(matches!(err, TransformError::Shape { .. }));
    assert_eq!(session.kernel(), before);
    Ok(())
}

#[test]
fn test_failed_load_keeps_session() -> Result<()> {
    let (dir, path) = gradient_file()?;

    let mut session = Session::default();
    session.load(&path)?;

    let err = session.load(dir.path().join("missing.jpg")).unwrap_err();
    assert!(matches!(err, TransformError::Io(_)));
    assert_eq!(session.source_path(), Some(path.as_path()));
    Ok(())
}

#[test]
fn test_save_outputs() -> Result<()> {
    let (dir, path) = gradient_file()?;

    let mut session = Session::default();
    session.load(&path)?;
    session.select_threshold(ThresholdMethod::AdaptiveMean);
    session.apply_threshold_preview()?;

    let image_path = dir.path().join("binary.png");
    session.save_displayed(&image_path)?;
    let saved = image::open(&image_path)?;
    assert_eq!((saved.width(), saved.height()), (24, 16));

    let jpeg_path = dir.path().join("binary.jpg");
    session.save_displayed(&jpeg_path)?;
    assert!(jpeg_path.exists());

    let hist_path = dir.path().join("hist.png");
    session.save_histogram(&hist_path)?;
    let hist = image::open(&hist_path)?;
    assert_eq!((hist.width(), hist.height()), (640, 480));

    assert!(session.save_histogram(dir.path().join("hist.gif")).is_err());
    Ok(())
}
