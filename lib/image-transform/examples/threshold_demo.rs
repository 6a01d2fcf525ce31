/// Threshold demo
/// Runs every thresholding strategy and renders the histogram of each result

use image_transform::{HistogramConfig, ThresholdMethod, Transform, histogram, image_buffer};
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let output_dir = Path::new("tmp");
    std::fs::create_dir_all(output_dir)?;

    let img = image_buffer::load("data/test.png")?;
    histogram::render(&img, &HistogramConfig::new()).save(output_dir.join("histogram_source.png"))?;

    for method in ThresholdMethod::all() {
        let spec = method.spec(127);
        let binary = spec.transform(&img)?;

        let filename = format!("threshold_{}.png", method.key());
        image_buffer::save(&binary, output_dir.join(&filename))?;
        histogram::render(&binary, &HistogramConfig::new())
            .save(output_dir.join(format!("histogram_{}.png", method.key())))?;
        println!("✓ Generated {filename} ({})", method.label());
    }

    println!("\n✓ All threshold effects applied successfully!");
    println!("  Images saved to: tmp/");

    Ok(())
}
