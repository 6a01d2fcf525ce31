/// Kernel demo
/// Applies every built-in kernel to data/test.png

use image_transform::{NamedKernel, Transform, image_buffer};
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let output_dir = Path::new("tmp");
    std::fs::create_dir_all(output_dir)?;

    let img = image_buffer::load("data/test.png")?;

    for named in NamedKernel::all() {
        let Some(kernel) = named.kernel() else {
            continue;
        };

        let filtered = kernel.transform(&img)?;
        let filename = format!("kernel_{}.png", named.name().to_lowercase());
        image_buffer::save(&filtered, output_dir.join(&filename))?;
        println!("✓ Generated {filename}\n{kernel}");
    }

    println!("\n✓ All kernels applied successfully!");
    println!("  Images saved to: tmp/");

    Ok(())
}
