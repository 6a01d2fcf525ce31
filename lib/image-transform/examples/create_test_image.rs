use image::{Rgb, RgbImage};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all("data")?;

    // 800x600 gradient with a dark disc, so both blurs and thresholds show up.
    let mut img = RgbImage::new(800, 600);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let (dx, dy) = (x as i32 - 400, y as i32 - 300);
        if dx * dx + dy * dy < 120 * 120 {
            *pixel = Rgb([20, 30, 40]);
        } else {
            *pixel = Rgb([
                (x * 255 / 800) as u8,
                (y * 255 / 600) as u8,
                ((x + y) * 255 / 1400) as u8,
            ]);
        }
    }

    img.save("data/test.png")?;
    println!("Created data/test.png");
    Ok(())
}
