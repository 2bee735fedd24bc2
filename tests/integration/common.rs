use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};

/// 64x64 grayscale image of 8x8 blocks whose shades depend on `seed`.
pub fn blocky_image(seed: u32) -> RgbImage {
    RgbImage::from_fn(64, 64, |x, y| {
        let cell = (x / 8) * 8 + (y / 8);
        let v = ((cell * 97 + seed * 61 + 31) % 251) as u8;
        Rgb([v, v, v])
    })
}

/// Photographic negative; fingerprints far from the original.
pub fn inverted(img: &RgbImage) -> RgbImage {
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        pixel.0 = pixel.0.map(|c| 255 - c);
    }
    out
}

pub fn save(dir: &Path, name: &str, img: &RgbImage) -> PathBuf {
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}

/// Exact half-size copy of a [`blocky_image`]: every 8x8 block becomes 4x4.
pub fn half_size(img: &RgbImage) -> RgbImage {
    RgbImage::from_fn(img.width() / 2, img.height() / 2, |x, y| *img.get_pixel(x * 2, y * 2))
}
