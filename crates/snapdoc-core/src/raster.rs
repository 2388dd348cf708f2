//! Cropping and encoding primitives shared by the pipeline.

use crate::error::Result;
use crate::region::Region;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Crop an image to the given region.
///
/// The region is clamped to the image bounds first, so out-of-range
/// coordinates from an upstream analyzer cannot index past the buffer.
pub fn crop_image(image: &DynamicImage, region: Region) -> DynamicImage {
    let clamped = region.clamp(image.width(), image.height());
    image.crop_imm(
        clamped.left as u32,
        clamped.top as u32,
        clamped.width,
        clamped.height,
    )
}

/// Encode an image as PNG bytes.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut bytes: Vec<u8> = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Decode image bytes (PNG/JPEG/WebP) into a raster image.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn checker(width: u32, height: u32) -> DynamicImage {
        let mut img = RgbaImage::new(width, height);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = if (x + y) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            };
        }
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn test_crop_within_bounds() {
        let img = checker(100, 80);
        let cropped = crop_image(&img, Region::new(10, 10, 30, 20));
        assert_eq!((cropped.width(), cropped.height()), (30, 20));
    }

    #[test]
    fn test_crop_clamps_hallucinated_region() {
        let img = checker(100, 80);
        let cropped = crop_image(&img, Region::new(-20, 60, 500, 500));
        assert_eq!((cropped.width(), cropped.height()), (100, 20));
    }

    #[test]
    fn test_png_round_trip() {
        let img = checker(16, 16);
        let bytes = encode_png(&img).unwrap();
        let decoded = decode_image(&bytes).unwrap();
        assert_eq!(decoded.to_rgba8(), img.to_rgba8());
    }

    #[test]
    fn test_full_bounds_crop_reencodes_identically() {
        // Cropping to the exact image bounds is a no-op: the bytes
        // match the input re-encoded in the same format.
        let img = checker(32, 24);
        let original = encode_png(&img).unwrap();
        let reloaded = decode_image(&original).unwrap();
        let cropped = crop_image(&reloaded, Region::new(0, 0, 32, 24));
        assert_eq!(encode_png(&cropped).unwrap(), original);
    }
}
