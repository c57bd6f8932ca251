//! Region-local blur
//!
//! The whole image is blurred once; blurred pixels are then copied back only
//! where a detection polygon covers them.

use image::{GrayImage, Luma, RgbaImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::filter::gaussian_blur_f32;
use imageproc::point::Point as PixelPoint;

use crate::ocr::Region;

const MASKED: Luma<u8> = Luma([255]);

/// Integer polygon clamped to the canvas.
///
/// Returns `None` for regions that collapse to fewer than three distinct
/// corners, which the polygon rasterizer cannot fill.
fn polygon(region: &Region, width: u32, height: u32) -> Option<Vec<PixelPoint<i32>>> {
    let max_x = width.saturating_sub(1) as f32;
    let max_y = height.saturating_sub(1) as f32;

    let mut points: Vec<PixelPoint<i32>> = Vec::with_capacity(4);
    for p in region.points() {
        let point = PixelPoint::new(
            p.x.clamp(0.0, max_x).round() as i32,
            p.y.clamp(0.0, max_y).round() as i32,
        );
        if !points.contains(&point) {
            points.push(point);
        }
    }

    (points.len() >= 3).then_some(points)
}

/// Mask with every region filled
pub fn region_mask(width: u32, height: u32, regions: &[Region]) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    for region in regions {
        if let Some(points) = polygon(region, width, height) {
            draw_polygon_mut(&mut mask, &points, MASKED);
        }
    }
    mask
}

/// Blur `image` inside `regions` only
pub fn blur_regions(image: &mut RgbaImage, regions: &[Region], sigma: f32) {
    if regions.is_empty() || sigma <= 0.0 {
        return;
    }

    let mask = region_mask(image.width(), image.height(), regions);
    let blurred = gaussian_blur_f32(image, sigma);

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        if mask.get_pixel(x, y)[0] != 0 {
            *pixel = *blurred.get_pixel(x, y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Left half black, right half white
    fn split_image() -> RgbaImage {
        RgbaImage::from_fn(40, 20, |x, _| {
            if x < 20 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        })
    }

    #[test]
    fn test_only_masked_pixels_change() {
        let original = split_image();
        let mut image = original.clone();

        blur_regions(&mut image, &[Region::from_rect(15.0, 5.0, 10.0, 10.0)], 4.0);

        // The edge under the region is softened
        assert_ne!(image.get_pixel(19, 10), original.get_pixel(19, 10));
        // Pixels outside the region are untouched
        assert_eq!(image.get_pixel(19, 0), original.get_pixel(19, 0));
        assert_eq!(image.get_pixel(5, 10), original.get_pixel(5, 10));
        assert_eq!(image.dimensions(), original.dimensions());
    }

    #[test]
    fn test_degenerate_regions_are_skipped() {
        let original = split_image();
        let mut image = original.clone();

        blur_regions(
            &mut image,
            &[Region::from_rect(10.0, 10.0, 0.0, 0.0), Region::from_rect(10.0, 3.0, 20.0, 0.0)],
            4.0,
        );
        assert_eq!(image, original);
    }

    #[test]
    fn test_mask_is_clamped_to_canvas() {
        let mask = region_mask(10, 10, &[Region::from_rect(-5.0, -5.0, 100.0, 100.0)]);
        for (x, y) in [(0, 0), (9, 0), (5, 5), (9, 9)] {
            assert_eq!(mask.get_pixel(x, y)[0], 255);
        }
    }
}
