//! Unit tests for the fallback compositor

use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use tryon_gateway::imaging::ImageAsset;
use tryon_gateway::pipeline::fallback::{composite, overlay_region};

fn solid_rgb(width: u32, height: u32, color: [u8; 3]) -> ImageAsset {
    ImageAsset::from_dynamic(DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color))))
        .unwrap()
}

#[test]
fn test_opaque_garment_covers_upper_body() {
    let human = solid_rgb(768, 1024, [0, 0, 255]);
    let garment = solid_rgb(512, 512, [255, 0, 0]);

    let result = composite(&human, &garment).unwrap();
    assert_eq!(result.dimensions(), (768, 1024));

    let region = overlay_region((768, 1024), (512, 512));
    assert_eq!((region.x, region.y, region.width, region.height), (192, 341, 384, 384));

    let rgb = result.as_dynamic().to_rgb8();
    assert_eq!(rgb.get_pixel(384, 500), &Rgb([255, 0, 0]));
    assert_eq!(rgb.get_pixel(384, 300), &Rgb([0, 0, 255]));
    assert_eq!(rgb.get_pixel(100, 500), &Rgb([0, 0, 255]));
    assert_eq!(rgb.get_pixel(384, 800), &Rgb([0, 0, 255]));
}

#[test]
fn test_transparent_garment_is_blended() {
    let human = solid_rgb(200, 300, [0, 0, 255]);
    let mut garment = RgbaImage::from_pixel(100, 100, Rgba([255, 0, 0, 255]));
    // Left half fully transparent
    for y in 0..100 {
        for x in 0..50 {
            garment.put_pixel(x, y, Rgba([255, 0, 0, 0]));
        }
    }
    let garment = ImageAsset::from_dynamic(DynamicImage::ImageRgba8(garment)).unwrap();

    let result = composite(&human, &garment).unwrap();
    assert!(!result.has_alpha());

    // Garment occupies x 50..150, y 100..200
    let rgb = result.as_dynamic().to_rgb8();
    assert_eq!(rgb.get_pixel(60, 150), &Rgb([0, 0, 255]));
    assert_eq!(rgb.get_pixel(140, 150), &Rgb([255, 0, 0]));
}

#[test]
fn test_tall_garment_is_clipped_at_bottom() {
    let human = solid_rgb(100, 100, [0, 255, 0]);
    let garment = solid_rgb(10, 100, [255, 0, 0]);

    let result = composite(&human, &garment).unwrap();
    assert_eq!(result.dimensions(), (100, 100));
    let rgb = result.as_dynamic().to_rgb8();
    assert_eq!(rgb.get_pixel(50, 99), &Rgb([255, 0, 0]));
}

#[test]
fn test_composite_is_deterministic() {
    let human = solid_rgb(64, 96, [10, 20, 30]);
    let garment = solid_rgb(40, 20, [200, 100, 50]);
    assert_eq!(composite(&human, &garment).unwrap(), composite(&human, &garment).unwrap());
}

#[test]
fn test_extreme_aspect_garment_stays_within_canvas() {
    let human = solid_rgb(768, 1024, [0, 0, 255]);
    let garment = solid_rgb(1, 20000, [255, 0, 0]);

    let region = overlay_region((768, 1024), (1, 20000));
    assert_eq!(region.y + region.height, 1024);
    assert!(region.source_rows <= 20000);

    let result = composite(&human, &garment).unwrap();
    assert_eq!(result.dimensions(), (768, 1024));
    let rgb = result.as_dynamic().to_rgb8();
    assert_eq!(rgb.get_pixel(384, 700), &Rgb([255, 0, 0]));
    assert_eq!(rgb.get_pixel(384, 1023), &Rgb([255, 0, 0]));
    assert_eq!(rgb.get_pixel(100, 700), &Rgb([0, 0, 255]));
}
