//! Unit tests for image payload decoding and encoding

use image::{DynamicImage, GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};
use tryon_gateway::imaging::codec::{self, ImageFormat};
use tryon_gateway::imaging::{ChannelLayout, ImageAsset};
use tryon_gateway::AppError;

fn rgb_asset(width: u32, height: u32) -> ImageAsset {
    let image = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
    ImageAsset::from_dynamic(DynamicImage::ImageRgb8(image)).unwrap()
}

#[test]
fn test_base64_png_decodes_with_and_without_prefix() {
    let png = codec::encode(&rgb_asset(33, 17), ImageFormat::Png, 90).unwrap();

    let bare = codec::decode_base64_image(&codec::encode_base64(&png)).unwrap();
    let data_url = codec::decode_base64_image(&codec::create_data_url(&png, ImageFormat::Png)).unwrap();

    assert_eq!(bare.dimensions(), (33, 17));
    assert_eq!(bare, data_url);
}

#[test]
fn test_line_wrapped_base64_is_accepted() {
    let png = codec::encode(&rgb_asset(20, 12), ImageFormat::Png, 90).unwrap();
    let encoded = codec::encode_base64(&png);

    // MIME-style wrapping at 76 columns with CRLF, plus stray spaces
    let wrapped = encoded
        .as_bytes()
        .chunks(76)
        .map(|line| std::str::from_utf8(line).unwrap())
        .collect::<Vec<_>>()
        .join("\r\n");
    let padded = format!("data:image/png;base64, {}\n", wrapped);

    assert_eq!(codec::decode_base64(&wrapped).unwrap(), png);
    assert_eq!(codec::decode_base64_image(&padded).unwrap().dimensions(), (20, 12));
}

#[test]
fn test_reencode_keeps_geometry() {
    let original = codec::encode(&rgb_asset(120, 80), ImageFormat::Png, 90).unwrap();
    let decoded = codec::decode_bytes(&original).unwrap();

    let jpeg = codec::encode(&decoded, ImageFormat::Jpeg, 90).unwrap();
    let redecoded = codec::decode_bytes(&jpeg).unwrap();

    assert_eq!(redecoded.dimensions(), decoded.dimensions());
}

#[test]
fn test_rgba_is_flattened_for_jpeg() {
    let rgba = RgbaImage::from_pixel(10, 10, Rgba([200, 10, 10, 128]));
    let asset = ImageAsset::from_dynamic(DynamicImage::ImageRgba8(rgba)).unwrap();
    assert_eq!(asset.layout(), ChannelLayout::Rgba);

    let jpeg = codec::encode(&asset, ImageFormat::Jpeg, 80).unwrap();
    assert!(jpeg.starts_with(&[0xFF, 0xD8, 0xFF]));

    let decoded = codec::decode_bytes(&jpeg).unwrap();
    assert_eq!(decoded.layout(), ChannelLayout::Rgb);
    assert_eq!(decoded.as_dynamic().dimensions(), (10, 10));
}

#[test]
fn test_rgba_survives_png() {
    let rgba = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 4]));
    let asset = ImageAsset::from_dynamic(DynamicImage::ImageRgba8(rgba)).unwrap();
    let png = codec::encode(&asset, ImageFormat::Png, 90).unwrap();
    assert_eq!(codec::decode_bytes(&png).unwrap(), asset);
}

#[test]
fn test_malformed_payloads_are_decode_errors() {
    assert!(matches!(codec::decode_base64_image("not-base64!!"), Err(AppError::Decode(_))));
    assert!(matches!(codec::decode_bytes(&[]), Err(AppError::Decode(_))));
    // Valid base64, but not an image
    assert!(matches!(
        codec::decode_base64_image("SGVsbG8sIFdvcmxkIQ=="),
        Err(AppError::Decode(_))
    ));
}

#[test]
fn test_data_url_shape() {
    let url = codec::encode_data_url(&rgb_asset(2, 2), ImageFormat::Jpeg, 90).unwrap();
    assert!(url.starts_with("data:image/jpeg;base64,"));
    assert_eq!(codec::decode_base64_image(&url).unwrap().dimensions(), (2, 2));
}
