use std::path::Path;

use image::imageops::FilterType;

use super::ops::Tensor3;
use crate::error::ApiError;

pub const INPUT_SIZE: usize = 224;

/// ImageNet channel means in BGR order. The backbone was trained with
/// Caffe-style preprocessing: channels reordered RGB→BGR, means subtracted,
/// no scaling.
const BGR_MEAN: [f32; 3] = [103.939, 116.779, 123.68];

/// Decode an image file, resize to the fixed input resolution and normalize
/// into a 3×224×224 BGR tensor. Existence is the caller's concern; any decode
/// failure is an invalid image.
pub fn load_and_preprocess(path: &Path) -> Result<Tensor3, ApiError> {
    let decoded = image::open(path).map_err(|_| ApiError::InvalidImage)?;
    let rgb = decoded
        .resize_exact(INPUT_SIZE as u32, INPUT_SIZE as u32, FilterType::Triangle)
        .to_rgb8();

    let mut tensor = Tensor3::zeros(3, INPUT_SIZE, INPUT_SIZE);
    for y in 0..INPUT_SIZE {
        for x in 0..INPUT_SIZE {
            let [r, g, b] = rgb.get_pixel(x as u32, y as u32).0;
            tensor.set(0, y, x, b as f32 - BGR_MEAN[0]);
            tensor.set(1, y, x, g as f32 - BGR_MEAN[1]);
            tensor.set(2, y, x, r as f32 - BGR_MEAN[2]);
        }
    }
    Ok(tensor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn normalizes_into_bgr_mean_subtracted_tensor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat.png");
        RgbImage::from_pixel(INPUT_SIZE as u32, INPUT_SIZE as u32, Rgb([124, 117, 104]))
            .save(&path)
            .unwrap();

        let t = load_and_preprocess(&path).unwrap();
        assert_eq!(
            (t.channels, t.height, t.width),
            (3, INPUT_SIZE, INPUT_SIZE)
        );
        assert!((t.get(0, 0, 0) - (104.0 - 103.939)).abs() < 1e-4);
        assert!((t.get(1, 100, 100) - (117.0 - 116.779)).abs() < 1e-4);
        assert!((t.get(2, 223, 223) - (124.0 - 123.68)).abs() < 1e-4);
    }

    #[test]
    fn resizes_to_fixed_input_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.png");
        RgbImage::from_pixel(32, 48, Rgb([200, 10, 10]))
            .save(&path)
            .unwrap();

        let t = load_and_preprocess(&path).unwrap();
        assert_eq!((t.height, t.width), (INPUT_SIZE, INPUT_SIZE));
    }

    #[test]
    fn undecodable_file_is_invalid_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-an-image.jpg");
        std::fs::write(&path, b"definitely not jpeg bytes").unwrap();

        let err = load_and_preprocess(&path).unwrap_err();
        assert!(matches!(err, ApiError::InvalidImage));
    }
}
