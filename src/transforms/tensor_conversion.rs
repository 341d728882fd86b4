use std::fmt;

use image::{DynamicImage, GenericImageView};
use ndarray::{Array3, Axis};
use rand::RngCore;

use super::{Sample, Transform};
use crate::error::{Error, Result};

/// 8 bit HWC image to a CHW f32 tensor in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToTensor;

impl Transform for ToTensor {
    fn apply(&self, sample: Sample, _rng: &mut dyn RngCore) -> Result<Sample> {
        let img = sample.expect_image("ToTensor")?;
        Ok(Sample::Tensor(from_img_to_tensor(&img)))
    }
}

impl fmt::Display for ToTensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ToTensor()")
    }
}

pub fn from_img_to_tensor(img: &DynamicImage) -> Array3<f32> {
    let (width, height) = img.dimensions();
    let (width, height) = (width as usize, height as usize);
    let converted;
    let (channels, raw): (usize, &[u8]) = match img {
        DynamicImage::ImageLuma8(buf) => (1, &buf.as_raw()[..]),
        DynamicImage::ImageRgb8(buf) => (3, &buf.as_raw()[..]),
        DynamicImage::ImageRgba8(buf) => (4, &buf.as_raw()[..]),
        other => {
            converted = other.to_rgb8();
            (3, &converted.as_raw()[..])
        }
    };
    Array3::from_shape_fn((channels, height, width), |(c, y, x)| {
        f32::from(raw[(y * width + x) * channels + c]) / 255.
    })
}

/// Per channel `(x - mean) / std`. Single values apply to every channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalize {
    mean: Vec<f32>,
    std: Vec<f32>,
}

impl Normalize {
    pub fn new(mean: Vec<f32>, std: Vec<f32>) -> Result<Normalize> {
        if mean.is_empty() || std.is_empty() {
            return Err(Error::InvalidValue {
                key: "normalize".to_string(),
                expected: "at least one mean and one std value".to_string(),
            });
        }
        if std.iter().any(|s| *s == 0.) {
            return Err(Error::InvalidValue {
                key: "normalize.std".to_string(),
                expected: "non-zero values, division by zero otherwise".to_string(),
            });
        }
        Ok(Normalize { mean, std })
    }

    fn per_channel(values: &[f32], channel: usize) -> f32 {
        if values.len() == 1 {
            values[0]
        } else {
            values[channel]
        }
    }
}

impl Transform for Normalize {
    fn apply(&self, sample: Sample, _rng: &mut dyn RngCore) -> Result<Sample> {
        let mut tensor = sample.expect_tensor("Normalize")?;
        let channels = tensor.len_of(Axis(0));
        for values in [&self.mean, &self.std] {
            if values.len() != 1 && values.len() != channels {
                return Err(Error::ChannelMismatch {
                    channels,
                    got: values.len(),
                });
            }
        }
        for (channel, mut plane) in tensor.axis_iter_mut(Axis(0)).enumerate() {
            let mean = Normalize::per_channel(&self.mean, channel);
            let std = Normalize::per_channel(&self.std, channel);
            plane.mapv_inplace(|v| (v - mean) / std);
        }
        Ok(Sample::Tensor(tensor))
    }
}

impl fmt::Display for Normalize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Normalize(mean={:?}, std={:?})", self.mean, self.std)
    }
}

#[cfg(feature = "tch")]
impl Sample {
    /// Copies the sample into a libtorch tensor: float CHW for tensors,
    /// uint8 CHW for images.
    pub fn to_tch(&self) -> tch::Tensor {
        match self {
            Sample::Tensor(tensor) => {
                let (c, h, w) = tensor.dim();
                let data: Vec<f32> = tensor.iter().copied().collect();
                tch::Tensor::from_slice(&data).reshape([c as i64, h as i64, w as i64])
            }
            Sample::Image(img) => {
                let rgb = img.to_rgb8();
                let (width, height) = rgb.dimensions();
                tch::Tensor::from_slice(rgb.as_raw().as_slice())
                    .reshape([height as i64, width as i64, 3])
                    .permute([2, 0, 1])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn to_tensor_layout_and_scale() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(2, 1, Rgb([255, 51, 0]));
        let out = ToTensor
            .apply(
                Sample::Image(DynamicImage::ImageRgb8(img)),
                &mut StdRng::seed_from_u64(0),
            )
            .unwrap();
        let tensor = out.as_tensor().unwrap();
        assert_eq!(tensor.dim(), (3, 2, 3));
        assert_eq!(tensor[[0, 1, 2]], 1.);
        assert!((tensor[[1, 1, 2]] - 0.2).abs() < 1e-6);
        assert_eq!(tensor[[2, 1, 2]], 0.);
        assert_eq!(tensor[[0, 0, 0]], 0.);
    }

    #[test]
    fn to_tensor_keeps_grayscale_single_channel() {
        let img = GrayImage::from_pixel(2, 2, Luma([255]));
        let tensor = from_img_to_tensor(&DynamicImage::ImageLuma8(img));
        assert_eq!(tensor.dim(), (1, 2, 2));
    }

    #[test]
    fn normalize_per_channel() {
        let tensor = Array3::from_elem((3, 2, 2), 0.5f32);
        let normalize = Normalize::new(vec![0.5, 0.0, 1.0], vec![0.5, 0.25, 0.5]).unwrap();
        let out = normalize
            .apply(Sample::Tensor(tensor), &mut StdRng::seed_from_u64(0))
            .unwrap()
            .into_tensor()
            .unwrap();
        assert_eq!(out[[0, 1, 1]], 0.);
        assert_eq!(out[[1, 0, 0]], 2.);
        assert_eq!(out[[2, 0, 1]], -1.);
    }

    #[test]
    fn normalize_rejects_zero_std_and_wrong_channel_count() {
        assert!(Normalize::new(vec![0.5], vec![0.5, 0.]).is_err());
        assert!(Normalize::new(vec![], vec![1.]).is_err());
        let normalize = Normalize::new(vec![0.5, 0.5], vec![0.5]).unwrap();
        assert!(matches!(
            normalize.apply(
                Sample::Tensor(Array3::zeros((3, 1, 1))),
                &mut StdRng::seed_from_u64(0)
            ),
            Err(Error::ChannelMismatch { channels: 3, got: 2 })
        ));
    }

    #[test]
    fn normalize_needs_a_tensor() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(1, 1));
        let normalize = Normalize::new(vec![0.5], vec![0.5]).unwrap();
        assert!(normalize
            .apply(Sample::Image(img), &mut StdRng::seed_from_u64(0))
            .is_err());
    }
}

#[cfg(all(test, feature = "tch"))]
mod tch_tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn tensor_sample_keeps_shape_and_values() {
        let mut tensor = Array3::<f32>::zeros((3, 2, 4));
        tensor[[1, 1, 3]] = 0.75;
        let converted = Sample::Tensor(tensor).to_tch();
        assert_eq!(converted.size(), vec![3, 2, 4]);
        assert_eq!(converted.double_value(&[1, 1, 3]), 0.75);
        assert_eq!(converted.double_value(&[0, 0, 0]), 0.);
    }

    #[test]
    fn image_sample_is_channel_first_u8() {
        let mut img = RgbImage::new(4, 2);
        img.put_pixel(3, 1, Rgb([10, 20, 30]));
        let converted = Sample::Image(DynamicImage::ImageRgb8(img)).to_tch();
        assert_eq!(converted.size(), vec![3, 2, 4]);
        assert_eq!(converted.kind(), tch::Kind::Uint8);
        assert_eq!(converted.int64_value(&[2, 1, 3]), 30);
        assert_eq!(converted.int64_value(&[0, 1, 3]), 10);
    }
}
