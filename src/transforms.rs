//! Per-sample transforms, applied lazily when a dataset item is read.
use std::fmt;

use image::{DynamicImage, GenericImageView};
use itertools::Itertools;
use ndarray::Array3;
use rand::RngCore;

use crate::error::{Error, Result};

pub mod image_augmentations;
pub mod tensor_conversion;
pub mod transform_config;

pub use image_augmentations::{RandomHorizontalFlip, RandomRotation, Resize};
pub use tensor_conversion::{Normalize, ToTensor};
pub use transform_config::{Degrees, NormalizeConfig, ResizeConfig, TransformConfig};

/// A dataset item on its way through a transform chain
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    Image(DynamicImage),
    /// channels x height x width
    Tensor(Array3<f32>),
}

impl Sample {
    /// (channels, height, width)
    pub fn shape(&self) -> (usize, usize, usize) {
        match self {
            Sample::Image(img) => {
                let (width, height) = img.dimensions();
                (
                    img.color().channel_count() as usize,
                    height as usize,
                    width as usize,
                )
            }
            Sample::Tensor(tensor) => tensor.dim(),
        }
    }

    pub fn as_tensor(&self) -> Option<&Array3<f32>> {
        match self {
            Sample::Tensor(tensor) => Some(tensor),
            Sample::Image(_) => None,
        }
    }

    pub fn into_tensor(self) -> Option<Array3<f32>> {
        match self {
            Sample::Tensor(tensor) => Some(tensor),
            Sample::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&DynamicImage> {
        match self {
            Sample::Image(img) => Some(img),
            Sample::Tensor(_) => None,
        }
    }

    pub(crate) fn expect_image(self, transform: &'static str) -> Result<DynamicImage> {
        match self {
            Sample::Image(img) => Ok(img),
            Sample::Tensor(_) => Err(Error::UnexpectedSample {
                transform,
                expected: "an image",
            }),
        }
    }

    pub(crate) fn expect_tensor(self, transform: &'static str) -> Result<Array3<f32>> {
        match self {
            Sample::Tensor(tensor) => Ok(tensor),
            Sample::Image(_) => Err(Error::UnexpectedSample {
                transform,
                expected: "a tensor",
            }),
        }
    }
}

/// One step of a transform chain.
///
/// Random transforms draw from the given rng so a chain can be replayed with a
/// seeded generator.
pub trait Transform: fmt::Display + Send + Sync {
    fn apply(&self, sample: Sample, rng: &mut dyn RngCore) -> Result<Sample>;
}

/// Applies its transforms in order
pub struct Compose {
    transforms: Vec<Box<dyn Transform>>,
}

impl Compose {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Compose {
        Compose { transforms }
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl Transform for Compose {
    fn apply(&self, sample: Sample, rng: &mut dyn RngCore) -> Result<Sample> {
        self.transforms
            .iter()
            .try_fold(sample, |sample, transform| transform.apply(sample, &mut *rng))
    }
}

impl fmt::Display for Compose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.transforms.is_empty() {
            return write!(f, "Compose()");
        }
        write!(
            f,
            "Compose(\n    {}\n)",
            self.transforms.iter().format("\n    ")
        )
    }
}

impl fmt::Debug for Compose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn compose_runs_in_order_and_prints_every_stage() {
        let chain = Compose::new(vec![
            Box::new(Resize::new(4, 6)),
            Box::new(ToTensor),
            Box::new(Normalize::new(vec![0.5], vec![0.5]).unwrap()),
        ]);
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([255, 255, 255])));
        let out = chain
            .apply(Sample::Image(img), &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(out.shape(), (3, 4, 6));
        assert!(out.as_tensor().unwrap().iter().all(|v| (*v - 1.).abs() < 1e-6));
        assert_eq!(
            chain.to_string(),
            "Compose(\n    Resize(size=(4, 6))\n    ToTensor()\n    Normalize(mean=[0.5], std=[0.5])\n)"
        );
    }

    #[test]
    fn wrong_stage_order_is_an_error() {
        let chain = Compose::new(vec![Box::new(ToTensor), Box::new(Resize::new(2, 2))]);
        let img = DynamicImage::ImageRgb8(RgbImage::new(3, 3));
        assert!(matches!(
            chain.apply(Sample::Image(img), &mut StdRng::seed_from_u64(0)),
            Err(Error::UnexpectedSample { transform: "Resize", .. })
        ));
    }
}
