use std::fmt;

use image::imageops::FilterType;
use image::{DynamicImage, Luma, Rgb, Rgba};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use rand::{Rng, RngCore};

use super::{Sample, Transform};
use crate::error::{Error, Result};
use crate::transforms::transform_config::Degrees;

/// Mirrors the image left to right with probability `p`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomHorizontalFlip {
    p: f64,
}

impl RandomHorizontalFlip {
    pub fn new(p: f64) -> Result<RandomHorizontalFlip> {
        if !(0.0..=1.0).contains(&p) {
            return Err(Error::InvalidValue {
                key: "p".to_string(),
                expected: "a probability between 0 and 1".to_string(),
            });
        }
        Ok(RandomHorizontalFlip { p })
    }
}

impl Default for RandomHorizontalFlip {
    fn default() -> Self {
        RandomHorizontalFlip { p: 0.5 }
    }
}

impl Transform for RandomHorizontalFlip {
    fn apply(&self, sample: Sample, rng: &mut dyn RngCore) -> Result<Sample> {
        let img = sample.expect_image("RandomHorizontalFlip")?;
        if rng.gen_bool(self.p) {
            Ok(Sample::Image(img.fliph()))
        } else {
            Ok(Sample::Image(img))
        }
    }
}

impl fmt::Display for RandomHorizontalFlip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RandomHorizontalFlip(p={})", self.p)
    }
}

/// Rotates about the centre by an angle drawn uniformly from `[min, max]` degrees.
///
/// Positive angles turn counter-clockwise. The canvas keeps its size and the
/// corners left uncovered are black.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomRotation {
    min: f64,
    max: f64,
}

impl RandomRotation {
    pub fn new(degrees: Degrees) -> Result<RandomRotation> {
        let (min, max) = match degrees {
            Degrees::Symmetric(d) if d < 0. => {
                return Err(Error::InvalidValue {
                    key: "degrees".to_string(),
                    expected: "a non-negative number when given a single value".to_string(),
                })
            }
            Degrees::Symmetric(d) => (-d, d),
            Degrees::Range([min, max]) => (min, max),
        };
        if !(min <= max) {
            return Err(Error::InvalidValue {
                key: "degrees".to_string(),
                expected: "a [min, max] range with min <= max".to_string(),
            });
        }
        // the sampled range must have a finite width
        if !(max - min).is_finite() {
            return Err(Error::InvalidValue {
                key: "degrees".to_string(),
                expected: "finite bounds".to_string(),
            });
        }
        Ok(RandomRotation { min, max })
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }
}

impl Transform for RandomRotation {
    fn apply(&self, sample: Sample, rng: &mut dyn RngCore) -> Result<Sample> {
        let img = sample.expect_image("RandomRotation")?;
        let angle = rng.gen_range(self.min..=self.max) % 360.;
        Ok(Sample::Image(rotate(img, angle as f32)))
    }
}

impl fmt::Display for RandomRotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RandomRotation(degrees=[{}, {}], interpolation=nearest, expand=False, fill=0)",
            self.min, self.max
        )
    }
}

// imageproc turns clockwise for a positive theta
fn rotate(img: DynamicImage, degrees: f32) -> DynamicImage {
    let theta = -degrees.to_radians();
    let nearest = Interpolation::Nearest;
    match img {
        DynamicImage::ImageLuma8(buf) => {
            DynamicImage::ImageLuma8(rotate_about_center(&buf, theta, nearest, Luma([0])))
        }
        DynamicImage::ImageRgb8(buf) => {
            DynamicImage::ImageRgb8(rotate_about_center(&buf, theta, nearest, Rgb([0, 0, 0])))
        }
        DynamicImage::ImageRgba8(buf) => DynamicImage::ImageRgba8(rotate_about_center(
            &buf,
            theta,
            nearest,
            Rgba([0, 0, 0, 0]),
        )),
        other => DynamicImage::ImageRgb8(rotate_about_center(
            &other.to_rgb8(),
            theta,
            nearest,
            Rgb([0, 0, 0]),
        )),
    }
}

/// Resizes to exactly `height` x `width`, ignoring the aspect ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resize {
    height: u32,
    width: u32,
}

impl Resize {
    pub fn new(height: u32, width: u32) -> Resize {
        Resize { height, width }
    }
}

impl Transform for Resize {
    fn apply(&self, sample: Sample, _rng: &mut dyn RngCore) -> Result<Sample> {
        let img = sample.expect_image("Resize")?;
        Ok(Sample::Image(img.resize_exact(
            self.width,
            self.height,
            FilterType::Triangle,
        )))
    }
}

impl fmt::Display for Resize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resize(size=({}, {}))", self.height, self.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbImage};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn marked_image() -> DynamicImage {
        let mut img = RgbImage::new(4, 2);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        DynamicImage::ImageRgb8(img)
    }

    fn pixel(sample: &Sample, x: u32, y: u32) -> [u8; 4] {
        sample.as_image().unwrap().get_pixel(x, y).0
    }

    #[test]
    fn flip_always_and_never() {
        let mut rng = StdRng::seed_from_u64(7);
        let always = RandomHorizontalFlip::new(1.0).unwrap();
        let flipped = always.apply(Sample::Image(marked_image()), &mut rng).unwrap();
        assert_eq!(pixel(&flipped, 3, 0), [255, 0, 0, 255]);
        assert_eq!(pixel(&flipped, 0, 0), [0, 0, 0, 255]);

        let never = RandomHorizontalFlip::new(0.0).unwrap();
        let kept = never.apply(Sample::Image(marked_image()), &mut rng).unwrap();
        assert_eq!(pixel(&kept, 0, 0), [255, 0, 0, 255]);
    }

    #[test]
    fn flip_rejects_bad_probability() {
        assert!(RandomHorizontalFlip::new(1.5).is_err());
        assert!(RandomHorizontalFlip::new(-0.1).is_err());
    }

    #[test]
    fn rotation_degrees_validation() {
        assert_eq!(
            RandomRotation::new(Degrees::Symmetric(15.)).unwrap().range(),
            (-15., 15.)
        );
        assert_eq!(
            RandomRotation::new(Degrees::Range([-5., 30.])).unwrap().range(),
            (-5., 30.)
        );
        assert!(RandomRotation::new(Degrees::Symmetric(-1.)).is_err());
        assert!(RandomRotation::new(Degrees::Range([10., 5.])).is_err());
    }

    #[test]
    fn rotation_rejects_unbounded_degrees() {
        for degrees in [
            Degrees::Symmetric(f64::INFINITY),
            Degrees::Symmetric(1e308),
            Degrees::Symmetric(f64::NAN),
            Degrees::Range([f64::NEG_INFINITY, 0.]),
            Degrees::Range([-1e308, 1e308]),
        ] {
            assert!(matches!(
                RandomRotation::new(degrees),
                Err(Error::InvalidValue { .. })
            ));
        }
        // large but sampleable
        let wide = RandomRotation::new(Degrees::Symmetric(1e300)).unwrap();
        assert!(wide
            .apply(Sample::Image(marked_image()), &mut StdRng::seed_from_u64(3))
            .is_ok());
    }

    #[test]
    fn rotation_zero_is_identity() {
        let rotation = RandomRotation::new(Degrees::Symmetric(0.)).unwrap();
        let out = rotation
            .apply(Sample::Image(marked_image()), &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(out.as_image().unwrap(), &marked_image());
    }

    #[test]
    fn rotation_is_counter_clockwise_and_fills_black() {
        // left half white, right half black
        let img = RgbImage::from_fn(20, 20, |x, _| {
            if x < 10 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let quarter_turn = RandomRotation::new(Degrees::Range([90., 90.])).unwrap();
        let out = quarter_turn
            .apply(
                Sample::Image(DynamicImage::ImageRgb8(img)),
                &mut StdRng::seed_from_u64(1),
            )
            .unwrap();
        // the left half ends up at the bottom
        assert_eq!(pixel(&out, 5, 16), [255, 255, 255, 255]);
        assert_eq!(pixel(&out, 15, 16), [255, 255, 255, 255]);
        assert_eq!(pixel(&out, 5, 3), [0, 0, 0, 255]);
        assert_eq!(pixel(&out, 15, 3), [0, 0, 0, 255]);

        let white = DynamicImage::ImageRgb8(RgbImage::from_pixel(21, 21, Rgb([255, 255, 255])));
        let eighth_turn = RandomRotation::new(Degrees::Range([45., 45.])).unwrap();
        let out = eighth_turn
            .apply(Sample::Image(white), &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(pixel(&out, 0, 0), [0, 0, 0, 255]);
        assert_eq!(pixel(&out, 10, 10), [255, 255, 255, 255]);
    }

    #[test]
    fn resize_is_exact() {
        let out = Resize::new(3, 7)
            .apply(Sample::Image(marked_image()), &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(out.shape(), (3, 3, 7));
    }
}
