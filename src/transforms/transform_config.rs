use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use super::{
    Compose, Normalize, RandomHorizontalFlip, RandomRotation, Resize, ToTensor, Transform,
};
use crate::config::Parameters;
use crate::error::{Error, Result};

const ROOT: &str = "transformations";

/// Rotation bounds: a single `d` means `[-d, d]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Degrees {
    Symmetric(f64),
    Range([f64; 2]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeConfig {
    pub height: u32,
    pub width: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeConfig {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

/// The `transformations` block of the project parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformConfig {
    pub random_rotation: Degrees,
    pub resize: ResizeConfig,
    pub normalize: NormalizeConfig,
}

impl TransformConfig {
    /// Reads every key the melanoma chain needs. Nothing is defaulted: the
    /// first absent key fails with [`Error::MissingKey`].
    pub fn from_parameters(params: &Parameters) -> Result<TransformConfig> {
        let rotation_key = [ROOT, "random_rotation"];
        let random_rotation = match params.lookup(&rotation_key)? {
            Value::Sequence(_) => match params.lookup_f64_seq(&rotation_key)?.as_slice() {
                [min, max] => Degrees::Range([*min, *max]),
                _ => {
                    return Err(Error::InvalidValue {
                        key: rotation_key.join("."),
                        expected: "a number or a [min, max] pair".to_string(),
                    })
                }
            },
            _ => Degrees::Symmetric(params.lookup_f64(&rotation_key)?),
        };
        let resize = ResizeConfig {
            height: params.lookup_u32(&[ROOT, "resize", "height"])?,
            width: params.lookup_u32(&[ROOT, "resize", "width"])?,
        };
        let normalize = NormalizeConfig {
            mean: params.lookup_f64_seq(&[ROOT, "normalize", "mean"])?,
            std: params.lookup_f64_seq(&[ROOT, "normalize", "std"])?,
        };
        Ok(TransformConfig {
            random_rotation,
            resize,
            normalize,
        })
    }

    /// Flip, rotate, resize, to tensor, normalize; in that order
    pub fn build(&self) -> Result<Compose> {
        let to_f32 = |values: &[f64]| values.iter().map(|v| *v as f32).collect::<Vec<f32>>();
        let transforms: Vec<Box<dyn Transform>> = vec![
            Box::new(RandomHorizontalFlip::default()),
            Box::new(RandomRotation::new(self.random_rotation)?),
            Box::new(Resize::new(self.resize.height, self.resize.width)),
            Box::new(ToTensor),
            Box::new(Normalize::new(
                to_f32(&self.normalize.mean),
                to_f32(&self.normalize.std),
            )?),
        ];
        Ok(Compose::new(transforms))
    }
}
