//! Image data sets for the SIIM-ISIC melanoma classification pipeline.
//!
//! [`ImageDataset`] reads an image folder (one sub folder per label) and
//! attaches the augmentation chain described by the project parameters:
//!
//! ```yaml
//! transformations:
//!   random_rotation: 15
//!   resize: {height: 224, width: 224}
//!   normalize: {mean: [0.5, 0.5, 0.5], std: [0.5, 0.5, 0.5]}
//! ```
pub mod config;
pub mod dataset;
pub mod error;
pub mod transforms;

pub use config::{ConfigLoader, Parameters};
pub use dataset::{DataLoader, DataSet, Description, ImageDataset, ImageFolder};
pub use error::{Error, Result};
pub use transforms::{Compose, Sample, Transform, TransformConfig};
