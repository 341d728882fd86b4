use std::fmt;

use serde_json::{Map, Value};

use crate::error::Result;

pub mod image_dataset;
pub mod image_folder;

pub use image_dataset::ImageDataset;
pub use image_folder::{ImageFolder, ImageFolderIter, IMG_EXTENSIONS};

/// Attributes a data set reports about itself
pub type Description = Map<String, Value>;

/// A named artifact a pipeline can load, save and describe.
///
/// `Display` is the identity used in logs, e.g. `ImageDataset(filepath=data/train)`.
pub trait DataSet: fmt::Display {
    type Data;

    fn load(&self) -> Result<Self::Data>;

    fn save(&self, data: Self::Data) -> Result<()>;

    fn describe(&self) -> Description;

    fn exists(&self) -> Result<bool> {
        Ok(false)
    }
}

/// An iterator over a data set that can report how far along it is
pub trait DataLoader: Iterator {
    /// Index of the item the next call yields, starting from 0
    fn next_element_index(&self) -> usize;
    /// Number of items in the data set
    fn max_elem_index(&self) -> usize;
}
