use std::fmt;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use super::{DataSet, Description, ImageFolder};
use crate::config::{ConfigLoader, Parameters, PARAMETER_PATTERNS};
use crate::error::{Error, Result};
use crate::transforms::TransformConfig;

/// Loads an image folder of skin lesion pictures through the melanoma
/// augmentation chain configured under `transformations`.
///
/// ```no_run
/// use siim_melanoma::{DataSet, ImageDataset};
///
/// let dataset = ImageDataset::from_project("data/01_raw/train", ".")?;
/// let images = dataset.load()?;
/// println!("{} images in {:?}", images.len(), images.classes());
/// # Ok::<(), siim_melanoma::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ImageDataset {
    filepath: String,
    parameters: Parameters,
}

impl ImageDataset {
    /// `filepath` is taken as is, it is only read on `load`
    pub fn new<S: Into<String>>(filepath: S, parameters: Parameters) -> ImageDataset {
        ImageDataset {
            filepath: filepath.into(),
            parameters,
        }
    }

    /// Resolves the project parameters (`conf/base`, then `conf/local`).
    /// A project without any parameter file gets an empty mapping.
    pub fn from_project<S: Into<String>, P: AsRef<Path>>(
        filepath: S,
        project_dir: P,
    ) -> Result<ImageDataset> {
        let loader = ConfigLoader::for_project(project_dir);
        let parameters = match loader.get(&PARAMETER_PATTERNS) {
            Ok(parameters) => parameters,
            Err(Error::MissingConfig { .. }) => {
                debug!(
                    "No parameters found in {:?}, using an empty configuration",
                    loader.conf_paths()
                );
                Parameters::default()
            }
            Err(e) => return Err(e),
        };
        Ok(ImageDataset::new(filepath, parameters))
    }

    pub fn filepath(&self) -> &str {
        &self.filepath
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }
}

impl DataSet for ImageDataset {
    type Data = ImageFolder;

    fn load(&self) -> Result<ImageFolder> {
        info!("Loading data from {}", self);
        let transform = TransformConfig::from_parameters(&self.parameters)?.build()?;
        debug!("Transform: {}", transform);
        ImageFolder::new(&self.filepath, Some(Box::new(transform)))
    }

    // images are never written back
    fn save(&self, _data: ImageFolder) -> Result<()> {
        debug!("Ignoring save to {}", self);
        Ok(())
    }

    fn describe(&self) -> Description {
        let mut description = Description::new();
        description.insert("filepath".to_string(), Value::String(self.filepath.clone()));
        description
    }

    fn exists(&self) -> Result<bool> {
        Ok(Path::new(&self.filepath).is_dir())
    }
}

impl fmt::Display for ImageDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageDataset(filepath={})", self.filepath)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn describe_is_the_filepath_only() {
        let dataset = ImageDataset::new("s3://bucket/train", Parameters::default());
        assert_eq!(
            Value::Object(dataset.describe()),
            json!({"filepath": "s3://bucket/train"})
        );
        assert_eq!(dataset.to_string(), "ImageDataset(filepath=s3://bucket/train)");
    }

    #[test]
    fn empty_parameters_fail_on_first_key() {
        let dataset = ImageDataset::new("/does/not/matter", Parameters::default());
        match dataset.load() {
            Err(Error::MissingKey(key)) => assert_eq!(key, "transformations"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn exists_checks_for_a_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().display().to_string();
        assert!(ImageDataset::new(path, Parameters::default()).exists().unwrap());
        assert!(!ImageDataset::new("/no/such/folder", Parameters::default())
            .exists()
            .unwrap());
    }
}
