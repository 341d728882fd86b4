use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use rand::RngCore;
use rayon::prelude::*;
use walkdir::WalkDir;

use super::DataLoader;
use crate::error::{Error, Result};
use crate::transforms::{Sample, Transform};

/// File extensions recognised as images, compared case-insensitively
pub const IMG_EXTENSIONS: [&str; 9] = [
    "jpg", "jpeg", "png", "ppm", "bmp", "pgm", "tif", "tiff", "webp",
];

/// Labelled images laid out as `root/<class>/**/<image>`.
///
/// Scanning happens once on construction; images are decoded and transformed
/// only when an item is read.
pub struct ImageFolder {
    root: PathBuf,
    classes: Vec<String>,
    class_to_idx: BTreeMap<String, usize>,
    samples: Vec<(PathBuf, usize)>,
    transform: Option<Box<dyn Transform>>,
}

impl ImageFolder {
    pub fn new<T: AsRef<Path>>(
        root: T,
        transform: Option<Box<dyn Transform>>,
    ) -> Result<ImageFolder> {
        let root = root.as_ref().to_owned();
        let classes = find_classes(&root)?;
        let class_to_idx: BTreeMap<String, usize> = classes
            .iter()
            .enumerate()
            .map(|(idx, class)| (class.clone(), idx))
            .collect();
        let samples = make_dataset(&root, &classes)?;
        Ok(ImageFolder {
            root,
            classes,
            class_to_idx,
            samples,
            transform,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sorted class names; a label is an index into this
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn class_to_idx(&self) -> &BTreeMap<String, usize> {
        &self.class_to_idx
    }

    /// (image path, label) for every item, in item order
    pub fn samples(&self) -> &[(PathBuf, usize)] {
        &self.samples
    }

    pub fn targets(&self) -> Vec<usize> {
        self.samples.iter().map(|(_, target)| *target).collect()
    }

    pub fn transform(&self) -> Option<&dyn Transform> {
        self.transform.as_deref()
    }

    /// Decodes and transforms item `index`
    pub fn get(&self, index: usize) -> Result<(Sample, usize)> {
        self.get_with_rng(index, &mut rand::thread_rng())
    }

    pub fn get_with_rng(&self, index: usize, rng: &mut dyn RngCore) -> Result<(Sample, usize)> {
        let (path, target) = self.samples.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.samples.len(),
        })?;
        let img = Sample::Image(load_rgb(path)?);
        let sample = match &self.transform {
            Some(transform) => transform.apply(img, rng)?,
            None => img,
        };
        Ok((sample, *target))
    }

    pub fn iter(&self) -> ImageFolderIter<'_> {
        ImageFolderIter {
            folder: self,
            next_element_index: 0,
        }
    }

    /// Reads every item on the rayon pool, keeping item order
    pub fn load_all(&self) -> Result<Vec<(Sample, usize)>> {
        (0..self.len())
            .into_par_iter()
            .map(|index| self.get(index))
            .collect()
    }
}

fn find_classes(root: &Path) -> Result<Vec<String>> {
    let mut classes = vec![];
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() {
            if let Some(name) = path.file_name() {
                classes.push(name.to_string_lossy().into_owned());
            }
        }
    }
    if classes.is_empty() {
        return Err(Error::NoClasses(root.to_owned()));
    }
    classes.sort();
    Ok(classes)
}

fn make_dataset(root: &Path, classes: &[String]) -> Result<Vec<(PathBuf, usize)>> {
    let mut samples = vec![];
    for (class_idx, class) in classes.iter().enumerate() {
        let mut files = vec![];
        for entry in WalkDir::new(root.join(class)).follow_links(true) {
            let entry = entry?;
            if entry.file_type().is_file() && is_image_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
        if files.is_empty() {
            return Err(Error::EmptyClass {
                class: class.clone(),
                extensions: IMG_EXTENSIONS.join(", "),
            });
        }
        // folder by folder (folders ordered as strings), files sorted within each
        files.sort_by_cached_key(|path| {
            (
                path.parent().map(|dir| dir.to_string_lossy().into_owned()),
                path.file_name().map(|name| name.to_os_string()),
            )
        });
        samples.extend(files.into_iter().map(|path| (path, class_idx)));
    }
    Ok(samples)
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMG_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn load_rgb(path: &Path) -> Result<DynamicImage> {
    let img = image::open(path).map_err(|source| Error::Image {
        path: path.to_owned(),
        source,
    })?;
    Ok(DynamicImage::ImageRgb8(img.to_rgb8()))
}

impl fmt::Display for ImageFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Dataset ImageFolder\n    Number of datapoints: {}\n    Root location: {}",
            self.len(),
            self.root.display()
        )?;
        if let Some(transform) = &self.transform {
            write!(f, "\nTransform: {}", transform)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ImageFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFolder")
            .field("root", &self.root)
            .field("classes", &self.classes)
            .field("len", &self.samples.len())
            .field("transform", &self.transform.as_ref().map(|t| t.to_string()))
            .finish()
    }
}

/// Lazily reads the items of an [`ImageFolder`] in order
pub struct ImageFolderIter<'a> {
    folder: &'a ImageFolder,
    next_element_index: usize,
}

impl<'a> Iterator for ImageFolderIter<'a> {
    type Item = Result<(Sample, usize)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_element_index >= self.folder.len() {
            return None;
        }
        let item = self.folder.get(self.next_element_index);
        self.next_element_index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.folder.len().saturating_sub(self.next_element_index);
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for ImageFolderIter<'a> {}

impl<'a> DataLoader for ImageFolderIter<'a> {
    fn next_element_index(&self) -> usize {
        self.next_element_index
    }

    fn max_elem_index(&self) -> usize {
        self.folder.len()
    }
}

impl<'a> IntoIterator for &'a ImageFolder {
    type Item = Result<(Sample, usize)>;
    type IntoIter = ImageFolderIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
