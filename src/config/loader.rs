use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde_yaml::Value;
use tracing::{debug, warn};

use super::parameters::Parameters;
use crate::error::{Error, Result};

/// Glob patterns under which project parameters live
pub const PARAMETER_PATTERNS: [&str; 2] = ["parameters*", "parameters*/**"];

/// Layers of a project, in override order
pub const CONF_ENVIRONMENTS: [&str; 2] = ["base", "local"];

const CONFIG_EXTENSIONS: [&str; 3] = ["yml", "yaml", "json"];

/// Reads configuration from an ordered list of folders, later folders
/// overriding earlier ones key by key at the top level.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    conf_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    pub fn new<P: Into<PathBuf>>(conf_paths: impl IntoIterator<Item = P>) -> ConfigLoader {
        ConfigLoader {
            conf_paths: conf_paths.into_iter().map(Into::into).collect(),
        }
    }

    /// `<project_dir>/conf/base` overridden by `<project_dir>/conf/local`
    pub fn for_project<T: AsRef<Path>>(project_dir: T) -> ConfigLoader {
        let conf_root = project_dir.as_ref().join("conf");
        ConfigLoader::new(CONF_ENVIRONMENTS.iter().map(|env| conf_root.join(env)))
    }

    pub fn conf_paths(&self) -> &[PathBuf] {
        &self.conf_paths
    }

    /// Resolves every file matching one of `patterns` across all layers.
    ///
    /// Within a layer a top-level key may only be defined once. When no file
    /// matches in any layer the result is [`Error::MissingConfig`].
    ///
    /// A conf path that is missing or not a directory is skipped with a
    /// warning instead of failing, so a project without `conf/local` (or
    /// without any conf folder) resolves like one whose folders hold no
    /// matching file.
    pub fn get(&self, patterns: &[&str]) -> Result<Parameters> {
        let mut resolved = Parameters::default();
        let mut processed: HashSet<PathBuf> = HashSet::new();
        for conf_path in &self.conf_paths {
            if !conf_path.is_dir() {
                warn!(
                    "Configuration path {} does not exist or is not a directory, skipping",
                    conf_path.display()
                );
                continue;
            }
            let files: Vec<PathBuf> = lookup_config_files(conf_path, patterns)?
                .into_iter()
                .filter(|file| processed.insert(file.clone()))
                .collect();
            debug!("Loading {} config file(s) from {}", files.len(), conf_path.display());
            resolved.merge(load_layer(&files)?);
        }
        if processed.is_empty() {
            return Err(Error::MissingConfig {
                conf_paths: self.conf_paths.clone(),
                patterns: patterns.iter().map(|p| p.to_string()).collect(),
            });
        }
        Ok(resolved)
    }
}

fn lookup_config_files(conf_path: &Path, patterns: &[&str]) -> Result<BTreeSet<PathBuf>> {
    let root = Pattern::escape(&conf_path.to_string_lossy());
    let mut files = BTreeSet::new();
    for pattern in patterns {
        // a trailing `**` only walks directories, the files are one level below
        let pattern = if pattern.ends_with("**") {
            format!("{}/{}/*", root, pattern)
        } else {
            format!("{}/{}", root, pattern)
        };
        for entry in glob::glob(&pattern)? {
            let path = entry.map_err(|e| Error::Io(e.into()))?;
            if path.is_file() && has_config_extension(&path) {
                files.insert(path);
            }
        }
    }
    Ok(files)
}

fn has_config_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| CONFIG_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn load_layer(files: &[PathBuf]) -> Result<Parameters> {
    let mut layer = Parameters::default();
    let mut seen: Vec<(&PathBuf, BTreeSet<String>)> = vec![];
    for file in files {
        let params = load_file(file)?;
        let keys: BTreeSet<String> = params.keys().into_iter().collect();
        for (other_file, other_keys) in &seen {
            let duplicates: Vec<String> = keys.intersection(other_keys).cloned().collect();
            if !duplicates.is_empty() {
                return Err(Error::DuplicateKeys {
                    first: (*other_file).clone(),
                    second: file.clone(),
                    keys: duplicates,
                });
            }
        }
        seen.push((file, keys));
        layer.merge(params);
    }
    Ok(layer)
}

fn load_file(path: &Path) -> Result<Parameters> {
    let text = fs::read_to_string(path)?;
    let value: Value = serde_yaml::from_str(&text).map_err(|source| Error::Yaml {
        path: path.to_owned(),
        source,
    })?;
    Parameters::from_value(value, &path.display().to_string())
}
