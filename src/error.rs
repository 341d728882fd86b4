use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving parameters, scanning folders or transforming samples
#[derive(Error, Debug)]
pub enum Error {
    #[error("no configuration files found in {conf_paths:?} matching the glob pattern(s) {patterns:?}")]
    MissingConfig {
        conf_paths: Vec<PathBuf>,
        patterns: Vec<String>,
    },

    #[error("duplicate keys found in {first} and {second}: {keys:?}")]
    DuplicateKeys {
        first: PathBuf,
        second: PathBuf,
        keys: Vec<String>,
    },

    #[error("missing key '{0}'")]
    MissingKey(String),

    #[error("invalid value for '{key}': expected {expected}")]
    InvalidValue { key: String, expected: String },

    #[error("couldn't find any class folder in {0}")]
    NoClasses(PathBuf),

    #[error("found no valid file for the class '{class}'. Supported extensions are: {extensions}")]
    EmptyClass { class: String, extensions: String },

    #[error("index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("{transform} expects {expected} input")]
    UnexpectedSample {
        transform: &'static str,
        expected: &'static str,
    },

    #[error("normalize expects 1 or {channels} values, got {got}")]
    ChannelMismatch { channels: usize, got: usize },

    #[error("failed to load image at '{path}': {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Glob(#[from] glob::PatternError),

    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
