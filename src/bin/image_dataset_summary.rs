use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use itertools::Itertools;
use siim_melanoma::{DataLoader, DataSet, ImageDataset};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Loads an image folder through the project's transform chain and prints what it finds
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Image folder root, one sub folder per class
    filepath: String,

    /// Project folder holding conf/base and conf/local
    #[arg(short, long, default_value = ".")]
    project_dir: PathBuf,

    /// Number of transformed samples to read
    #[arg(short, long, default_value_t = 3)]
    samples: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// `RUST_LOG` wins when it parses, otherwise `--verbose` picks debug over info
fn log_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| {
            let level = if verbose { "debug" } else { "info" };
            EnvFilter::new(format!(
                "siim_melanoma={},image_dataset_summary={}",
                level, level
            ))
        })
}

fn main() -> Result<()> {
    let args = Args::parse();
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref(), args.verbose))
        .init();

    let dataset = ImageDataset::from_project(args.filepath.as_str(), &args.project_dir)
        .with_context(|| format!("reading parameters under {}", args.project_dir.display()))?;
    println!("{}", serde_json::to_string_pretty(&dataset.describe())?);

    let folder = dataset
        .load()
        .with_context(|| format!("loading {}", dataset))?;
    println!("{}", folder);

    let counts = folder.targets().into_iter().counts();
    for (idx, class) in folder.classes().iter().enumerate() {
        println!("{:>8} {}", counts.get(&idx).copied().unwrap_or(0), class);
    }

    let mut items = folder.iter();
    while items.next_element_index() < args.samples.min(items.max_elem_index()) {
        let index = items.next_element_index();
        if let Some(item) = items.next() {
            let (sample, target) = item.with_context(|| format!("reading item {}", index))?;
            info!(
                "Item {}/{}: label {} ({}) shape {:?}",
                index + 1,
                items.max_elem_index(),
                target,
                folder.classes()[target],
                sample.shape()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_overrides_verbose_flag() {
        assert_eq!(log_filter(Some("warn"), true).to_string(), "warn");
        let verbose = log_filter(None, true).to_string();
        assert!(verbose.contains("siim_melanoma=debug"));
        let quiet = log_filter(None, false).to_string();
        assert!(quiet.contains("image_dataset_summary=info"));
    }
}
