//! Library entry point for the UMAP dimensionality-reduction engine.
//!
//! This file re-exports the core types and provides convenient helpers to
//! persist and restore a fitted [`UmapModel`] as JSON. The persisted schema
//! captures everything `transform` needs: the calibrated kernel `(a, b)`,
//! training data and embedding, kNN arrays, random-projection forest,
//! symmetric search graph, metric identifier, and the full configuration.
//
// Public modules
pub mod config;
pub mod curve;
pub mod error;
pub mod fuzzy;
pub mod knn;
pub mod layout;
pub mod metric;
pub mod model;
pub mod sparse;
pub mod spectral;

// Re-export primary types for ergonomic use.
pub use config::{Initialization, TargetMetric, UmapConfig};
pub use error::UmapError;
pub use metric::Metric;
pub use model::{Umap, UmapModel};

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Save a fitted model to a JSON file.
///
/// # Arguments
///
/// * `model` - the fitted model to persist
/// * `path` - filesystem path to write JSON to
///
/// # Returns
///
/// `Ok(())` on success, or an `anyhow::Error` on failure.
///
/// # Notes
///
/// - A model fitted with a custom metric serializes its metric by name only
///   and therefore cannot be restored by `load_model_json`; restoring is
///   supported for the built-in metric names.
pub fn save_model_json(model: &UmapModel, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("creating model file {}", path.display()))?;
    serde_json::to_writer(BufWriter::new(file), model).context("serializing model")?;
    Ok(())
}

/// Load a fitted model from a JSON file previously written with
/// [`save_model_json`].
///
/// # Arguments
///
/// * `path` - path to the JSON file
///
/// # Returns
///
/// A [`UmapModel`] ready for `transform` calls.
pub fn load_model_json(path: &Path) -> Result<UmapModel> {
    let file = BufReader::new(
        File::open(path).with_context(|| format!("opening model file {}", path.display()))?,
    );
    let model: UmapModel = serde_json::from_reader(file).context("deserializing model")?;
    Ok(model)
}
