//! Run configuration for both pipelines.
//!
//! Every field has a built-in default; a JSON file may override any subset of
//! them, and command-line flags override the file.

use crate::error::{ProtscopeError, Result};
use protscope_render::ChartSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_EMBEDDING_STORE_PATH: &str =
    "/farmshare/home/classes/bios/270/data/processed_bacteria_data/protein_embeddings.h5";
pub const DEFAULT_EMBEDDINGS_OUTPUT_PATH: &str = "embeddings.npy";
pub const DEFAULT_PROTEIN_IDS_DATASET: &str = "protein_ids";
pub const DEFAULT_RECORD_TABLE: &str = "gff";
pub const DEFAULT_RECORD_COLUMN: &str = "record_id";
pub const DEFAULT_PROTEIN_COLUMN: &str = "protein_id";

/// Where protein identifiers live inside the record database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordDatabaseSettings {
    pub table: String,
    pub record_column: String,
    pub protein_column: String,
}

impl Default for RecordDatabaseSettings {
    fn default() -> Self {
        Self {
            table: DEFAULT_RECORD_TABLE.to_string(),
            record_column: DEFAULT_RECORD_COLUMN.to_string(),
            protein_column: DEFAULT_PROTEIN_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub embedding_store_path: PathBuf,
    /// Name of the 1-D identifier dataset, row-aligned with every metric.
    pub protein_ids_dataset: String,
    pub output_path: PathBuf,
    pub record_database: RecordDatabaseSettings,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            embedding_store_path: PathBuf::from(DEFAULT_EMBEDDING_STORE_PATH),
            protein_ids_dataset: DEFAULT_PROTEIN_IDS_DATASET.to_string(),
            output_path: PathBuf::from(DEFAULT_EMBEDDINGS_OUTPUT_PATH),
            record_database: RecordDatabaseSettings::default(),
        }
    }
}

impl ExtractionConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        load_json(path)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParalogConfig {
    pub chart: ChartSettings,
}

impl ParalogConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        load_json(path)
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(ProtscopeError::NotFound(format!(
            "Configuration file '{}' does not exist",
            path.display()
        )));
    }
    let text = fs::read_to_string(path).map_err(ProtscopeError::io("read configuration", path))?;
    Ok(serde_json::from_str(&text)?)
}
