//! Record → protein → embedding resolution.

use crate::config::ExtractionConfig;
use crate::embedding_store::{EmbeddingStore, Metric, build_id_index};
use crate::error::{ProtscopeError, Result};
use crate::input::ensure_parent_dir;
use crate::record_db::{SqliteRecordDatabase, resolve_record_proteins};
use ndarray::Array2;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Rows gathered for a list of protein identifiers.
#[derive(Debug, Clone)]
pub struct GatheredEmbeddings {
    pub matrix: Array2<f32>,
    /// Identifiers behind each matrix row, in row order.
    pub protein_ids: Vec<String>,
    /// Requested identifiers that have no row in the store.
    pub skipped: usize,
}

/// Resolves `protein_ids` to rows of `metric`, preserving input order.
///
/// Identifiers missing from `index` are skipped without complaint. `context`
/// names the record being resolved and appears in the error raised when no
/// identifier resolves.
pub fn gather_embeddings<S: EmbeddingStore + ?Sized>(
    store: &S,
    protein_ids: &[String],
    index: &HashMap<String, usize>,
    metric: &str,
    context: &str,
) -> Result<GatheredEmbeddings> {
    if !store.has_metric(metric)? {
        return Err(ProtscopeError::NotFound(format!(
            "Metric '{metric}' not found in embedding store. Available datasets: {:?}",
            store.metric_names()?
        )));
    }

    let (rows, resolved): (Vec<usize>, Vec<String>) = protein_ids
        .iter()
        .filter_map(|pid| index.get(pid).map(|&row| (row, pid.clone())))
        .unzip();

    if rows.is_empty() {
        return Err(ProtscopeError::Validation(format!(
            "No embeddings found for proteins in record_id '{context}'"
        )));
    }

    let matrix = store.gather_rows(metric, &rows)?;
    Ok(GatheredEmbeddings {
        matrix,
        skipped: protein_ids.len() - resolved.len(),
        protein_ids: resolved,
    })
}

/// Everything needed for one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub database_path: PathBuf,
    pub record_id: String,
    pub metric: Metric,
    pub config: ExtractionConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub record_id: String,
    pub metric: Metric,
    pub output_path: PathBuf,
    pub shape: (usize, usize),
    pub resolved: usize,
    pub skipped: usize,
}

impl ExtractionReport {
    pub fn shape_text(&self) -> String {
        format!("({}, {})", self.shape.0, self.shape.1)
    }
}

pub fn write_embeddings_npy(path: &Path, matrix: &Array2<f32>) -> Result<()> {
    ensure_parent_dir(path)?;
    ndarray_npy::write_npy(path, matrix)?;
    Ok(())
}

/// Runs the full extraction: record lookup, store gather and `.npy` output.
///
/// `open_store` receives the configured store path; the store it returns is
/// dropped before the matrix is written.
pub fn run_extraction<S, F>(
    request: &ExtractionRequest,
    open_store: F,
) -> Result<ExtractionReport>
where
    S: EmbeddingStore,
    F: FnOnce(&Path) -> Result<S>,
{
    let config = &request.config;
    let protein_ids = {
        let database =
            SqliteRecordDatabase::open(&request.database_path, &config.record_database)?;
        resolve_record_proteins(&database, &request.record_id)?
    };
    log::info!(
        "Record '{}': {} protein IDs",
        request.record_id,
        protein_ids.len()
    );

    let gathered = {
        let store = open_store(&config.embedding_store_path)?;
        let index = build_id_index(&store.protein_ids()?);
        log::debug!("Embedding store holds {} identifiers", index.len());
        gather_embeddings(
            &store,
            &protein_ids,
            &index,
            request.metric.as_str(),
            &request.record_id,
        )?
    };

    write_embeddings_npy(&config.output_path, &gathered.matrix)?;
    log::info!(
        "Wrote {} x {} {} matrix to {}",
        gathered.matrix.nrows(),
        gathered.matrix.ncols(),
        request.metric,
        config.output_path.display()
    );

    Ok(ExtractionReport {
        record_id: request.record_id.clone(),
        metric: request.metric,
        output_path: config.output_path.clone(),
        shape: gathered.matrix.dim(),
        resolved: gathered.protein_ids.len(),
        skipped: gathered.skipped,
    })
}
