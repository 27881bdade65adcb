//! Embedding store access: identifier normalization, the identifier → row
//! index and the store abstraction itself.

use crate::error::{ProtscopeError, Result};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Embedding aggregation variants shipped in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Metric {
    MeanEmbeddings,
    MeanMidEmbeddings,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::MeanEmbeddings, Metric::MeanMidEmbeddings];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::MeanEmbeddings => "mean_embeddings",
            Metric::MeanMidEmbeddings => "mean_mid_embeddings",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = ProtscopeError;

    fn from_str(s: &str) -> Result<Self> {
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Metric::ALL.iter().map(Metric::as_str).collect();
                ProtscopeError::NotFound(format!(
                    "Unknown metric '{s}', expected one of {known:?}"
                ))
            })
    }
}

/// A protein identifier exactly as the store holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredIdentifier {
    Bytes(Vec<u8>),
    Text(String),
}

impl From<&str> for StoredIdentifier {
    fn from(value: &str) -> Self {
        StoredIdentifier::Text(value.to_string())
    }
}

/// Decodes byte identifiers as UTF-8 and passes text through.
pub fn normalize_identifiers(raw: Vec<StoredIdentifier>) -> Result<Vec<String>> {
    raw.into_iter()
        .enumerate()
        .map(|(row, id)| match id {
            StoredIdentifier::Text(text) => Ok(text),
            StoredIdentifier::Bytes(bytes) => String::from_utf8(bytes).map_err(|e| {
                ProtscopeError::Format(format!(
                    "Protein identifier at row {row} is not valid UTF-8: {e}"
                ))
            }),
        })
        .collect()
}

/// Maps each identifier to its zero-based row. A repeated identifier keeps
/// its last row.
pub fn build_id_index(protein_ids: &[String]) -> HashMap<String, usize> {
    protein_ids
        .iter()
        .enumerate()
        .map(|(row, id)| (id.clone(), row))
        .collect()
}

/// Read-only view of a row-aligned embedding store.
pub trait EmbeddingStore {
    /// The identifier array, one entry per matrix row.
    fn stored_identifiers(&self) -> Result<Vec<StoredIdentifier>>;

    /// Names of the metric matrices available in the store.
    fn metric_names(&self) -> Result<Vec<String>>;

    fn has_metric(&self, metric: &str) -> Result<bool> {
        Ok(self.metric_names()?.iter().any(|name| name == metric))
    }

    /// Copies the given rows of `metric`, in the given order.
    fn gather_rows(&self, metric: &str, rows: &[usize]) -> Result<Array2<f32>>;

    fn protein_ids(&self) -> Result<Vec<String>> {
        normalize_identifiers(self.stored_identifiers()?)
    }
}

/// Embedding store held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEmbeddingStore {
    identifiers: Vec<StoredIdentifier>,
    metrics: BTreeMap<String, Array2<f32>>,
}

impl InMemoryEmbeddingStore {
    pub fn new(identifiers: Vec<StoredIdentifier>) -> Self {
        Self {
            identifiers,
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, name: &str, matrix: Array2<f32>) -> Result<Self> {
        if matrix.nrows() != self.identifiers.len() {
            return Err(ProtscopeError::Validation(format!(
                "Metric '{name}' has {} rows but the store has {} identifiers",
                matrix.nrows(),
                self.identifiers.len()
            )));
        }
        self.metrics.insert(name.to_string(), matrix);
        Ok(self)
    }
}

impl EmbeddingStore for InMemoryEmbeddingStore {
    fn stored_identifiers(&self) -> Result<Vec<StoredIdentifier>> {
        Ok(self.identifiers.clone())
    }

    fn metric_names(&self) -> Result<Vec<String>> {
        Ok(self.metrics.keys().cloned().collect())
    }

    fn gather_rows(&self, metric: &str, rows: &[usize]) -> Result<Array2<f32>> {
        let matrix = self.metrics.get(metric).ok_or_else(|| {
            ProtscopeError::NotFound(format!("Metric '{metric}' not found in embedding store"))
        })?;
        if let Some(&row) = rows.iter().find(|&&row| row >= matrix.nrows()) {
            return Err(ProtscopeError::Format(format!(
                "Row {row} is outside metric '{metric}' with {} rows",
                matrix.nrows()
            )));
        }
        Ok(matrix.select(Axis(0), rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn metric_names_round_trip_through_from_str() {
        for metric in Metric::ALL {
            assert_eq!(metric.as_str().parse::<Metric>().unwrap(), metric);
        }
        let err = "bogus_metric".parse::<Metric>().unwrap_err();
        assert!(matches!(err, ProtscopeError::NotFound(_)));
    }

    #[test]
    fn normalization_decodes_bytes_and_passes_text() {
        let ids = normalize_identifiers(vec![
            StoredIdentifier::Bytes(b"WP_000001.1".to_vec()),
            StoredIdentifier::Text("WP_000002.1".to_string()),
        ])
        .unwrap();
        assert_eq!(ids, vec!["WP_000001.1", "WP_000002.1"]);
    }

    #[test]
    fn normalization_rejects_invalid_utf8() {
        let err = normalize_identifiers(vec![
            StoredIdentifier::from("ok"),
            StoredIdentifier::Bytes(vec![0xff, 0xfe]),
        ])
        .unwrap_err();
        assert!(matches!(err, ProtscopeError::Format(_)));
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn index_uses_last_duplicate() {
        let ids: Vec<String> = ["a", "b", "a"].iter().map(|s| s.to_string()).collect();
        let index = build_id_index(&ids);
        assert_eq!(index.len(), 2);
        assert_eq!(index["a"], 2);
        assert_eq!(index["b"], 1);
    }

    #[test]
    fn in_memory_store_validates_row_alignment() {
        let store = InMemoryEmbeddingStore::new(vec!["a".into(), "b".into()]);
        let err = store
            .with_metric("mean_embeddings", array![[1.0f32, 2.0]])
            .unwrap_err();
        assert!(matches!(err, ProtscopeError::Validation(_)));
    }

    #[test]
    fn in_memory_store_gathers_in_request_order() {
        let store = InMemoryEmbeddingStore::new(vec!["a".into(), "b".into(), "c".into()])
            .with_metric("m", array![[0.0f32, 0.5], [1.0, 1.5], [2.0, 2.5]])
            .unwrap();
        assert!(store.has_metric("m").unwrap());
        assert!(!store.has_metric("n").unwrap());
        let rows = store.gather_rows("m", &[2, 0]).unwrap();
        assert_eq!(rows, array![[2.0f32, 2.5], [0.0, 0.5]]);
        assert!(store.gather_rows("m", &[3]).is_err());
    }
}
