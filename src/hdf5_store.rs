//! HDF5-backed embedding store.
//!
//! The file holds a 1-D identifier dataset and one 2-D `f32`-compatible
//! dataset per metric, all row-aligned.

use crate::embedding_store::{EmbeddingStore, StoredIdentifier};
use crate::error::{ProtscopeError, Result};
use hdf5::types::{FixedAscii, FixedUnicode, TypeDescriptor, VarLenAscii, VarLenUnicode};
use ndarray::{Array1, Array2, s};
use std::path::Path;

/// Upper bound for fixed-length identifier strings.
const MAX_FIXED_ID_LEN: usize = 256;

pub struct Hdf5EmbeddingStore {
    file: hdf5::File,
    protein_ids_dataset: String,
}

impl Hdf5EmbeddingStore {
    /// Opens the store read-only. The handle closes when the store is dropped.
    pub fn open(path: &Path, protein_ids_dataset: &str) -> Result<Self> {
        if !path.exists() {
            return Err(ProtscopeError::NotFound(format!(
                "Embedding store '{}' does not exist",
                path.display()
            )));
        }
        let file = hdf5::File::open(path)?;
        if !file.link_exists(protein_ids_dataset) {
            return Err(ProtscopeError::NotFound(format!(
                "Identifier dataset '{protein_ids_dataset}' not found in '{}'",
                path.display()
            )));
        }
        log::debug!("Opened embedding store {}", path.display());
        Ok(Self {
            file,
            protein_ids_dataset: protein_ids_dataset.to_string(),
        })
    }

    /// Fixed-length identifiers wider than the read buffer would be cut short.
    fn check_fixed_size(&self, size: usize) -> Result<()> {
        if size > MAX_FIXED_ID_LEN {
            return Err(ProtscopeError::Format(format!(
                "Identifier dataset '{}' stores {size}-byte strings; at most \
                 {MAX_FIXED_ID_LEN} are supported",
                self.protein_ids_dataset
            )));
        }
        Ok(())
    }

    fn matrix_dataset(&self, name: &str) -> Option<hdf5::Dataset> {
        if name == self.protein_ids_dataset || !self.file.link_exists(name) {
            return None;
        }
        self.file.dataset(name).ok().filter(|dataset| dataset.ndim() == 2)
    }
}

impl EmbeddingStore for Hdf5EmbeddingStore {
    fn stored_identifiers(&self) -> Result<Vec<StoredIdentifier>> {
        let dataset = self.file.dataset(&self.protein_ids_dataset)?;
        let ids = match dataset.dtype()?.to_descriptor()? {
            TypeDescriptor::VarLenUnicode => dataset
                .read_raw::<VarLenUnicode>()?
                .iter()
                .map(|s| StoredIdentifier::Text(s.as_str().to_string()))
                .collect(),
            TypeDescriptor::FixedUnicode(size) => {
                self.check_fixed_size(size)?;
                dataset
                    .read_raw::<FixedUnicode<MAX_FIXED_ID_LEN>>()?
                    .iter()
                    .map(|s| StoredIdentifier::Text(s.as_str().to_string()))
                    .collect()
            }
            TypeDescriptor::VarLenAscii => dataset
                .read_raw::<VarLenAscii>()?
                .iter()
                .map(|s| StoredIdentifier::Bytes(s.as_bytes().to_vec()))
                .collect(),
            TypeDescriptor::FixedAscii(size) => {
                self.check_fixed_size(size)?;
                dataset
                    .read_raw::<FixedAscii<MAX_FIXED_ID_LEN>>()?
                    .iter()
                    .map(|s| StoredIdentifier::Bytes(s.as_bytes().to_vec()))
                    .collect()
            }
            other => {
                return Err(ProtscopeError::Format(format!(
                    "Identifier dataset '{}' has unsupported type {other:?}",
                    self.protein_ids_dataset
                )));
            }
        };
        Ok(ids)
    }

    fn metric_names(&self) -> Result<Vec<String>> {
        Ok(self
            .file
            .member_names()?
            .into_iter()
            .filter(|name| self.matrix_dataset(name).is_some())
            .collect())
    }

    /// Only 2-D datasets count as metrics; groups and vectors do not.
    fn has_metric(&self, metric: &str) -> Result<bool> {
        Ok(self.matrix_dataset(metric).is_some())
    }

    fn gather_rows(&self, metric: &str, rows: &[usize]) -> Result<Array2<f32>> {
        let dataset = self.file.dataset(metric)?;
        let shape = dataset.shape();
        if shape.len() != 2 {
            return Err(ProtscopeError::Format(format!(
                "Metric '{metric}' is {}-dimensional, expected a 2-D matrix",
                shape.len()
            )));
        }
        let (n_rows, width) = (shape[0], shape[1]);
        let mut gathered = Array2::<f32>::zeros((rows.len(), width));
        for (out_row, &row) in rows.iter().enumerate() {
            if row >= n_rows {
                return Err(ProtscopeError::Format(format!(
                    "Row {row} is outside metric '{metric}' with {n_rows} rows"
                )));
            }
            let values: Array1<f32> = dataset.read_slice_1d(s![row, ..])?;
            gathered.row_mut(out_row).assign(&values);
        }
        Ok(gathered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding_store::build_id_index;
    use crate::embeddings::gather_embeddings;
    use ndarray::Array2;
    use tempfile::tempdir;

    const WIDTH: usize = 164;
    const IDS: [&str; 3] = ["a", "b", "c"];

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum IdLayout {
        VarLenAscii,
        VarLenUnicode,
        FixedAscii,
    }

    fn write_ids(file: &hdf5::File, layout: IdLayout) {
        let builder = file.new_dataset_builder();
        match layout {
            IdLayout::VarLenAscii => {
                let ids: Vec<VarLenAscii> =
                    IDS.iter().map(|s| VarLenAscii::from_ascii(s).unwrap()).collect();
                builder.with_data(&ids).create("protein_ids").unwrap();
            }
            IdLayout::VarLenUnicode => {
                let ids: Vec<VarLenUnicode> = IDS.iter().map(|s| s.parse().unwrap()).collect();
                builder.with_data(&ids).create("protein_ids").unwrap();
            }
            IdLayout::FixedAscii => {
                let ids: Vec<FixedAscii<16>> =
                    IDS.iter().map(|s| FixedAscii::from_ascii(s).unwrap()).collect();
                builder.with_data(&ids).create("protein_ids").unwrap();
            }
        }
    }

    fn write_store(path: &Path, layout: IdLayout) -> hdf5::File {
        let file = hdf5::File::create(path).unwrap();
        write_ids(&file, layout);
        let mean = Array2::from_shape_fn((3, WIDTH), |(r, c)| (r * 1000 + c) as f32);
        let mid = Array2::from_shape_fn((3, WIDTH), |(r, c)| -((r * 1000 + c) as f32));
        file.new_dataset_builder()
            .with_data(&mean)
            .create("mean_embeddings")
            .unwrap();
        file.new_dataset_builder()
            .with_data(&mid)
            .create("mean_mid_embeddings")
            .unwrap();
        file
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn byte_and_text_identifiers_normalize_alike() {
        let td = tempdir().unwrap();
        for layout in [IdLayout::VarLenAscii, IdLayout::VarLenUnicode, IdLayout::FixedAscii] {
            let path = td.path().join(format!("store_{layout:?}.h5"));
            drop(write_store(&path, layout));
            let store = Hdf5EmbeddingStore::open(&path, "protein_ids").unwrap();
            let raw = store.stored_identifiers().unwrap();
            assert_eq!(
                matches!(raw[0], StoredIdentifier::Bytes(_)),
                layout != IdLayout::VarLenUnicode
            );
            assert_eq!(store.protein_ids().unwrap(), vec!["a", "b", "c"]);
        }
    }

    #[test]
    fn gathers_rows_from_file() {
        let td = tempdir().unwrap();
        for layout in [IdLayout::VarLenAscii, IdLayout::FixedAscii] {
            let path = td.path().join(format!("store_{layout:?}.h5"));
            drop(write_store(&path, layout));
            let store = Hdf5EmbeddingStore::open(&path, "protein_ids").unwrap();

            let mut names = store.metric_names().unwrap();
            names.sort();
            assert_eq!(names, vec!["mean_embeddings", "mean_mid_embeddings"]);

            let index = build_id_index(&store.protein_ids().unwrap());
            let gathered =
                gather_embeddings(&store, &ids(&["c", "x", "a"]), &index, "mean_embeddings", "NC_1")
                    .unwrap();
            assert_eq!(gathered.matrix.dim(), (2, WIDTH));
            assert_eq!(gathered.matrix[[0, 3]], 2003.0);
            assert_eq!(gathered.matrix[[1, 3]], 3.0);
            assert_eq!(gathered.protein_ids, vec!["c", "a"]);

            let err = gather_embeddings(&store, &ids(&["a"]), &index, "bogus_metric", "NC_1")
                .unwrap_err();
            assert!(matches!(err, ProtscopeError::NotFound(_)));
            assert!(err.to_string().contains("mean_mid_embeddings"));
        }
    }

    #[test]
    fn oversized_fixed_identifiers_are_rejected() {
        let td = tempdir().unwrap();
        let path = td.path().join("wide.h5");
        {
            let file = hdf5::File::create(&path).unwrap();
            let ids: Vec<FixedAscii<300>> =
                IDS.iter().map(|s| FixedAscii::from_ascii(s).unwrap()).collect();
            file.new_dataset_builder()
                .with_data(&ids)
                .create("protein_ids")
                .unwrap();
        }
        let store = Hdf5EmbeddingStore::open(&path, "protein_ids").unwrap();
        let err = store.stored_identifiers().unwrap_err();
        assert!(matches!(err, ProtscopeError::Format(_)));
        assert!(err.to_string().contains("300"));
    }

    #[test]
    fn groups_and_vectors_are_not_metrics() {
        let td = tempdir().unwrap();
        let path = td.path().join("store.h5");
        {
            let file = write_store(&path, IdLayout::VarLenUnicode);
            file.create_group("mean_group").unwrap();
            file.new_dataset_builder()
                .with_data(&[1.0f32, 2.0, 3.0])
                .create("lengths")
                .unwrap();
        }
        let store = Hdf5EmbeddingStore::open(&path, "protein_ids").unwrap();
        for name in ["mean_group", "lengths", "protein_ids", "missing"] {
            assert!(!store.has_metric(name).unwrap(), "{name}");
        }
        assert!(store.has_metric("mean_embeddings").unwrap());

        let index = build_id_index(&store.protein_ids().unwrap());
        let err = gather_embeddings(&store, &ids(&["a"]), &index, "lengths", "NC_1").unwrap_err();
        assert!(matches!(err, ProtscopeError::NotFound(_)));
        assert!(err.to_string().contains("mean_embeddings"));
        assert!(!err.to_string().contains("mean_group"));
    }

    #[test]
    fn missing_file_or_identifier_dataset_is_not_found() {
        let td = tempdir().unwrap();
        let err = Hdf5EmbeddingStore::open(&td.path().join("none.h5"), "protein_ids")
            .err()
            .unwrap();
        assert!(matches!(err, ProtscopeError::NotFound(_)));

        let path = td.path().join("store.h5");
        drop(write_store(&path, IdLayout::VarLenUnicode));
        let err = Hdf5EmbeddingStore::open(&path, "ids").err().unwrap();
        assert!(matches!(err, ProtscopeError::NotFound(_)));
    }
}
