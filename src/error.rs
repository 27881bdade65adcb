use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = ProtscopeError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ProtscopeError {
    /// A requested metric, record database or input file does not exist.
    #[error("{0}")]
    NotFound(String),
    /// Inputs were readable but nothing usable came out of them.
    #[error("{0}")]
    Validation(String),
    /// An input file or dataset is malformed.
    #[error("{0}")]
    Format(String),
    #[error("could not {action} '{}': {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("record database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not write TSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("could not write .npy matrix: {0}")]
    Npy(#[from] ndarray_npy::WriteNpyError),
    #[error(transparent)]
    Render(#[from] protscope_render::RenderError),
    #[cfg(feature = "hdf5-store")]
    #[error("embedding store error: {0}")]
    Hdf5(#[from] hdf5::Error),
}

impl ProtscopeError {
    pub(crate) fn io(
        action: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| ProtscopeError::Io {
            action,
            path,
            source,
        }
    }
}
