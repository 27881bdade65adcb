//! Protein embedding extraction and paralog summaries for bacterial
//! assemblies.

pub mod about;
pub mod clusters;
pub mod config;
pub mod embedding_store;
pub mod embeddings;
pub mod error;
pub mod fasta_headers;
#[cfg(feature = "hdf5-store")]
pub mod hdf5_store;
pub mod input;
pub mod logging;
pub mod paralogs;
pub mod record_db;

pub use error::{ProtscopeError, Result};
