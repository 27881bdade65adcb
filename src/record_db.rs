//! Record → protein lookup backed by the course's SQLite record database.

use crate::config::RecordDatabaseSettings;
use crate::error::{ProtscopeError, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

/// Source of the protein identifiers owned by a record.
pub trait RecordLookup {
    /// Returns the record's protein identifiers in database order; `None`
    /// marks a NULL entry. An unknown record yields an empty list.
    fn protein_ids(&self, record_id: &str) -> Result<Vec<Option<String>>>;
}

/// Read-only connection to a record database.
#[derive(Debug)]
pub struct SqliteRecordDatabase {
    connection: Connection,
    query: String,
}

fn quote_identifier(name: &str) -> Result<String> {
    if name.is_empty() || name.contains('"') {
        return Err(ProtscopeError::Validation(format!(
            "Invalid SQL identifier in record database settings: '{name}'"
        )));
    }
    Ok(format!("\"{name}\""))
}

impl SqliteRecordDatabase {
    pub fn open(path: &Path, settings: &RecordDatabaseSettings) -> Result<Self> {
        if !path.exists() {
            return Err(ProtscopeError::NotFound(format!(
                "Record database '{}' does not exist",
                path.display()
            )));
        }
        let query = format!(
            "SELECT {} FROM {} WHERE {} = ?1 ORDER BY rowid",
            quote_identifier(&settings.protein_column)?,
            quote_identifier(&settings.table)?,
            quote_identifier(&settings.record_column)?,
        );
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let connection = Connection::open_with_flags(path, flags)?;
        log::debug!("Opened record database {}", path.display());
        Ok(Self { connection, query })
    }
}

impl RecordLookup for SqliteRecordDatabase {
    fn protein_ids(&self, record_id: &str) -> Result<Vec<Option<String>>> {
        let mut statement = self.connection.prepare_cached(&self.query)?;
        let rows = statement.query_map((record_id,), |row| row.get::<_, Option<String>>(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

/// Looks up a record's proteins and drops NULL entries.
///
/// An unknown record and a record without proteins are reported the same way.
pub fn resolve_record_proteins<L: RecordLookup + ?Sized>(
    lookup: &L,
    record_id: &str,
) -> Result<Vec<String>> {
    let protein_ids: Vec<String> = lookup
        .protein_ids(record_id)?
        .into_iter()
        .flatten()
        .collect();
    if protein_ids.is_empty() {
        return Err(ProtscopeError::Validation(format!(
            "No protein IDs found for record_id '{record_id}'"
        )));
    }
    log::debug!(
        "Record '{record_id}' owns {} protein IDs",
        protein_ids.len()
    );
    Ok(protein_ids)
}
