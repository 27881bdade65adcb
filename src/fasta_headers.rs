use crate::error::{ProtscopeError, Result};
use crate::input::open_input;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

/// Protein identifier → protein name, as read from FASTA headers.
pub type ProteinNames = HashMap<String, String>;

/// Splits a header line (without `>`) into identifier and name.
fn split_header(header: &str) -> (&str, &str) {
    let header = header.trim();
    match header.split_once(char::is_whitespace) {
        Some((id, name)) => (id, name.trim_start()),
        None => (header, ""),
    }
}

/// Reads `>id description` headers; a header without a description maps to
/// an empty name. Only `>` lines are inspected. Later duplicates replace
/// earlier ones.
pub fn parse_fasta_headers_from<R: BufRead>(reader: R, source: &str) -> Result<ProteinNames> {
    let mut names = ProteinNames::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| ProtscopeError::io("read FASTA", source)(e))?;
        let Some(header) = line.strip_prefix('>') else {
            continue;
        };
        let (id, name) = split_header(header);
        if id.is_empty() {
            return Err(ProtscopeError::Format(format!(
                "Invalid FASTA header in '{source}' (line {}): header without identifier",
                n + 1
            )));
        }
        names.insert(id.to_string(), name.to_string());
    }
    Ok(names)
}

pub fn parse_fasta_headers(path: &Path) -> Result<ProteinNames> {
    let names = parse_fasta_headers_from(open_input(path)?, &path.to_string_lossy())?;
    log::info!("Read {} protein headers from {}", names.len(), path.display());
    Ok(names)
}
