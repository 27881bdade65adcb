use crate::error::{ProtscopeError, Result};
use crate::input::open_input;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub id: String,
    pub members: Vec<String>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() <= 1
    }
}

/// Cluster memberships in first-appearance order of the cluster identifiers.
#[derive(Debug, Clone, Default)]
pub struct ClusterTable {
    clusters: Vec<Cluster>,
    by_id: HashMap<String, usize>,
}

impl ClusterTable {
    pub fn push(&mut self, cluster_id: &str, protein_id: &str) {
        match self.by_id.get(cluster_id) {
            Some(&idx) => self.clusters[idx].members.push(protein_id.to_string()),
            None => {
                self.by_id.insert(cluster_id.to_string(), self.clusters.len());
                self.clusters.push(Cluster {
                    id: cluster_id.to_string(),
                    members: vec![protein_id.to_string()],
                });
            }
        }
    }

    pub fn get(&self, cluster_id: &str) -> Option<&Cluster> {
        self.by_id.get(cluster_id).map(|&idx| &self.clusters[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

/// Parses `cluster_id<TAB>protein_id` lines. Blank lines are skipped; any
/// other line must have exactly two tab-separated fields.
pub fn parse_cluster_table_from<R: BufRead>(reader: R, source: &str) -> Result<ClusterTable> {
    let mut table = ClusterTable::default();
    for (n, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| ProtscopeError::io("read cluster table", source)(e))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let [cluster_id, protein_id] = fields[..] else {
            return Err(ProtscopeError::Format(format!(
                "Malformed cluster line {} in '{source}': expected 2 tab-separated fields, found {}: '{line}'",
                n + 1,
                fields.len()
            )));
        };
        table.push(cluster_id, protein_id);
    }
    Ok(table)
}

pub fn parse_cluster_table(path: &Path) -> Result<ClusterTable> {
    let table = parse_cluster_table_from(open_input(path)?, &path.to_string_lossy())?;
    log::info!("Read {} clusters from {}", table.len(), path.display());
    Ok(table)
}
