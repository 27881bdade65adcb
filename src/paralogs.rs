//! Paralog copy numbers and the summary report.

use crate::clusters::{ClusterTable, parse_cluster_table};
use crate::config::ParalogConfig;
use crate::error::{ProtscopeError, Result};
use crate::fasta_headers::{ProteinNames, parse_fasta_headers};
use crate::input::ensure_parent_dir;
use csv::{QuoteStyle, WriterBuilder};
use itertools::Itertools;
use protscope_render::{Bar, write_bar_chart};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const NO_PARALOGS_MESSAGE: &str = "No paralogous clusters found (no clusters with >1 protein).";
pub const TSV_HEADER: [&str; 3] = ["protein_id", "protein_name", "copy_number"];

#[derive(Debug, Clone)]
struct CopyNumberEntry {
    protein_id: String,
    copy_number: usize,
    cluster: usize,
}

/// Copy number of every protein in a non-singleton cluster, in the order the
/// proteins were first assigned.
#[derive(Debug, Clone, Default)]
pub struct CopyNumbers {
    entries: Vec<CopyNumberEntry>,
    by_protein: HashMap<String, usize>,
    reassigned: usize,
}

impl CopyNumbers {
    /// Clusters are processed in table order. A protein that turns up in a
    /// second multi-member cluster takes that cluster's size but keeps its
    /// original position.
    pub fn from_clusters(table: &ClusterTable) -> Self {
        let mut copies = Self::default();
        for (cluster_idx, cluster) in table.iter().enumerate() {
            if cluster.is_singleton() {
                continue;
            }
            let copy_number = cluster.len();
            for protein_id in &cluster.members {
                copies.assign(protein_id, copy_number, cluster_idx, &cluster.id);
            }
        }
        copies
    }

    fn assign(&mut self, protein_id: &str, copy_number: usize, cluster: usize, cluster_id: &str) {
        match self.by_protein.get(protein_id) {
            Some(&idx) => {
                let entry = &mut self.entries[idx];
                if entry.cluster != cluster {
                    log::warn!(
                        "Protein '{protein_id}' is in more than one paralog cluster; \
                         using copy number {copy_number} from cluster '{cluster_id}'"
                    );
                    self.reassigned += 1;
                }
                entry.copy_number = copy_number;
                entry.cluster = cluster;
            }
            None => {
                self.by_protein.insert(protein_id.to_string(), self.entries.len());
                self.entries.push(CopyNumberEntry {
                    protein_id: protein_id.to_string(),
                    copy_number,
                    cluster,
                });
            }
        }
    }

    pub fn get(&self, protein_id: &str) -> Option<usize> {
        self.by_protein
            .get(protein_id)
            .map(|&idx| self.entries[idx].copy_number)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Proteins that were moved from one paralog cluster to another.
    pub fn reassigned(&self) -> usize {
        self.reassigned
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries
            .iter()
            .map(|e| (e.protein_id.as_str(), e.copy_number))
    }

    /// Entries by copy number, highest first; ties keep assignment order.
    pub fn sorted_desc(&self) -> Vec<(&str, usize)> {
        self.iter().sorted_by(|a, b| b.1.cmp(&a.1)).collect()
    }
}

pub fn write_summary_tsv(path: &Path, copies: &CopyNumbers, names: &ProteinNames) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Never)
        .from_path(path)?;
    writer.write_record(TSV_HEADER)?;
    for (protein_id, copy_number) in copies.sorted_desc() {
        let name = names.get(protein_id).map(String::as_str).unwrap_or("");
        writer.write_record([protein_id, name, copy_number.to_string().as_str()])?;
    }
    writer
        .flush()
        .map_err(ProtscopeError::io("write summary TSV", path))?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ParalogRequest {
    pub faa_path: PathBuf,
    pub clusters_path: PathBuf,
    pub out_tsv: PathBuf,
    pub out_chart: PathBuf,
    pub config: ParalogConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParalogReport {
    pub tsv_path: PathBuf,
    /// `None` when there were no paralogs to plot.
    pub chart_path: Option<PathBuf>,
    pub proteins: usize,
    pub paralog_clusters: usize,
    pub reassigned: usize,
}

/// Reads the FASTA and cluster table, writes the TSV, and plots the top
/// proteins when any paralogs exist.
pub fn summarize_paralogs(request: &ParalogRequest) -> Result<ParalogReport> {
    let names = parse_fasta_headers(&request.faa_path)?;
    let table = parse_cluster_table(&request.clusters_path)?;
    let copies = CopyNumbers::from_clusters(&table);
    let paralog_clusters = table.iter().filter(|c| !c.is_singleton()).count();
    log::info!(
        "{} proteins in {paralog_clusters} paralog clusters",
        copies.len()
    );

    write_summary_tsv(&request.out_tsv, &copies, &names)?;

    let chart_path = if copies.is_empty() {
        log::info!("{NO_PARALOGS_MESSAGE}");
        None
    } else {
        let bars: Vec<Bar> = copies
            .sorted_desc()
            .into_iter()
            .take(request.config.chart.top_n)
            .map(|(protein_id, copy_number)| Bar::new(protein_id, copy_number))
            .collect();
        write_bar_chart(&request.out_chart, &bars, &request.config.chart)?;
        Some(request.out_chart.clone())
    };

    Ok(ParalogReport {
        tsv_path: request.out_tsv.clone(),
        chart_path,
        proteins: copies.len(),
        paralog_clusters,
        reassigned: copies.reassigned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clusters::parse_cluster_table_from;
    use std::fs;
    use tempfile::tempdir;

    fn table(text: &str) -> ClusterTable {
        parse_cluster_table_from(text.as_bytes(), "clusters.tsv").unwrap()
    }

    #[test]
    fn singletons_are_not_paralogs() {
        let copies = CopyNumbers::from_clusters(&table("c1\tp1\nc1\tp2\nc2\tp3\n"));
        assert_eq!(copies.len(), 2);
        assert_eq!(copies.get("p1"), Some(2));
        assert_eq!(copies.get("p2"), Some(2));
        assert_eq!(copies.get("p3"), None);
    }

    #[test]
    fn copy_number_is_cluster_size() {
        let copies = CopyNumbers::from_clusters(&table(
            "a\ta1\nb\tb1\na\ta2\nb\tb2\na\ta3\nc\tc1\nb\tb3\nb\tb4\n",
        ));
        for p in ["a1", "a2", "a3"] {
            assert_eq!(copies.get(p), Some(3));
        }
        for p in ["b1", "b2", "b3", "b4"] {
            assert_eq!(copies.get(p), Some(4));
        }
        assert_eq!(copies.get("c1"), None);
        assert_eq!(copies.reassigned(), 0);
    }

    #[test]
    fn sorted_desc_is_stable_for_ties() {
        let copies = CopyNumbers::from_clusters(&table(
            "x\tx1\nx\tx2\ny\ty1\ny\ty2\ny\ty3\n",
        ));
        let order: Vec<&str> = copies.sorted_desc().into_iter().map(|(p, _)| p).collect();
        assert_eq!(order, vec!["y1", "y2", "y3", "x1", "x2"]);
    }

    #[test]
    fn later_cluster_wins_for_shared_protein() {
        let copies = CopyNumbers::from_clusters(&table(
            "c1\tp1\nc1\tp2\nc2\tp1\nc2\tp3\nc2\tp4\n",
        ));
        assert_eq!(copies.get("p1"), Some(3));
        assert_eq!(copies.reassigned(), 1);
        let first: Vec<&str> = copies.iter().map(|(p, _)| p).collect();
        assert_eq!(first, vec!["p1", "p2", "p3", "p4"]);
    }

    #[test]
    fn duplicate_member_in_one_cluster_is_not_a_reassignment() {
        let copies = CopyNumbers::from_clusters(&table("c1\tp1\nc1\tp1\n"));
        assert_eq!(copies.get("p1"), Some(2));
        assert_eq!(copies.len(), 1);
        assert_eq!(copies.reassigned(), 0);
    }

    fn request(root: &Path, faa: &str, clusters: &str, chart: &str) -> ParalogRequest {
        let faa_path = root.join("assembly.faa");
        let clusters_path = root.join("prot90_cluster.tsv");
        fs::write(&faa_path, faa).unwrap();
        fs::write(&clusters_path, clusters).unwrap();
        ParalogRequest {
            faa_path,
            clusters_path,
            out_tsv: root.join("results/paralogs.tsv"),
            out_chart: root.join("results/plots").join(chart),
            config: ParalogConfig::default(),
        }
    }

    #[test]
    fn summary_for_two_paralogs() {
        let td = tempdir().unwrap();
        let request = request(
            td.path(),
            ">p1 alpha\nMKV\n>p2 beta\nMKV\n",
            "c1\tp1\nc1\tp2\nc2\tp3\n",
            "top10.svg",
        );
        let report = summarize_paralogs(&request).unwrap();
        assert_eq!(report.proteins, 2);
        assert_eq!(report.paralog_clusters, 1);
        assert_eq!(report.chart_path.as_deref(), Some(request.out_chart.as_path()));

        let tsv = fs::read_to_string(&request.out_tsv).unwrap();
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(lines[0], "protein_id\tprotein_name\tcopy_number");
        assert_eq!(&lines[1..], &["p1\talpha\t2", "p2\tbeta\t2"]);
        assert!(!tsv.contains("p3"));

        let svg = fs::read_to_string(&request.out_chart).unwrap();
        assert!(svg.contains("p1"));
        assert!(!svg.contains("p3"));
    }

    #[test]
    fn tsv_sorted_by_copy_number_with_missing_names() {
        let td = tempdir().unwrap();
        let request = request(
            td.path(),
            ">a1 kinase\nM\n",
            "A\ta1\nA\ta2\nB\tb1\nB\tb2\nB\tb3\n",
            "top10.svg",
        );
        summarize_paralogs(&request).unwrap();
        let tsv = fs::read_to_string(&request.out_tsv).unwrap();
        let rows: Vec<Vec<&str>> = tsv.lines().skip(1).map(|l| l.split('\t').collect()).collect();
        assert_eq!(rows.len(), 5);
        let copies: Vec<&str> = rows.iter().map(|r| r[2]).collect();
        assert_eq!(copies, vec!["3", "3", "3", "2", "2"]);
        assert_eq!(rows[3], vec!["a1", "kinase", "2"]);
        assert_eq!(rows[4], vec!["a2", "", "2"]);
    }

    #[test]
    fn all_singletons_give_header_only_tsv_and_no_chart() {
        let td = tempdir().unwrap();
        let request = request(td.path(), ">p1 alpha\nM\n", "c1\tp1\nc2\tp2\n", "top10.png");
        let report = summarize_paralogs(&request).unwrap();
        assert_eq!(report.proteins, 0);
        assert!(report.chart_path.is_none());
        assert_eq!(
            fs::read_to_string(&request.out_tsv).unwrap(),
            "protein_id\tprotein_name\tcopy_number\n"
        );
        assert!(!request.out_chart.exists());
    }

    #[test]
    fn malformed_cluster_line_aborts_before_output() {
        let td = tempdir().unwrap();
        let request = request(td.path(), ">p1\nM\n", "c1\tp1\nbroken line\n", "top10.png");
        let err = summarize_paralogs(&request).unwrap_err();
        assert!(matches!(err, ProtscopeError::Format(_)));
        assert!(!request.out_tsv.exists());
    }
}
