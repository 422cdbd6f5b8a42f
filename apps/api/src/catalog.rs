//! Catalog Store — the static table of assessment products, loaded once from CSV.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One row of the catalog CSV.
///
/// The column names and casing are the contract shared with the
/// `scrape-catalog` binary; both sides must keep them in sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "RemoteTesting")]
    pub remote_testing: String,
    #[serde(rename = "AdaptiveSupport")]
    pub adaptive_support: String,
    #[serde(rename = "Type")]
    pub assessment_type: String,
    #[serde(rename = "Skills")]
    pub skills: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Duration")]
    pub duration: String,
}

/// The loaded catalog. Read-only after startup; shared via `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub records: Vec<AssessmentRecord>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("opening catalog file {}", path.display()))?;
        let mut records = Vec::new();
        for row in reader.deserialize() {
            let record: AssessmentRecord = row.context("malformed catalog row")?;
            records.push(record);
        }
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
Name,URL,RemoteTesting,AdaptiveSupport,Type,Skills,Description,Duration
Java Test,https://example.com/java,Yes,No,K,Knowledge and Skills,Core Java assessment,30
Sales Sim,https://example.com/sales,No,Yes,S,Simulations,Situational sales exercise,
";

    fn parse(csv_text: &str) -> Vec<AssessmentRecord> {
        let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
        reader
            .deserialize()
            .collect::<Result<Vec<AssessmentRecord>, _>>()
            .unwrap()
    }

    #[test]
    fn parses_the_exact_column_contract() {
        let records = parse(SAMPLE_CSV);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Java Test");
        assert_eq!(records[0].remote_testing, "Yes");
        assert_eq!(records[0].adaptive_support, "No");
        assert_eq!(records[0].assessment_type, "K");
        assert_eq!(records[0].duration, "30");
    }

    #[test]
    fn empty_duration_stays_empty() {
        let records = parse(SAMPLE_CSV);
        assert_eq!(records[1].duration, "");
    }

    #[test]
    fn records_round_trip_through_the_same_headers() {
        let records = parse(SAMPLE_CSV);
        let mut writer = csv::Writer::from_writer(Vec::new());
        for record in &records {
            writer.serialize(record).unwrap();
        }
        let written = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert!(written.starts_with(
            "Name,URL,RemoteTesting,AdaptiveSupport,Type,Skills,Description,Duration"
        ));
        assert_eq!(parse(&written), records);
    }

    #[test]
    fn load_fails_on_missing_file() {
        assert!(Catalog::load(Path::new("/definitely/not/here.csv")).is_err());
    }
}
