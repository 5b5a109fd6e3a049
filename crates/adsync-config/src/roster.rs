//! Publisher roster: CSV file and inline entries, deduplicated by domain.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use adsync_fetch::Publisher;
use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::settings::{AdsyncConfig, InlinePublisher};

#[derive(Debug, Deserialize)]
struct CsvRow {
    domain: String,
    #[serde(default)]
    publisher_name: Option<String>,
    #[serde(default)]
    app_ads_path: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

/// Publishers in roster order, each domain once. The first entry for a
/// domain wins; later ones are listed in `duplicates`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    pub publishers: Vec<Publisher>,
    pub duplicates: Vec<String>,
}

impl Roster {
    pub fn from_publishers<I>(publishers: I) -> Self
    where
        I: IntoIterator<Item = Publisher>,
    {
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut roster = Roster::default();
        for p in publishers {
            if seen.insert(p.domain.clone()) {
                roster.publishers.push(p);
            } else {
                roster.duplicates.push(p.domain);
            }
        }
        roster
    }

    pub fn len(&self) -> usize {
        self.publishers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.publishers.is_empty()
    }

    pub fn get(&self, domain: &str) -> Option<&Publisher> {
        self.publishers.iter().find(|p| p.domain == domain)
    }
}

fn publisher(
    domain: &str,
    name: Option<&str>,
    path: Option<&str>,
    notes: Option<&str>,
) -> Publisher {
    Publisher::new(domain)
        .with_name(name.unwrap_or_default())
        .with_path(path.unwrap_or_default())
        .with_notes(notes.unwrap_or_default().trim())
}

/// Parse roster CSV. Only the `domain` column is required; rows with an
/// empty domain are skipped.
pub fn parse_roster_csv<R: Read>(reader: R) -> Result<Vec<Publisher>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().context("roster csv: header row")?.clone();
    if !headers.iter().any(|h| h == "domain") {
        bail!("roster csv: missing required 'domain' column");
    }

    let mut out = Vec::new();
    for (idx, row) in rdr.deserialize::<CsvRow>().enumerate() {
        // Header is line 1.
        let row = row.with_context(|| format!("roster csv: bad row at line {}", idx + 2))?;
        if row.domain.trim().is_empty() {
            continue;
        }
        out.push(publisher(
            &row.domain,
            row.publisher_name.as_deref(),
            row.app_ads_path.as_deref(),
            row.notes.as_deref(),
        ));
    }
    Ok(out)
}

fn from_inline(entry: &InlinePublisher) -> Publisher {
    publisher(
        &entry.domain,
        entry.name.as_deref(),
        entry.app_ads_path.as_deref(),
        entry.notes.as_deref(),
    )
}

/// CSV entries first (when configured), then inline entries.
pub fn load_roster(cfg: &AdsyncConfig) -> Result<Roster> {
    let mut all: Vec<Publisher> = Vec::new();
    if let Some(path) = &cfg.publishers.csv {
        all.extend(read_roster_file(path)?);
    }
    all.extend(
        cfg.publishers
            .inline
            .iter()
            .filter(|e| !e.domain.trim().is_empty())
            .map(from_inline),
    );
    Ok(Roster::from_publishers(all))
}

fn read_roster_file(path: &Path) -> Result<Vec<Publisher>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open roster csv: {}", path.display()))?;
    parse_roster_csv(file).with_context(|| format!("failed to parse roster csv: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
domain,publisher_name,app_ads_path,notes
studio-a.example,Studio A,,
Studio-B.example , ,ads.txt/app-ads.txt, quarterly review
,,,
studio-a.example,Studio A again,,
";

    #[test]
    fn csv_defaults_and_normalization() {
        let pubs = parse_roster_csv(CSV.as_bytes()).unwrap();
        assert_eq!(pubs.len(), 3);
        assert_eq!(pubs[0].name, "Studio A");
        assert_eq!(pubs[0].app_ads_path, "/app-ads.txt");
        assert_eq!(pubs[1].domain, "studio-b.example");
        assert_eq!(pubs[1].name, "studio-b.example");
        assert_eq!(pubs[1].app_ads_path, "/ads.txt/app-ads.txt");
        assert_eq!(pubs[1].notes, "quarterly review");
    }

    #[test]
    fn roster_dedups_by_domain_first_wins() {
        let roster = Roster::from_publishers(parse_roster_csv(CSV.as_bytes()).unwrap());
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.get("studio-a.example").unwrap().name, "Studio A");
        assert_eq!(roster.duplicates, vec!["studio-a.example".to_string()]);
    }

    #[test]
    fn domain_only_csv_is_enough() {
        let pubs = parse_roster_csv("domain\none.example\ntwo.example\n".as_bytes()).unwrap();
        assert_eq!(pubs.len(), 2);
    }

    #[test]
    fn missing_domain_column_is_an_error() {
        assert!(parse_roster_csv("site,name\nx,y\n".as_bytes()).is_err());
    }
}
