//! Candidate hostname sources.
//!
//! Each loader returns `Ok(None)` when its source is simply absent (missing
//! file, empty table) so callers can combine whatever is available.

use crate::error::SourceError;
use rand::seq::SliceRandom;
use sea_orm::{ConnectionTrait, Database, DbBackend, FromQueryResult, Statement};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Order-preserving deduplication; the first occurrence wins.
pub fn unique_list<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

fn read_source(path: &Path) -> Result<Option<String>, SourceError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(SourceError::Io {
            path: path.display().to_string(),
            source,
        }),
    }
}

/// Newline-delimited hostnames. Lines are trimmed and blank lines dropped.
pub fn load_hostnames_file(path: &Path) -> Result<Option<Vec<String>>, SourceError> {
    let Some(content) = read_source(path)? else {
        return Ok(None);
    };
    let hostnames: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    Ok(Some(hostnames))
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShodanLocation {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// The subset of a Shodan banner export record we use.
#[derive(Debug, Clone, Deserialize)]
pub struct ShodanEntry {
    pub ip_str: String,
    #[serde(default)]
    pub transport: String,
    #[serde(default)]
    pub location: Option<ShodanLocation>,
}

impl ShodanEntry {
    pub fn is_tcp(&self) -> bool {
        self.transport == "tcp"
    }
}

/// Parse a Shodan JSON-lines export. Lines that are not valid records are
/// skipped; only `tcp` entries are returned.
pub fn parse_shodan_export(content: &str) -> Vec<ShodanEntry> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<ShodanEntry>(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, "skipping malformed Shodan line");
                None
            }
        })
        .filter(ShodanEntry::is_tcp)
        .collect()
}

pub fn load_shodan_entries(path: &Path) -> Result<Option<Vec<ShodanEntry>>, SourceError> {
    Ok(read_source(path)?.map(|content| parse_shodan_export(&content)))
}

/// IP addresses of the `tcp` entries of a Shodan export.
pub fn load_shodan_file(path: &Path) -> Result<Option<Vec<String>>, SourceError> {
    Ok(load_shodan_entries(path)?.map(|entries| {
        entries
            .into_iter()
            .map(|entry| entry.ip_str.trim().to_string())
            .collect()
    }))
}

#[derive(Debug, FromQueryResult)]
struct DestinationRow {
    destination: String,
}

/// Read `destinations(destination)` from a homeserver database, e.g. Synapse's
/// federation destinations table.
#[tracing::instrument(name = "load_destinations", skip(database_url))]
pub async fn load_destinations(
    database_url: &str,
    limit: Option<u64>,
) -> Result<Option<Vec<String>>, SourceError> {
    let db = Database::connect(database_url).await?;
    let backend = db.get_database_backend();
    let stmt = match limit {
        Some(limit) => Statement::from_sql_and_values(
            backend,
            limit_query(backend),
            [sea_orm::Value::BigInt(Some(limit.min(i64::MAX as u64) as i64))],
        ),
        None => Statement::from_string(backend, "SELECT destination FROM destinations"),
    };
    let rows = DestinationRow::find_by_statement(stmt).all(&db).await?;
    let _ = db.close().await;

    let destinations: Vec<String> = rows
        .into_iter()
        .map(|row| row.destination.trim().to_string())
        .filter(|destination| !destination.is_empty())
        .collect();
    if destinations.is_empty() {
        info!("destinations table is empty");
        return Ok(None);
    }
    Ok(Some(destinations))
}

fn limit_query(backend: DbBackend) -> &'static str {
    match backend {
        DbBackend::Postgres => "SELECT destination FROM destinations LIMIT $1",
        _ => "SELECT destination FROM destinations LIMIT ?",
    }
}

/// Deduplicated union of candidate sources, in the order they were added.
#[derive(Debug, Default, Clone)]
pub struct CandidateSet {
    hostnames: Vec<String>,
    seen: HashSet<String>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend<I>(&mut self, hostnames: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let before = self.hostnames.len();
        for hostname in hostnames {
            if self.seen.insert(hostname.clone()) {
                self.hostnames.push(hostname);
            }
        }
        self.hostnames.len() - before
    }

    pub fn shuffle(&mut self) {
        self.hostnames.shuffle(&mut rand::thread_rng());
    }

    pub fn len(&self) -> usize {
        self.hostnames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hostnames.is_empty()
    }
}

impl IntoIterator for CandidateSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.hostnames.into_iter()
    }
}
