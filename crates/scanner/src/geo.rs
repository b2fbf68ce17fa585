//! Map Shodan hits that answer like a Matrix homeserver onto coordinates.

use crate::federation::DEFAULT_FEDERATION_PORT;
use crate::federation::network::fetch_url;
use crate::federation::tls::TlsMode;
use crate::federation::user_agent::random_user_agent;
use crate::federation::version::VERSION_PATH;
use crate::scan::run_pool;
use crate::source::ShodanEntry;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::future::Future;
use tracing::{debug, info};

/// Number of export lines handled by one `--slice`.
pub const SLICE_LEN: usize = 3500;
/// Slices past this index take everything that is left.
pub const LAST_FIXED_SLICE: usize = 6;

const MATRIX_MARKERS: [&str; 2] = ["Synapse", "Dendrite"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub ip: String,
}

impl GeoPoint {
    /// Only tcp entries with both coordinates set and non-zero are mappable.
    pub fn from_entry(entry: &ShodanEntry) -> Option<Self> {
        if !entry.is_tcp() {
            return None;
        }
        let location = entry.location.as_ref()?;
        let latitude = location.latitude.filter(|v| *v != 0.0)?;
        let longitude = location.longitude.filter(|v| *v != 0.0)?;
        Some(Self {
            latitude: round4(latitude),
            longitude: round4(longitude),
            ip: entry.ip_str.trim().to_string(),
        })
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

pub fn body_looks_like_matrix(body: &[u8]) -> bool {
    let text = String::from_utf8_lossy(body);
    MATRIX_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Hit the federation version endpoint on 8448 without verifying the
/// certificate. The status code is ignored; only the body is inspected.
#[tracing::instrument(name = "detect_matrix", level = "debug", skip(entry), fields(ip = %entry.ip_str))]
pub async fn detect_matrix(entry: ShodanEntry) -> Option<GeoPoint> {
    let point = GeoPoint::from_entry(&entry)?;
    match fetch_url(
        &point.ip,
        DEFAULT_FEDERATION_PORT,
        VERSION_PATH,
        TlsMode::Insecure,
        random_user_agent(),
    )
    .await
    {
        Ok(response) if body_looks_like_matrix(&response.body) => Some(point),
        Ok(response) => {
            debug!(status = %response.status, "not a Matrix server");
            None
        }
        Err(e) => {
            debug!(error = %e, "no answer on federation port");
            None
        }
    }
}

/// Cut the export into the fixed per-process chunks it was historically
/// split into.
pub fn slice_lines<T>(mut items: Vec<T>, index: usize) -> Vec<T> {
    let start = index.saturating_mul(SLICE_LEN);
    if start >= items.len() {
        return Vec::new();
    }
    let mut items = items.split_off(start);
    if index <= LAST_FIXED_SLICE {
        items.truncate(SLICE_LEN);
    }
    items
}

pub async fn geo_scan(entries: Vec<ShodanEntry>, workers: usize) -> Vec<GeoPoint> {
    geo_scan_with(entries, workers, detect_matrix).await
}

/// Run `detect` over the mappable entries in random order on the bounded pool.
pub async fn geo_scan_with<F, Fut>(
    entries: Vec<ShodanEntry>,
    workers: usize,
    detect: F,
) -> Vec<GeoPoint>
where
    F: Fn(ShodanEntry) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<GeoPoint>> + Send + 'static,
{
    let mut entries: Vec<ShodanEntry> = entries
        .into_iter()
        .filter(|entry| GeoPoint::from_entry(entry).is_some())
        .collect();
    entries.shuffle(&mut rand::thread_rng());
    let total = entries.len();
    info!(entries = total, workers, "starting geo scan");
    let points = run_pool(entries, workers, detect).await;
    info!(found = points.len(), entries = total, "geo scan finished");
    points
}
