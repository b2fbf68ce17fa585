use hyper::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("TLS error: {0}")]
    Tls(String),
    #[error("Network timeout after {0:?}")]
    Timeout(std::time::Duration),
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP status {status}: {context}")]
    Http { status: StatusCode, context: String },
    #[error("JSON parse error: {0}")]
    Json(String),
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),
    #[error("Redirect loop or too many redirects (limit {0})")]
    TooManyRedirects(usize),
}

impl FetchError {
    /// Only a failed TLS handshake earns the unverified retry; every other
    /// transport failure is final for the candidate.
    pub fn is_tls(&self) -> bool {
        matches!(self, FetchError::Tls(_))
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid Shodan export line: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Destinations database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("Schema migration failed: {0}")]
    Migration(String),
    #[error("Invalid stored row: {0}")]
    InvalidRow(String),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
