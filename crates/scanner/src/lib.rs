//! A library for discovering and fingerprinting Matrix federation servers.
//!
//! Candidate hostnames are gathered from local sources, resolved through the
//! server discovery rules (IP literal, `.well-known`, SRV, plain A record),
//! confirmed by querying the federation version endpoint, and persisted.

pub mod config;
pub mod entity;
pub mod error;
pub mod export;
pub mod federation;
pub mod geo;
pub mod probe;
pub mod record;
pub mod scan;
pub mod source;
pub mod store;

pub use probe::{FederationEndpoint, ProbeClient, Prober};
pub use record::ServerRecord;
pub use store::RecordStore;
