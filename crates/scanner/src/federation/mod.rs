//! Federation discovery building blocks.
//! Modules:
//! - normalize: raw candidate token → bare hostname + explicit port
//! - delegation: the IP / well-known / SRV / assumed-A resolution policy
//! - well_known: `.well-known/matrix/server` fetch and `m.server` parsing
//! - dns: SRV selection and address resolution
//! - network: TLS + HTTP/1 fetch with redirects and timeout
//! - tls: shared verifying and non-verifying client configs
//! - version: `/_matrix/federation/v1/version` query
//! - user_agent: randomized User-Agent selection
//! - live: the real-network implementation of the lookup traits

pub mod delegation;
pub mod dns;
pub mod live;
pub mod network;
pub mod normalize;
pub mod tls;
pub mod user_agent;
pub mod version;
pub mod well_known;

pub use delegation::{
    DEFAULT_FEDERATION_PORT, DelegationLookup, LookupMethod, ResolvedEndpoint, resolve,
};

pub use dns::{SrvTarget, absolutize_srv_target, lookup_server_srv, resolve_host_ip};

pub use live::LiveNetwork;

pub use network::{FetchedResponse, NETWORK_TIMEOUT_SECS, fetch_url};

pub use normalize::{NormalizedCandidate, normalize_candidate};

pub use tls::TlsMode;

pub use version::{Version, VersionResp, query_server_version};

pub use well_known::{lookup_server_well_known, parse_m_server};
