//! Server name → federation endpoint resolution.
//!
//! The order is fixed: IP literal, `.well-known/matrix/server`, SRV, then the
//! bare name on port 8448. The first tier that produces an endpoint wins, so a
//! server publishing both a well-known document and SRV records is always
//! resolved through the well-known document.

use crate::federation::dns::SrvTarget;
use crate::federation::well_known::parse_m_server;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::net::IpAddr;
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_FEDERATION_PORT: u16 = 8448;

/// How a delegated endpoint was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LookupMethod {
    #[serde(rename = "ip")]
    Ip,
    #[serde(rename = "wellknown")]
    WellKnown,
    #[serde(rename = "srv")]
    Srv,
    #[serde(rename = "a")]
    AssumedA,
}

impl LookupMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupMethod::Ip => "ip",
            LookupMethod::WellKnown => "wellknown",
            LookupMethod::Srv => "srv",
            LookupMethod::AssumedA => "a",
        }
    }
}

impl fmt::Display for LookupMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LookupMethod {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ip" => Ok(LookupMethod::Ip),
            "wellknown" => Ok(LookupMethod::WellKnown),
            "srv" => Ok(LookupMethod::Srv),
            "a" => Ok(LookupMethod::AssumedA),
            other => Err(format!("unknown lookup method: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub delegated_host: String,
    pub delegated_port: u16,
    pub method: LookupMethod,
}

/// The two network-backed delegation tiers. Both report absence as `None`;
/// the reason a tier failed never changes the outcome.
pub trait DelegationLookup: Send + Sync {
    /// Raw `m.server` value from the well-known document, if one was served.
    fn well_known(&self, server_name: &str) -> impl Future<Output = Option<String>> + Send;

    fn srv(&self, server_name: &str) -> impl Future<Output = Option<SrvTarget>> + Send;
}

/// Resolve `hostname` to its federation endpoint. Never fails: with no
/// delegation in place the name itself on port 8448 is assumed.
#[tracing::instrument(name = "resolve_delegation", level = "debug", skip(lookup))]
pub async fn resolve<L: DelegationLookup>(hostname: &str, lookup: &L) -> ResolvedEndpoint {
    if hostname.parse::<IpAddr>().is_ok() {
        return ResolvedEndpoint {
            delegated_host: hostname.to_string(),
            delegated_port: DEFAULT_FEDERATION_PORT,
            method: LookupMethod::Ip,
        };
    }

    if let Some(m_server) = lookup.well_known(hostname).await {
        match parse_m_server(&m_server) {
            Some((delegated_host, delegated_port)) => {
                return ResolvedEndpoint {
                    delegated_host,
                    delegated_port,
                    method: LookupMethod::WellKnown,
                };
            }
            None => debug!(m_server = %m_server, "ignoring malformed m.server"),
        }
    }

    if let Some(srv) = lookup.srv(hostname).await {
        return ResolvedEndpoint {
            delegated_host: srv.host,
            delegated_port: srv.port,
            method: LookupMethod::Srv,
        };
    }

    ResolvedEndpoint {
        delegated_host: hostname.to_string(),
        delegated_port: DEFAULT_FEDERATION_PORT,
        method: LookupMethod::AssumedA,
    }
}
