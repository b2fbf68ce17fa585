//! Probe one candidate: normalize, resolve delegation, confirm the version
//! endpoint answers, and assemble a [`ServerRecord`].
//!
//! Every failure collapses into `None`. An internet-wide candidate list is
//! mostly dead or unrelated hosts, so a miss is the expected outcome and is
//! neither surfaced nor retried (apart from the single unverified TLS retry).

use crate::error::FetchError;
use crate::federation::tls::TlsMode;
use crate::federation::version::Version;
use crate::federation::{DelegationLookup, normalize_candidate, resolve};
use crate::record::ServerRecord;
use std::future::Future;
use std::net::IpAddr;
use tracing::debug;

/// Network operations needed once the endpoint is known.
pub trait FederationEndpoint: Send + Sync {
    fn fetch_version(
        &self,
        host: &str,
        port: u16,
        mode: TlsMode,
    ) -> impl Future<Output = Result<Version, FetchError>> + Send;

    fn resolve_ip(&self, host: &str) -> impl Future<Output = Option<IpAddr>> + Send;
}

/// Anything that can turn a raw candidate into a record.
pub trait Prober: Send + Sync + 'static {
    fn probe(&self, raw_candidate: &str) -> impl Future<Output = Option<ServerRecord>> + Send;
}

pub struct ProbeClient<N> {
    network: N,
}

impl<N> ProbeClient<N>
where
    N: DelegationLookup + FederationEndpoint,
{
    pub fn new(network: N) -> Self {
        Self { network }
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    /// Fetch the version first with certificate verification, then once more
    /// without it if and only if the first attempt failed in the TLS layer.
    /// The flag in the result is whether the certificate verified.
    pub async fn fetch_version_with_fallback(
        &self,
        host: &str,
        port: u16,
    ) -> Result<(Version, bool), FetchError> {
        match self.network.fetch_version(host, port, TlsMode::Verify).await {
            Ok(version) => Ok((version, true)),
            Err(e) if e.is_tls() => {
                debug!(host, port, error = %e, "certificate rejected, retrying unverified");
                let version = self
                    .network
                    .fetch_version(host, port, TlsMode::Insecure)
                    .await?;
                Ok((version, false))
            }
            Err(e) => Err(e),
        }
    }
}

impl<N> Prober for ProbeClient<N>
where
    N: DelegationLookup + FederationEndpoint + 'static,
{
    #[tracing::instrument(name = "probe", level = "debug", skip(self))]
    async fn probe(&self, raw_candidate: &str) -> Option<ServerRecord> {
        let Some(candidate) = normalize_candidate(raw_candidate) else {
            debug!("candidate did not normalize to a hostname");
            return None;
        };

        let mut endpoint = resolve(&candidate.host, &self.network).await;
        if let Some(port) = candidate.explicit_port {
            endpoint.delegated_port = port;
        }

        let (version, tls_valid) = match self
            .fetch_version_with_fallback(&endpoint.delegated_host, endpoint.delegated_port)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                debug!(
                    host = %endpoint.delegated_host,
                    port = endpoint.delegated_port,
                    error = %e,
                    "version probe failed"
                );
                return None;
            }
        };

        let Some(ip) = self.network.resolve_ip(&endpoint.delegated_host).await else {
            debug!(host = %endpoint.delegated_host, "delegated host has no address");
            return None;
        };

        Some(ServerRecord {
            hostname: candidate.host,
            delegated_hostname: endpoint.delegated_host,
            delegated_ip: ip.to_string(),
            delegated_port: endpoint.delegated_port,
            lookup_method: endpoint.method,
            server_name: version.name,
            server_version: version.version,
            tls_valid,
        })
    }
}
