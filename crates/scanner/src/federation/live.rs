use crate::error::FetchError;
use crate::federation::delegation::DelegationLookup;
use crate::federation::dns::{SrvTarget, lookup_server_srv, resolve_host_ip};
use crate::federation::tls::TlsMode;
use crate::federation::version::{Version, query_server_version};
use crate::federation::well_known::lookup_server_well_known;
use crate::probe::FederationEndpoint;
use hickory_resolver::{Resolver, TokioResolver};
use std::net::IpAddr;
use std::sync::Arc;

/// Delegation and version probing over real DNS and HTTPS.
#[derive(Clone)]
pub struct LiveNetwork {
    resolver: Arc<TokioResolver>,
}

impl LiveNetwork {
    pub fn new(resolver: Arc<TokioResolver>) -> Self {
        Self { resolver }
    }

    /// Build a network backed by the system resolver configuration.
    pub fn from_system() -> Result<Self, hickory_resolver::ResolveError> {
        let resolver = Resolver::builder_tokio()?.build();
        Ok(Self::new(Arc::new(resolver)))
    }
}

impl DelegationLookup for LiveNetwork {
    async fn well_known(&self, server_name: &str) -> Option<String> {
        lookup_server_well_known(server_name).await
    }

    async fn srv(&self, server_name: &str) -> Option<SrvTarget> {
        lookup_server_srv(server_name, &self.resolver).await
    }
}

impl FederationEndpoint for LiveNetwork {
    async fn fetch_version(
        &self,
        host: &str,
        port: u16,
        mode: TlsMode,
    ) -> Result<Version, FetchError> {
        query_server_version(host, port, mode).await
    }

    async fn resolve_ip(&self, host: &str) -> Option<IpAddr> {
        resolve_host_ip(host, &self.resolver).await
    }
}
