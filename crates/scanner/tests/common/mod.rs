//! In-memory stand-ins for DNS and HTTPS used across the integration tests.
#![allow(dead_code)]

use federation_scanner::error::FetchError;
use federation_scanner::federation::{DelegationLookup, SrvTarget, TlsMode, Version};
use federation_scanner::probe::FederationEndpoint;
use hyper::StatusCode;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// What a version endpoint answers for one TLS mode.
#[derive(Clone, Debug)]
pub enum Reply {
    Version(&'static str, &'static str),
    BadCertificate,
    Refused,
    TimedOut,
    Status(u16),
}

impl Reply {
    fn into_result(self) -> Result<Version, FetchError> {
        match self {
            Reply::Version(name, version) => Ok(Version {
                name: name.to_string(),
                version: version.to_string(),
            }),
            Reply::BadCertificate => Err(FetchError::Tls("invalid peer certificate".into())),
            Reply::Refused => Err(FetchError::Network("connection refused".into())),
            Reply::TimedOut => Err(FetchError::Timeout(Duration::from_secs(3))),
            Reply::Status(code) => Err(FetchError::Http {
                status: StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY),
                context: "fake".into(),
            }),
        }
    }
}

#[derive(Default)]
pub struct FakeNetwork {
    well_known: HashMap<String, String>,
    srv: HashMap<String, SrvTarget>,
    verified: HashMap<(String, u16), Reply>,
    unverified: HashMap<(String, u16), Reply>,
    addresses: HashMap<String, IpAddr>,
    pub well_known_calls: AtomicUsize,
    pub srv_calls: AtomicUsize,
    pub version_calls: Mutex<Vec<(String, u16, TlsMode)>>,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_well_known(mut self, host: &str, m_server: &str) -> Self {
        self.well_known.insert(host.to_string(), m_server.to_string());
        self
    }

    pub fn with_srv(mut self, host: &str, target: &str, port: u16) -> Self {
        self.srv.insert(
            host.to_string(),
            SrvTarget {
                host: target.to_string(),
                port,
            },
        );
        self
    }

    /// Same answer with and without certificate verification.
    pub fn with_version(self, host: &str, port: u16, reply: Reply) -> Self {
        self.with_verified(host, port, reply.clone())
            .with_unverified(host, port, reply)
    }

    pub fn with_verified(mut self, host: &str, port: u16, reply: Reply) -> Self {
        self.verified.insert((host.to_string(), port), reply);
        self
    }

    pub fn with_unverified(mut self, host: &str, port: u16, reply: Reply) -> Self {
        self.unverified.insert((host.to_string(), port), reply);
        self
    }

    pub fn with_address(mut self, host: &str, ip: &str) -> Self {
        self.addresses
            .insert(host.to_string(), ip.parse().expect("valid test address"));
        self
    }

    pub fn well_known_count(&self) -> usize {
        self.well_known_calls.load(Ordering::SeqCst)
    }

    pub fn srv_count(&self) -> usize {
        self.srv_calls.load(Ordering::SeqCst)
    }

    pub fn version_attempts(&self) -> Vec<(String, u16, TlsMode)> {
        self.version_calls.lock().unwrap().clone()
    }
}

impl DelegationLookup for FakeNetwork {
    async fn well_known(&self, server_name: &str) -> Option<String> {
        self.well_known_calls.fetch_add(1, Ordering::SeqCst);
        self.well_known.get(server_name).cloned()
    }

    async fn srv(&self, server_name: &str) -> Option<SrvTarget> {
        self.srv_calls.fetch_add(1, Ordering::SeqCst);
        self.srv.get(server_name).cloned()
    }
}

impl FederationEndpoint for FakeNetwork {
    async fn fetch_version(
        &self,
        host: &str,
        port: u16,
        mode: TlsMode,
    ) -> Result<Version, FetchError> {
        self.version_calls
            .lock()
            .unwrap()
            .push((host.to_string(), port, mode));
        let replies = match mode {
            TlsMode::Verify => &self.verified,
            TlsMode::Insecure => &self.unverified,
        };
        replies
            .get(&(host.to_string(), port))
            .cloned()
            .unwrap_or(Reply::Refused)
            .into_result()
    }

    async fn resolve_ip(&self, host: &str) -> Option<IpAddr> {
        if let Ok(ip) = host.parse() {
            return Some(ip);
        }
        self.addresses.get(host).copied()
    }
}
