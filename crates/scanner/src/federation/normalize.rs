//! Turning raw candidate tokens into bare hostnames.
//!
//! Candidates come from scan exports, Matrix IDs scraped out of room state and
//! hand-maintained lists, so they carry all sorts of noise: schemes, user or
//! room prefixes, query strings, paths and explicit ports.

use std::net::{IpAddr, Ipv6Addr};

/// A candidate reduced to the name that gets delegated, plus any port the
/// input spelled out explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCandidate {
    pub host: String,
    pub explicit_port: Option<u16>,
}

/// Normalize a raw candidate. Returns `None` when nothing resembling a
/// hostname or IP literal is left.
pub fn normalize_candidate(raw: &str) -> Option<NormalizedCandidate> {
    let mut candidate = raw.trim();
    for scheme in ["https://", "http://"] {
        if let Some(rest) = candidate.strip_prefix(scheme) {
            candidate = rest;
        }
    }

    // Matrix identifiers: "@user:server", "#alias:server", "!room:server".
    // Nested forms such as "@user:!room:server" peel one sigil at a time.
    while let Some(rest) = candidate.strip_prefix(['@', '#', '!']) {
        let (_, server) = rest.split_once(':')?;
        candidate = server;
    }
    if let Some((_, server)) = candidate.split_once('!') {
        // Room id embedded mid-token, e.g. "matrix.to/!room:server".
        let (_, server) = server.split_once(':')?;
        candidate = server;
    }

    let end = candidate.find(['?', '#', '/']).unwrap_or(candidate.len());
    let candidate = &candidate[..end];

    let (host, explicit_port) = split_host_port(candidate)?;
    if host.parse::<IpAddr>().is_err() && !is_valid_hostname(host) {
        return None;
    }
    // "matrix.org." and "matrix.org" are the same server
    let host = host.strip_suffix('.').unwrap_or(host);
    Some(NormalizedCandidate {
        host: host.to_ascii_lowercase(),
        explicit_port,
    })
}

fn split_host_port(candidate: &str) -> Option<(&str, Option<u16>)> {
    if let Some(rest) = candidate.strip_prefix('[') {
        let (addr, tail) = rest.split_once(']')?;
        let port = match tail {
            "" => None,
            _ => Some(tail.strip_prefix(':')?.parse::<u16>().ok()?),
        };
        return Some((addr, port));
    }
    if candidate.parse::<Ipv6Addr>().is_ok() {
        return Some((candidate, None));
    }
    match candidate.split_once(':') {
        Some((host, port)) => Some((host, Some(port.parse::<u16>().ok()?))),
        None => Some((candidate, None)),
    }
}

/// ASCII DNS name check: letters, digits, hyphens and dots, no empty labels.
pub fn is_valid_hostname(hostname: &str) -> bool {
    let hostname = hostname.strip_suffix('.').unwrap_or(hostname);
    if hostname.is_empty() || hostname.len() > 253 || !hostname.is_ascii() {
        return false;
    }
    hostname.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}
