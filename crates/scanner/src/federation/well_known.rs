use crate::federation::network::fetch_url;
use crate::federation::normalize::is_valid_hostname;
use crate::federation::tls::TlsMode;
use crate::federation::user_agent::random_user_agent;
use hyper::StatusCode;
use tracing::debug;

pub const WELL_KNOWN_PATH: &str = "/.well-known/matrix/server";

/// Fetch `https://{server_name}/.well-known/matrix/server` and return the raw
/// `m.server` value. Certificates are not verified here; delegation documents
/// are commonly served with self-signed certificates.
#[tracing::instrument(name = "lookup_server_well_known", level = "debug")]
pub async fn lookup_server_well_known(server_name: &str) -> Option<String> {
    let response = match fetch_url(
        server_name,
        443,
        WELL_KNOWN_PATH,
        TlsMode::Insecure,
        random_user_agent(),
    )
    .await
    {
        Ok(response) => response,
        Err(e) => {
            debug!(error = %e, "well-known fetch failed");
            return None;
        }
    };
    if response.status != StatusCode::OK {
        debug!(status = %response.status, "well-known returned non-200");
        return None;
    }
    extract_m_server(&response.body)
}

/// Pull `m.server` out of a well-known document body.
pub fn extract_m_server(body: &[u8]) -> Option<String> {
    let json = serde_json::from_slice::<serde_json::Value>(body).ok()?;
    json.as_object()?
        .get("m.server")?
        .as_str()
        .map(str::to_string)
}

/// Split an `m.server` value of the form `host[:port]` into its parts. The
/// port defaults to 443 when absent. Returns `None` for anything malformed.
pub fn parse_m_server(value: &str) -> Option<(String, u16)> {
    let value = value.trim();
    if let Some(rest) = value.strip_prefix('[') {
        // IPv6 literal: "[::1]" or "[::1]:8448"
        let (addr, tail) = rest.split_once(']')?;
        addr.parse::<std::net::Ipv6Addr>().ok()?;
        let port = match tail {
            "" => 443,
            _ => tail.strip_prefix(':')?.parse::<u16>().ok()?,
        };
        return Some((addr.to_string(), port));
    }

    let (host, port) = match value.split_once(':') {
        Some((host, port)) => (host, port.parse::<u16>().ok()?),
        None => (value, 443),
    };
    if port == 0 || !is_valid_hostname(host) {
        return None;
    }
    Some((host.to_ascii_lowercase(), port))
}
