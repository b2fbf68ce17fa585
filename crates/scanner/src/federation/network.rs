use crate::error::FetchError;
use crate::federation::tls::{TlsMode, client_config};
use bytes::Bytes;
use http_body_util::{BodyExt, Empty, Limited};
use hyper::{Request, StatusCode};
use hyper_util::rt::TokioIo;
use rustls_pki_types::ServerName;
use tokio::net::TcpStream;
use tokio::time::{Duration, timeout};
use tokio_rustls::TlsConnector;
use tracing::debug;
use url::Url;

/// Upper bound for one complete request chain, redirects included.
pub const NETWORK_TIMEOUT_SECS: u64 = 3;

pub const MAX_REDIRECTS: usize = 10;

/// Bodies of the documents we fetch are a few hundred bytes.
const MAX_BODY_BYTES: usize = 256 * 1024;

#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Fetch `https://{host}:{port}{path}`, following redirects, within
/// [`NETWORK_TIMEOUT_SECS`].
#[tracing::instrument(name = "fetch_url", level = "debug", skip(user_agent))]
pub async fn fetch_url(
    host: &str,
    port: u16,
    path: &str,
    mode: TlsMode,
    user_agent: &str,
) -> Result<FetchedResponse, FetchError> {
    let timeout_duration = Duration::from_secs(NETWORK_TIMEOUT_SECS);
    timeout(
        timeout_duration,
        fetch_with_redirects(host, port, path, mode, user_agent),
    )
    .await
    .map_err(|_| FetchError::Timeout(timeout_duration))?
}

async fn fetch_with_redirects(
    host: &str,
    port: u16,
    path: &str,
    mode: TlsMode,
    user_agent: &str,
) -> Result<FetchedResponse, FetchError> {
    let mut current_host = host.to_string();
    let mut current_port = port;
    let mut current_path = path.to_string();

    for _ in 0..=MAX_REDIRECTS {
        let (response, location) =
            fetch_once(&current_host, current_port, &current_path, mode, user_agent).await?;
        if !response.status.is_redirection() {
            return Ok(response);
        }
        let Some(next) = location.and_then(|loc| {
            redirect_target(&current_host, current_port, &current_path, &loc)
        }) else {
            // Unfollowable redirect, hand the 3xx to the caller which rejects it.
            return Ok(response);
        };
        debug!(
            from = %format!("{current_host}:{current_port}{current_path}"),
            to = %format!("{}:{}{}", next.0, next.1, next.2),
            "following redirect"
        );
        (current_host, current_port, current_path) = next;
    }
    Err(FetchError::TooManyRedirects(MAX_REDIRECTS))
}

/// Resolve a `Location` header against the current request. Only `https`
/// targets are followed.
pub fn redirect_target(
    host: &str,
    port: u16,
    path: &str,
    location: &str,
) -> Option<(String, u16, String)> {
    let base = Url::parse(&format!("https://{}:{port}{path}", bracket_ipv6(host))).ok()?;
    let next = base.join(location).ok()?;
    if next.scheme() != "https" {
        return None;
    }
    let next_host = next.host_str()?.trim_matches(|c| c == '[' || c == ']');
    let next_port = next.port_or_known_default().unwrap_or(443);
    let mut next_path = next.path().to_string();
    if let Some(query) = next.query() {
        next_path.push('?');
        next_path.push_str(query);
    }
    Some((next_host.to_string(), next_port, next_path))
}

fn bracket_ipv6(host: &str) -> String {
    if host.contains(':') {
        format!("[{host}]")
    } else {
        host.to_string()
    }
}

async fn fetch_once(
    host: &str,
    port: u16,
    path: &str,
    mode: TlsMode,
    user_agent: &str,
) -> Result<(FetchedResponse, Option<String>), FetchError> {
    let stream = TcpStream::connect((host, port))
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;

    let config = client_config(mode).map_err(|e| FetchError::Tls(e.to_string()))?;
    let connector = TlsConnector::from(config);
    let domain = ServerName::try_from(host.to_string())
        .map_err(|_| FetchError::InvalidDomain(host.to_string()))?;

    let tls_stream = connector
        .connect(domain, stream)
        .await
        .map_err(classify_handshake_error)?;

    let io = TokioIo::new(tls_stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;
    tokio::task::spawn(async move {
        if let Err(err) = conn.await {
            debug!(error = ?err, "connection task ended");
        }
    });

    let host_header = if port == 443 {
        bracket_ipv6(host)
    } else {
        format!("{}:{port}", bracket_ipv6(host))
    };
    let req = Request::builder()
        .uri(path)
        .header(hyper::header::USER_AGENT, user_agent)
        .header(hyper::header::HOST, host_header)
        .body(Empty::<Bytes>::new())
        .map_err(|e| FetchError::Network(e.to_string()))?;

    let response = sender
        .send_request(req)
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;

    let status = response.status();
    let location = response
        .headers()
        .get(hyper::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = Limited::new(response.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?
        .to_bytes();

    Ok((FetchedResponse { status, body }, location))
}

/// tokio-rustls surfaces handshake failures as `io::Error`s wrapping a
/// `rustls::Error`; a reset or EOF mid-handshake stays a network error.
fn classify_handshake_error(e: std::io::Error) -> FetchError {
    let is_tls = e
        .get_ref()
        .is_some_and(|inner| inner.is::<rustls::Error>())
        || e.kind() == std::io::ErrorKind::InvalidData;
    if is_tls {
        FetchError::Tls(e.to_string())
    } else {
        FetchError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_redirect_keeps_host() {
        let next = redirect_target("example.org", 443, "/.well-known/matrix/server", "/other");
        assert_eq!(next, Some(("example.org".into(), 443, "/other".into())));
    }

    #[test]
    fn absolute_redirect_switches_host_and_port() {
        let next = redirect_target(
            "example.org",
            443,
            "/.well-known/matrix/server",
            "https://matrix.example.org:8443/.well-known/matrix/server?x=1",
        );
        assert_eq!(
            next,
            Some((
                "matrix.example.org".into(),
                8443,
                "/.well-known/matrix/server?x=1".into()
            ))
        );
    }

    #[test]
    fn plain_http_redirect_not_followed() {
        assert!(redirect_target("example.org", 443, "/", "http://example.org/").is_none());
    }

    #[test]
    fn tls_errors_are_classified() {
        let tls = std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            rustls::Error::InvalidCertificate(rustls::CertificateError::UnknownIssuer),
        );
        assert!(classify_handshake_error(tls).is_tls());

        let reset = std::io::Error::from(std::io::ErrorKind::ConnectionReset);
        assert!(!classify_handshake_error(reset).is_tls());
    }
}
