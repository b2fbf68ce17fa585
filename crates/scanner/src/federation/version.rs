use crate::error::FetchError;
use crate::federation::network::fetch_url;
use crate::federation::tls::TlsMode;
use crate::federation::user_agent::random_user_agent;
use hyper::StatusCode;
use serde::{Deserialize, Serialize};

pub const VERSION_PATH: &str = "/_matrix/federation/v1/version";

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionResp {
    pub server: Version,
}

#[tracing::instrument(name = "query_server_version", level = "debug")]
pub async fn query_server_version(
    host: &str,
    port: u16,
    mode: TlsMode,
) -> Result<Version, FetchError> {
    let response = fetch_url(host, port, VERSION_PATH, mode, random_user_agent()).await?;
    if response.status != StatusCode::OK {
        return Err(FetchError::Http {
            status: response.status,
            context: format!("version endpoint of {host}:{port}"),
        });
    }
    parse_version_body(&response.body)
}

/// Decode `{"server": {"name": ..., "version": ...}}`. Extra keys are ignored;
/// a missing or empty name is rejected.
pub fn parse_version_body(body: &[u8]) -> Result<Version, FetchError> {
    let resp = serde_json::from_slice::<VersionResp>(body)
        .map_err(|e| FetchError::Json(e.to_string()))?;
    if resp.server.name.trim().is_empty() {
        return Err(FetchError::Json("empty server.name".to_string()));
    }
    Ok(resp.server)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_synapse_response() {
        let v = parse_version_body(br#"{"server":{"name":"Synapse","version":"1.50.0"}}"#)
            .unwrap();
        assert_eq!(
            v,
            Version {
                name: "Synapse".into(),
                version: "1.50.0".into()
            }
        );
    }

    #[test]
    fn ignores_extra_keys() {
        let v = parse_version_body(
            br#"{"server":{"name":"conduwuit","version":"0.4.6","compiler":"rustc"},"x":1}"#,
        )
        .unwrap();
        assert_eq!(v.name, "conduwuit");
    }

    #[test]
    fn rejects_missing_keys() {
        assert!(parse_version_body(br#"{"server":{"name":"Synapse"}}"#).is_err());
        assert!(parse_version_body(br#"{"version":"1.0"}"#).is_err());
        assert!(parse_version_body(br#"{"server":{"name":"","version":"1"}}"#).is_err());
        assert!(parse_version_body(b"<html></html>").is_err());
    }
}
