use crate::federation::LookupMethod;
use serde::{Deserialize, Serialize};

/// One confirmed federation server. `hostname` is the canonical key of the
/// record store: lowercase, and unique across the table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerRecord {
    pub hostname: String,
    pub delegated_hostname: String,
    pub delegated_ip: String,
    pub delegated_port: u16,
    pub lookup_method: LookupMethod,
    pub server_name: String,
    pub server_version: String,
    pub tls_valid: bool,
}

impl ServerRecord {
    /// `;`-separated line in the column order of `delegated_data`, used for
    /// debug output.
    pub fn to_line(&self) -> String {
        format!(
            "{};{};{};{};{};{};{};{}",
            self.hostname,
            self.delegated_hostname,
            self.delegated_ip,
            self.delegated_port,
            self.lookup_method,
            self.server_name,
            self.server_version,
            if self.tls_valid { "yes" } else { "no" }
        )
    }
}

/// Header matching [`ServerRecord::to_line`].
pub const RECORD_LINE_HEADER: &str = "Hostname;Delegated hostname;Delegated IP;Delegated port;Server lookup type;Name;Matrix server version;Valid SSL";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_format() {
        let record = ServerRecord {
            hostname: "example.org".into(),
            delegated_hostname: "matrix.example.org".into(),
            delegated_ip: "192.0.2.10".into(),
            delegated_port: 443,
            lookup_method: LookupMethod::WellKnown,
            server_name: "Synapse".into(),
            server_version: "1.50.0".into(),
            tls_valid: false,
        };
        assert_eq!(
            record.to_line(),
            "example.org;matrix.example.org;192.0.2.10;443;wellknown;Synapse;1.50.0;no"
        );
        assert_eq!(
            RECORD_LINE_HEADER.split(';').count(),
            record.to_line().split(';').count()
        );
    }
}
