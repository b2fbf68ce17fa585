use crate::federation::network::NETWORK_TIMEOUT_SECS;
use hickory_resolver::proto::rr::rdata::SRV;
use hickory_resolver::{Resolver, name_server::ConnectionProvider};
use std::net::IpAddr;
use tokio::time::{Duration, timeout};
use tracing::debug;

/// Service labels queried in order. `_matrix-fed` superseded `_matrix` but
/// most deployments in the wild still only publish the older label.
///
/// This goes one label beyond the plain `_matrix._tcp` service lookup: when a
/// host publishes both labels with different targets, the `_matrix-fed`
/// target wins and `_matrix` is never queried.
pub const SRV_PREFIXES: [&str; 2] = ["_matrix-fed._tcp", "_matrix._tcp"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrvTarget {
    pub host: String,
    pub port: u16,
}

pub fn absolutize_srv_target(target: &str, base: &str) -> String {
    if target.ends_with('.') {
        target.to_string()
    } else {
        format!("{}.{}.", target, base.trim_end_matches('.'))
    }
}

/// Pick the record a client should try first: lowest priority, then highest
/// weight. A target of "." means the service is explicitly unavailable.
pub fn select_srv_record(records: &[SRV], base: &str) -> Option<SrvTarget> {
    records
        .iter()
        .filter(|srv| !srv.target().is_root() && srv.port() != 0)
        .min_by(|a, b| {
            a.priority()
                .cmp(&b.priority())
                .then_with(|| b.weight().cmp(&a.weight()))
        })
        .map(|srv| SrvTarget {
            host: absolutize_srv_target(&srv.target().to_utf8(), base)
                .trim_end_matches('.')
                .to_ascii_lowercase(),
            port: srv.port(),
        })
}

/// Fully qualified SRV names for `server_name`, in query order.
pub fn srv_query_names(server_name: &str) -> Vec<String> {
    let base = server_name.trim_end_matches('.');
    SRV_PREFIXES
        .iter()
        .map(|prefix| format!("{prefix}.{base}."))
        .collect()
}

#[tracing::instrument(name = "lookup_server_srv", level = "debug", skip(resolver))]
pub async fn lookup_server_srv<P: ConnectionProvider>(
    server_name: &str,
    resolver: &Resolver<P>,
) -> Option<SrvTarget> {
    for query in srv_query_names(server_name) {
        let lookup = timeout(
            Duration::from_secs(NETWORK_TIMEOUT_SECS),
            resolver.srv_lookup(query.as_str()),
        )
        .await;
        let records: Vec<SRV> = match lookup {
            Ok(Ok(records)) => records.iter().cloned().collect(),
            Ok(Err(e)) => {
                debug!(query = %query, error = %e, "SRV lookup failed");
                continue;
            }
            Err(_) => {
                debug!(query = %query, "SRV lookup timed out");
                continue;
            }
        };
        if let Some(target) = select_srv_record(&records, server_name) {
            return Some(target);
        }
    }
    None
}

/// Resolve a host to one address, preferring IPv4. IP literals are returned
/// as-is without touching the resolver.
#[tracing::instrument(name = "resolve_host_ip", level = "debug", skip(resolver))]
pub async fn resolve_host_ip<P: ConnectionProvider>(
    host: &str,
    resolver: &Resolver<P>,
) -> Option<IpAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Some(ip);
    }
    let lookup = timeout(
        Duration::from_secs(NETWORK_TIMEOUT_SECS),
        resolver.lookup_ip(format!("{}.", host.trim_end_matches('.'))),
    )
    .await;
    match lookup {
        Ok(Ok(ips)) => {
            let addrs: Vec<IpAddr> = ips.iter().collect();
            addrs
                .iter()
                .find(|ip| ip.is_ipv4())
                .or_else(|| addrs.first())
                .copied()
        }
        Ok(Err(e)) => {
            debug!(error = %e, "address lookup failed");
            None
        }
        Err(_) => {
            debug!("address lookup timed out");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_resolver::proto::rr::Name;
    use std::str::FromStr;

    fn srv(priority: u16, weight: u16, port: u16, target: &str) -> SRV {
        SRV::new(priority, weight, port, Name::from_str(target).unwrap())
    }

    #[test]
    fn absolutize() {
        assert_eq!(
            absolutize_srv_target("matrix", "example.org"),
            "matrix.example.org."
        );
        assert_eq!(
            absolutize_srv_target("synapse.example.net.", "example.org"),
            "synapse.example.net."
        );
    }

    #[test]
    fn lowest_priority_then_highest_weight() {
        let records = vec![
            srv(20, 100, 8448, "backup.example.org."),
            srv(10, 5, 8449, "light.example.org."),
            srv(10, 50, 8450, "heavy.example.org."),
        ];
        assert_eq!(
            select_srv_record(&records, "example.org"),
            Some(SrvTarget {
                host: "heavy.example.org".into(),
                port: 8450
            })
        );
    }

    #[test]
    fn matrix_fed_label_is_queried_first() {
        assert_eq!(
            srv_query_names("example.org"),
            vec![
                "_matrix-fed._tcp.example.org.".to_string(),
                "_matrix._tcp.example.org.".to_string(),
            ]
        );
        assert_eq!(
            srv_query_names("example.org.")[0],
            "_matrix-fed._tcp.example.org."
        );
    }

    #[test]
    fn root_target_means_unavailable() {
        let records = vec![srv(0, 0, 8448, ".")];
        assert_eq!(select_srv_record(&records, "example.org"), None);
        assert_eq!(select_srv_record(&[], "example.org"), None);
    }
}
