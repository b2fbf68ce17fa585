//! Tests for candidate sources and the geo export file.

use federation_scanner::export::write_address_points;
use federation_scanner::geo::GeoPoint;
use federation_scanner::source::{
    CandidateSet, load_hostnames_file, load_shodan_entries, load_shodan_file,
};
use std::fs;
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "federation-scanner-{}-{}",
        std::process::id(),
        name
    ))
}

#[test]
fn test_missing_sources_are_none() {
    let path = temp_path("absent.txt");
    let _ = fs::remove_file(&path);
    assert!(load_hostnames_file(&path).unwrap().is_none());
    assert!(load_shodan_file(&path).unwrap().is_none());
}

#[test]
fn test_hostnames_file_trims_and_skips_blanks() {
    let path = temp_path("hostnames.txt");
    fs::write(&path, "matrix.org\n\n  mozilla.org  \r\nkde.org\n").unwrap();

    let hostnames = load_hostnames_file(&path).unwrap().unwrap();

    assert_eq!(hostnames, vec!["matrix.org", "mozilla.org", "kde.org"]);
    let _ = fs::remove_file(&path);
}

#[test]
fn test_sources_merge_without_duplicates() {
    let hosts = temp_path("merge-hosts.txt");
    let shodan = temp_path("merge-shodan.json");
    fs::write(&hosts, "matrix.org\n192.0.2.1\n").unwrap();
    fs::write(
        &shodan,
        concat!(
            r#"{"ip_str": "192.0.2.1", "transport": "tcp"}"#,
            "\n",
            r#"{"ip_str": "192.0.2.2", "transport": "tcp"}"#,
            "\n",
            r#"{"ip_str": "192.0.2.3", "transport": "udp"}"#,
            "\n"
        ),
    )
    .unwrap();

    let mut candidates = CandidateSet::new();
    assert_eq!(candidates.extend(load_hostnames_file(&hosts).unwrap().unwrap()), 2);
    assert_eq!(candidates.extend(load_shodan_file(&shodan).unwrap().unwrap()), 1);
    assert_eq!(
        candidates.into_iter().collect::<Vec<_>>(),
        vec!["matrix.org", "192.0.2.1", "192.0.2.2"]
    );

    let entries = load_shodan_entries(&shodan).unwrap().unwrap();
    assert_eq!(entries.len(), 2);

    let _ = fs::remove_file(&hosts);
    let _ = fs::remove_file(&shodan);
}

#[test]
fn test_write_address_points_file() {
    let path = temp_path("web").join("matrix_servers.js");
    let points = vec![GeoPoint {
        latitude: 52.3702,
        longitude: 4.8952,
        ip: "192.0.2.1".into(),
    }];

    write_address_points(&path, &points).unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "var addressPoints = [\n[52.3702, 4.8952, \"192.0.2.1\"],\n];\n"
    );
    let _ = fs::remove_dir_all(path.parent().unwrap());
}
