use config::Config;
use federation_scanner::config::{AppConfig, ConfigError, load_config};
use std::fs;
use std::path::PathBuf;

fn from_yaml(yaml: &str) -> Result<AppConfig, config::ConfigError> {
    Config::builder()
        .add_source(config::File::from_str(yaml, config::FileFormat::Yaml))
        .build()?
        .try_deserialize()
}

#[test]
fn test_full_config_deserialization() {
    let yaml_content = r#"
data_directory: "/var/lib/scanner"
files:
  hostnames: "hosts.txt"
  shodan: "export.json"
  database: "servers.sqlite"
  web_data: "points.js"
settings:
  hs_workers: 50
  shodan_workers: 25
  debug: true
destinations:
  enabled: true
  database_url: "postgres://synapse@localhost/synapse"
  limit: 1000
"#;

    let config = from_yaml(yaml_content).expect("Failed to deserialize config");

    assert_eq!(config.settings.hs_workers, 50);
    assert_eq!(config.settings.shodan_workers, 25);
    assert!(config.settings.debug);
    assert_eq!(config.destinations.limit, Some(1000));
    assert_eq!(
        config.hostnames_path(),
        PathBuf::from("/var/lib/scanner/hosts.txt")
    );
    assert_eq!(
        config.web_data_path(),
        PathBuf::from("/var/lib/scanner/points.js")
    );
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_config_uses_defaults() {
    let config = from_yaml("settings:\n  hs_workers: 3\n").expect("Failed to deserialize config");

    assert_eq!(config.settings.hs_workers, 3);
    assert_eq!(config.settings.shodan_workers, 10);
    assert_eq!(config.data_directory, PathBuf::from("data"));
    assert_eq!(config.files.shodan, "shodan-export.json");
    assert!(!config.destinations.enabled);
}

#[test]
fn test_non_integer_workers_rejected() {
    assert!(from_yaml("settings:\n  hs_workers: lots\n").is_err());
}

#[test]
fn test_enabled_destinations_without_url_rejected() {
    let config = from_yaml("destinations:\n  enabled: true\n").expect("Failed to deserialize config");
    assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
}

#[test]
fn test_load_config_from_file() {
    let path = std::env::temp_dir().join(format!(
        "federation-scanner-config-{}.yaml",
        std::process::id()
    ));
    fs::write(&path, "data_directory: \"scan-data\"\nsettings:\n  hs_workers: 7\n").unwrap();

    let config = load_config(&path).expect("Failed to load config");
    assert_eq!(config.settings.hs_workers, 7);
    assert_eq!(
        config.database_path(),
        PathBuf::from("scan-data").join("delegated.sqlite")
    );


    fs::write(&path, "settings:\n  shodan_workers: \"ten\"\n").unwrap();
    assert!(matches!(load_config(&path), Err(ConfigError::Build(_))));

    let _ = fs::remove_file(&path);
}

#[test]
fn test_zero_workers_can_be_overridden_before_validation() {
    let path = std::env::temp_dir().join(format!(
        "federation-scanner-config-zero-{}.yaml",
        std::process::id()
    ));
    fs::write(&path, "settings:\n  hs_workers: 0\n").unwrap();

    let mut config = load_config(&path).expect("loading does not validate");
    assert_eq!(config.settings.hs_workers, 0);
    assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

    config.settings.hs_workers = 20;
    assert!(config.validate().is_ok());

    let _ = fs::remove_file(&path);
}

#[test]
fn test_missing_config_file_falls_back_to_defaults() {
    let path = std::env::temp_dir().join("federation-scanner-config-does-not-exist.yaml");
    let config = load_config(&path).expect("defaults");
    assert_eq!(config.settings.hs_workers, 10);
}
