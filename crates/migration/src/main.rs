use config::Config;
use sea_orm_migration::prelude::*;
use std::env;
use std::path::PathBuf;

/// Build a SQLite URL from the scanner's `config.yaml` (`data_directory` +
/// `files.database`), with the scanner's defaults for missing keys.
fn database_url_from_config() -> Option<String> {
    let settings = Config::builder()
        .add_source(config::File::with_name("config.yaml").required(false))
        .build()
        .ok()?;
    let data_directory = settings
        .get_string("data_directory")
        .unwrap_or_else(|_| "data".to_string());
    let database = settings
        .get_string("files.database")
        .unwrap_or_else(|_| "delegated.sqlite".to_string());
    let path = PathBuf::from(data_directory).join(database);
    Some(format!("sqlite://{}?mode=rwc", path.display()))
}

#[tokio::main]
async fn main() {
    // DATABASE_URL from the environment wins
    if env::var("DATABASE_URL").is_err() {
        if let Some(url) = database_url_from_config() {
            env::set_var("DATABASE_URL", url);
        }
    }
    cli::run_cli(migration::Migrator).await;
}
