//! Persistence of resolved servers in `delegated_data`.
//!
//! The store is the only writer. Each batch operation runs in its own
//! transaction and is expected to be called from a single task after the
//! scan has drained.

use crate::entity::delegated_data;
use crate::error::StoreError;
use crate::federation::LookupMethod;
use crate::record::ServerRecord;
use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

#[derive(Clone, Debug)]
pub struct RecordStore {
    db: DatabaseConnection,
}

impl RecordStore {
    /// Open (creating if needed) a SQLite database file and bring its schema
    /// up to date.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        Self::connect(&format!("sqlite://{}?mode=rwc", path.display())).await
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let db = Database::connect(database_url).await?;
        Migrator::up(&db, None)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        Ok(Self { db })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Write every record, replacing any stored record with the same
    /// hostname. Returns the number of rows written.
    #[tracing::instrument(name = "upsert_all", skip_all, fields(records = records.len()))]
    pub async fn upsert_all(&self, records: &[ServerRecord]) -> Result<usize, StoreError> {
        let txn = self.db.begin().await?;
        let mut seen = HashSet::new();
        let mut written = 0;
        for record in records {
            if !seen.insert(record) {
                continue;
            }
            let hostname = record.hostname.to_lowercase();
            let replaced = delegated_data::Entity::delete_many()
                .filter(delegated_data::Column::Hostname.eq(hostname.as_str()))
                .exec(&txn)
                .await?
                .rows_affected;
            if replaced > 0 {
                debug!(hostname = %hostname, "replacing stored record");
            }
            delegated_data::ActiveModel {
                id: ActiveValue::NotSet,
                hostname: ActiveValue::Set(hostname),
                delegated_hostname: ActiveValue::Set(record.delegated_hostname.clone()),
                delegated_ip: ActiveValue::Set(record.delegated_ip.clone()),
                delegated_port: ActiveValue::Set(i32::from(record.delegated_port)),
                server_lookup_type: ActiveValue::Set(record.lookup_method.as_str().to_string()),
                name: ActiveValue::Set(record.server_name.clone()),
                version: ActiveValue::Set(record.server_version.clone()),
                valid_ssl: ActiveValue::Set(record.tls_valid),
            }
            .insert(&txn)
            .await?;
            written += 1;
        }
        txn.commit().await?;
        info!(written, "stored resolved servers");
        Ok(written)
    }

    /// Drop records keyed by a bare IP when the same address is also known
    /// under a name resolved another way. Must run after a batch's upserts.
    #[tracing::instrument(name = "purge_ip_duplicates", skip_all)]
    pub async fn purge_ip_duplicates(&self) -> Result<u64, StoreError> {
        let ip_method = LookupMethod::Ip.as_str();
        let txn = self.db.begin().await?;
        let ip_rows = delegated_data::Entity::find()
            .filter(delegated_data::Column::ServerLookupType.eq(ip_method))
            .all(&txn)
            .await?;

        let mut removed = 0;
        for row in ip_rows {
            let named = delegated_data::Entity::find()
                .filter(delegated_data::Column::DelegatedIp.eq(row.delegated_ip.as_str()))
                .filter(delegated_data::Column::ServerLookupType.ne(ip_method))
                .count(&txn)
                .await?;
            if named > 0 {
                debug!(hostname = %row.hostname, ip = %row.delegated_ip, "purging IP duplicate");
                removed += delegated_data::Entity::delete_by_id(row.id)
                    .exec(&txn)
                    .await?
                    .rows_affected;
            }
        }
        txn.commit().await?;
        info!(removed, "purged IP-keyed duplicates");
        Ok(removed)
    }

    pub async fn all_records(&self) -> Result<Vec<ServerRecord>, StoreError> {
        delegated_data::Entity::find()
            .order_by_asc(delegated_data::Column::Hostname)
            .all(&self.db)
            .await?
            .into_iter()
            .map(ServerRecord::try_from)
            .collect()
    }

    pub async fn get(&self, hostname: &str) -> Result<Option<ServerRecord>, StoreError> {
        delegated_data::Entity::find()
            .filter(delegated_data::Column::Hostname.eq(hostname.to_lowercase()))
            .one(&self.db)
            .await?
            .map(ServerRecord::try_from)
            .transpose()
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        Ok(delegated_data::Entity::find().count(&self.db).await?)
    }
}

impl TryFrom<delegated_data::Model> for ServerRecord {
    type Error = StoreError;

    fn try_from(model: delegated_data::Model) -> Result<Self, Self::Error> {
        let delegated_port = u16::try_from(model.delegated_port).map_err(|_| {
            StoreError::InvalidRow(format!(
                "delegated_port {} out of range for {}",
                model.delegated_port, model.hostname
            ))
        })?;
        let lookup_method = model
            .server_lookup_type
            .parse::<LookupMethod>()
            .map_err(StoreError::InvalidRow)?;
        Ok(ServerRecord {
            hostname: model.hostname,
            delegated_hostname: model.delegated_hostname,
            delegated_ip: model.delegated_ip,
            delegated_port,
            lookup_method,
            server_name: model.name,
            server_version: model.version,
            tls_valid: model.valid_ssl,
        })
    }
}
