use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DelegatedData::Table)
                    .if_not_exists()
                    .col(pk_auto(DelegatedData::Id))
                    .col(string(DelegatedData::Hostname).not_null().to_owned())
                    .col(string(DelegatedData::DelegatedHostname).not_null().to_owned())
                    .col(string(DelegatedData::DelegatedIp).not_null().to_owned())
                    .col(integer(DelegatedData::DelegatedPort).not_null().to_owned())
                    .col(string(DelegatedData::ServerLookupType).not_null().to_owned())
                    .col(string(DelegatedData::Name).not_null().to_owned())
                    .col(string(DelegatedData::Version).not_null().to_owned())
                    .col(
                        boolean(DelegatedData::ValidSsl)
                            .default(false)
                            .not_null()
                            .to_owned(),
                    )
                    .to_owned(),
            )
            .await?;
        // One row per hostname; the store replaces on conflict.
        manager
            .create_index(
                Index::create()
                    .name("idx_delegated_data_hostname_unique")
                    .table(DelegatedData::Table)
                    .col(DelegatedData::Hostname)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_delegated_data_ip_lookup")
                    .table(DelegatedData::Table)
                    .col(DelegatedData::DelegatedIp)
                    .col(DelegatedData::ServerLookupType)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_delegated_data_ip_lookup")
                    .table(DelegatedData::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_delegated_data_hostname_unique")
                    .table(DelegatedData::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(DelegatedData::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum DelegatedData {
    Table,
    Id,
    Hostname,
    DelegatedHostname,
    DelegatedIp,
    DelegatedPort,
    ServerLookupType,
    Name,
    Version,
    ValidSsl,
}
