use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250301_000001_create_delegated_data::DelegatedData;

#[derive(DeriveMigrationName)]
pub struct Migration;

// Room directory tables. Nothing writes them yet; they mirror the layout the
// public room crawl will fill.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PublicRooms::Table)
                    .if_not_exists()
                    .col(pk_auto(PublicRooms::Id))
                    .col(integer_null(PublicRooms::HostId))
                    .col(string_null(PublicRooms::CanonicalAlias))
                    .col(string_null(PublicRooms::Name))
                    .col(integer_null(PublicRooms::NumJoinedMembers))
                    .col(string_null(PublicRooms::RoomId))
                    .col(string_null(PublicRooms::Topic))
                    .col(boolean_null(PublicRooms::WorldReadable))
                    .col(boolean_null(PublicRooms::GuestCanJoin))
                    .col(string_null(PublicRooms::AvatarUrl))
                    .col(boolean_null(PublicRooms::MFederate))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_public_rooms_host")
                            .from(PublicRooms::Table, PublicRooms::HostId)
                            .to(DelegatedData::Table, DelegatedData::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                Table::create()
                    .table(Aliases::Table)
                    .if_not_exists()
                    .col(pk_auto(Aliases::Id))
                    .col(integer_null(Aliases::RoomId))
                    .col(string_null(Aliases::Alias))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_aliases_room")
                            .from(Aliases::Table, Aliases::RoomId)
                            .to(PublicRooms::Table, PublicRooms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Aliases::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PublicRooms::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PublicRooms {
    Table,
    Id,
    HostId,
    CanonicalAlias,
    Name,
    NumJoinedMembers,
    RoomId,
    Topic,
    WorldReadable,
    GuestCanJoin,
    AvatarUrl,
    #[iden = "m_federate"]
    MFederate,
}

#[derive(Iden)]
enum Aliases {
    Table,
    Id,
    RoomId,
    Alias,
}
