//! Migration: Create endpoints table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Endpoints::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Endpoints::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Endpoints::Path).string().not_null())
                    .col(ColumnDef::new(Endpoints::Method).string().not_null())
                    .col(ColumnDef::new(Endpoints::Description).string().null())
                    .col(ColumnDef::new(Endpoints::CreatedAt).date_time().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_endpoints_path_method")
                    .table(Endpoints::Table)
                    .col(Endpoints::Path)
                    .col(Endpoints::Method)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Endpoints::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Endpoints {
    Table,
    Id,
    Path,
    Method,
    Description,
    #[iden = "created_at"]
    CreatedAt,
}
