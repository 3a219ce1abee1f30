//! Migration: Create role_permissions table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RolePermissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RolePermissions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RolePermissions::RoleName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RolePermissions::EndpointPath)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RolePermissions::Method).string().not_null())
                    .col(
                        ColumnDef::new(RolePermissions::CreatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_role_permissions_unique")
                    .table(RolePermissions::Table)
                    .col(RolePermissions::RoleName)
                    .col(RolePermissions::EndpointPath)
                    .col(RolePermissions::Method)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(RolePermissions::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
pub enum RolePermissions {
    Table,
    Id,
    #[iden = "role_name"]
    RoleName,
    #[iden = "endpoint_path"]
    EndpointPath,
    Method,
    #[iden = "created_at"]
    CreatedAt,
}
