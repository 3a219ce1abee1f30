//! Migration: Create payment_credentials table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PaymentCredentials::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentCredentials::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PaymentCredentials::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(PaymentCredentials::ApiKey)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentCredentials::SecretKey)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentCredentials::BaseUrl)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentCredentials::Installment)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PaymentCredentials::InstallmentOptions)
                            .json()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentCredentials::IsTestMode)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(PaymentCredentials::Currency)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentCredentials::IsActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PaymentCredentials::CreatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentCredentials::UpdatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payment_credentials_is_active")
                    .table(PaymentCredentials::Table)
                    .col(PaymentCredentials::IsActive)
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
                    .table(PaymentCredentials::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
pub enum PaymentCredentials {
    Table,
    Id,
    Name,
    #[iden = "api_key"]
    ApiKey,
    #[iden = "secret_key"]
    SecretKey,
    #[iden = "base_url"]
    BaseUrl,
    Installment,
    #[iden = "installment_options"]
    InstallmentOptions,
    #[iden = "is_test_mode"]
    IsTestMode,
    Currency,
    #[iden = "is_active"]
    IsActive,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}
