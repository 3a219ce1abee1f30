pub use sea_orm_migration::prelude::*;

mod m20260829_000001_create_payment_credentials;
mod m20260829_000002_create_endpoints;
mod m20260829_000003_create_role_permissions;
mod m20260829_000004_create_static_pages;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260829_000001_create_payment_credentials::Migration),
            Box::new(m20260829_000002_create_endpoints::Migration),
            Box::new(m20260829_000003_create_role_permissions::Migration),
            Box::new(m20260829_000004_create_static_pages::Migration),
        ]
    }
}
