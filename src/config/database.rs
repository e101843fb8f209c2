//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the database schema always matches the Rust structs without hand-written SQL.
//! Creation uses `IF NOT EXISTS`, which makes [`create_tables`] safe to run on every start.

use crate::config::AppConfig;
use crate::entities::{
    BillingPeriod, Building, Contractor, Document, ExpenseItem, Key, KeyIssue, Lease,
    RentAdjustment, Tenant, Ticket, Unit, Vacancy,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/immo.sqlite?mode=rwc";

/// Resolves the database URL.
///
/// `DATABASE_URL` from the environment wins over `database_url` in config.toml;
/// without either, a local `SQLite` file under `data/` is used.
#[must_use]
pub fn get_database_url(config: &AppConfig) -> String {
    std::env::var("DATABASE_URL")
        .ok()
        .or_else(|| config.database_url.clone())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    Database::connect(database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables, parents before children so foreign keys resolve.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Building).await?;
    create_table(db, &schema, Unit).await?;
    create_table(db, &schema, Tenant).await?;
    create_table(db, &schema, Lease).await?;
    create_table(db, &schema, Vacancy).await?;
    create_table(db, &schema, BillingPeriod).await?;
    create_table(db, &schema, ExpenseItem).await?;
    create_table(db, &schema, Contractor).await?;
    create_table(db, &schema, Ticket).await?;
    create_table(db, &schema, RentAdjustment).await?;
    create_table(db, &schema, Document).await?;
    create_table(db, &schema, Key).await?;
    create_table(db, &schema, KeyIssue).await?;

    Ok(())
}

/// Connects and makes sure the schema exists.
pub async fn init_db(database_url: &str) -> Result<DatabaseConnection> {
    let db = create_connection(database_url).await?;
    create_tables(&db).await?;
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{BuildingModel, LeaseModel, TicketModel, UnitModel};
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        let _: Vec<BuildingModel> = Building::find().limit(1).all(&db).await?;
        let _: Vec<UnitModel> = Unit::find().limit(1).all(&db).await?;
        let _: Vec<LeaseModel> = Lease::find().limit(1).all(&db).await?;
        let _: Vec<TicketModel> = Ticket::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[test]
    fn test_database_url_from_config() {
        let config = AppConfig {
            database_url: Some("sqlite::memory:".to_string()),
            ..AppConfig::default()
        };
        // DATABASE_URL may be set by the developer's .env; only check the fallback chain
        if std::env::var("DATABASE_URL").is_err() {
            assert_eq!(get_database_url(&config), "sqlite::memory:");
            assert_eq!(get_database_url(&AppConfig::default()), DEFAULT_DATABASE_URL);
        }
    }
}
