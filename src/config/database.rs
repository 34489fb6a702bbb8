//! Database configuration module for `TroopTreasury`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! It provides functions for establishing database connections and creating all necessary
//! tables based on the entity definitions. The module uses `SeaORM`'s
//! `Schema::create_table_from_entity` method to generate SQL statements from the entity
//! models, ensuring that the database schema matches the Rust struct definitions without
//! requiring manual SQL.

use crate::entities::{
    AdultExpense, Campout, CampoutAdult, CampoutScout, FundraisingCampaign, ParentScout, Scout,
    Transaction, User,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Gets the database URL from environment variable or returns default `SQLite` path.
///
/// This function looks for `DATABASE_URL` in the environment and falls back to
/// a default local `SQLite` file if not found.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://data/troop_treasury.sqlite".to_string())
}

/// Establishes a connection to the `SQLite` database using the `DATABASE_URL` environment variable.
///
/// Falls back to a default local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(get_database_url()).await.map_err(Into::into)
}

/// Creates all necessary database tables using `SeaORM`'s schema generation from entity definitions.
///
/// This function uses the `DeriveEntityModel` macros to generate proper SQL statements
/// for table creation, ensuring the database schema matches the Rust struct definitions.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let user_table = schema.create_table_from_entity(User);
    let scout_table = schema.create_table_from_entity(Scout);
    let campout_table = schema.create_table_from_entity(Campout);
    let campout_scout_table = schema.create_table_from_entity(CampoutScout);
    let campout_adult_table = schema.create_table_from_entity(CampoutAdult);
    let parent_scout_table = schema.create_table_from_entity(ParentScout);
    let transaction_table = schema.create_table_from_entity(Transaction);
    let adult_expense_table = schema.create_table_from_entity(AdultExpense);
    let campaign_table = schema.create_table_from_entity(FundraisingCampaign);

    db.execute(builder.build(&user_table)).await?;
    db.execute(builder.build(&scout_table)).await?;
    db.execute(builder.build(&campout_table)).await?;
    db.execute(builder.build(&campout_scout_table)).await?;
    db.execute(builder.build(&campout_adult_table)).await?;
    db.execute(builder.build(&parent_scout_table)).await?;
    db.execute(builder.build(&transaction_table)).await?;
    db.execute(builder.build(&adult_expense_table)).await?;
    db.execute(builder.build(&campaign_table)).await?;

    Ok(())
}
