//! Shared test utilities for `TroopTreasury`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::access::Principal,
    core::{fundraising, scout},
    entities,
    entities::{campout::CampoutStatus, user::Role},
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Installs a compact tracing subscriber so `RUST_LOG` works under
/// `cargo test`. Only the first call installs anything.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Sets up a test database plus an admin principal backed by a real user row.
/// Returns (db, admin) for tests exercising elevated operations.
pub async fn setup_with_admin() -> Result<(DatabaseConnection, Principal)> {
    let db = setup_test_db().await?;
    let admin = create_test_user(&db, "Avery Admin", Role::Admin).await?;
    let principal = Principal::new(admin.id, Role::Admin);
    Ok((db, principal))
}

/// Creates an active user with the given role.
pub async fn create_test_user(
    db: &DatabaseConnection,
    name: &str,
    role: Role,
) -> Result<entities::user::Model> {
    let user = entities::user::ActiveModel {
        name: Set(name.to_string()),
        role: Set(role),
        is_active: Set(true),
        ..Default::default()
    };
    Ok(user.insert(db).await?)
}

/// Creates an active scout with a zero IBA balance and no linked user.
pub async fn create_test_scout(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::scout::Model> {
    scout::create_scout(db, name.to_string(), None).await
}

/// Creates a scout and seeds their IBA balance directly.
/// Use this when the test cares about the balance, not how it got there.
pub async fn create_scout_with_balance(
    db: &DatabaseConnection,
    name: &str,
    balance: Decimal,
) -> Result<entities::scout::Model> {
    let created = create_test_scout(db, name).await?;
    scout::credit_iba(db, created.id, balance).await?;
    scout::get_scout_required(db, created.id).await
}

/// Links a parent user to a scout, authorizing the parent to act for them.
pub async fn link_parent_to_scout(
    db: &DatabaseConnection,
    parent_id: i64,
    scout_id: i64,
) -> Result<entities::parent_scout::Model> {
    let link = entities::parent_scout::ActiveModel {
        parent_id: Set(parent_id),
        scout_id: Set(scout_id),
    };
    Ok(link.insert(db).await?)
}

/// Attaches a user account to a scout record and returns the updated scout.
pub async fn link_scout_to_user(
    db: &DatabaseConnection,
    scout_id: i64,
    user_id: i64,
) -> Result<entities::scout::Model> {
    let existing = scout::get_scout_required(db, scout_id).await?;
    let mut active: entities::scout::ActiveModel = existing.into();
    active.user_id = Set(Some(user_id));
    Ok(active.update(db).await?)
}

/// Creates an OPEN campout with sensible defaults.
///
/// # Defaults
/// * `location`: "Camp Wildwood"
/// * dates: a June 2026 weekend
/// * `estimated_cost`: 100.00
pub async fn create_test_campout(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::campout::Model> {
    let model = entities::campout::ActiveModel {
        name: Set(name.to_string()),
        location: Set("Camp Wildwood".to_string()),
        start_date: Set("2026-06-12T00:00:00Z".parse().unwrap_or_default()),
        end_date: Set("2026-06-14T00:00:00Z".parse().unwrap_or_default()),
        estimated_cost: Set(Decimal::new(10000, 2)),
        status: Set(CampoutStatus::Open),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Creates a campout already in the CLOSED state, for exercising the
/// no-activity-after-close guards.
pub async fn create_closed_campout(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::campout::Model> {
    let created = create_test_campout(db, name).await?;
    let mut active: entities::campout::ActiveModel = created.into();
    active.status = Set(CampoutStatus::Closed);
    Ok(active.update(db).await?)
}

/// Creates an ACTIVE fundraising campaign with the given IBA percentage.
pub async fn create_test_campaign(
    db: &DatabaseConnection,
    principal: &Principal,
    iba_percentage: i32,
) -> Result<entities::fundraising_campaign::Model> {
    fundraising::create_campaign(
        db,
        principal,
        fundraising::NewCampaign {
            name: format!("Test Campaign ({iba_percentage}%)"),
            start_date: "2026-09-01T00:00:00Z".parse().unwrap_or_default(),
            end_date: None,
            goal: Decimal::new(100_000, 2),
            iba_percentage,
        },
    )
    .await
}
