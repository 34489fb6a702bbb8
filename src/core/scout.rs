//! Scout roster and Individual Budget Account balance access.
//!
//! The two balance mutators here are the only code allowed to write
//! `iba_balance`, and both are single SQL statements so concurrent requests
//! cannot interleave a read-modify-write. Callers must invoke them inside the
//! same database transaction as the ledger entry that justifies the change.

use crate::{
    entities::{Scout, scout, scout::ScoutStatus},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};

/// Creates a scout roster entry with a zero IBA balance.
pub async fn create_scout(
    db: &DatabaseConnection,
    name: String,
    user_id: Option<i64>,
) -> Result<scout::Model> {
    if name.trim().is_empty() {
        return Err(Error::validation("name", "Scout name cannot be empty"));
    }

    let scout = scout::ActiveModel {
        name: Set(name.trim().to_string()),
        user_id: Set(user_id),
        status: Set(ScoutStatus::Active),
        iba_balance: Set(Decimal::ZERO),
        ..Default::default()
    };

    Ok(scout.insert(db).await?)
}

/// Finds a scout by its unique ID.
pub async fn get_scout_by_id(
    db: &impl ConnectionTrait,
    scout_id: i64,
) -> Result<Option<scout::Model>> {
    Scout::find_by_id(scout_id).one(db).await.map_err(Into::into)
}

/// Finds a scout by ID, returning `NotFound` if it does not exist.
pub async fn get_scout_required(db: &impl ConnectionTrait, scout_id: i64) -> Result<scout::Model> {
    get_scout_by_id(db, scout_id)
        .await?
        .ok_or(Error::NotFound { what: "Scout" })
}

/// Retrieves all active scouts, ordered alphabetically by name.
pub async fn get_active_scouts(db: &DatabaseConnection) -> Result<Vec<scout::Model>> {
    Scout::find()
        .filter(scout::Column::Status.eq(ScoutStatus::Active))
        .order_by_asc(scout::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Marks a scout inactive. The record and its ledger history are retained;
/// scouts referenced by transactions are never hard-deleted.
pub async fn deactivate_scout(db: &DatabaseConnection, scout_id: i64) -> Result<scout::Model> {
    let scout = get_scout_required(db, scout_id).await?;
    let mut active: scout::ActiveModel = scout.into();
    active.status = Set(ScoutStatus::Inactive);
    Ok(active.update(db).await?)
}

/// Atomically adds `amount` to a scout's IBA balance.
///
/// Uses a single `UPDATE scouts SET iba_balance = iba_balance + ?` statement
/// rather than read-modify-write, so concurrent credits cannot lose updates.
/// Must be called inside the same transaction as the ledger entry recording
/// the credit.
pub async fn credit_iba<C>(db: &C, scout_id: i64, amount: Decimal) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Scout::update_many()
        .col_expr(
            scout::Column::IbaBalance,
            Expr::col(scout::Column::IbaBalance).add(amount),
        )
        .filter(scout::Column::Id.eq(scout_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::NotFound { what: "Scout" });
    }
    Ok(())
}

/// Atomically subtracts `amount` from a scout's IBA balance, failing if the
/// balance does not cover it.
///
/// The sufficiency check and the decrement are one conditional UPDATE
/// (`... WHERE id = ? AND iba_balance >= ?`), so two concurrent collections
/// can never both pass the check against a stale balance. Must be called
/// inside the same transaction as the ledger entry recording the debit.
pub async fn debit_iba_checked<C>(db: &C, scout_id: i64, amount: Decimal) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Scout::update_many()
        .col_expr(
            scout::Column::IbaBalance,
            Expr::col(scout::Column::IbaBalance).sub(amount),
        )
        .filter(scout::Column::Id.eq(scout_id))
        .filter(scout::Column::IbaBalance.gte(amount))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        // Zero rows means either no such scout or not enough funds; re-read
        // to tell the two apart.
        let scout = Scout::find_by_id(scout_id)
            .one(db)
            .await?
            .ok_or(Error::NotFound { what: "Scout" })?;
        return Err(Error::InsufficientFunds {
            account: scout.name,
            current: scout.iba_balance,
            required: amount,
        });
    }
    Ok(())
}
