//! Campout lifecycle, rosters, and expense capture.
//!
//! A campout moves OPEN → READY_FOR_PAYMENT → CLOSED with no back-transitions
//! (the transitions themselves live in [`crate::core::settlement`]). Every
//! mutation here re-reads the campout and rejects CLOSED ones, so a settled
//! event can never accumulate new costs or roster changes.

use crate::{
    core::{
        access::{self, Action, Principal},
        transaction as tx_ops,
    },
    entities::{
        AdultExpense, Campout, CampoutAdult, CampoutScout, adult_expense, campout,
        campout::CampoutStatus,
        campout_adult,
        campout_adult::CampoutAdultRole,
        campout_scout,
        transaction::{TransactionStatus, TransactionType},
        user::Role,
    },
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Input for creating a campout.
#[derive(Debug, Clone)]
pub struct NewCampout {
    /// Event name
    pub name: String,
    /// Where the campout takes place
    pub location: String,
    /// First day of the event
    pub start_date: DateTimeUtc,
    /// Last day of the event
    pub end_date: DateTimeUtc,
    /// Pre-event cost estimate in dollars
    pub estimated_cost: Decimal,
}

/// Creates a campout in the OPEN state.
pub async fn create_campout(
    db: &DatabaseConnection,
    principal: &Principal,
    new: NewCampout,
) -> Result<campout::Model> {
    access::ensure(principal, Action::ManageRoster)?;

    if new.name.trim().is_empty() {
        return Err(Error::validation("name", "Campout name cannot be empty"));
    }
    if new.end_date < new.start_date {
        return Err(Error::validation(
            "end_date",
            "End date cannot be before start date",
        ));
    }
    if new.estimated_cost < Decimal::ZERO {
        return Err(Error::validation(
            "estimated_cost",
            "Estimated cost cannot be negative",
        ));
    }

    let model = campout::ActiveModel {
        name: Set(new.name.trim().to_string()),
        location: Set(new.location),
        start_date: Set(new.start_date),
        end_date: Set(new.end_date),
        estimated_cost: Set(new.estimated_cost),
        status: Set(CampoutStatus::Open),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(campout_id = model.id, name = %model.name, "campout created");
    Ok(model)
}

/// Finds a campout by its unique ID.
pub async fn get_campout_by_id(
    db: &impl ConnectionTrait,
    campout_id: i64,
) -> Result<Option<campout::Model>> {
    Campout::find_by_id(campout_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a campout by ID, returning `NotFound` if it does not exist.
pub async fn get_campout_required(
    db: &impl ConnectionTrait,
    campout_id: i64,
) -> Result<campout::Model> {
    get_campout_by_id(db, campout_id)
        .await?
        .ok_or(Error::NotFound { what: "Campout" })
}

/// Retrieves all campouts, most recent first.
pub async fn get_campouts(db: &DatabaseConnection) -> Result<Vec<campout::Model>> {
    Campout::find()
        .order_by_desc(campout::Column::StartDate)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Rejects any new ledger or roster activity against a CLOSED campout.
pub fn ensure_accepts_entries(campout: &campout::Model) -> Result<()> {
    if campout.status == CampoutStatus::Closed {
        return Err(Error::invalid_state(
            "Campout is closed to new activity",
        ));
    }
    Ok(())
}

/// Rejects expense mutations once the cost list is finalized. Payments keep
/// flowing in READY_FOR_PAYMENT; the expense side is frozen so the per-person
/// share participants were quoted cannot shift under them.
pub fn ensure_expenses_open(campout: &campout::Model) -> Result<()> {
    if campout.status != CampoutStatus::Open {
        return Err(Error::invalid_state(
            "Campout costs are finalized; expenses are locked",
        ));
    }
    Ok(())
}

/// Registers a scout for a campout.
///
/// Elevated roles and leaders may register any scout; a parent may register
/// only scouts they are linked to. Duplicate registrations are rejected with
/// a conflict rather than silently ignored.
pub async fn register_scout(
    db: &DatabaseConnection,
    principal: &Principal,
    campout_id: i64,
    scout_id: i64,
) -> Result<campout_scout::Model> {
    if principal.role == Role::Parent {
        access::ensure_linked_to_scout(db, principal, scout_id).await?;
    } else {
        access::ensure(principal, Action::ManageRoster)?;
    }

    let campout = get_campout_required(db, campout_id).await?;
    ensure_accepts_entries(&campout)?;
    crate::core::scout::get_scout_required(db, scout_id).await?;

    let existing = CampoutScout::find_by_id((campout_id, scout_id)).one(db).await?;
    if existing.is_some() {
        return Err(Error::Conflict(
            "Scout is already registered for this campout".to_string(),
        ));
    }

    let registration = campout_scout::ActiveModel {
        campout_id: Set(campout_id),
        scout_id: Set(scout_id),
    }
    .insert(db)
    .await?;

    info!(campout_id, scout_id, "scout registered");
    Ok(registration)
}

/// Removes a scout's registration from a campout.
pub async fn remove_scout(
    db: &DatabaseConnection,
    principal: &Principal,
    campout_id: i64,
    scout_id: i64,
) -> Result<()> {
    access::ensure(principal, Action::ManageRoster)?;
    let campout = get_campout_required(db, campout_id).await?;
    ensure_accepts_entries(&campout)?;

    let result = CampoutScout::delete_many()
        .filter(campout_scout::Column::CampoutId.eq(campout_id))
        .filter(campout_scout::Column::ScoutId.eq(scout_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            what: "Registration",
        });
    }
    Ok(())
}

/// Assigns a role to an adult for a campout. Idempotent: assigning a role the
/// adult already holds is a no-op. An adult can hold both roles at once.
pub async fn assign_adult(
    db: &DatabaseConnection,
    principal: &Principal,
    campout_id: i64,
    adult_id: i64,
    role: CampoutAdultRole,
) -> Result<campout_adult::Model> {
    access::ensure(principal, Action::ManageRoster)?;
    let campout = get_campout_required(db, campout_id).await?;
    ensure_accepts_entries(&campout)?;

    upsert_adult_role(db, campout_id, adult_id, role).await
}

/// Inserts the role row unless it already exists.
async fn upsert_adult_role<C>(
    db: &C,
    campout_id: i64,
    adult_id: i64,
    role: CampoutAdultRole,
) -> Result<campout_adult::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = CampoutAdult::find_by_id((campout_id, adult_id, role))
        .one(db)
        .await?
    {
        return Ok(existing);
    }

    campout_adult::ActiveModel {
        campout_id: Set(campout_id),
        adult_id: Set(adult_id),
        role: Set(role),
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Moves an adult from one role to another in a single atomic unit, so the
/// adult is never role-less partway through.
pub async fn switch_adult_role(
    db: &DatabaseConnection,
    principal: &Principal,
    campout_id: i64,
    adult_id: i64,
    from: CampoutAdultRole,
    to: CampoutAdultRole,
) -> Result<campout_adult::Model> {
    access::ensure(principal, Action::ManageRoster)?;
    let campout = get_campout_required(db, campout_id).await?;
    ensure_accepts_entries(&campout)?;

    let txn = db.begin().await?;

    let result = CampoutAdult::delete_many()
        .filter(campout_adult::Column::CampoutId.eq(campout_id))
        .filter(campout_adult::Column::AdultId.eq(adult_id))
        .filter(campout_adult::Column::Role.eq(from))
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound { what: "Adult role" });
    }

    let new_role = upsert_adult_role(&txn, campout_id, adult_id, to).await?;
    txn.commit().await?;
    Ok(new_role)
}

/// Removes all of an adult's roles from a campout.
pub async fn remove_adult(
    db: &DatabaseConnection,
    principal: &Principal,
    campout_id: i64,
    adult_id: i64,
) -> Result<()> {
    access::ensure(principal, Action::ManageRoster)?;
    let campout = get_campout_required(db, campout_id).await?;
    ensure_accepts_entries(&campout)?;

    let result = CampoutAdult::delete_many()
        .filter(campout_adult::Column::CampoutId.eq(campout_id))
        .filter(campout_adult::Column::AdultId.eq(adult_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound { what: "Adult role" });
    }
    Ok(())
}

/// Retrieves the scout registrations for a campout.
pub async fn get_registered_scouts(
    db: &impl ConnectionTrait,
    campout_id: i64,
) -> Result<Vec<campout_scout::Model>> {
    CampoutScout::find()
        .filter(campout_scout::Column::CampoutId.eq(campout_id))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the adult role rows for a campout.
pub async fn get_adult_roles(
    db: &impl ConnectionTrait,
    campout_id: i64,
) -> Result<Vec<campout_adult::Model>> {
    CampoutAdult::find()
        .filter(campout_adult::Column::CampoutId.eq(campout_id))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Records a troop expense paid directly from troop funds against a campout.
/// No reimbursement is owed, so the entry goes straight into the ledger as
/// an approved expense.
pub async fn log_troop_expense(
    db: &DatabaseConnection,
    principal: &Principal,
    campout_id: i64,
    amount: Decimal,
    description: String,
) -> Result<crate::entities::transaction::Model> {
    access::ensure(principal, Action::LogTroopExpense)?;
    tx_ops::validate_amount(amount)?;
    if description.trim().is_empty() {
        return Err(Error::validation("description", "Description is required"));
    }

    let campout = get_campout_required(db, campout_id).await?;
    ensure_accepts_entries(&campout)?;
    ensure_expenses_open(&campout)?;

    let mut entry = tx_ops::base_entry(principal, amount, TransactionType::Expense, description);
    entry.status = Set(TransactionStatus::Approved);
    entry.approved_by = Set(Some(principal.user_id));
    entry.campout_id = Set(Some(campout_id));
    Ok(entry.insert(db).await?)
}

/// Logs an out-of-pocket expense an adult paid for a campout.
///
/// Logging an expense makes the adult an organizer of that campout if they
/// were not already (whoever is buying the food is running the show). An
/// adult may log their own expenses; logging for someone else requires
/// roster-management rights.
pub async fn log_adult_expense(
    db: &DatabaseConnection,
    principal: &Principal,
    campout_id: i64,
    adult_id: i64,
    amount: Decimal,
    description: String,
) -> Result<adult_expense::Model> {
    access::ensure(principal, Action::LogAdultExpense)?;
    if adult_id != principal.user_id {
        access::ensure(principal, Action::ManageRoster)?;
    }
    tx_ops::validate_amount(amount)?;
    if description.trim().is_empty() {
        return Err(Error::validation("description", "Description is required"));
    }

    let campout = get_campout_required(db, campout_id).await?;
    ensure_accepts_entries(&campout)?;
    ensure_expenses_open(&campout)?;

    let txn = db.begin().await?;

    upsert_adult_role(&txn, campout_id, adult_id, CampoutAdultRole::Organizer).await?;

    let expense = adult_expense::ActiveModel {
        campout_id: Set(campout_id),
        adult_id: Set(adult_id),
        amount: Set(amount),
        description: Set(description),
        is_reimbursed: Set(false),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(
        campout_id,
        adult_id,
        amount = %expense.amount,
        "adult expense logged"
    );
    Ok(expense)
}

/// Finds an adult expense by ID, returning `NotFound` if it does not exist.
async fn get_expense_required(
    db: &impl ConnectionTrait,
    expense_id: i64,
) -> Result<adult_expense::Model> {
    AdultExpense::find_by_id(expense_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            what: "Adult expense",
        })
}

/// Ownership refinement for an already-fetched expense: the owner may edit
/// their own; editing someone else's requires roster-management rights. The
/// role-matrix check happens before the fetch so unauthorized callers learn
/// nothing about which expense ids exist.
fn ensure_may_edit_expense(principal: &Principal, expense: &adult_expense::Model) -> Result<()> {
    if expense.adult_id != principal.user_id {
        access::ensure(principal, Action::ManageRoster)?;
    }
    Ok(())
}

/// Updates the amount and description of an unreimbursed expense.
pub async fn update_adult_expense(
    db: &DatabaseConnection,
    principal: &Principal,
    expense_id: i64,
    amount: Decimal,
    description: String,
) -> Result<adult_expense::Model> {
    access::ensure(principal, Action::LogAdultExpense)?;

    let expense = get_expense_required(db, expense_id).await?;
    ensure_may_edit_expense(principal, &expense)?;
    tx_ops::validate_amount(amount)?;

    if expense.is_reimbursed {
        return Err(Error::invalid_state("Cannot update a reimbursed expense."));
    }
    let campout = get_campout_required(db, expense.campout_id).await?;
    ensure_accepts_entries(&campout)?;
    ensure_expenses_open(&campout)?;

    let mut active: adult_expense::ActiveModel = expense.into();
    active.amount = Set(amount);
    active.description = Set(description);
    Ok(active.update(db).await?)
}

/// Deletes an unreimbursed expense.
pub async fn delete_adult_expense(
    db: &DatabaseConnection,
    principal: &Principal,
    expense_id: i64,
) -> Result<()> {
    access::ensure(principal, Action::LogAdultExpense)?;

    let expense = get_expense_required(db, expense_id).await?;
    ensure_may_edit_expense(principal, &expense)?;

    if expense.is_reimbursed {
        return Err(Error::invalid_state("Cannot delete a reimbursed expense."));
    }
    let campout = get_campout_required(db, expense.campout_id).await?;
    ensure_accepts_entries(&campout)?;
    ensure_expenses_open(&campout)?;

    expense.delete(db).await?;
    Ok(())
}

/// Reimburses a single adult expense: one REIMBURSEMENT ledger entry plus the
/// one-way `is_reimbursed` flip, committed together. Approving an expense
/// that is already reimbursed is a no-op.
pub async fn approve_reimbursement(
    db: &DatabaseConnection,
    principal: &Principal,
    expense_id: i64,
) -> Result<adult_expense::Model> {
    access::ensure(principal, Action::ApproveReimbursement)?;

    let expense = get_expense_required(db, expense_id).await?;
    if expense.is_reimbursed {
        return Ok(expense);
    }
    let campout = get_campout_required(db, expense.campout_id).await?;
    ensure_accepts_entries(&campout)?;

    let txn = db.begin().await?;

    let mut entry = tx_ops::base_entry(
        principal,
        expense.amount,
        TransactionType::Reimbursement,
        format!("Reimbursement: {}", expense.description),
    );
    entry.status = Set(TransactionStatus::Approved);
    entry.approved_by = Set(Some(principal.user_id));
    entry.campout_id = Set(Some(expense.campout_id));
    entry.beneficiary_id = Set(Some(expense.adult_id));
    entry.insert(&txn).await?;

    let mut active: adult_expense::ActiveModel = expense.into();
    active.is_reimbursed = Set(true);
    let reimbursed = active.update(&txn).await?;

    txn.commit().await?;

    info!(expense_id, "adult expense reimbursed");
    Ok(reimbursed)
}

/// Retrieves all adult expenses for a campout.
pub async fn get_adult_expenses_for_campout(
    db: &impl ConnectionTrait,
    campout_id: i64,
) -> Result<Vec<adult_expense::Model>> {
    AdultExpense::find()
        .filter(adult_expense::Column::CampoutId.eq(campout_id))
        .all(db)
        .await
        .map_err(Into::into)
}
