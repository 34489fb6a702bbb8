//! Campout settlement - cost splitting, batch collection, organizer payout,
//! and the lifecycle state machine.
//!
//! The split is recomputed from the ledger every time rather than stored, so
//! a late expense or payment can never leave a stale per-person figure. Batch
//! collection commits one atomic unit per participant and stops at the first
//! one who cannot pay; everything collected before the stop stays collected.

use crate::{
    core::{
        AccountRef,
        access::{self, Action, Principal},
        campout as campout_ops, scout as scout_ops, transaction as tx_ops,
    },
    entities::{
        ParentScout, Scout, Transaction, User, campout,
        campout::CampoutStatus,
        campout_adult::CampoutAdultRole,
        parent_scout, scout, transaction,
        transaction::{TransactionStatus, TransactionType},
    },
    errors::{Error, Result},
};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{info, warn};

/// The recomputed cost split for a campout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostSummary {
    /// Sum of approved troop expenses and all logged adult expenses
    pub total_cost: Decimal,
    /// Registered scouts plus attendee-role adults
    pub headcount: u32,
    /// `total_cost / headcount`, rounded half-up to cents; zero when nobody
    /// is registered
    pub cost_per_person: Decimal,
}

/// One participant's standing against the per-person share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentStanding {
    /// Total approved payments attributed to this participant
    pub amount_paid: Decimal,
    /// Whether the payments cover the per-person share
    pub is_paid: bool,
}

/// One successful batch-collection debit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRecord {
    /// Who the collection was for
    pub account: AccountRef,
    /// Display name of the participant
    pub name: String,
    /// Amount moved out of an IBA
    pub amount: Decimal,
}

fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Recomputes the cost split for a campout from the ledger.
///
/// Total cost is approved EXPENSE entries plus every logged adult expense,
/// reimbursed or not; REIMBURSEMENT entries are the payout mirror of adult
/// expenses and are excluded to avoid double counting. Headcount is the
/// registered scouts plus adults holding an ATTENDEE role.
pub async fn cost_summary(db: &impl ConnectionTrait, campout_id: i64) -> Result<CostSummary> {
    let expenses = Transaction::find()
        .filter(transaction::Column::CampoutId.eq(campout_id))
        .filter(transaction::Column::TxType.eq(TransactionType::Expense))
        .filter(transaction::Column::Status.eq(TransactionStatus::Approved))
        .all(db)
        .await?;
    let adult_expenses = campout_ops::get_adult_expenses_for_campout(db, campout_id).await?;

    let total_cost: Decimal = expenses
        .iter()
        .map(|t| t.amount)
        .chain(adult_expenses.iter().map(|e| e.amount))
        .sum();

    let scouts = campout_ops::get_registered_scouts(db, campout_id).await?;
    let attendees = campout_ops::get_adult_roles(db, campout_id)
        .await?
        .into_iter()
        .filter(|r| r.role == CampoutAdultRole::Attendee)
        .count();
    let headcount = u32::try_from(scouts.len() + attendees).unwrap_or(u32::MAX);

    let cost_per_person = if headcount == 0 {
        Decimal::ZERO
    } else {
        round_cents(total_cost / Decimal::from(headcount))
    };

    Ok(CostSummary {
        total_cost,
        headcount,
        cost_per_person,
    })
}

/// Sums the approved payments attributed to one participant for a campout.
///
/// A transfer with a beneficiary counts toward the beneficiary adult, never
/// toward the funding scout.
pub async fn amount_paid(
    db: &impl ConnectionTrait,
    campout_id: i64,
    account: AccountRef,
) -> Result<Decimal> {
    let mut query = Transaction::find()
        .filter(transaction::Column::CampoutId.eq(campout_id))
        .filter(transaction::Column::Status.eq(TransactionStatus::Approved))
        .filter(transaction::Column::TxType.is_in([
            TransactionType::CampTransfer,
            TransactionType::RegistrationIncome,
            TransactionType::EventPayment,
        ]));
    query = match account {
        AccountRef::Scout(scout_id) => query
            .filter(transaction::Column::ScoutId.eq(scout_id))
            .filter(transaction::Column::BeneficiaryId.is_null()),
        AccountRef::Adult(adult_id) => {
            query.filter(transaction::Column::BeneficiaryId.eq(adult_id))
        }
    };

    let payments = query.all(db).await?;
    Ok(payments.iter().map(|t| t.amount).sum())
}

/// Computes a participant's standing against the current per-person share.
pub async fn payment_standing(
    db: &impl ConnectionTrait,
    campout_id: i64,
    account: AccountRef,
) -> Result<PaymentStanding> {
    let summary = cost_summary(db, campout_id).await?;
    let paid = amount_paid(db, campout_id, account).await?;
    Ok(PaymentStanding {
        amount_paid: paid,
        is_paid: paid >= summary.cost_per_person,
    })
}

/// Moves a campout from OPEN to READY_FOR_PAYMENT, freezing the expectation
/// that its expense list is complete.
pub async fn finalize_campout_costs(
    db: &DatabaseConnection,
    principal: &Principal,
    campout_id: i64,
) -> Result<campout::Model> {
    access::ensure(principal, Action::FinalizeCampout)?;

    let campout = campout_ops::get_campout_required(db, campout_id).await?;
    if campout.status != CampoutStatus::Open {
        return Err(Error::invalid_state(
            "Only an open campout can be finalized",
        ));
    }

    let summary = cost_summary(db, campout_id).await?;
    info!(
        campout_id,
        total_cost = %summary.total_cost,
        headcount = summary.headcount,
        cost_per_person = %summary.cost_per_person,
        "campout costs finalized"
    );

    let mut active: campout::ActiveModel = campout.into();
    active.status = Set(CampoutStatus::ReadyForPayment);
    Ok(active.update(db).await?)
}

/// Moves a campout from READY_FOR_PAYMENT to CLOSED. After this no ledger
/// entry, expense, or roster change may reference the campout.
pub async fn close_campout(
    db: &DatabaseConnection,
    principal: &Principal,
    campout_id: i64,
) -> Result<campout::Model> {
    access::ensure(principal, Action::CloseCampout)?;

    let campout = campout_ops::get_campout_required(db, campout_id).await?;
    if campout.status != CampoutStatus::ReadyForPayment {
        return Err(Error::invalid_state(
            "Only a campout that is ready for payment can be closed",
        ));
    }

    let mut active: campout::ActiveModel = campout.into();
    active.status = Set(CampoutStatus::Closed);
    let closed = active.update(db).await?;
    info!(campout_id, "campout closed");
    Ok(closed)
}

/// Collects the outstanding per-person share from every participant's IBA.
///
/// Each participant is one atomic unit: a CAMP_TRANSFER entry plus the
/// checked balance debit, committed before the next participant is touched.
/// The first participant whose funding account cannot cover the due amount
/// aborts the run with an error naming them; participants already collected
/// stay collected, and re-running skips them because their due recomputes to
/// zero. Adult attendees are funded from the first linked scout IBA that can
/// cover their share.
pub async fn batch_collect_iba(
    db: &DatabaseConnection,
    principal: &Principal,
    campout_id: i64,
) -> Result<Vec<CollectionRecord>> {
    access::ensure(principal, Action::CollectIba)?;

    let campout = campout_ops::get_campout_required(db, campout_id).await?;
    campout_ops::ensure_accepts_entries(&campout)?;

    let summary = cost_summary(db, campout_id).await?;
    if summary.headcount == 0 {
        return Err(Error::invalid_state(
            "Campout has no participants to collect from",
        ));
    }

    let mut collected = Vec::new();

    let registrations = campout_ops::get_registered_scouts(db, campout_id).await?;
    for registration in registrations {
        let scout = scout_ops::get_scout_required(db, registration.scout_id).await?;
        let paid = amount_paid(db, campout_id, AccountRef::Scout(scout.id)).await?;
        let due = summary.cost_per_person - paid;
        if due <= Decimal::ZERO {
            continue;
        }

        collect_one(db, principal, campout_id, scout.id, None, due).await?;
        collected.push(CollectionRecord {
            account: AccountRef::Scout(scout.id),
            name: scout.name,
            amount: due,
        });
    }

    let attendee_ids: Vec<i64> = campout_ops::get_adult_roles(db, campout_id)
        .await?
        .into_iter()
        .filter(|r| r.role == CampoutAdultRole::Attendee)
        .map(|r| r.adult_id)
        .collect();
    for adult_id in attendee_ids {
        let adult = User::find_by_id(adult_id)
            .one(db)
            .await?
            .ok_or(Error::NotFound { what: "User" })?;
        let paid = amount_paid(db, campout_id, AccountRef::Adult(adult_id)).await?;
        let due = summary.cost_per_person - paid;
        if due <= Decimal::ZERO {
            continue;
        }

        let funder = find_funding_scout(db, adult_id, due, &adult.name).await?;
        collect_one(db, principal, campout_id, funder, Some(adult_id), due).await?;
        collected.push(CollectionRecord {
            account: AccountRef::Adult(adult_id),
            name: adult.name,
            amount: due,
        });
    }

    info!(
        campout_id,
        count = collected.len(),
        "batch IBA collection complete"
    );
    Ok(collected)
}

/// One participant's collection: ledger entry plus checked debit, committed
/// together.
async fn collect_one(
    db: &DatabaseConnection,
    principal: &Principal,
    campout_id: i64,
    funding_scout_id: i64,
    beneficiary_id: Option<i64>,
    amount: Decimal,
) -> Result<()> {
    let txn = db.begin().await?;

    let mut entry = tx_ops::base_entry(
        principal,
        amount,
        TransactionType::CampTransfer,
        "Automated IBA Collection".to_string(),
    );
    entry.status = Set(TransactionStatus::Approved);
    entry.approved_by = Set(Some(principal.user_id));
    entry.scout_id = Set(Some(funding_scout_id));
    entry.beneficiary_id = Set(beneficiary_id);
    entry.campout_id = Set(Some(campout_id));
    entry.insert(&txn).await?;

    scout_ops::debit_iba_checked(&txn, funding_scout_id, amount).await?;

    txn.commit().await?;
    Ok(())
}

/// Picks the scout IBA that will fund an adult attendee's share: the first
/// scout linked to the adult whose balance covers the due amount.
async fn find_funding_scout(
    db: &impl ConnectionTrait,
    adult_id: i64,
    due: Decimal,
    adult_name: &str,
) -> Result<i64> {
    let linked: Vec<scout::Model> = ParentScout::find()
        .filter(parent_scout::Column::ParentId.eq(adult_id))
        .find_also_related(Scout)
        .order_by_asc(parent_scout::Column::ScoutId)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(_, scout)| scout)
        .collect();

    if let Some(funder) = linked.iter().find(|s| s.iba_balance >= due) {
        return Ok(funder.id);
    }

    let best = linked
        .iter()
        .map(|s| s.iba_balance)
        .max()
        .unwrap_or(Decimal::ZERO);
    Err(Error::InsufficientFunds {
        account: adult_name.to_string(),
        current: best,
        required: due,
    })
}

/// Computes the outstanding reimbursement owed to each organizer: the sum of
/// their unreimbursed expenses for the campout. The usual input to
/// [`payout_organizers`].
pub async fn outstanding_reimbursements(
    db: &impl ConnectionTrait,
    campout_id: i64,
) -> Result<Vec<(i64, Decimal)>> {
    let outstanding = campout_ops::get_adult_expenses_for_campout(db, campout_id)
        .await?
        .into_iter()
        .filter(|e| !e.is_reimbursed);

    let mut totals: Vec<(i64, Decimal)> = Vec::new();
    for expense in outstanding {
        match totals.iter_mut().find(|(id, _)| *id == expense.adult_id) {
            Some((_, total)) => *total += expense.amount,
            None => totals.push((expense.adult_id, expense.amount)),
        }
    }
    Ok(totals)
}

/// Pays organizers back in one atomic unit: per adult with a positive payout,
/// one REIMBURSEMENT entry for the given amount, and every one of that
/// adult's unreimbursed expenses for the campout is marked reimbursed.
///
/// The payout amount is the treasurer's call and is not required to match
/// the expense total; whatever they settle on clears the adult's whole slate
/// for this campout. Zero or negative payouts are skipped with a warning.
/// Re-running pays nothing twice because cleared expenses no longer qualify.
pub async fn payout_organizers(
    db: &DatabaseConnection,
    principal: &Principal,
    campout_id: i64,
    payouts: &[(i64, Decimal)],
) -> Result<Vec<CollectionRecord>> {
    access::ensure(principal, Action::PayoutOrganizers)?;

    let campout = campout_ops::get_campout_required(db, campout_id).await?;
    campout_ops::ensure_accepts_entries(&campout)?;

    let txn = db.begin().await?;
    let mut records = Vec::new();

    for &(adult_id, amount) in payouts {
        if amount <= Decimal::ZERO {
            warn!(adult_id, amount = %amount, "skipping non-positive organizer payout");
            continue;
        }
        let adult = User::find_by_id(adult_id)
            .one(&txn)
            .await?
            .ok_or(Error::NotFound { what: "User" })?;

        let mut entry = tx_ops::base_entry(
            principal,
            amount,
            TransactionType::Reimbursement,
            format!("Organizer reimbursement for {}", adult.name),
        );
        entry.status = Set(TransactionStatus::Approved);
        entry.approved_by = Set(Some(principal.user_id));
        entry.campout_id = Set(Some(campout_id));
        entry.beneficiary_id = Set(Some(adult_id));
        entry.insert(&txn).await?;

        crate::entities::AdultExpense::update_many()
            .col_expr(
                crate::entities::adult_expense::Column::IsReimbursed,
                Expr::value(true),
            )
            .filter(crate::entities::adult_expense::Column::CampoutId.eq(campout_id))
            .filter(crate::entities::adult_expense::Column::AdultId.eq(adult_id))
            .filter(crate::entities::adult_expense::Column::IsReimbursed.eq(false))
            .exec(&txn)
            .await?;

        records.push(CollectionRecord {
            account: AccountRef::Adult(adult_id),
            name: adult.name,
            amount,
        });
    }

    txn.commit().await?;

    info!(campout_id, count = records.len(), "organizers paid out");
    Ok(records)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::transaction::{record_manual_payment, pay_from_iba};
    use crate::entities::user::Role;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_cost_summary_counts_all_expense_sources() -> Result<()> {
        let (db, admin) = setup_with_admin().await?;
        let campout = create_test_campout(&db, "Fall Campout").await?;
        let adult = create_test_user(&db, "Lee", Role::Leader).await?;
        let scout = create_test_scout(&db, "Sam").await?;
        crate::core::campout::register_scout(&db, &admin, campout.id, scout.id).await?;

        crate::core::campout::log_troop_expense(
            &db,
            &admin,
            campout.id,
            dec!(60.00),
            "Campsite fee".to_string(),
        )
        .await?;
        let expense = crate::core::campout::log_adult_expense(
            &db,
            &admin,
            campout.id,
            adult.id,
            dec!(40.00),
            "Groceries".to_string(),
        )
        .await?;

        let summary = cost_summary(&db, campout.id).await?;
        assert_eq!(summary.total_cost, dec!(100.00));
        assert_eq!(summary.headcount, 1);
        assert_eq!(summary.cost_per_person, dec!(100.00));

        // Reimbursing the adult expense must not change the total: the
        // REIMBURSEMENT entry mirrors a cost already counted.
        crate::core::campout::approve_reimbursement(&db, &admin, expense.id).await?;
        let summary = cost_summary(&db, campout.id).await?;
        assert_eq!(summary.total_cost, dec!(100.00));

        Ok(())
    }

    #[tokio::test]
    async fn test_cost_per_person_rounds_half_up() -> Result<()> {
        let (db, admin) = setup_with_admin().await?;
        let campout = create_test_campout(&db, "Fall Campout").await?;
        for name in ["A", "B", "C"] {
            let s = create_test_scout(&db, name).await?;
            crate::core::campout::register_scout(&db, &admin, campout.id, s.id).await?;
        }
        crate::core::campout::log_troop_expense(
            &db,
            &admin,
            campout.id,
            dec!(100.00),
            "Campsite fee".to_string(),
        )
        .await?;

        let summary = cost_summary(&db, campout.id).await?;
        assert_eq!(summary.cost_per_person, dec!(33.33));

        // An exact half-cent rounds away from zero: 25.01 / 2 = 12.505
        let pair = create_test_campout(&db, "Pair Campout").await?;
        for name in ["D", "E"] {
            let s = create_test_scout(&db, name).await?;
            crate::core::campout::register_scout(&db, &admin, pair.id, s.id).await?;
        }
        crate::core::campout::log_troop_expense(
            &db,
            &admin,
            pair.id,
            dec!(25.01),
            "Firewood".to_string(),
        )
        .await?;
        let summary = cost_summary(&db, pair.id).await?;
        assert_eq!(summary.cost_per_person, dec!(12.51));

        Ok(())
    }

    #[tokio::test]
    async fn test_empty_campout_has_zero_share() -> Result<()> {
        let (db, admin) = setup_with_admin().await?;
        let campout = create_test_campout(&db, "Fall Campout").await?;
        crate::core::campout::log_troop_expense(
            &db,
            &admin,
            campout.id,
            dec!(50.00),
            "Deposit".to_string(),
        )
        .await?;

        let summary = cost_summary(&db, campout.id).await?;
        assert_eq!(summary.total_cost, dec!(50.00));
        assert_eq!(summary.headcount, 0);
        assert_eq!(summary.cost_per_person, Decimal::ZERO);

        let collect = batch_collect_iba(&db, &admin, campout.id).await;
        assert!(matches!(collect.unwrap_err(), Error::InvalidState(_)));

        Ok(())
    }

    #[tokio::test]
    async fn test_lifecycle_is_linear() -> Result<()> {
        let (db, admin) = setup_with_admin().await?;
        let campout = create_test_campout(&db, "Fall Campout").await?;

        // Cannot close an OPEN campout
        let early_close = close_campout(&db, &admin, campout.id).await;
        assert!(matches!(early_close.unwrap_err(), Error::InvalidState(_)));

        let ready = finalize_campout_costs(&db, &admin, campout.id).await?;
        assert_eq!(ready.status, CampoutStatus::ReadyForPayment);

        // Cannot finalize twice
        let refinalize = finalize_campout_costs(&db, &admin, campout.id).await;
        assert!(matches!(refinalize.unwrap_err(), Error::InvalidState(_)));

        let closed = close_campout(&db, &admin, campout.id).await?;
        assert_eq!(closed.status, CampoutStatus::Closed);

        let reclose = close_campout(&db, &admin, campout.id).await;
        assert!(matches!(reclose.unwrap_err(), Error::InvalidState(_)));

        Ok(())
    }

    #[tokio::test]
    async fn test_leader_cannot_close_or_collect() -> Result<()> {
        let (db, admin) = setup_with_admin().await?;
        let campout = create_test_campout(&db, "Fall Campout").await?;
        let leader_user = create_test_user(&db, "Lee", Role::Leader).await?;
        let leader = Principal::new(leader_user.id, Role::Leader);

        finalize_campout_costs(&db, &admin, campout.id).await?;

        let collect = batch_collect_iba(&db, &leader, campout.id).await;
        assert!(matches!(collect.unwrap_err(), Error::Unauthorized));
        let close = close_campout(&db, &leader, campout.id).await;
        assert!(matches!(close.unwrap_err(), Error::Unauthorized));

        Ok(())
    }

    #[tokio::test]
    async fn test_batch_collect_scouts() -> Result<()> {
        let (db, admin) = setup_with_admin().await?;
        let campout = create_test_campout(&db, "Fall Campout").await?;
        let a = create_scout_with_balance(&db, "Alice", dec!(100.00)).await?;
        let b = create_scout_with_balance(&db, "Ben", dec!(100.00)).await?;
        crate::core::campout::register_scout(&db, &admin, campout.id, a.id).await?;
        crate::core::campout::register_scout(&db, &admin, campout.id, b.id).await?;
        crate::core::campout::log_troop_expense(
            &db,
            &admin,
            campout.id,
            dec!(80.00),
            "Campsite fee".to_string(),
        )
        .await?;

        let records = batch_collect_iba(&db, &admin, campout.id).await?;
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.amount == dec!(40.00)));

        let a_after = crate::core::scout::get_scout_required(&db, a.id).await?;
        let b_after = crate::core::scout::get_scout_required(&db, b.id).await?;
        assert_eq!(a_after.iba_balance, dec!(60.00));
        assert_eq!(b_after.iba_balance, dec!(60.00));

        // Everyone is paid up, so a second run collects nothing.
        let records = batch_collect_iba(&db, &admin, campout.id).await?;
        assert!(records.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_batch_collect_stops_at_first_underfunded() -> Result<()> {
        let (db, admin) = setup_with_admin().await?;
        let campout = create_test_campout(&db, "Fall Campout").await?;
        let rich = create_scout_with_balance(&db, "Alice", dec!(100.00)).await?;
        let poor = create_scout_with_balance(&db, "Ben", dec!(5.00)).await?;
        crate::core::campout::register_scout(&db, &admin, campout.id, rich.id).await?;
        crate::core::campout::register_scout(&db, &admin, campout.id, poor.id).await?;
        crate::core::campout::log_troop_expense(
            &db,
            &admin,
            campout.id,
            dec!(80.00),
            "Campsite fee".to_string(),
        )
        .await?;

        let result = batch_collect_iba(&db, &admin, campout.id).await;
        match result.unwrap_err() {
            Error::InsufficientFunds {
                account,
                current,
                required,
            } => {
                assert_eq!(account, "Ben");
                assert_eq!(current, dec!(5.00));
                assert_eq!(required, dec!(40.00));
            }
            other => panic!("expected InsufficientFunds, got {other:?}"),
        }

        // The collection committed before the failure is retained.
        let rich_after = crate::core::scout::get_scout_required(&db, rich.id).await?;
        assert_eq!(rich_after.iba_balance, dec!(60.00));

        // Topping up and re-running collects only from the one still owing.
        crate::core::scout::credit_iba(&db, poor.id, dec!(50.00)).await?;
        let records = batch_collect_iba(&db, &admin, campout.id).await?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Ben");
        let rich_final = crate::core::scout::get_scout_required(&db, rich.id).await?;
        assert_eq!(rich_final.iba_balance, dec!(60.00));

        Ok(())
    }

    #[tokio::test]
    async fn test_partial_payment_reduces_due() -> Result<()> {
        let (db, admin) = setup_with_admin().await?;
        let campout = create_test_campout(&db, "Fall Campout").await?;
        let scout = create_scout_with_balance(&db, "Sam", dec!(100.00)).await?;
        crate::core::campout::register_scout(&db, &admin, campout.id, scout.id).await?;
        crate::core::campout::log_troop_expense(
            &db,
            &admin,
            campout.id,
            dec!(50.00),
            "Campsite fee".to_string(),
        )
        .await?;

        record_manual_payment(
            &db,
            &admin,
            campout.id,
            dec!(20.00),
            AccountRef::Scout(scout.id),
        )
        .await?;

        let records = batch_collect_iba(&db, &admin, campout.id).await?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount, dec!(30.00));

        let standing = payment_standing(&db, campout.id, AccountRef::Scout(scout.id)).await?;
        assert_eq!(standing.amount_paid, dec!(50.00));
        assert!(standing.is_paid);

        Ok(())
    }

    #[tokio::test]
    async fn test_adult_attendee_funded_by_linked_scout() -> Result<()> {
        let (db, admin) = setup_with_admin().await?;
        let campout = create_test_campout(&db, "Fall Campout").await?;
        let parent = create_test_user(&db, "Pat", Role::Parent).await?;
        let scout = create_scout_with_balance(&db, "Sam", dec!(100.00)).await?;
        link_parent_to_scout(&db, parent.id, scout.id).await?;
        crate::core::campout::register_scout(&db, &admin, campout.id, scout.id).await?;
        crate::core::campout::assign_adult(
            &db,
            &admin,
            campout.id,
            parent.id,
            CampoutAdultRole::Attendee,
        )
        .await?;
        crate::core::campout::log_troop_expense(
            &db,
            &admin,
            campout.id,
            dec!(60.00),
            "Campsite fee".to_string(),
        )
        .await?;

        // Two participants at $30 each, both funded from Sam's IBA.
        let records = batch_collect_iba(&db, &admin, campout.id).await?;
        assert_eq!(records.len(), 2);

        let after = crate::core::scout::get_scout_required(&db, scout.id).await?;
        assert_eq!(after.iba_balance, dec!(40.00));

        // The adult's share counts toward the adult, not the scout.
        let scout_standing =
            payment_standing(&db, campout.id, AccountRef::Scout(scout.id)).await?;
        assert_eq!(scout_standing.amount_paid, dec!(30.00));
        let adult_standing =
            payment_standing(&db, campout.id, AccountRef::Adult(parent.id)).await?;
        assert_eq!(adult_standing.amount_paid, dec!(30.00));
        assert!(adult_standing.is_paid);

        Ok(())
    }

    #[tokio::test]
    async fn test_adult_with_no_funding_source_named() -> Result<()> {
        let (db, admin) = setup_with_admin().await?;
        let campout = create_test_campout(&db, "Fall Campout").await?;
        let loner = create_test_user(&db, "Morgan", Role::Parent).await?;
        crate::core::campout::assign_adult(
            &db,
            &admin,
            campout.id,
            loner.id,
            CampoutAdultRole::Attendee,
        )
        .await?;
        crate::core::campout::log_troop_expense(
            &db,
            &admin,
            campout.id,
            dec!(30.00),
            "Campsite fee".to_string(),
        )
        .await?;

        let result = batch_collect_iba(&db, &admin, campout.id).await;
        match result.unwrap_err() {
            Error::InsufficientFunds {
                account, current, ..
            } => {
                assert_eq!(account, "Morgan");
                assert_eq!(current, Decimal::ZERO);
            }
            other => panic!("expected InsufficientFunds, got {other:?}"),
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_payout_organizers_clears_all_outstanding() -> Result<()> {
        let (db, admin) = setup_with_admin().await?;
        let campout = create_test_campout(&db, "Fall Campout").await?;
        let lee = create_test_user(&db, "Lee", Role::Leader).await?;
        let pat = create_test_user(&db, "Pat", Role::Parent).await?;

        crate::core::campout::log_adult_expense(
            &db,
            &admin,
            campout.id,
            lee.id,
            dec!(120.00),
            "Groceries".to_string(),
        )
        .await?;
        crate::core::campout::log_adult_expense(
            &db,
            &admin,
            campout.id,
            lee.id,
            dec!(30.00),
            "Fuel".to_string(),
        )
        .await?;
        crate::core::campout::log_adult_expense(
            &db,
            &admin,
            campout.id,
            pat.id,
            dec!(45.00),
            "Propane".to_string(),
        )
        .await?;

        let owed = outstanding_reimbursements(&db, campout.id).await?;
        assert_eq!(owed.len(), 2);
        assert!(owed.contains(&(lee.id, dec!(150.00))));
        assert!(owed.contains(&(pat.id, dec!(45.00))));

        let payouts = payout_organizers(&db, &admin, campout.id, &owed).await?;
        assert_eq!(payouts.len(), 2);
        let lee_payout = payouts.iter().find(|p| p.name == "Lee").unwrap();
        assert_eq!(lee_payout.amount, dec!(150.00));
        let pat_payout = payouts.iter().find(|p| p.name == "Pat").unwrap();
        assert_eq!(pat_payout.amount, dec!(45.00));

        let expenses =
            crate::core::campout::get_adult_expenses_for_campout(&db, campout.id).await?;
        assert!(expenses.iter().all(|e| e.is_reimbursed));

        // Nothing left to pay on a second run
        let owed = outstanding_reimbursements(&db, campout.id).await?;
        assert!(owed.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_payout_shortfall_still_clears_all_expenses() -> Result<()> {
        let (db, admin) = setup_with_admin().await?;
        let campout = create_test_campout(&db, "Fall Campout").await?;
        let lee = create_test_user(&db, "Lee", Role::Leader).await?;

        crate::core::campout::log_adult_expense(
            &db,
            &admin,
            campout.id,
            lee.id,
            dec!(25.00),
            "Groceries".to_string(),
        )
        .await?;
        crate::core::campout::log_adult_expense(
            &db,
            &admin,
            campout.id,
            lee.id,
            dec!(10.00),
            "Ice".to_string(),
        )
        .await?;

        // The treasurer settles on $10 even though $35 was logged. The single
        // payout still clears both expenses.
        let payouts =
            payout_organizers(&db, &admin, campout.id, &[(lee.id, dec!(10.00))]).await?;
        assert_eq!(payouts.len(), 1);
        assert_eq!(payouts[0].amount, dec!(10.00));

        let expenses =
            crate::core::campout::get_adult_expenses_for_campout(&db, campout.id).await?;
        assert_eq!(expenses.len(), 2);
        assert!(expenses.iter().all(|e| e.is_reimbursed));

        let entries = Transaction::find()
            .filter(transaction::Column::CampoutId.eq(campout.id))
            .filter(transaction::Column::TxType.eq(TransactionType::Reimbursement))
            .all(&db)
            .await?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].amount, dec!(10.00));

        Ok(())
    }

    #[tokio::test]
    async fn test_simple_split_scenario() -> Result<()> {
        let (db, admin) = setup_with_admin().await?;
        let campout = create_test_campout(&db, "Fall Campout").await?;
        let a = create_scout_with_balance(&db, "Alice", dec!(50.00)).await?;
        let b = create_test_scout(&db, "Ben").await?;
        let adult = create_test_user(&db, "Pat", Role::Parent).await?;
        crate::core::campout::register_scout(&db, &admin, campout.id, a.id).await?;
        crate::core::campout::register_scout(&db, &admin, campout.id, b.id).await?;
        crate::core::campout::assign_adult(
            &db,
            &admin,
            campout.id,
            adult.id,
            CampoutAdultRole::Attendee,
        )
        .await?;
        crate::core::campout::log_troop_expense(
            &db,
            &admin,
            campout.id,
            dec!(90.00),
            "Campsite fee".to_string(),
        )
        .await?;

        let summary = cost_summary(&db, campout.id).await?;
        assert_eq!(summary.headcount, 3);
        assert_eq!(summary.cost_per_person, dec!(30.00));

        pay_from_iba(&db, &admin, campout.id, a.id, dec!(30.00), None).await?;
        let a_after = crate::core::scout::get_scout_required(&db, a.id).await?;
        assert_eq!(a_after.iba_balance, dec!(20.00));

        let a_standing = payment_standing(&db, campout.id, AccountRef::Scout(a.id)).await?;
        assert!(a_standing.is_paid);
        let b_standing = payment_standing(&db, campout.id, AccountRef::Scout(b.id)).await?;
        assert!(!b_standing.is_paid);
        let adult_standing =
            payment_standing(&db, campout.id, AccountRef::Adult(adult.id)).await?;
        assert!(!adult_standing.is_paid);

        Ok(())
    }

    #[tokio::test]
    async fn test_iba_balances_reconcile_with_ledger() -> Result<()> {
        let (db, admin) = setup_with_admin().await?;
        let campout = create_test_campout(&db, "Fall Campout").await?;
        let a = create_test_scout(&db, "Alice").await?;
        let b = create_test_scout(&db, "Ben").await?;
        crate::core::campout::register_scout(&db, &admin, campout.id, a.id).await?;
        crate::core::campout::register_scout(&db, &admin, campout.id, b.id).await?;

        crate::core::transaction::bulk_iba_deposits(
            &db,
            &admin,
            &[(a.id, dec!(75.25)), (b.id, dec!(60.10))],
            "Check night",
        )
        .await?;
        crate::core::campout::log_troop_expense(
            &db,
            &admin,
            campout.id,
            dec!(66.66),
            "Campsite fee".to_string(),
        )
        .await?;
        pay_from_iba(&db, &admin, campout.id, a.id, dec!(12.34), None).await?;
        batch_collect_iba(&db, &admin, campout.id).await?;

        // Every IBA cent must be accounted for by the ledger: deposits in,
        // camp transfers out.
        let entries = Transaction::find().all(&db).await?;
        let mut expected = Decimal::ZERO;
        for t in &entries {
            if t.status != TransactionStatus::Approved || t.scout_id.is_none() {
                continue;
            }
            match t.tx_type {
                TransactionType::IbaDeposit => expected += t.amount,
                TransactionType::CampTransfer => expected -= t.amount,
                _ => {}
            }
        }

        let a_after = crate::core::scout::get_scout_required(&db, a.id).await?;
        let b_after = crate::core::scout::get_scout_required(&db, b.id).await?;
        assert_eq!(a_after.iba_balance + b_after.iba_balance, expected);

        Ok(())
    }

    #[tokio::test]
    async fn test_reconciliation_holds_over_long_mixed_sequence() -> Result<()> {
        let (db, admin) = setup_with_admin().await?;
        let campout = create_test_campout(&db, "Summer Camp").await?;
        let campaign = create_test_campaign(&db, &admin, 40).await?;
        let mut scouts = Vec::new();
        for name in ["Alice", "Ben", "Cleo", "Drew", "Evan"] {
            let s = create_test_scout(&db, name).await?;
            crate::core::campout::register_scout(&db, &admin, campout.id, s.id).await?;
            scouts.push(s);
        }
        crate::core::campout::log_troop_expense(
            &db,
            &admin,
            campout.id,
            dec!(100.00),
            "Campsite fee".to_string(),
        )
        .await?;

        // Deterministic LCG so failures reproduce.
        let mut seed: u64 = 0x5eed_cafe;
        let mut next = move || {
            seed = seed
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            seed >> 33
        };

        for i in 0..2_000u32 {
            let scout_id = scouts[(next() as usize) % scouts.len()].id;
            let cents = i64::try_from(1 + next() % 5_000).unwrap();
            let amount = Decimal::new(cents, 2);

            match next() % 6 {
                0 | 1 => {
                    crate::core::transaction::record_transaction(
                        &db,
                        &admin,
                        crate::core::transaction::NewTransaction {
                            amount,
                            tx_type: TransactionType::IbaDeposit,
                            description: "Deposit".to_string(),
                            scout_id: Some(scout_id),
                            ..Default::default()
                        },
                    )
                    .await?;
                }
                2 => {
                    crate::core::transaction::record_transaction(
                        &db,
                        &admin,
                        crate::core::transaction::NewTransaction {
                            amount,
                            tx_type: TransactionType::FundraisingIncome,
                            description: "Popcorn sale".to_string(),
                            scout_id: Some(scout_id),
                            campaign_id: Some(campaign.id),
                            ..Default::default()
                        },
                    )
                    .await?;
                }
                3 => {
                    match pay_from_iba(&db, &admin, campout.id, scout_id, amount, None).await {
                        Ok(_) | Err(Error::InsufficientFunds { .. }) => {}
                        Err(e) => return Err(e),
                    }
                }
                4 => {
                    record_manual_payment(
                        &db,
                        &admin,
                        campout.id,
                        amount,
                        AccountRef::Scout(scout_id),
                    )
                    .await?;
                }
                _ => {
                    let reclaim = crate::core::transaction::record_transaction(
                        &db,
                        &admin,
                        crate::core::transaction::NewTransaction {
                            amount,
                            tx_type: TransactionType::IbaReclaim,
                            description: "Reclaim".to_string(),
                            scout_id: Some(scout_id),
                            ..Default::default()
                        },
                    )
                    .await;
                    match reclaim {
                        Ok(_) | Err(Error::InsufficientFunds { .. }) => {}
                        Err(e) => return Err(e),
                    }
                }
            }

            if i % 250 == 249 {
                match batch_collect_iba(&db, &admin, campout.id).await {
                    Ok(_) | Err(Error::InsufficientFunds { .. }) => {}
                    Err(e) => return Err(e),
                }
            }
        }

        // Signed replay of every approved IBA-affecting entry must land
        // exactly on the sum of balances: not a cent of drift.
        let entries = Transaction::find().all(&db).await?;
        let mut expected = Decimal::ZERO;
        for t in &entries {
            if t.status != TransactionStatus::Approved || t.scout_id.is_none() {
                continue;
            }
            match t.tx_type {
                TransactionType::IbaDeposit => expected += t.amount,
                TransactionType::FundraisingIncome if t.campaign_id.is_some() => {
                    expected += crate::core::fundraising::iba_share(&campaign, t.amount);
                }
                TransactionType::CampTransfer | TransactionType::IbaReclaim => {
                    expected -= t.amount;
                }
                _ => {}
            }
        }

        let mut total = Decimal::ZERO;
        for s in &scouts {
            let current = crate::core::scout::get_scout_required(&db, s.id).await?;
            assert!(current.iba_balance >= Decimal::ZERO, "negative balance");
            total += current.iba_balance;
        }
        assert_eq!(total, expected);

        Ok(())
    }

    #[tokio::test]
    async fn test_full_settlement_reconciles() -> Result<()> {
        let (db, admin) = setup_with_admin().await?;
        let campout = create_test_campout(&db, "Fall Campout").await?;
        let organizer = create_test_user(&db, "Lee", Role::Leader).await?;
        let mut scouts = Vec::new();
        for name in ["Alice", "Ben", "Cleo"] {
            let s = create_scout_with_balance(&db, name, dec!(100.00)).await?;
            crate::core::campout::register_scout(&db, &admin, campout.id, s.id).await?;
            scouts.push(s);
        }

        crate::core::campout::log_troop_expense(
            &db,
            &admin,
            campout.id,
            dec!(45.00),
            "Campsite fee".to_string(),
        )
        .await?;
        crate::core::campout::log_adult_expense(
            &db,
            &admin,
            campout.id,
            organizer.id,
            dec!(54.00),
            "Groceries".to_string(),
        )
        .await?;

        finalize_campout_costs(&db, &admin, campout.id).await?;

        // One scout pays part of their share from IBA up front
        pay_from_iba(&db, &admin, campout.id, scouts[0].id, dec!(13.00), None).await?;

        let records = batch_collect_iba(&db, &admin, campout.id).await?;
        // 99 / 3 = 33 each; Alice already paid 13 so owes 20
        assert_eq!(records.len(), 3);

        let summary = cost_summary(&db, campout.id).await?;
        let mut total_paid = Decimal::ZERO;
        for s in &scouts {
            let standing = payment_standing(&db, campout.id, AccountRef::Scout(s.id)).await?;
            assert_eq!(standing.amount_paid, summary.cost_per_person);
            total_paid += standing.amount_paid;
        }
        assert_eq!(total_paid, summary.total_cost);

        let owed = outstanding_reimbursements(&db, campout.id).await?;
        payout_organizers(&db, &admin, campout.id, &owed).await?;
        let closed = close_campout(&db, &admin, campout.id).await?;
        assert_eq!(closed.status, CampoutStatus::Closed);

        Ok(())
    }
}
