//! Ledger mutations - payments, IBA transfers, deposits, and deletions.
//!
//! Every operation here consults the access guard before touching mutable
//! state, enforces the closed-campout gate at the entry point, and pairs any
//! IBA balance change with its justifying ledger entry inside one database
//! transaction. Amounts are always positive `Decimal`s with at most two
//! decimal places; the transaction type carries the direction.

use crate::{
    core::{
        AccountRef,
        access::{self, Action, Principal},
        campout as campout_ops, fundraising, scout as scout_ops,
    },
    entities::{
        Transaction, transaction,
        transaction::{TransactionStatus, TransactionType},
    },
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Input for a general ledger entry.
#[derive(Debug, Clone, Default)]
pub struct NewTransaction {
    /// Amount in dollars, must be positive with at most two decimal places
    pub amount: Decimal,
    /// Kind of entry
    pub tx_type: TransactionType,
    /// Human-readable description
    pub description: String,
    /// Funding scout link
    pub scout_id: Option<i64>,
    /// Beneficiary adult link
    pub beneficiary_id: Option<i64>,
    /// Campout link
    pub campout_id: Option<i64>,
    /// Budget category link
    pub budget_category_id: Option<i64>,
    /// Fundraising campaign link
    pub campaign_id: Option<i64>,
}

/// Rejects non-positive amounts and sub-cent precision.
pub(crate) fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::validation("amount", "Amount must be positive"));
    }
    if amount != amount.round_dp(2) {
        return Err(Error::validation(
            "amount",
            "Amount must have at most two decimal places",
        ));
    }
    Ok(())
}

/// Builds an `ActiveModel` with the fields every entry shares: timestamp now,
/// approval derived from the principal's role.
pub(crate) fn base_entry(
    principal: &Principal,
    amount: Decimal,
    tx_type: TransactionType,
    description: String,
) -> transaction::ActiveModel {
    let (status, approved_by) = if principal.auto_approves() {
        (TransactionStatus::Approved, Some(principal.user_id))
    } else {
        (TransactionStatus::Pending, None)
    };

    transaction::ActiveModel {
        amount: Set(amount),
        tx_type: Set(tx_type),
        description: Set(description),
        created_at: Set(chrono::Utc::now()),
        status: Set(status),
        approved_by: Set(approved_by),
        ..Default::default()
    }
}

/// Records a general ledger transaction.
///
/// Campout and campaign links are gated: a CLOSED campout or campaign rejects
/// new entries. Elevated roles auto-approve; parents may only record entries
/// for scouts they are linked to, and their entries stay PENDING. Approved
/// IBA deposits and scout-linked fundraising income apply their balance
/// effect in the same atomic unit as the insert.
pub async fn record_transaction(
    db: &DatabaseConnection,
    principal: &Principal,
    new: NewTransaction,
) -> Result<transaction::Model> {
    access::ensure(principal, Action::RecordTransaction)?;

    if principal.role == crate::entities::user::Role::Parent {
        let scout_id = new
            .scout_id
            .ok_or_else(|| Error::validation("scout_id", "Parents must select a scout"))?;
        access::ensure_linked_to_scout(db, principal, scout_id).await?;
    }

    validate_amount(new.amount)?;
    if new.description.trim().is_empty() {
        return Err(Error::validation("description", "Description is required"));
    }

    if let Some(campout_id) = new.campout_id {
        let campout = campout_ops::get_campout_required(db, campout_id).await?;
        campout_ops::ensure_accepts_entries(&campout)?;
        // The expense side freezes at finalize even for direct ledger entries.
        if new.tx_type == TransactionType::Expense {
            campout_ops::ensure_expenses_open(&campout)?;
        }
    }
    let campaign = match new.campaign_id {
        Some(campaign_id) => Some(fundraising::get_open_campaign(db, campaign_id).await?),
        None => None,
    };

    let txn = db.begin().await?;

    let mut entry = base_entry(principal, new.amount, new.tx_type, new.description);
    entry.scout_id = Set(new.scout_id);
    entry.beneficiary_id = Set(new.beneficiary_id);
    entry.campout_id = Set(new.campout_id);
    entry.budget_category_id = Set(new.budget_category_id);
    entry.campaign_id = Set(new.campaign_id);
    let model = entry.insert(&txn).await?;

    if model.status == TransactionStatus::Approved {
        apply_balance_effect(&txn, &model, campaign.as_ref()).await?;
    }

    txn.commit().await?;

    info!(
        tx_id = model.id,
        tx_type = ?model.tx_type,
        amount = %model.amount,
        "transaction recorded"
    );
    Ok(model)
}

/// Applies the IBA side effect an approved entry carries, if any.
async fn apply_balance_effect<C>(
    db: &C,
    model: &transaction::Model,
    campaign: Option<&crate::entities::fundraising_campaign::Model>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    match (model.tx_type, model.scout_id) {
        (TransactionType::IbaDeposit, Some(scout_id)) => {
            scout_ops::credit_iba(db, scout_id, model.amount).await
        }
        (TransactionType::IbaReclaim, Some(scout_id)) => {
            scout_ops::debit_iba_checked(db, scout_id, model.amount).await
        }
        (TransactionType::FundraisingIncome, Some(scout_id)) => {
            if let Some(campaign) = campaign {
                fundraising::apply_iba_split(db, campaign, scout_id, model.amount).await?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Approves a pending transaction, applying any deferred IBA effect in the
/// same atomic unit as the status flip.
pub async fn approve_transaction(
    db: &DatabaseConnection,
    principal: &Principal,
    transaction_id: i64,
) -> Result<transaction::Model> {
    if !principal.auto_approves() {
        return Err(Error::Unauthorized);
    }

    let txn = db.begin().await?;

    let model = Transaction::find_by_id(transaction_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound {
            what: "Transaction",
        })?;

    if model.status != TransactionStatus::Pending {
        return Err(Error::invalid_state(
            "Only pending transactions can be approved",
        ));
    }

    let campaign = match model.campaign_id {
        Some(campaign_id) => fundraising::get_campaign_by_id(&txn, campaign_id).await?,
        None => None,
    };

    let mut active: transaction::ActiveModel = model.into();
    active.status = Set(TransactionStatus::Approved);
    active.approved_by = Set(Some(principal.user_id));
    let approved = active.update(&txn).await?;

    apply_balance_effect(&txn, &approved, campaign.as_ref()).await?;

    txn.commit().await?;
    Ok(approved)
}

/// Records a manual (cash/check) campout fee payment for a scout or adult.
pub async fn record_manual_payment(
    db: &DatabaseConnection,
    principal: &Principal,
    campout_id: i64,
    amount: Decimal,
    who: AccountRef,
) -> Result<transaction::Model> {
    access::ensure(principal, Action::RecordPayment)?;
    validate_amount(amount)?;

    let campout = campout_ops::get_campout_required(db, campout_id).await?;
    campout_ops::ensure_accepts_entries(&campout)?;

    let (description, scout_id, beneficiary_id) = match who {
        AccountRef::Scout(id) => (
            "Scout Campout Fee Payment (Manual/Cash)".to_string(),
            Some(id),
            None,
        ),
        AccountRef::Adult(id) => (
            "Adult Campout Fee Payment (Manual/Cash)".to_string(),
            None,
            Some(id),
        ),
    };

    // Cash in hand is approved on the spot regardless of who records it.
    let mut entry = base_entry(principal, amount, TransactionType::EventPayment, description);
    entry.status = Set(TransactionStatus::Approved);
    entry.approved_by = Set(Some(principal.user_id));
    entry.scout_id = Set(scout_id);
    entry.beneficiary_id = Set(beneficiary_id);
    entry.campout_id = Set(Some(campout_id));

    Ok(entry.insert(db).await?)
}

/// Transfers funds from a scout's IBA toward a campout fee.
///
/// When `beneficiary_adult_id` is set, the scout's account funds that adult's
/// share: the payment counts toward the adult's paid total, not the scout's.
/// The balance check, decrement, and ledger entry are one atomic unit, and a
/// transfer that clears the sufficiency check is auto-approved.
pub async fn pay_from_iba(
    db: &DatabaseConnection,
    principal: &Principal,
    campout_id: i64,
    scout_id: i64,
    amount: Decimal,
    beneficiary_adult_id: Option<i64>,
) -> Result<transaction::Model> {
    access::ensure(principal, Action::PayFromIba)?;
    access::ensure_linked_to_scout(db, principal, scout_id).await?;
    validate_amount(amount)?;

    let campout = campout_ops::get_campout_required(db, campout_id).await?;
    campout_ops::ensure_accepts_entries(&campout)?;

    let txn = db.begin().await?;

    let description = if beneficiary_adult_id.is_some() {
        "Payment for Adult from IBA"
    } else {
        "Payment from IBA"
    };
    let mut entry = base_entry(
        principal,
        amount,
        TransactionType::CampTransfer,
        description.to_string(),
    );
    entry.status = Set(TransactionStatus::Approved);
    entry.approved_by = Set(Some(principal.user_id));
    entry.scout_id = Set(Some(scout_id));
    entry.beneficiary_id = Set(beneficiary_adult_id);
    entry.campout_id = Set(Some(campout_id));
    let model = entry.insert(&txn).await?;

    scout_ops::debit_iba_checked(&txn, scout_id, amount).await?;

    txn.commit().await?;

    info!(
        scout_id,
        campout_id,
        amount = %amount,
        beneficiary = ?beneficiary_adult_id,
        "IBA transfer recorded"
    );
    Ok(model)
}

/// Records a batch of IBA deposits (e.g. from a check-cashing night), one
/// ledger entry plus balance credit per scout, all in one atomic unit.
pub async fn bulk_iba_deposits(
    db: &DatabaseConnection,
    principal: &Principal,
    deposits: &[(i64, Decimal)],
    description: &str,
) -> Result<usize> {
    access::ensure(principal, Action::BulkDeposit)?;
    if deposits.is_empty() {
        return Err(Error::validation(
            "deposits",
            "At least one deposit is required",
        ));
    }
    if description.trim().is_empty() {
        return Err(Error::validation("description", "Description is required"));
    }
    for &(_, amount) in deposits {
        validate_amount(amount)?;
    }

    let txn = db.begin().await?;

    for &(scout_id, amount) in deposits {
        let mut entry = base_entry(
            principal,
            amount,
            TransactionType::IbaDeposit,
            description.to_string(),
        );
        entry.scout_id = Set(Some(scout_id));
        entry.insert(&txn).await?;

        scout_ops::credit_iba(&txn, scout_id, amount).await?;
    }

    txn.commit().await?;

    info!(count = deposits.len(), "bulk IBA deposits recorded");
    Ok(deposits.len())
}

/// Deletes a ledger entry that is not part of a protected chain.
///
/// Entries that moved IBA money (transfers, deposits, reclaims, scout-linked
/// fundraising credits) and reimbursements mirroring adult expenses are
/// protected: deleting them would orphan a balance mutation and break the
/// audit trail.
pub async fn delete_transaction(
    db: &DatabaseConnection,
    principal: &Principal,
    transaction_id: i64,
) -> Result<()> {
    access::ensure(principal, Action::DeleteTransaction)?;

    let model = Transaction::find_by_id(transaction_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            what: "Transaction",
        })?;

    let protected = matches!(
        model.tx_type,
        TransactionType::CampTransfer
            | TransactionType::IbaDeposit
            | TransactionType::IbaReclaim
            | TransactionType::Reimbursement
    ) || (model.tx_type == TransactionType::FundraisingIncome && model.scout_id.is_some());

    if protected && model.status == TransactionStatus::Approved {
        return Err(Error::invalid_state(
            "Cannot delete a transaction that is part of a settled ledger chain",
        ));
    }

    model.delete(db).await?;
    Ok(())
}

/// Retrieves all transactions for a campout, newest first.
pub async fn get_transactions_for_campout(
    db: &impl ConnectionTrait,
    campout_id: i64,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::CampoutId.eq(campout_id))
        .order_by_desc(transaction::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific transaction by its unique ID.
pub async fn get_transaction_by_id(
    db: &impl ConnectionTrait,
    transaction_id: i64,
) -> Result<Option<transaction::Model>> {
    Transaction::find_by_id(transaction_id)
        .one(db)
        .await
        .map_err(Into::into)
}
