//! Fundraising campaigns and the scout revenue split.
//!
//! A campaign carries an IBA percentage: that share of any scout-attributed
//! campaign income is credited to the scout's account, rounded half-up to
//! cents. The credit rides in the same atomic unit as the income entry, so
//! the ledger and the balances never disagree about a sale.

use crate::{
    core::{
        access::{self, Action, Principal},
        scout as scout_ops, transaction as tx_ops,
    },
    entities::{
        FundraisingCampaign, fundraising_campaign,
        fundraising_campaign::FundraisingStatus,
        transaction::{TransactionStatus, TransactionType},
    },
    errors::{Error, Result},
};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, warn};

/// Input for creating a fundraising campaign.
#[derive(Debug, Clone)]
pub struct NewCampaign {
    /// Campaign name
    pub name: String,
    /// When the campaign starts
    pub start_date: DateTimeUtc,
    /// When the campaign ends, if scheduled
    pub end_date: Option<DateTimeUtc>,
    /// Fundraising goal in dollars
    pub goal: Decimal,
    /// Percentage (0-100) of scout-linked income credited to the scout's IBA
    pub iba_percentage: i32,
}

/// Creates a campaign in the ACTIVE state.
///
/// Splits above 30% are unusual for council-compliant fundraisers and get a
/// warning in the log, but are not rejected; compliance sign-off is tracked
/// separately via [`set_compliance_approved`].
pub async fn create_campaign(
    db: &DatabaseConnection,
    principal: &Principal,
    new: NewCampaign,
) -> Result<fundraising_campaign::Model> {
    access::ensure(principal, Action::ManageFundraising)?;

    if new.name.trim().is_empty() {
        return Err(Error::validation("name", "Campaign name cannot be empty"));
    }
    if !(0..=100).contains(&new.iba_percentage) {
        return Err(Error::validation(
            "iba_percentage",
            "IBA percentage must be between 0 and 100",
        ));
    }
    if new.goal < Decimal::ZERO {
        return Err(Error::validation("goal", "Goal cannot be negative"));
    }
    if new.iba_percentage > 30 {
        warn!(
            iba_percentage = new.iba_percentage,
            "campaign IBA split exceeds the customary 30%"
        );
    }

    let model = fundraising_campaign::ActiveModel {
        name: Set(new.name.trim().to_string()),
        start_date: Set(new.start_date),
        end_date: Set(new.end_date),
        goal: Set(new.goal),
        status: Set(FundraisingStatus::Active),
        iba_percentage: Set(new.iba_percentage),
        is_compliance_approved: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(campaign_id = model.id, name = %model.name, "campaign created");
    Ok(model)
}

/// Finds a campaign by its unique ID.
pub async fn get_campaign_by_id(
    db: &impl ConnectionTrait,
    campaign_id: i64,
) -> Result<Option<fundraising_campaign::Model>> {
    FundraisingCampaign::find_by_id(campaign_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a campaign and rejects it unless it is still ACTIVE.
pub async fn get_open_campaign(
    db: &impl ConnectionTrait,
    campaign_id: i64,
) -> Result<fundraising_campaign::Model> {
    let campaign = get_campaign_by_id(db, campaign_id)
        .await?
        .ok_or(Error::NotFound { what: "Campaign" })?;
    if campaign.status == FundraisingStatus::Closed {
        return Err(Error::invalid_state(
            "Campaign is closed to new transactions",
        ));
    }
    Ok(campaign)
}

/// Retrieves all campaigns, most recent first.
pub async fn get_campaigns(db: &DatabaseConnection) -> Result<Vec<fundraising_campaign::Model>> {
    FundraisingCampaign::find()
        .order_by_desc(fundraising_campaign::Column::StartDate)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Flips a campaign between ACTIVE and CLOSED.
pub async fn toggle_campaign_status(
    db: &DatabaseConnection,
    principal: &Principal,
    campaign_id: i64,
) -> Result<fundraising_campaign::Model> {
    access::ensure(principal, Action::ManageFundraising)?;

    let campaign = get_campaign_by_id(db, campaign_id)
        .await?
        .ok_or(Error::NotFound { what: "Campaign" })?;
    let next = match campaign.status {
        FundraisingStatus::Active => FundraisingStatus::Closed,
        FundraisingStatus::Closed => FundraisingStatus::Active,
    };

    let mut active: fundraising_campaign::ActiveModel = campaign.into();
    active.status = Set(next);
    Ok(active.update(db).await?)
}

/// Records council compliance sign-off for a campaign.
pub async fn set_compliance_approved(
    db: &DatabaseConnection,
    principal: &Principal,
    campaign_id: i64,
    approved: bool,
) -> Result<fundraising_campaign::Model> {
    access::ensure(principal, Action::ManageFundraising)?;

    let campaign = get_campaign_by_id(db, campaign_id)
        .await?
        .ok_or(Error::NotFound { what: "Campaign" })?;
    let mut active: fundraising_campaign::ActiveModel = campaign.into();
    active.is_compliance_approved = Set(approved);
    Ok(active.update(db).await?)
}

/// Computes the scout's share of a campaign sale: `amount * pct / 100`,
/// rounded half-up to cents.
#[must_use]
pub fn iba_share(campaign: &fundraising_campaign::Model, amount: Decimal) -> Decimal {
    (amount * Decimal::from(campaign.iba_percentage) / Decimal::from(100))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Credits a scout's IBA with their split of a campaign sale. Must run inside
/// the same transaction as the income entry it derives from. A zero split is
/// a no-op.
pub async fn apply_iba_split<C>(
    db: &C,
    campaign: &fundraising_campaign::Model,
    scout_id: i64,
    amount: Decimal,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let share = iba_share(campaign, amount);
    if share <= Decimal::ZERO {
        return Ok(());
    }
    scout_ops::credit_iba(db, scout_id, share).await
}

/// One scout's (or external payee's) share of a campaign distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// Scout receiving an IBA credit, or `None` for an external payout
    pub scout_id: Option<i64>,
    /// Dollar amount allocated
    pub amount: Decimal,
    /// What the allocation is for
    pub description: String,
}

/// Distributes a campaign's proceeds in one atomic unit.
///
/// Writes the total as a single FUNDRAISING_INCOME entry, credits each scout
/// allocation to their IBA with a matching scout-linked income entry, records
/// external allocations as EXPENSE entries, and finishes with one EXPENSE for
/// the sum moved into scout accounts so the troop-level ledger stays
/// balanced.
pub async fn distribute_campaign(
    db: &DatabaseConnection,
    principal: &Principal,
    campaign_id: i64,
    total: Decimal,
    allocations: Vec<Allocation>,
) -> Result<()> {
    access::ensure(principal, Action::ManageFundraising)?;
    tx_ops::validate_amount(total)?;

    let campaign = get_open_campaign(db, campaign_id).await?;
    let allocated: Decimal = allocations.iter().map(|a| a.amount).sum();
    if allocated > total {
        return Err(Error::validation(
            "allocations",
            "Allocations exceed the distribution total",
        ));
    }
    for alloc in &allocations {
        tx_ops::validate_amount(alloc.amount)?;
    }

    let txn = db.begin().await?;

    let mut income = tx_ops::base_entry(
        principal,
        total,
        TransactionType::FundraisingIncome,
        format!("Fundraising proceeds: {}", campaign.name),
    );
    income.status = Set(TransactionStatus::Approved);
    income.approved_by = Set(Some(principal.user_id));
    income.campaign_id = Set(Some(campaign.id));
    income.insert(&txn).await?;

    let mut scout_total = Decimal::ZERO;
    for alloc in allocations {
        match alloc.scout_id {
            Some(scout_id) => {
                scout_ops::credit_iba(&txn, scout_id, alloc.amount).await?;
                scout_total += alloc.amount;

                let mut credit = tx_ops::base_entry(
                    principal,
                    alloc.amount,
                    TransactionType::FundraisingIncome,
                    alloc.description,
                );
                credit.status = Set(TransactionStatus::Approved);
                credit.approved_by = Set(Some(principal.user_id));
                credit.scout_id = Set(Some(scout_id));
                credit.campaign_id = Set(Some(campaign.id));
                credit.insert(&txn).await?;
            }
            None => {
                let mut payout = tx_ops::base_entry(
                    principal,
                    alloc.amount,
                    TransactionType::Expense,
                    alloc.description,
                );
                payout.status = Set(TransactionStatus::Approved);
                payout.approved_by = Set(Some(principal.user_id));
                payout.campaign_id = Set(Some(campaign.id));
                payout.insert(&txn).await?;
            }
        }
    }

    if scout_total > Decimal::ZERO {
        let mut offset = tx_ops::base_entry(
            principal,
            scout_total,
            TransactionType::Expense,
            format!("Distribution to scout accounts: {}", campaign.name),
        );
        offset.status = Set(TransactionStatus::Approved);
        offset.approved_by = Set(Some(principal.user_id));
        offset.campaign_id = Set(Some(campaign.id));
        offset.insert(&txn).await?;
    }

    txn.commit().await?;

    info!(
        campaign_id,
        total = %total,
        to_scouts = %scout_total,
        "campaign distributed"
    );
    Ok(())
}
