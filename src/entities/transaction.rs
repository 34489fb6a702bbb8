//! Transaction entity - The immutable financial ledger.
//!
//! Amounts are always positive; `tx_type` encodes direction (income vs
//! expense). `scout_id` names the funding source and `beneficiary_id` the
//! adult whose fee a payment covers. A payment with both set is a scout's IBA
//! funding an adult's share, and counts toward the adult's paid total only.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of ledger entry.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
pub enum TransactionType {
    /// Troop money going out
    #[default]
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
    /// Payout mirroring an adult's out-of-pocket expense
    #[sea_orm(string_value = "REIMBURSEMENT")]
    Reimbursement,
    /// Internal transfer from a scout's IBA to a campout
    #[sea_orm(string_value = "CAMP_TRANSFER")]
    CampTransfer,
    /// Registration fee income
    #[sea_orm(string_value = "REGISTRATION_INCOME")]
    RegistrationIncome,
    /// Manual/cash event fee payment
    #[sea_orm(string_value = "EVENT_PAYMENT")]
    EventPayment,
    /// Income from a fundraising campaign
    #[sea_orm(string_value = "FUNDRAISING_INCOME")]
    FundraisingIncome,
    /// Annual dues income
    #[sea_orm(string_value = "DUES")]
    Dues,
    /// Deposit into a scout's IBA
    #[sea_orm(string_value = "IBA_DEPOSIT")]
    IbaDeposit,
    /// Funds reclaimed from an IBA back to the troop
    #[sea_orm(string_value = "IBA_RECLAIM")]
    IbaReclaim,
    /// Donation received
    #[sea_orm(string_value = "DONATION_IN")]
    DonationIn,
}

impl TransactionType {
    /// Whether this entry adds money to the troop ledger (true) or removes
    /// it (false) when summing signed ledger totals.
    #[must_use]
    pub const fn is_income(self) -> bool {
        match self {
            Self::Expense | Self::Reimbursement => false,
            Self::CampTransfer
            | Self::RegistrationIncome
            | Self::EventPayment
            | Self::FundraisingIncome
            | Self::Dues
            | Self::IbaDeposit
            | Self::IbaReclaim
            | Self::DonationIn => true,
        }
    }
}

/// Approval status of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum TransactionStatus {
    /// Awaiting approval by an elevated role
    #[sea_orm(string_value = "PENDING")]
    Pending,
    /// Counted in all balances and totals
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    /// Declined; retained for audit only
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Amount in dollars, always positive; `tx_type` carries the direction
    pub amount: Decimal,
    /// Kind of ledger entry
    pub tx_type: TransactionType,
    /// Human-readable description
    pub description: String,
    /// When the transaction was created
    pub created_at: DateTimeUtc,
    /// Approval status
    pub status: TransactionStatus,
    /// Funding scout, when a scout's money is involved
    pub scout_id: Option<i64>,
    /// Adult whose fee this payment covers, when distinct from the funding scout
    pub beneficiary_id: Option<i64>,
    /// Campout this entry is charged against
    pub campout_id: Option<i64>,
    /// Budget category link (managed outside the ledger core)
    pub budget_category_id: Option<i64>,
    /// Fundraising campaign link
    pub campaign_id: Option<i64>,
    /// User who approved the entry
    pub approved_by: Option<i64>,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Funding scout
    #[sea_orm(
        belongs_to = "super::scout::Entity",
        from = "Column::ScoutId",
        to = "super::scout::Column::Id"
    )]
    Scout,
    /// Campout the entry is charged against
    #[sea_orm(
        belongs_to = "super::campout::Entity",
        from = "Column::CampoutId",
        to = "super::campout::Column::Id"
    )]
    Campout,
    /// Fundraising campaign link
    #[sea_orm(
        belongs_to = "super::fundraising_campaign::Entity",
        from = "Column::CampaignId",
        to = "super::fundraising_campaign::Column::Id"
    )]
    Campaign,
}

impl Related<super::scout::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Scout.def()
    }
}

impl Related<super::campout::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campout.def()
    }
}

impl Related<super::fundraising_campaign::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaign.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
