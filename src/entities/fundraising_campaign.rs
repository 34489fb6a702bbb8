//! Fundraising campaign entity.
//!
//! `iba_percentage` is the scout revenue split: that share of campaign income
//! recorded against a scout is credited to their IBA.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether a campaign still accepts income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum FundraisingStatus {
    /// Accepting income
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    /// No further transactions may reference the campaign
    #[sea_orm(string_value = "CLOSED")]
    Closed,
}

/// Fundraising campaign database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fundraising_campaigns")]
pub struct Model {
    /// Unique identifier for the campaign
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Campaign name
    pub name: String,
    /// When the campaign starts
    pub start_date: DateTimeUtc,
    /// When the campaign ends, if scheduled
    pub end_date: Option<DateTimeUtc>,
    /// Fundraising goal in dollars
    pub goal: Decimal,
    /// Whether the campaign still accepts income
    pub status: FundraisingStatus,
    /// Percentage (0-100) of scout-linked income credited to the scout's IBA
    pub iba_percentage: i32,
    /// Council compliance sign-off
    pub is_compliance_approved: bool,
}

/// Defines relationships between FundraisingCampaign and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Income recorded against this campaign
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
