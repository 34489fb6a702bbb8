//! Scout entity - Youth roster members with Individual Budget Accounts.
//!
//! `iba_balance` is owned by the ledger layer: it is only ever written inside
//! the same database transaction as the ledger entry that justifies the
//! change. Scouts referenced by transactions are never hard-deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Roster status for a scout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ScoutStatus {
    /// Currently on the roster
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    /// Left the troop; record retained for ledger history
    #[sea_orm(string_value = "INACTIVE")]
    Inactive,
}

/// Scout database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "scouts")]
pub struct Model {
    /// Unique identifier for the scout
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Scout's name
    pub name: String,
    /// Linked user account, if the scout has a login
    pub user_id: Option<i64>,
    /// Roster status
    pub status: ScoutStatus,
    /// Individual Budget Account balance in dollars
    pub iba_balance: Decimal,
}

/// Defines relationships between Scout and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Ledger entries funded by or credited to this scout
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
    /// Campout registrations
    #[sea_orm(has_many = "super::campout_scout::Entity")]
    Registrations,
    /// Parents authorized to act for this scout
    #[sea_orm(has_many = "super::parent_scout::Entity")]
    ParentLinks,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::campout_scout::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Registrations.def()
    }
}

impl Related<super::parent_scout::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ParentLinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
