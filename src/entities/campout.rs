//! Campout entity - A troop event with its own cost pool and roster.
//!
//! The status column drives the settlement state machine:
//! OPEN → READY_FOR_PAYMENT → CLOSED, linear with no back-transitions.
//! Once CLOSED, no transaction or adult expense may reference the campout.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Settlement lifecycle state of a campout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
pub enum CampoutStatus {
    /// Accepting registrations and expenses
    #[sea_orm(string_value = "OPEN")]
    Open,
    /// Expenses finalized, collecting payments
    #[sea_orm(string_value = "READY_FOR_PAYMENT")]
    ReadyForPayment,
    /// Settled; no further ledger activity allowed
    #[sea_orm(string_value = "CLOSED")]
    Closed,
}

/// Campout database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "campouts")]
pub struct Model {
    /// Unique identifier for the campout
    #[sea_orm(primary_key)]
    pub id: i64,
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
    /// Lifecycle state
    pub status: CampoutStatus,
}

/// Defines relationships between Campout and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Ledger entries charged against this campout
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
    /// Reimbursable out-of-pocket expenses
    #[sea_orm(has_many = "super::adult_expense::Entity")]
    AdultExpenses,
    /// Registered scouts
    #[sea_orm(has_many = "super::campout_scout::Entity")]
    ScoutRegistrations,
    /// Adult role rows (organizer/attendee)
    #[sea_orm(has_many = "super::campout_adult::Entity")]
    AdultRoles,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::adult_expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AdultExpenses.def()
    }
}

impl Related<super::campout_scout::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ScoutRegistrations.def()
    }
}

impl Related<super::campout_adult::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AdultRoles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
