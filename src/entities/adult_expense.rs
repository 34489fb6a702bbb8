//! Adult expense entity - Out-of-pocket spending awaiting reimbursement.
//!
//! `is_reimbursed` is a one-way gate: once true the record is immutable.
//! Reimbursed expenses still count toward a campout's total cost; the
//! REIMBURSEMENT transaction is the payout mirror, not a second cost.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Adult expense database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "adult_expenses")]
pub struct Model {
    /// Unique identifier for the expense
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Campout the expense was incurred for
    pub campout_id: i64,
    /// Adult who paid out of pocket
    pub adult_id: i64,
    /// Amount in dollars
    pub amount: Decimal,
    /// What the money was spent on
    pub description: String,
    /// Whether the adult has been paid back
    pub is_reimbursed: bool,
}

/// Defines relationships between AdultExpense and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Campout the expense belongs to
    #[sea_orm(
        belongs_to = "super::campout::Entity",
        from = "Column::CampoutId",
        to = "super::campout::Column::Id"
    )]
    Campout,
    /// Adult who paid
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AdultId",
        to = "super::user::Column::Id"
    )]
    Adult,
}

impl Related<super::campout::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campout.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Adult.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
