//! User entity - Adult account holders (leaders, parents, financiers).
//!
//! Users carry the role consulted by the access guard. Scout-role users are
//! linked one-to-one from the scout roster via `scout.user_id`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Application role attached to an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Role {
    /// Full access to every operation
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    /// All financial mutations
    #[sea_orm(string_value = "FINANCIER")]
    Financier,
    /// Campout and roster mutations, no settings
    #[sea_orm(string_value = "LEADER")]
    Leader,
    /// Mutations scoped to linked scouts only
    #[sea_orm(string_value = "PARENT")]
    Parent,
    /// Read-only plus self-initiated IBA payments
    #[sea_orm(string_value = "SCOUT")]
    Scout,
}

/// User database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Role used for authorization decisions
    pub role: Role,
    /// Deactivated accounts keep their history but cannot act
    pub is_active: bool,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Expenses this adult paid out of pocket
    #[sea_orm(has_many = "super::adult_expense::Entity")]
    AdultExpenses,
    /// Campout role rows for this adult
    #[sea_orm(has_many = "super::campout_adult::Entity")]
    CampoutRoles,
    /// Parent-scout authorization links
    #[sea_orm(has_many = "super::parent_scout::Entity")]
    ParentLinks,
}

impl Related<super::adult_expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AdultExpenses.def()
    }
}

impl Related<super::campout_adult::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CampoutRoles.def()
    }
}

impl Related<super::parent_scout::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ParentLinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
