//! Parent-scout authorization link.
//!
//! A row authorizes the parent to act on the scout's behalf (payments,
//! balance visibility) and makes the scout's IBA a funding source for the
//! parent's own campout fees during batch collection.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Parent-scout link database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parent_scouts")]
pub struct Model {
    /// Parent-role user
    #[sea_orm(primary_key, auto_increment = false)]
    pub parent_id: i64,
    /// Scout the parent may act for
    #[sea_orm(primary_key, auto_increment = false)]
    pub scout_id: i64,
}

/// Defines relationships between ParentScout and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Parent side of the link
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ParentId",
        to = "super::user::Column::Id"
    )]
    Parent,
    /// Scout side of the link
    #[sea_orm(
        belongs_to = "super::scout::Entity",
        from = "Column::ScoutId",
        to = "super::scout::Column::Id"
    )]
    Scout,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Parent.def()
    }
}

impl Related<super::scout::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Scout.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
