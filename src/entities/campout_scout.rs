//! Campout-scout registration join table.
//!
//! The composite primary key doubles as the uniqueness constraint, so a
//! duplicate registration surfaces as a database conflict.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Campout registration database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "campout_scouts")]
pub struct Model {
    /// Campout the scout is registered for
    #[sea_orm(primary_key, auto_increment = false)]
    pub campout_id: i64,
    /// Registered scout
    #[sea_orm(primary_key, auto_increment = false)]
    pub scout_id: i64,
}

/// Defines relationships between CampoutScout and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Campout side of the join
    #[sea_orm(
        belongs_to = "super::campout::Entity",
        from = "Column::CampoutId",
        to = "super::campout::Column::Id"
    )]
    Campout,
    /// Scout side of the join
    #[sea_orm(
        belongs_to = "super::scout::Entity",
        from = "Column::ScoutId",
        to = "super::scout::Column::Id"
    )]
    Scout,
}

impl Related<super::campout::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campout.def()
    }
}

impl Related<super::scout::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Scout.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
