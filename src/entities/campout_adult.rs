//! Campout-adult role join table.
//!
//! Role is part of the primary key, so an adult can hold ORGANIZER and
//! ATTENDEE simultaneously as two rows. Attendees owe a per-person share;
//! organizers do not unless they also hold an attendee row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role an adult holds for a specific campout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum CampoutAdultRole {
    /// Plans and runs the campout; reimbursed for upfront spending
    #[sea_orm(string_value = "ORGANIZER")]
    Organizer,
    /// Participates and owes a per-person share like a scout
    #[sea_orm(string_value = "ATTENDEE")]
    Attendee,
}

/// Campout adult role database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "campout_adults")]
pub struct Model {
    /// Campout the adult participates in
    #[sea_orm(primary_key, auto_increment = false)]
    pub campout_id: i64,
    /// Participating adult
    #[sea_orm(primary_key, auto_increment = false)]
    pub adult_id: i64,
    /// Role held for this campout
    #[sea_orm(primary_key, auto_increment = false)]
    pub role: CampoutAdultRole,
}

/// Defines relationships between CampoutAdult and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Campout side of the join
    #[sea_orm(
        belongs_to = "super::campout::Entity",
        from = "Column::CampoutId",
        to = "super::campout::Column::Id"
    )]
    Campout,
    /// Adult side of the join
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
