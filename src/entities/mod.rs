//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod adult_expense;
pub mod campout;
pub mod campout_adult;
pub mod campout_scout;
pub mod fundraising_campaign;
pub mod parent_scout;
pub mod scout;
pub mod transaction;
pub mod user;

// Re-export specific types to avoid conflicts
pub use adult_expense::{
    Column as AdultExpenseColumn, Entity as AdultExpense, Model as AdultExpenseModel,
};
pub use campout::{Column as CampoutColumn, Entity as Campout, Model as CampoutModel};
pub use campout_adult::{
    Column as CampoutAdultColumn, Entity as CampoutAdult, Model as CampoutAdultModel,
};
pub use campout_scout::{
    Column as CampoutScoutColumn, Entity as CampoutScout, Model as CampoutScoutModel,
};
pub use fundraising_campaign::{
    Column as FundraisingCampaignColumn, Entity as FundraisingCampaign,
    Model as FundraisingCampaignModel,
};
pub use parent_scout::{
    Column as ParentScoutColumn, Entity as ParentScout, Model as ParentScoutModel,
};
pub use scout::{Column as ScoutColumn, Entity as Scout, Model as ScoutModel};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
