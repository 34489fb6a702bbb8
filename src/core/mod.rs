//! Core business logic - framework-agnostic ledger, roster, and settlement
//! operations.
//!
//! Everything in here takes a database connection plus an authenticated
//! [`access::Principal`] and returns structured results; no rendering or
//! session handling. All balance-affecting writes pair a ledger entry with
//! the balance update inside one database transaction.

pub mod access;
pub mod campout;
pub mod fundraising;
pub mod scout;
pub mod settlement;
pub mod transaction;

use serde::{Deserialize, Serialize};

/// A participant account a payment can be attributed to: either a scout
/// (identified by roster id) or an adult (identified by user id).
///
/// Using a tagged variant instead of two optional foreign keys makes payment
/// attribution a total function: a scout paying their own share and a scout's
/// IBA funding an adult's share can never be confused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountRef {
    /// A scout, paying (or being paid for) their own share
    Scout(i64),
    /// An adult attendee, whose share may be funded by cash or a linked scout's IBA
    Adult(i64),
}
