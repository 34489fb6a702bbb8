//! Access guard - authorization predicate consulted by every mutating operation.
//!
//! The role matrix is a pure function so it can be tested without a database;
//! ownership checks (parents acting for linked scouts, scouts acting for their
//! own record) go through [`ensure_linked_to_scout`]. Operations call the
//! guard before reading any mutable state so unauthorized callers learn
//! nothing about resource existence or amounts.

use crate::{
    entities::{ParentScout, Scout, parent_scout, user::Role},
    errors::{Error, Result},
};
use sea_orm::prelude::*;

/// The authenticated caller, as supplied by the external identity oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    /// User id of the authenticated account
    pub user_id: i64,
    /// Role attached to the account
    pub role: Role,
}

impl Principal {
    /// Convenience constructor.
    #[must_use]
    pub const fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Whether transactions created by this principal are auto-approved.
    #[must_use]
    pub const fn auto_approves(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Financier)
    }
}

/// Every mutating operation the core exposes, for role-matrix checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Create scouts/campouts, register participants, assign adult roles
    ManageRoster,
    /// Record a general ledger transaction
    RecordTransaction,
    /// Record a manual (cash) event payment
    RecordPayment,
    /// Transfer from a scout's IBA to a campout
    PayFromIba,
    /// Log a direct troop expense against a campout
    LogTroopExpense,
    /// Log a reimbursable out-of-pocket adult expense
    LogAdultExpense,
    /// Delete an unprotected ledger entry
    DeleteTransaction,
    /// Move a campout from OPEN to READY_FOR_PAYMENT
    FinalizeCampout,
    /// Batch-collect dues from scout IBAs
    CollectIba,
    /// Reimburse organizers for a campout
    PayoutOrganizers,
    /// Move a campout to CLOSED
    CloseCampout,
    /// Approve a single adult expense for reimbursement
    ApproveReimbursement,
    /// Create or toggle fundraising campaigns, run distributions
    ManageFundraising,
    /// Bulk-record IBA deposits
    BulkDeposit,
}

/// Pure role-matrix predicate: may `principal` perform `action` at all?
///
/// Ownership-scoped refinements (a parent acting only for linked scouts) are
/// layered on top via [`ensure_linked_to_scout`].
#[must_use]
pub fn can_act(principal: &Principal, action: Action) -> bool {
    use Action as A;
    match principal.role {
        Role::Admin | Role::Financier => true,
        Role::Leader => matches!(
            action,
            A::ManageRoster
                | A::RecordTransaction
                | A::RecordPayment
                | A::PayFromIba
                | A::LogTroopExpense
                | A::LogAdultExpense
                | A::DeleteTransaction
                | A::FinalizeCampout
        ),
        Role::Parent => matches!(
            action,
            A::RecordTransaction | A::PayFromIba | A::LogAdultExpense
        ),
        Role::Scout => matches!(action, A::PayFromIba),
    }
}

/// Returns `Unauthorized` unless the role matrix allows the action.
pub fn ensure(principal: &Principal, action: Action) -> Result<()> {
    if can_act(principal, action) {
        Ok(())
    } else {
        Err(Error::Unauthorized)
    }
}

/// Verifies the principal may act on behalf of a specific scout.
///
/// Elevated roles pass unconditionally. A PARENT must hold a `ParentScout`
/// link to the scout; a SCOUT must be the linked user of the scout record.
/// The error carries no scout detail.
pub async fn ensure_linked_to_scout(
    db: &impl ConnectionTrait,
    principal: &Principal,
    scout_id: i64,
) -> Result<()> {
    match principal.role {
        Role::Admin | Role::Financier | Role::Leader => Ok(()),
        Role::Parent => {
            let link = ParentScout::find()
                .filter(parent_scout::Column::ParentId.eq(principal.user_id))
                .filter(parent_scout::Column::ScoutId.eq(scout_id))
                .one(db)
                .await?;
            if link.is_some() {
                Ok(())
            } else {
                Err(Error::Unauthorized)
            }
        }
        Role::Scout => {
            let scout = Scout::find_by_id(scout_id).one(db).await?;
            match scout {
                Some(s) if s.user_id == Some(principal.user_id) => Ok(()),
                _ => Err(Error::Unauthorized),
            }
        }
    }
}
