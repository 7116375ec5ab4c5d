//! Authorization predicates over roles.

use crate::account::{Account, Role};

/// Whether `role` may create or manage any account.
pub fn can_manage_any(role: Role) -> bool {
    match role {
        Role::Admin => true,
        Role::Manager | Role::User => false,
    }
}

/// Whether `requester` may manage the account identified by `target_id`.
///
/// Admins manage everyone. Users only manage their own record. Managers are
/// not granted anything here.
pub fn can_manage_target(requester: &Account, target_id: i64) -> bool {
    match requester.role {
        Role::Admin => true,
        Role::User => requester.id == target_id,
        Role::Manager => false,
    }
}
