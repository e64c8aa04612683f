//! # nisdesk-guard — Membership Guard Engine
//!
//! Pure decision functions that authorize or reject a proposed role change
//! or activation toggle on a membership. The engine receives snapshots of
//! the acting and target memberships plus a count of *other* active owners
//! in the organisation (excluding the target); it performs no storage
//! access and has no side effects. Applying an accepted mutation — and
//! doing so atomically with the owner count it was checked against — is
//! the caller's responsibility.
//!
//! ## Rule order
//!
//! Self-action checks take precedence over last-owner checks: when an
//! owner tries to demote themselves while also being the last owner, the
//! reported reason is the self-lowering one.
//!
//! Both guards are value-idempotent: proposing the current role or the
//! current active flag is evaluated by the same rules and accepted when
//! they pass — rejections depend only on hierarchy and the owner
//! invariant, never on the value being unchanged.

use thiserror::Error;

use nisdesk_core::{MembershipSnapshot, OrgRole};

/// A policy rejection. Every variant carries the user-facing reason the
/// HTTP layer surfaces verbatim; none of these are faults, and all are
/// recoverable by choosing a different action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("Only owners can perform this action.")]
    NotOwner,

    #[error("You can't lower your own role.")]
    SelfDemotion,

    #[error("You can't deactivate your own account in this organisation.")]
    SelfDeactivation,

    #[error("You can't demote the last owner in this organisation.")]
    LastOwnerDemotion,

    #[error("You can't deactivate the last owner in this organisation.")]
    LastOwnerDeactivation,
}

fn ensure_acting_owner(actor: &MembershipSnapshot) -> Result<(), GuardError> {
    if actor.is_acting_owner() {
        Ok(())
    } else {
        Err(GuardError::NotOwner)
    }
}

/// Whether the target is the organisation's last active owner, given the
/// count of other active owners (excluding the target).
fn is_last_active_owner(target: &MembershipSnapshot, other_active_owners: usize) -> bool {
    target.role == OrgRole::Owner && target.is_active && other_active_owners == 0
}

/// Authorize a role change on `target` requested by `actor`.
///
/// `other_active_owners` is the number of active owner memberships in the
/// organisation *excluding the target*, read in the same atomic scope that
/// will apply the change.
///
/// # Errors
///
/// - [`GuardError::NotOwner`] unless the actor is an active owner;
/// - [`GuardError::SelfDemotion`] when the actor lowers their own role;
/// - [`GuardError::LastOwnerDemotion`] when the change would demote the
///   organisation's last active owner.
pub fn guard_role_change(
    actor: &MembershipSnapshot,
    target: &MembershipSnapshot,
    new_role: OrgRole,
    other_active_owners: usize,
) -> Result<(), GuardError> {
    ensure_acting_owner(actor)?;

    let lowering = new_role < target.role;

    if actor.same_user(target) && lowering {
        return Err(GuardError::SelfDemotion);
    }

    if lowering
        && target.role == OrgRole::Owner
        && is_last_active_owner(target, other_active_owners)
    {
        return Err(GuardError::LastOwnerDemotion);
    }

    // Upgrades and no-op changes are accepted.
    Ok(())
}

/// Authorize an activation toggle on `target` requested by `actor`.
///
/// Reactivation is always permitted once the actor-is-owner check passes.
///
/// # Errors
///
/// - [`GuardError::NotOwner`] unless the actor is an active owner;
/// - [`GuardError::SelfDeactivation`] when the actor deactivates their own
///   membership;
/// - [`GuardError::LastOwnerDeactivation`] when deactivation would remove
///   the organisation's last active owner.
pub fn guard_toggle_active(
    actor: &MembershipSnapshot,
    target: &MembershipSnapshot,
    new_active: bool,
    other_active_owners: usize,
) -> Result<(), GuardError> {
    ensure_acting_owner(actor)?;

    if new_active {
        return Ok(());
    }

    if actor.same_user(target) {
        return Err(GuardError::SelfDeactivation);
    }

    if is_last_active_owner(target, other_active_owners) {
        return Err(GuardError::LastOwnerDeactivation);
    }

    Ok(())
}
