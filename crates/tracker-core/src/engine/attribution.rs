//! Attribution engine - infers which invite produced a join
//!
//! The remote service never says which invite a member used. The only
//! evidence is how the invite listing changed between two observations:
//!
//! 1. an invite present in both listings whose `uses` went up, or
//! 2. a limited invite on its last use that vanished (consumed and
//!    auto-deleted by the remote service), or
//! 3. the vanity URL counter going up.
//!
//! Everything here is pure: inputs are borrowed and never modified.

use std::collections::{HashMap, HashSet};

use crate::entities::{Attribution, InviteSnapshot, UnknownReason, VanitySnapshot};
use crate::error::DomainError;

/// Diff two observations and attribute one join.
///
/// When several invites moved between observations (two joins raced past
/// one refresh) the first candidate in fetch order wins and the result is
/// flagged `ambiguous`.
///
/// # Errors
/// `ValidationError` for malformed snapshots: negative counters, empty or
/// duplicate codes.
pub fn attribute(
    old: &[InviteSnapshot],
    current: &[InviteSnapshot],
    vanity_old: Option<&VanitySnapshot>,
    vanity_current: Option<&VanitySnapshot>,
) -> Result<Attribution, DomainError> {
    validate_invites(old, "previous")?;
    validate_invites(current, "current")?;
    validate_vanity(vanity_old)?;
    validate_vanity(vanity_current)?;

    let previous: HashMap<&str, &InviteSnapshot> =
        old.iter().map(|invite| (invite.code.as_str(), invite)).collect();

    // Step 1: invites that are still listed and gained uses
    let mut candidates: Vec<&InviteSnapshot> = current
        .iter()
        .filter(|invite| {
            previous
                .get(invite.code.as_str())
                .is_some_and(|before| invite.uses > before.uses)
        })
        .collect();

    // Step 2: limited invites on their last use that disappeared
    if candidates.is_empty() {
        let listed: HashSet<&str> = current.iter().map(|invite| invite.code.as_str()).collect();
        candidates = old
            .iter()
            .filter(|invite| !listed.contains(invite.code.as_str()) && invite.is_on_last_use())
            .collect();
    }

    if let Some(first) = candidates.first() {
        return Ok(Attribution::Normal {
            code: first.code.clone(),
            inviter_id: first.inviter_id.or_else(|| {
                previous
                    .get(first.code.as_str())
                    .and_then(|before| before.inviter_id)
            }),
            ambiguous: candidates.len() > 1,
        });
    }

    // Step 3: vanity URL
    if let (Some(before), Some(after)) = (vanity_old, vanity_current) {
        if after.uses > before.uses {
            return Ok(Attribution::Vanity {
                code: after.code.clone(),
            });
        }
    }

    Ok(Attribution::unknown(UnknownReason::NoCandidate))
}

/// Number of invites that would have matched in steps 1-2.
///
/// Used for reporting how ambiguous an attribution was.
pub fn candidate_count(old: &[InviteSnapshot], current: &[InviteSnapshot]) -> usize {
    let previous: HashMap<&str, i32> =
        old.iter().map(|invite| (invite.code.as_str(), invite.uses)).collect();

    let moved = current
        .iter()
        .filter(|invite| {
            previous
                .get(invite.code.as_str())
                .is_some_and(|&uses| invite.uses > uses)
        })
        .count();

    if moved > 0 {
        return moved;
    }

    let listed: HashSet<&str> = current.iter().map(|invite| invite.code.as_str()).collect();
    old.iter()
        .filter(|invite| !listed.contains(invite.code.as_str()) && invite.is_on_last_use())
        .count()
}

/// Codes whose `uses` went down between two observations.
///
/// A living invite's counter never decreases, so any hit means the remote
/// service recycled a code or one of the listings is stale.
pub fn uses_regressions<'a>(old: &[InviteSnapshot], current: &'a [InviteSnapshot]) -> Vec<&'a str> {
    let previous: HashMap<&str, i32> =
        old.iter().map(|invite| (invite.code.as_str(), invite.uses)).collect();

    current
        .iter()
        .filter(|invite| {
            previous
                .get(invite.code.as_str())
                .is_some_and(|&uses| invite.uses < uses)
        })
        .map(|invite| invite.code.as_str())
        .collect()
}

fn validate_invites(invites: &[InviteSnapshot], which: &str) -> Result<(), DomainError> {
    let mut seen = HashSet::with_capacity(invites.len());
    for invite in invites {
        if invite.code.is_empty() {
            return Err(DomainError::validation(format!("{which} snapshot has an empty invite code")));
        }
        if invite.uses < 0 || invite.max_uses < 0 {
            return Err(DomainError::validation(format!(
                "{which} snapshot has negative counters for invite {}",
                invite.code
            )));
        }
        if !seen.insert(invite.code.as_str()) {
            return Err(DomainError::validation(format!(
                "{which} snapshot lists invite {} twice",
                invite.code
            )));
        }
    }
    Ok(())
}

fn validate_vanity(vanity: Option<&VanitySnapshot>) -> Result<(), DomainError> {
    match vanity {
        Some(v) if v.uses < 0 => Err(DomainError::validation(format!(
            "vanity {} has negative uses",
            v.code
        ))),
        _ => Ok(()),
    }
}
