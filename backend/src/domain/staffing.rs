//! Mechanic assignment rules.
//!
//! Every open ticket keeps at least one assigned mechanic. The planners here
//! are pure: adapters evaluate them against rows read under lock and persist
//! the outcome only when they succeed.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use super::error::Error;
use super::identity::Mechanic;
use super::ids::{MechanicId, TicketId};
use super::ticket::MechanicChanges;

const LAST_MECHANIC_MESSAGE: &str =
    "Cannot remove the last mechanic from service ticket; at least one must remain.";

/// Compute the mechanic set after applying `changes` to `current`.
///
/// Additions skip ids not in `known` and ids already assigned. Removals skip
/// ids that are not assigned; each remaining removal requires at least two
/// mechanics to be assigned at that point. The first removal that would
/// empty the set rejects the whole request.
///
/// # Examples
/// ```
/// use std::collections::BTreeSet;
///
/// use mechanic_shop::domain::staffing::plan_assignment;
/// use mechanic_shop::domain::{ErrorCode, MechanicChanges, MechanicId};
///
/// let current = BTreeSet::from([MechanicId::new(1)]);
/// let changes = MechanicChanges { add: vec![], remove: vec![MechanicId::new(1)] };
/// let err = plan_assignment(&current, &changes, &BTreeSet::new()).unwrap_err();
/// assert_eq!(err.code(), ErrorCode::LastMechanicViolation);
/// ```
pub fn plan_assignment(
    current: &BTreeSet<MechanicId>,
    changes: &MechanicChanges,
    known: &BTreeSet<MechanicId>,
) -> Result<BTreeSet<MechanicId>, Error> {
    let mut next = current.clone();
    for id in changes.add.iter().filter(|id| known.contains(id)) {
        next.insert(*id);
    }
    for id in &changes.remove {
        if !next.contains(id) {
            continue;
        }
        if next.len() < 2 {
            return Err(Error::last_mechanic(LAST_MECHANIC_MESSAGE));
        }
        next.remove(id);
    }
    Ok(next)
}

/// Reject deleting `mechanic` while they are the sole mechanic on a ticket.
///
/// `assignments` lists each ticket the mechanic is assigned to together with
/// that ticket's current mechanic count.
pub fn ensure_mechanic_removable(
    mechanic: MechanicId,
    assignments: &[(TicketId, usize)],
) -> Result<(), Error> {
    match assignments.iter().find(|(_, count)| *count <= 1) {
        Some((ticket, _)) => Err(Error::would_orphan_ticket(format!(
            "Mechanic {mechanic} is the only mechanic assigned to service ticket {ticket}"
        ))),
        None => Ok(()),
    }
}

/// A mechanic paired with the number of tickets assigned to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MechanicLoad {
    /// The mechanic.
    pub mechanic: Mechanic,
    /// Number of open tickets assigned.
    pub ticket_count: u64,
}

/// Order mechanics by descending ticket count, breaking ties by ascending id.
#[must_use]
pub fn rank_by_load(mut loads: Vec<MechanicLoad>) -> Vec<MechanicLoad> {
    loads.sort_by_key(|load| (Reverse(load.ticket_count), load.mechanic.id));
    loads
}
