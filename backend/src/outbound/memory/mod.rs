//! In-process implementation of the repository ports.
//!
//! All state sits behind one mutex. Every mutating operation works on a copy
//! of the state and swaps it in only when the whole operation succeeds, which
//! gives the same all-or-nothing behaviour as a store transaction. Used by the
//! HTTP tests and by development runs without a database URL.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use tracing::error;

use crate::domain::{
    Customer, CustomerId, Error, Mechanic, MechanicId, Part, PartId, PartUsage,
    ServiceDescription, ServiceTicket, TicketId, Vin,
};

mod identities;
mod parts;
mod tickets;

#[derive(Debug, Clone, Default)]
struct State {
    customers: BTreeMap<CustomerId, Customer>,
    mechanics: BTreeMap<MechanicId, Mechanic>,
    parts: BTreeMap<PartId, Part>,
    tickets: BTreeMap<TicketId, TicketRow>,
    sequences: Sequences,
}

/// Last id handed out per table; ids start at 1.
#[derive(Debug, Clone, Copy, Default)]
struct Sequences {
    customer: i64,
    mechanic: i64,
    part: i64,
    ticket: i64,
}

fn bump(slot: &mut i64) -> i64 {
    *slot += 1;
    *slot
}

impl State {
    fn assemble(&self, id: TicketId, row: &TicketRow) -> ServiceTicket {
        let parts = row
            .usages
            .iter()
            .filter_map(|(part_id, quantity_used)| {
                self.parts.get(part_id).map(|part| PartUsage {
                    part_id: *part_id,
                    part_name: part.name.clone(),
                    quantity_used: *quantity_used,
                })
            })
            .collect();
        ServiceTicket {
            id,
            vin: row.vin.clone(),
            service_date: row.service_date,
            description: row.description.clone(),
            customer_id: row.customer_id,
            mechanic_ids: row.mechanic_ids.clone(),
            parts,
        }
    }
}

#[derive(Debug, Clone)]
struct TicketRow {
    vin: Vin,
    service_date: NaiveDate,
    description: ServiceDescription,
    customer_id: CustomerId,
    mechanic_ids: BTreeSet<MechanicId>,
    usages: BTreeMap<PartId, u32>,
}

/// Mutex-guarded store implementing every repository port.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, Error> {
        self.state.lock().map_err(|_| {
            error!("memory store mutex poisoned");
            Error::internal("Internal server error")
        })
    }

    fn read<T>(&self, f: impl FnOnce(&State) -> T) -> Result<T, Error> {
        let guard = self.lock()?;
        Ok(f(&guard))
    }

    fn write<T>(&self, f: impl FnOnce(&mut State) -> Result<T, Error>) -> Result<T, Error> {
        let mut guard = self.lock()?;
        let mut draft = guard.clone();
        let out = f(&mut draft)?;
        *guard = draft;
        Ok(out)
    }
}

#[cfg(test)]
mod tests;
