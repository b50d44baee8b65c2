//! Tickets and part usage in the in-memory store.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;

use super::{MemoryStore, TicketRow, bump};
use crate::domain::ledger::{StockPosition, apply_adjustment};
use crate::domain::ports::{
    PartsOutcome, TicketRepository, TicketScope, ticket_not_found, unknown_customer,
    unknown_mechanics, unknown_part,
};
use crate::domain::staffing::{MechanicLoad, plan_assignment};
use crate::domain::{
    Error, MechanicChanges, NewTicket, PartsAdjustment, ServiceTicket, TicketId,
    TicketInfoChanges,
};

#[async_trait]
impl TicketRepository for MemoryStore {
    async fn insert(&self, ticket: NewTicket) -> Result<ServiceTicket, Error> {
        self.write(|state| {
            if !state.customers.contains_key(&ticket.customer_id) {
                return Err(unknown_customer(ticket.customer_id));
            }
            if !ticket
                .mechanic_ids
                .iter()
                .all(|id| state.mechanics.contains_key(id))
            {
                return Err(unknown_mechanics());
            }
            let id = TicketId::new(bump(&mut state.sequences.ticket));
            let row = TicketRow {
                vin: ticket.vin,
                service_date: ticket.service_date,
                description: ticket.description,
                customer_id: ticket.customer_id,
                mechanic_ids: ticket.mechanic_ids,
                usages: BTreeMap::new(),
            };
            let stored = state.assemble(id, &row);
            state.tickets.insert(id, row);
            Ok(stored)
        })
    }

    async fn find(&self, id: TicketId) -> Result<Option<ServiceTicket>, Error> {
        self.read(|state| state.tickets.get(&id).map(|row| state.assemble(id, row)))
    }

    async fn list(&self, scope: TicketScope) -> Result<Vec<ServiceTicket>, Error> {
        self.read(|state| {
            state
                .tickets
                .iter()
                .filter(|(_, row)| match scope {
                    TicketScope::All => true,
                    TicketScope::Customer(id) => row.customer_id == id,
                    TicketScope::Mechanic(id) => row.mechanic_ids.contains(&id),
                })
                .map(|(id, row)| state.assemble(*id, row))
                .collect()
        })
    }

    async fn update_info(
        &self,
        id: TicketId,
        changes: TicketInfoChanges,
    ) -> Result<ServiceTicket, Error> {
        self.write(|state| {
            let mut ticket = state
                .tickets
                .get(&id)
                .map(|row| state.assemble(id, row))
                .ok_or_else(|| ticket_not_found(id))?;
            changes.apply_to(&mut ticket);
            let row = state
                .tickets
                .get_mut(&id)
                .ok_or_else(|| ticket_not_found(id))?;
            row.vin = ticket.vin.clone();
            row.service_date = ticket.service_date;
            row.description = ticket.description.clone();
            Ok(ticket)
        })
    }

    async fn update_mechanics(
        &self,
        id: TicketId,
        changes: MechanicChanges,
    ) -> Result<ServiceTicket, Error> {
        self.write(|state| {
            let known: BTreeSet<_> = state.mechanics.keys().copied().collect();
            let row = state
                .tickets
                .get_mut(&id)
                .ok_or_else(|| ticket_not_found(id))?;
            row.mechanic_ids = plan_assignment(&row.mechanic_ids, &changes, &known)?;
            let row = row.clone();
            Ok(state.assemble(id, &row))
        })
    }

    async fn adjust_parts(
        &self,
        id: TicketId,
        adjustment: PartsAdjustment,
    ) -> Result<PartsOutcome, Error> {
        let part_id = adjustment.part_id();
        self.write(|state| {
            let used_on_ticket = state
                .tickets
                .get(&id)
                .ok_or_else(|| ticket_not_found(id))?
                .usages
                .get(&part_id)
                .copied()
                .unwrap_or(0);
            let part = state
                .parts
                .get_mut(&part_id)
                .ok_or_else(|| unknown_part(part_id))?;
            let position = apply_adjustment(
                StockPosition {
                    on_hand: part.quantity_on_hand,
                    used_on_ticket,
                },
                &part.name,
                &adjustment,
            )?;
            part.quantity_on_hand = position.on_hand;
            let part_name = part.name.clone();
            if let Some(row) = state.tickets.get_mut(&id) {
                row.usages.insert(part_id, position.used_on_ticket);
            }
            Ok(PartsOutcome {
                ticket_id: id,
                part_name,
                position,
            })
        })
    }

    async fn delete(&self, id: TicketId) -> Result<(), Error> {
        self.write(|state| {
            state
                .tickets
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| ticket_not_found(id))
        })
    }

    async fn mechanic_loads(&self) -> Result<Vec<MechanicLoad>, Error> {
        self.read(|state| {
            state
                .mechanics
                .values()
                .map(|mechanic| MechanicLoad {
                    mechanic: mechanic.clone(),
                    ticket_count: state
                        .tickets
                        .values()
                        .filter(|row| row.mechanic_ids.contains(&mechanic.id))
                        .count() as u64,
                })
                .collect()
        })
    }
}
