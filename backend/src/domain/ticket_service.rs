//! Service ticket engine.
//!
//! Orchestrates ticket lifecycle operations. Field checks that need the
//! current date run here against the injected clock; checks that need
//! consistent store state (references, staffing, stock) run inside the
//! repository transaction.

use std::sync::Arc;

use chrono::NaiveDate;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use super::ledger::StockPosition;
use super::ports::{TicketRepository, TicketScope, ticket_not_found};
use super::staffing::{MechanicLoad, rank_by_load};
use super::ticket::ensure_not_past;
use super::{
    CustomerId, Error, MechanicChanges, MechanicId, NewTicket, PartsAdjustment, Principal, Role,
    ServiceDescription, ServiceTicket, TicketId, TicketInfoChanges, Vin,
};

/// Validated request to open a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDraft {
    /// Owning customer.
    pub customer_id: CustomerId,
    /// Vehicle being serviced.
    pub vin: Vin,
    /// Scheduled service date.
    pub service_date: NaiveDate,
    /// Requested work.
    pub description: ServiceDescription,
    /// Mechanics to assign.
    pub mechanic_ids: Vec<MechanicId>,
}

/// Outcome of a committed parts update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartsUpdated {
    /// Ticket that was adjusted.
    pub ticket_id: TicketId,
    /// Summary such as `3 Headlights(s) added`.
    pub message: String,
    /// Stock position after the commit.
    pub position: StockPosition,
}

/// Ticket lifecycle operations.
#[derive(Clone)]
pub struct TicketService {
    tickets: Arc<dyn TicketRepository>,
    clock: Arc<dyn Clock>,
}

impl TicketService {
    /// Create a new service.
    pub fn new(tickets: Arc<dyn TicketRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { tickets, clock }
    }

    fn today(&self) -> NaiveDate {
        self.clock.utc().date_naive()
    }

    /// Open a ticket.
    pub async fn create(
        &self,
        principal: &Principal,
        draft: TicketDraft,
    ) -> Result<ServiceTicket, Error> {
        principal.require_role(&[Role::Mechanic])?;
        let service_date = ensure_not_past(draft.service_date, self.today())?;
        let new_ticket = NewTicket::new(
            draft.customer_id,
            draft.vin,
            service_date,
            draft.description,
            draft.mechanic_ids,
        )?;
        let ticket = self.tickets.insert(new_ticket).await?;
        info!(
            ticket_id = %ticket.id,
            customer_id = %ticket.customer_id,
            mechanics = ticket.mechanic_ids.len(),
            "service ticket created"
        );
        Ok(ticket)
    }

    /// Tickets within `scope`.
    pub async fn list(&self, scope: TicketScope) -> Result<Vec<ServiceTicket>, Error> {
        self.tickets.list(scope).await
    }

    /// One ticket by id.
    pub async fn get(&self, id: TicketId) -> Result<ServiceTicket, Error> {
        self.tickets
            .find(id)
            .await?
            .ok_or_else(|| ticket_not_found(id))
    }

    /// Partially update VIN, date or description.
    pub async fn update_info(
        &self,
        principal: &Principal,
        id: TicketId,
        mut changes: TicketInfoChanges,
    ) -> Result<ServiceTicket, Error> {
        principal.require_role(&[Role::Mechanic])?;
        if changes.vin.is_none() && changes.service_date.is_none() && changes.description.is_none()
        {
            return Err(Error::validation("No fields to update"));
        }
        if let Some(date) = changes.service_date {
            changes.service_date = Some(ensure_not_past(date, self.today())?);
        }
        self.tickets.update_info(id, changes).await
    }

    /// Add and remove mechanics, keeping at least one assigned.
    pub async fn update_mechanics(
        &self,
        principal: &Principal,
        id: TicketId,
        changes: MechanicChanges,
    ) -> Result<ServiceTicket, Error> {
        principal.require_role(&[Role::Mechanic])?;
        if changes.add.is_empty() && changes.remove.is_empty() {
            return Err(Error::validation("No mechanic changes supplied").with_details(
                json!({ "field": "addMechanicIds", "code": "empty" }),
            ));
        }
        let ticket = self.tickets.update_mechanics(id, changes).await?;
        info!(ticket_id = %ticket.id, mechanics = ticket.mechanic_ids.len(), "ticket mechanics updated");
        Ok(ticket)
    }

    /// Reserve and/or release units of one part for a ticket.
    pub async fn update_parts(
        &self,
        principal: &Principal,
        id: TicketId,
        adjustment: PartsAdjustment,
    ) -> Result<PartsUpdated, Error> {
        principal.require_role(&[Role::Mechanic])?;
        let outcome = self.tickets.adjust_parts(id, adjustment).await?;
        let message = adjustment.summary(&outcome.part_name);
        info!(
            ticket_id = %outcome.ticket_id,
            part_id = %adjustment.part_id(),
            on_hand = outcome.position.on_hand,
            used_on_ticket = outcome.position.used_on_ticket,
            "ticket parts updated"
        );
        Ok(PartsUpdated {
            ticket_id: outcome.ticket_id,
            message,
            position: outcome.position,
        })
    }

    /// Hard-delete a ticket. Consumed parts stay consumed.
    pub async fn delete(&self, principal: &Principal, id: TicketId) -> Result<(), Error> {
        principal.require_role(&[Role::Mechanic])?;
        self.tickets.delete(id).await?;
        info!(ticket_id = %id, "service ticket deleted");
        Ok(())
    }

    /// Mechanics ordered by descending ticket count, then ascending id.
    pub async fn workload(&self) -> Result<Vec<MechanicLoad>, Error> {
        Ok(rank_by_load(self.tickets.mechanic_loads().await?))
    }
}

#[cfg(test)]
#[path = "ticket_service_tests.rs"]
mod tests;
