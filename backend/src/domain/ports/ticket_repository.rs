//! Port for service ticket persistence and the ledger transactions that
//! touch tickets and parts together.

use async_trait::async_trait;
use serde_json::json;

use crate::domain::ledger::StockPosition;
use crate::domain::staffing::MechanicLoad;
use crate::domain::{
    CustomerId, Error, MechanicChanges, MechanicId, NewTicket, PartId, PartName, PartsAdjustment,
    ServiceTicket, TicketId, TicketInfoChanges,
};

/// Which tickets a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketScope {
    /// Every ticket.
    All,
    /// Tickets owned by one customer.
    Customer(CustomerId),
    /// Tickets assigned to one mechanic.
    Mechanic(MechanicId),
}

/// Result of a committed parts adjustment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartsOutcome {
    /// Ticket that was adjusted.
    pub ticket_id: TicketId,
    /// Name of the adjusted part.
    pub part_name: PartName,
    /// Stock position after the commit.
    pub position: StockPosition,
}

/// Persistence contract for tickets.
///
/// Each method runs as one store transaction. Reference checks and invariant
/// checks happen inside that transaction, against rows locked for update.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Insert a ticket after checking the customer and every mechanic exist.
    async fn insert(&self, ticket: NewTicket) -> Result<ServiceTicket, Error>;

    /// Fetch a ticket with its mechanics and part usages.
    async fn find(&self, id: TicketId) -> Result<Option<ServiceTicket>, Error>;

    /// List tickets in scope ordered by id.
    async fn list(&self, scope: TicketScope) -> Result<Vec<ServiceTicket>, Error>;

    /// Merge allow-listed information changes.
    async fn update_info(
        &self,
        id: TicketId,
        changes: TicketInfoChanges,
    ) -> Result<ServiceTicket, Error>;

    /// Add and remove mechanics under the minimum staffing rule.
    async fn update_mechanics(
        &self,
        id: TicketId,
        changes: MechanicChanges,
    ) -> Result<ServiceTicket, Error>;

    /// Reserve and/or release units of one part for a ticket.
    async fn adjust_parts(
        &self,
        id: TicketId,
        adjustment: PartsAdjustment,
    ) -> Result<PartsOutcome, Error>;

    /// Delete a ticket and its usage records; consumed stock is not restored.
    async fn delete(&self, id: TicketId) -> Result<(), Error>;

    /// Every mechanic with the number of tickets assigned to them.
    async fn mechanic_loads(&self) -> Result<Vec<MechanicLoad>, Error>;
}

/// Error raised when a path-addressed ticket does not exist.
pub fn ticket_not_found(id: TicketId) -> Error {
    Error::not_found("Service ticket not found").with_details(json!({ "ticketId": id.get() }))
}

/// Error raised when a ticket references a missing customer.
pub fn unknown_customer(id: CustomerId) -> Error {
    Error::invalid_reference(format!("Customer with ID {id} does not exist"))
        .with_details(json!({ "field": "customerId", "code": "unknown_reference" }))
}

/// Error raised when a ticket references a missing mechanic.
pub fn unknown_mechanics() -> Error {
    Error::invalid_reference("One or more mechanic IDs are invalid")
        .with_details(json!({ "field": "mechanicIds", "code": "unknown_reference" }))
}

/// Error raised when a parts update references a missing part.
pub fn unknown_part(id: PartId) -> Error {
    Error::invalid_reference(format!("Part id {id} does not exist"))
        .with_details(json!({ "field": "partId", "code": "unknown_reference" }))
}
