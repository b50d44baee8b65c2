//! Inventory catalogue use-cases.
//!
//! Stock movements tied to tickets go through the ticket service; this service
//! covers the catalogue itself. Mutations are restricted to mechanics.

use std::sync::Arc;

use tracing::info;

use super::ports::{PartRepository, part_not_found};
use super::{Error, NewPart, Part, PartChanges, PartId, Principal, Role};

/// Part catalogue operations.
#[derive(Clone)]
pub struct InventoryService {
    parts: Arc<dyn PartRepository>,
}

impl InventoryService {
    /// Create a new service.
    pub fn new(parts: Arc<dyn PartRepository>) -> Self {
        Self { parts }
    }

    /// Add a part to the catalogue.
    pub async fn create(&self, principal: &Principal, part: NewPart) -> Result<Part, Error> {
        principal.require_role(&[Role::Mechanic])?;
        let part = self.parts.insert(part).await?;
        info!(part_id = %part.id, name = %part.name, on_hand = part.quantity_on_hand, "part created");
        Ok(part)
    }

    /// All parts ordered by id.
    pub async fn list(&self) -> Result<Vec<Part>, Error> {
        self.parts.list().await
    }

    /// One part by id.
    pub async fn get(&self, id: PartId) -> Result<Part, Error> {
        self.parts.find(id).await?.ok_or_else(|| part_not_found(id))
    }

    /// Merge allow-listed changes into a part.
    pub async fn update(
        &self,
        principal: &Principal,
        id: PartId,
        changes: PartChanges,
    ) -> Result<Part, Error> {
        principal.require_role(&[Role::Mechanic])?;
        if changes.is_empty() {
            return Err(Error::validation("No fields to update"));
        }
        self.parts.update(id, changes).await
    }

    /// Remove a part that no ticket still holds.
    pub async fn delete(&self, principal: &Principal, id: PartId) -> Result<Part, Error> {
        principal.require_role(&[Role::Mechanic])?;
        let removed = self.parts.delete(id).await?;
        info!(part_id = %removed.id, name = %removed.name, "part deleted");
        Ok(removed)
    }
}
