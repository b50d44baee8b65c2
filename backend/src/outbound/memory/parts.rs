//! Part catalogue of the in-memory store.

use async_trait::async_trait;

use super::{MemoryStore, State, bump};
use crate::domain::ports::{PartRepository, duplicate_part_name, part_in_use, part_not_found};
use crate::domain::{Error, NewPart, Part, PartChanges, PartId, PartName};

impl State {
    fn ensure_name_free(&self, name: &PartName, except: Option<PartId>) -> Result<(), Error> {
        let taken = self
            .parts
            .values()
            .any(|part| part.name == *name && Some(part.id) != except);
        if taken {
            return Err(duplicate_part_name());
        }
        Ok(())
    }
}

#[async_trait]
impl PartRepository for MemoryStore {
    async fn insert(&self, part: NewPart) -> Result<Part, Error> {
        self.write(|state| {
            state.ensure_name_free(&part.name, None)?;
            let stored = Part {
                id: PartId::new(bump(&mut state.sequences.part)),
                name: part.name,
                price: part.price,
                quantity_on_hand: part.quantity_on_hand,
            };
            state.parts.insert(stored.id, stored.clone());
            Ok(stored)
        })
    }

    async fn find(&self, id: PartId) -> Result<Option<Part>, Error> {
        self.read(|state| state.parts.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Part>, Error> {
        self.read(|state| state.parts.values().cloned().collect())
    }

    async fn update(&self, id: PartId, changes: PartChanges) -> Result<Part, Error> {
        self.write(|state| {
            if let Some(name) = &changes.name {
                state.ensure_name_free(name, Some(id))?;
            }
            let part = state.parts.get_mut(&id).ok_or_else(|| part_not_found(id))?;
            changes.apply_to(part);
            Ok(part.clone())
        })
    }

    async fn delete(&self, id: PartId) -> Result<Part, Error> {
        self.write(|state| {
            let held = state
                .tickets
                .values()
                .any(|row| row.usages.get(&id).is_some_and(|used| *used > 0));
            if held {
                return Err(part_in_use(id));
            }
            let removed = state.parts.remove(&id).ok_or_else(|| part_not_found(id))?;
            for row in state.tickets.values_mut() {
                row.usages.remove(&id);
            }
            Ok(removed)
        })
    }
}
