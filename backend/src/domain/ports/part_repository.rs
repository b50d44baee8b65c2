//! Port for inventory part persistence.

use async_trait::async_trait;
use serde_json::json;

use crate::domain::{Error, NewPart, Part, PartChanges, PartId};

/// Persistence contract for parts.
///
/// Part names are unique and compared case-sensitively.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PartRepository: Send + Sync {
    /// Insert a part; fails with `DuplicateValue` on a taken name.
    async fn insert(&self, part: NewPart) -> Result<Part, Error>;

    /// Fetch a part by id.
    async fn find(&self, id: PartId) -> Result<Option<Part>, Error>;

    /// List all parts ordered by id.
    async fn list(&self) -> Result<Vec<Part>, Error>;

    /// Merge allow-listed changes; a rename must not collide with another part.
    async fn update(&self, id: PartId, changes: PartChanges) -> Result<Part, Error>;

    /// Delete a part and return the removed row.
    ///
    /// Fails with `Conflict` while any ticket still holds units of the part.
    async fn delete(&self, id: PartId) -> Result<Part, Error>;
}

/// Error raised when a part name is already taken.
pub fn duplicate_part_name() -> Error {
    Error::duplicate("Part name already exists")
        .with_details(json!({ "field": "name", "code": "duplicate" }))
}

/// Error raised when a path-addressed part does not exist.
pub fn part_not_found(id: PartId) -> Error {
    Error::not_found(format!("Part {id} not found"))
}

/// Error raised when deleting a part still charged to tickets.
pub fn part_in_use(id: PartId) -> Error {
    Error::conflict("Part is in use by service tickets")
        .with_details(json!({ "partId": id.get() }))
}
