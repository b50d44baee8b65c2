//! PostgreSQL-backed `PartRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{PartRepository, part_in_use, part_not_found};
use crate::domain::{Error, NewPart, Part, PartChanges, PartId};

use super::error_mapping::{TxError, map_diesel_error, map_pool_error};
use super::models::{PartRow, PartValues};
use super::pool::DbPool;
use super::schema::{part_usages, parts};

/// Diesel-backed part catalogue.
#[derive(Clone)]
pub struct DieselPartRepository {
    pool: DbPool,
}

impl DieselPartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

async fn lock_part(conn: &mut AsyncPgConnection, id: PartId) -> Result<Part, TxError> {
    let row = parts::table
        .find(id.get())
        .select(PartRow::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| part_not_found(id))?;
    Ok(Part::try_from(row)?)
}

#[async_trait]
impl PartRepository for DieselPartRepository {
    async fn insert(&self, part: NewPart) -> Result<Part, Error> {
        let values = PartValues::new(&part.name, part.price, part.quantity_on_hand)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::insert_into(parts::table)
            .values(&values)
            .returning(PartRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Part::try_from(row)
    }

    async fn find(&self, id: PartId) -> Result<Option<Part>, Error> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        parts::table
            .find(id.get())
            .select(PartRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(Part::try_from)
            .transpose()
    }

    async fn list(&self) -> Result<Vec<Part>, Error> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        parts::table
            .select(PartRow::as_select())
            .order_by(parts::id)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?
            .into_iter()
            .map(Part::try_from)
            .collect()
    }

    async fn update(&self, id: PartId, changes: PartChanges) -> Result<Part, Error> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<_, TxError, _>(|conn| {
            async move {
                let mut part = lock_part(conn, id).await?;
                changes.apply_to(&mut part);
                let values = PartValues::new(&part.name, part.price, part.quantity_on_hand)?;
                diesel::update(parts::table.find(id.get()))
                    .set(&values)
                    .execute(conn)
                    .await?;
                Ok(part)
            }
            .scope_boxed()
        })
        .await
        .map_err(Error::from)
    }

    async fn delete(&self, id: PartId) -> Result<Part, Error> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<_, TxError, _>(|conn| {
            async move {
                let part = lock_part(conn, id).await?;
                let held: i64 = part_usages::table
                    .filter(part_usages::part_id.eq(id.get()))
                    .filter(part_usages::quantity_used.gt(0))
                    .count()
                    .get_result(conn)
                    .await?;
                if held > 0 {
                    return Err(part_in_use(id).into());
                }
                diesel::delete(part_usages::table.filter(part_usages::part_id.eq(id.get())))
                    .execute(conn)
                    .await?;
                diesel::delete(parts::table.find(id.get()))
                    .execute(conn)
                    .await?;
                Ok(part)
            }
            .scope_boxed()
        })
        .await
        .map_err(Error::from)
    }
}
