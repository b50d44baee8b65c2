//! PostgreSQL-backed `TicketRepository` implementation using Diesel ORM.
//!
//! Mutations lock the ticket row first, then any part or mechanic rows they
//! touch, and evaluate the pure rules in `domain::ledger` and
//! `domain::staffing` against what they read. Nothing is written unless the
//! rule succeeds, and the transaction commits every row change together.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ledger::{StockPosition, apply_adjustment};
use crate::domain::ports::{
    PartsOutcome, TicketRepository, TicketScope, ticket_not_found, unknown_customer,
    unknown_mechanics, unknown_part,
};
use crate::domain::staffing::{MechanicLoad, plan_assignment};
use crate::domain::{
    CustomerId, Error, Mechanic, MechanicChanges, MechanicId, NewTicket, PartId, PartName,
    PartUsage, PartsAdjustment, ServiceTicket, TicketId, TicketInfoChanges,
};

use super::error_mapping::{TxError, map_diesel_error, map_pool_error};
use super::models::{
    AssignmentRow, MechanicRow, TicketRecord, TicketValues, UsageRow, corrupt, from_quantity,
    to_quantity,
};
use super::pool::DbPool;
use super::schema::{customers, mechanics, part_usages, parts, service_mechanics, service_tickets};

/// Diesel-backed ticket store.
#[derive(Clone)]
pub struct DieselTicketRepository {
    pool: DbPool,
}

impl DieselTicketRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Attach assignments and part usage to ticket records, keeping their order.
async fn hydrate(
    conn: &mut AsyncPgConnection,
    records: Vec<TicketRecord>,
) -> Result<Vec<ServiceTicket>, Error> {
    let ids: Vec<i64> = records.iter().map(|record| record.id).collect();

    let assignments: Vec<AssignmentRow> = service_mechanics::table
        .filter(service_mechanics::service_ticket_id.eq_any(&ids))
        .select(AssignmentRow::as_select())
        .load(conn)
        .await
        .map_err(map_diesel_error)?;
    let mut crews: HashMap<i64, BTreeSet<MechanicId>> = HashMap::new();
    for row in assignments {
        crews
            .entry(row.service_ticket_id)
            .or_default()
            .insert(MechanicId::new(row.mechanic_id));
    }

    let usages: Vec<(UsageRow, String)> = part_usages::table
        .inner_join(parts::table)
        .filter(part_usages::service_ticket_id.eq_any(&ids))
        .select((UsageRow::as_select(), parts::name))
        .order_by(part_usages::part_id)
        .load(conn)
        .await
        .map_err(map_diesel_error)?;
    let mut bills: HashMap<i64, Vec<PartUsage>> = HashMap::new();
    for (row, name) in usages {
        bills.entry(row.service_ticket_id).or_default().push(PartUsage {
            part_id: PartId::new(row.part_id),
            part_name: PartName::new(name).map_err(|error| corrupt("part name", error))?,
            quantity_used: to_quantity(row.quantity_used)?,
        });
    }

    records
        .into_iter()
        .map(|record| {
            Ok(ServiceTicket {
                id: TicketId::new(record.id),
                vin: record.vin()?,
                service_date: record.service_date,
                description: record.description()?,
                customer_id: CustomerId::new(record.customer_id),
                mechanic_ids: crews.remove(&record.id).unwrap_or_default(),
                parts: bills.remove(&record.id).unwrap_or_default(),
            })
        })
        .collect()
}

async fn hydrate_one(
    conn: &mut AsyncPgConnection,
    record: TicketRecord,
) -> Result<ServiceTicket, Error> {
    let id = TicketId::new(record.id);
    hydrate(conn, vec![record])
        .await?
        .pop()
        .ok_or_else(|| ticket_not_found(id))
}

async fn lock_ticket(conn: &mut AsyncPgConnection, id: TicketId) -> Result<TicketRecord, TxError> {
    let record = service_tickets::table
        .find(id.get())
        .select(TicketRecord::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| ticket_not_found(id))?;
    Ok(record)
}

/// Share-lock the listed mechanics and return the ids that exist.
async fn known_mechanics(
    conn: &mut AsyncPgConnection,
    ids: impl IntoIterator<Item = MechanicId>,
) -> Result<BTreeSet<MechanicId>, TxError> {
    let raw: Vec<i64> = ids.into_iter().map(MechanicId::get).collect();
    let found: Vec<i64> = mechanics::table
        .filter(mechanics::id.eq_any(&raw))
        .select(mechanics::id)
        .for_share()
        .load(conn)
        .await?;
    Ok(found.into_iter().map(MechanicId::new).collect())
}

async fn insert_ticket(
    conn: &mut AsyncPgConnection,
    ticket: NewTicket,
) -> Result<ServiceTicket, TxError> {
    let customer = customers::table
        .find(ticket.customer_id.get())
        .select(customers::id)
        .for_share()
        .first::<i64>(conn)
        .await
        .optional()?;
    if customer.is_none() {
        return Err(unknown_customer(ticket.customer_id).into());
    }
    let known = known_mechanics(conn, ticket.mechanic_ids.iter().copied()).await?;
    if known != ticket.mechanic_ids {
        return Err(unknown_mechanics().into());
    }

    let record: TicketRecord = diesel::insert_into(service_tickets::table)
        .values(TicketValues {
            vin: ticket.vin.as_ref(),
            service_date: ticket.service_date,
            service_desc: ticket.description.as_ref(),
            customer_id: ticket.customer_id.get(),
        })
        .returning(TicketRecord::as_returning())
        .get_result(conn)
        .await?;
    let crew: Vec<AssignmentRow> = ticket
        .mechanic_ids
        .iter()
        .map(|mechanic| AssignmentRow {
            service_ticket_id: record.id,
            mechanic_id: mechanic.get(),
        })
        .collect();
    diesel::insert_into(service_mechanics::table)
        .values(&crew)
        .execute(conn)
        .await?;
    Ok(hydrate_one(conn, record).await?)
}

async fn reassign(
    conn: &mut AsyncPgConnection,
    id: TicketId,
    changes: MechanicChanges,
) -> Result<ServiceTicket, TxError> {
    // Mechanic rows before the ticket row, matching the mechanic delete path.
    let known = known_mechanics(conn, changes.add.iter().copied()).await?;
    let record = lock_ticket(conn, id).await?;
    let current: BTreeSet<MechanicId> = service_mechanics::table
        .filter(service_mechanics::service_ticket_id.eq(id.get()))
        .select(service_mechanics::mechanic_id)
        .load::<i64>(conn)
        .await?
        .into_iter()
        .map(MechanicId::new)
        .collect();
    let next = plan_assignment(&current, &changes, &known)?;

    let dropped: Vec<i64> = current.difference(&next).map(|m| m.get()).collect();
    if !dropped.is_empty() {
        diesel::delete(
            service_mechanics::table
                .filter(service_mechanics::service_ticket_id.eq(id.get()))
                .filter(service_mechanics::mechanic_id.eq_any(&dropped)),
        )
        .execute(conn)
        .await?;
    }
    let added: Vec<AssignmentRow> = next
        .difference(&current)
        .map(|mechanic| AssignmentRow {
            service_ticket_id: id.get(),
            mechanic_id: mechanic.get(),
        })
        .collect();
    if !added.is_empty() {
        diesel::insert_into(service_mechanics::table)
            .values(&added)
            .execute(conn)
            .await?;
    }
    Ok(hydrate_one(conn, record).await?)
}

async fn move_stock(
    conn: &mut AsyncPgConnection,
    id: TicketId,
    adjustment: PartsAdjustment,
) -> Result<PartsOutcome, TxError> {
    lock_ticket(conn, id).await?;
    let part_id = adjustment.part_id();
    let (name, on_hand): (String, i32) = parts::table
        .find(part_id.get())
        .select((parts::name, parts::quantity_on_hand))
        .for_update()
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| unknown_part(part_id))?;
    let part_name = PartName::new(name).map_err(|error| corrupt("part name", error))?;
    let used_on_ticket = part_usages::table
        .find((id.get(), part_id.get()))
        .select(part_usages::quantity_used)
        .first::<i32>(conn)
        .await
        .optional()?
        .map(to_quantity)
        .transpose()?
        .unwrap_or(0);

    let position = apply_adjustment(
        StockPosition {
            on_hand: to_quantity(on_hand)?,
            used_on_ticket,
        },
        &part_name,
        &adjustment,
    )?;

    let used = from_quantity(adjustment.quantity_used())?;
    if used > 0 {
        let reserved = diesel::update(
            parts::table
                .find(part_id.get())
                .filter(parts::quantity_on_hand.ge(used)),
        )
        .set(parts::quantity_on_hand.eq(parts::quantity_on_hand - used))
        .execute(conn)
        .await?;
        if reserved == 0 {
            return Err(
                Error::insufficient_stock(format!("Not enough {part_name}s in inventory")).into(),
            );
        }
    }
    let returned = from_quantity(adjustment.quantity_returned())?;
    if returned > 0 {
        diesel::update(parts::table.find(part_id.get()))
            .set(parts::quantity_on_hand.eq(parts::quantity_on_hand + returned))
            .execute(conn)
            .await?;
    }
    diesel::insert_into(part_usages::table)
        .values(UsageRow {
            service_ticket_id: id.get(),
            part_id: part_id.get(),
            quantity_used: from_quantity(position.used_on_ticket)?,
        })
        .on_conflict((part_usages::service_ticket_id, part_usages::part_id))
        .do_update()
        .set(part_usages::quantity_used.eq(excluded(part_usages::quantity_used)))
        .execute(conn)
        .await?;

    Ok(PartsOutcome {
        ticket_id: id,
        part_name,
        position,
    })
}

#[async_trait]
impl TicketRepository for DieselTicketRepository {
    async fn insert(&self, ticket: NewTicket) -> Result<ServiceTicket, Error> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<_, TxError, _>(|conn| insert_ticket(conn, ticket).scope_boxed())
            .await
            .map_err(Error::from)
    }

    async fn find(&self, id: TicketId) -> Result<Option<ServiceTicket>, Error> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let record = service_tickets::table
            .find(id.get())
            .select(TicketRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        match record {
            Some(record) => hydrate_one(&mut conn, record).await.map(Some),
            None => Ok(None),
        }
    }

    async fn list(&self, scope: TicketScope) -> Result<Vec<ServiceTicket>, Error> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = service_tickets::table
            .select(TicketRecord::as_select())
            .order_by(service_tickets::id)
            .into_boxed();
        query = match scope {
            TicketScope::All => query,
            TicketScope::Customer(id) => query.filter(service_tickets::customer_id.eq(id.get())),
            TicketScope::Mechanic(id) => query.filter(
                service_tickets::id.eq_any(
                    service_mechanics::table
                        .filter(service_mechanics::mechanic_id.eq(id.get()))
                        .select(service_mechanics::service_ticket_id),
                ),
            ),
        };
        let records = query.load(&mut conn).await.map_err(map_diesel_error)?;
        hydrate(&mut conn, records).await
    }

    async fn update_info(
        &self,
        id: TicketId,
        changes: TicketInfoChanges,
    ) -> Result<ServiceTicket, Error> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<_, TxError, _>(|conn| {
            async move {
                let record = lock_ticket(conn, id).await?;
                let mut ticket = hydrate_one(conn, record).await?;
                changes.apply_to(&mut ticket);
                diesel::update(service_tickets::table.find(id.get()))
                    .set(TicketValues {
                        vin: ticket.vin.as_ref(),
                        service_date: ticket.service_date,
                        service_desc: ticket.description.as_ref(),
                        customer_id: ticket.customer_id.get(),
                    })
                    .execute(conn)
                    .await?;
                Ok(ticket)
            }
            .scope_boxed()
        })
        .await
        .map_err(Error::from)
    }

    async fn update_mechanics(
        &self,
        id: TicketId,
        changes: MechanicChanges,
    ) -> Result<ServiceTicket, Error> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<_, TxError, _>(|conn| reassign(conn, id, changes).scope_boxed())
            .await
            .map_err(Error::from)
    }

    async fn adjust_parts(
        &self,
        id: TicketId,
        adjustment: PartsAdjustment,
    ) -> Result<PartsOutcome, Error> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<_, TxError, _>(|conn| move_stock(conn, id, adjustment).scope_boxed())
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, id: TicketId) -> Result<(), Error> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(service_tickets::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if removed == 0 {
            return Err(ticket_not_found(id));
        }
        Ok(())
    }

    async fn mechanic_loads(&self) -> Result<Vec<MechanicLoad>, Error> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let staff: Vec<MechanicRow> = mechanics::table
            .select(MechanicRow::as_select())
            .order_by(mechanics::id)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let counts: HashMap<i64, i64> = service_mechanics::table
            .group_by(service_mechanics::mechanic_id)
            .select((service_mechanics::mechanic_id, count_star()))
            .load::<(i64, i64)>(&mut conn)
            .await
            .map_err(map_diesel_error)?
            .into_iter()
            .collect();

        staff
            .into_iter()
            .map(|row| {
                let ticket_count = counts.get(&row.id).copied().unwrap_or(0);
                Ok(MechanicLoad {
                    ticket_count: u64::try_from(ticket_count)
                        .map_err(|error| corrupt("ticket count", error))?,
                    mechanic: Mechanic::try_from(row)?,
                })
            })
            .collect()
    }
}
