//! PostgreSQL-backed `IdentityRepository` implementation using Diesel ORM.
//!
//! Customers and mechanics live in separate tables, so every operation
//! dispatches on the role partition. Uniqueness of email and phone is
//! enforced by named constraints and translated in `error_mapping`.

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{IdentityRepository, identity_not_found};
use crate::domain::staffing::ensure_mechanic_removable;
use crate::domain::{
    Customer, EmailAddress, Error, ExternalId, Identity, IdentityChanges, IdentityKey, Mechanic,
    MechanicId, NewIdentity, Role, TicketId,
};

use super::error_mapping::{TxError, map_diesel_error, map_pool_error};
use super::models::{
    CustomerChangeset, CustomerRow, MechanicChangeset, MechanicRow, NewCustomerRow,
    NewMechanicRow,
};
use super::pool::DbPool;
use super::schema::{customers, mechanics, service_mechanics, service_tickets};

/// Diesel-backed identity store.
#[derive(Clone)]
pub struct DieselIdentityRepository {
    pool: DbPool,
}

impl DieselIdentityRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn customer(row: Option<CustomerRow>) -> Result<Option<Identity>, Error> {
    row.map(Customer::try_from)
        .transpose()
        .map(|found| found.map(Identity::Customer))
}

fn mechanic(row: Option<MechanicRow>) -> Result<Option<Identity>, Error> {
    row.map(Mechanic::try_from)
        .transpose()
        .map(|found| found.map(Identity::Mechanic))
}

async fn lock_identity(
    conn: &mut AsyncPgConnection,
    key: IdentityKey,
) -> Result<Identity, TxError> {
    let found = match key {
        IdentityKey::Customer(id) => customer(
            customers::table
                .find(id.get())
                .select(CustomerRow::as_select())
                .for_update()
                .first(conn)
                .await
                .optional()?,
        )?,
        IdentityKey::Mechanic(id) => mechanic(
            mechanics::table
                .find(id.get())
                .select(MechanicRow::as_select())
                .for_update()
                .first(conn)
                .await
                .optional()?,
        )?,
    };
    found.ok_or_else(|| identity_not_found(key).into())
}

async fn save_identity(conn: &mut AsyncPgConnection, identity: &Identity) -> Result<(), TxError> {
    match identity {
        Identity::Customer(customer) => {
            diesel::update(customers::table.find(customer.id.get()))
                .set(CustomerChangeset::from(&customer.account))
                .execute(conn)
                .await?;
        }
        Identity::Mechanic(mechanic) => {
            diesel::update(mechanics::table.find(mechanic.id.get()))
                .set(MechanicChangeset::from(mechanic))
                .execute(conn)
                .await?;
        }
    }
    Ok(())
}

/// Delete a mechanic unless that would leave a ticket without staff.
///
/// The mechanic's tickets are locked first so a concurrent reassignment
/// cannot slip in between the count and the delete.
async fn remove_mechanic(conn: &mut AsyncPgConnection, id: MechanicId) -> Result<(), TxError> {
    let exists = mechanics::table
        .find(id.get())
        .select(mechanics::id)
        .for_update()
        .first::<i64>(conn)
        .await
        .optional()?;
    if exists.is_none() {
        return Err(identity_not_found(IdentityKey::Mechanic(id)).into());
    }

    let ticket_ids: Vec<i64> = service_mechanics::table
        .filter(service_mechanics::mechanic_id.eq(id.get()))
        .select(service_mechanics::service_ticket_id)
        .load(conn)
        .await?;
    service_tickets::table
        .filter(service_tickets::id.eq_any(&ticket_ids))
        .select(service_tickets::id)
        .for_update()
        .load::<i64>(conn)
        .await?;

    let counts: Vec<(i64, i64)> = service_mechanics::table
        .filter(service_mechanics::service_ticket_id.eq_any(&ticket_ids))
        .group_by(service_mechanics::service_ticket_id)
        .select((service_mechanics::service_ticket_id, count_star()))
        .load(conn)
        .await?;
    let assignments: Vec<(TicketId, usize)> = counts
        .into_iter()
        .map(|(ticket, count)| {
            (
                TicketId::new(ticket),
                usize::try_from(count).unwrap_or(usize::MAX),
            )
        })
        .collect();
    ensure_mechanic_removable(id, &assignments)?;

    diesel::delete(service_mechanics::table.filter(service_mechanics::mechanic_id.eq(id.get())))
        .execute(conn)
        .await?;
    diesel::delete(mechanics::table.find(id.get()))
        .execute(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl IdentityRepository for DieselIdentityRepository {
    async fn insert(&self, identity: NewIdentity) -> Result<Identity, Error> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        match &identity {
            NewIdentity::Customer { account } => {
                let row: CustomerRow = diesel::insert_into(customers::table)
                    .values(NewCustomerRow::from(account))
                    .returning(CustomerRow::as_returning())
                    .get_result(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                Customer::try_from(row).map(Identity::Customer)
            }
            NewIdentity::Mechanic { account, salary } => {
                let row: MechanicRow = diesel::insert_into(mechanics::table)
                    .values(NewMechanicRow::new(account, *salary))
                    .returning(MechanicRow::as_returning())
                    .get_result(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                Mechanic::try_from(row).map(Identity::Mechanic)
            }
        }
    }

    async fn find(&self, key: IdentityKey) -> Result<Option<Identity>, Error> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        match key {
            IdentityKey::Customer(id) => customer(
                customers::table
                    .find(id.get())
                    .select(CustomerRow::as_select())
                    .first(&mut conn)
                    .await
                    .optional()
                    .map_err(map_diesel_error)?,
            ),
            IdentityKey::Mechanic(id) => mechanic(
                mechanics::table
                    .find(id.get())
                    .select(MechanicRow::as_select())
                    .first(&mut conn)
                    .await
                    .optional()
                    .map_err(map_diesel_error)?,
            ),
        }
    }

    async fn find_by_external_id(
        &self,
        role: Role,
        external_id: ExternalId,
    ) -> Result<Option<Identity>, Error> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let uuid = *external_id.as_uuid();
        match role {
            Role::Customer => customer(
                customers::table
                    .filter(customers::external_id.eq(uuid))
                    .select(CustomerRow::as_select())
                    .first(&mut conn)
                    .await
                    .optional()
                    .map_err(map_diesel_error)?,
            ),
            Role::Mechanic => mechanic(
                mechanics::table
                    .filter(mechanics::external_id.eq(uuid))
                    .select(MechanicRow::as_select())
                    .first(&mut conn)
                    .await
                    .optional()
                    .map_err(map_diesel_error)?,
            ),
        }
    }

    async fn find_by_email(
        &self,
        role: Role,
        email: &EmailAddress,
    ) -> Result<Option<Identity>, Error> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        match role {
            Role::Customer => customer(
                customers::table
                    .filter(customers::email.eq(email.as_ref()))
                    .select(CustomerRow::as_select())
                    .first(&mut conn)
                    .await
                    .optional()
                    .map_err(map_diesel_error)?,
            ),
            Role::Mechanic => mechanic(
                mechanics::table
                    .filter(mechanics::email.eq(email.as_ref()))
                    .select(MechanicRow::as_select())
                    .first(&mut conn)
                    .await
                    .optional()
                    .map_err(map_diesel_error)?,
            ),
        }
    }

    async fn list(&self, role: Role) -> Result<Vec<Identity>, Error> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        match role {
            Role::Customer => customers::table
                .select(CustomerRow::as_select())
                .order_by(customers::id)
                .load(&mut conn)
                .await
                .map_err(map_diesel_error)?
                .into_iter()
                .map(|row| Customer::try_from(row).map(Identity::Customer))
                .collect(),
            Role::Mechanic => mechanics::table
                .select(MechanicRow::as_select())
                .order_by(mechanics::id)
                .load(&mut conn)
                .await
                .map_err(map_diesel_error)?
                .into_iter()
                .map(|row| Mechanic::try_from(row).map(Identity::Mechanic))
                .collect(),
        }
    }

    async fn update(&self, key: IdentityKey, changes: IdentityChanges) -> Result<Identity, Error> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<_, TxError, _>(|conn| {
            async move {
                let mut identity = lock_identity(conn, key).await?;
                changes.apply_to(&mut identity);
                save_identity(conn, &identity).await?;
                Ok(identity)
            }
            .scope_boxed()
        })
        .await
        .map_err(Error::from)
    }

    async fn delete(&self, key: IdentityKey) -> Result<(), Error> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        match key {
            IdentityKey::Customer(id) => {
                // Tickets, assignments and usages go with the customer via ON DELETE CASCADE.
                let removed = diesel::delete(customers::table.find(id.get()))
                    .execute(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                if removed == 0 {
                    return Err(identity_not_found(key));
                }
                Ok(())
            }
            IdentityKey::Mechanic(id) => conn
                .transaction::<_, TxError, _>(|conn| remove_mechanic(conn, id).scope_boxed())
                .await
                .map_err(Error::from),
        }
    }
}
