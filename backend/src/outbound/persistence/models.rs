//! Internal Diesel row structs and their conversions to domain types.
//!
//! Rows are re-validated on the way out so a hand-edited database cannot
//! smuggle malformed values into the domain.

use std::fmt::Display;

use chrono::NaiveDate;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::ports::StoreError;
use crate::domain::{
    Account, Customer, CustomerId, EmailAddress, Error, ExternalId, Mechanic, MechanicId, Part,
    PartId, PartName, PasswordHash, PersonName, PhoneNumber, Profile, Salary, ServiceDescription,
    UnitPrice, Vin,
};

use super::schema::{customers, mechanics, part_usages, parts, service_mechanics, service_tickets};

pub(crate) fn corrupt(what: &str, detail: impl Display) -> Error {
    StoreError::query(format!("stored {what} is invalid: {detail}")).into()
}

pub(crate) fn to_quantity(raw: i32) -> Result<u32, Error> {
    u32::try_from(raw).map_err(|error| corrupt("quantity", error))
}

pub(crate) fn from_quantity(quantity: u32) -> Result<i32, Error> {
    i32::try_from(quantity).map_err(|_| Error::validation("Quantity is too large"))
}

fn account(
    external_id: Uuid,
    name: String,
    email: String,
    phone: String,
    password_hash: String,
    revocation_counter: i64,
) -> Result<Account, Error> {
    Ok(Account {
        external_id: ExternalId::from_uuid(external_id),
        profile: Profile {
            name: PersonName::new(name).map_err(|error| corrupt("name", error))?,
            email: EmailAddress::new(email).map_err(|error| corrupt("email", error))?,
            phone: PhoneNumber::new(phone).map_err(|error| corrupt("phone", error))?,
        },
        password_hash: PasswordHash::from_encoded(password_hash),
        revocation_counter,
    })
}

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = customers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CustomerRow {
    pub id: i64,
    pub external_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub revocation_counter: i64,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = Error;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CustomerId::new(row.id),
            account: account(
                row.external_id,
                row.name,
                row.email,
                row.phone,
                row.password_hash,
                row.revocation_counter,
            )?,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = customers)]
pub(crate) struct NewCustomerRow<'a> {
    pub external_id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub password_hash: &'a str,
    pub revocation_counter: i64,
}

impl<'a> From<&'a Account> for NewCustomerRow<'a> {
    fn from(account: &'a Account) -> Self {
        Self {
            external_id: *account.external_id.as_uuid(),
            name: account.profile.name.as_ref(),
            email: account.profile.email.as_ref(),
            phone: account.profile.phone.as_ref(),
            password_hash: account.password_hash.as_str(),
            revocation_counter: account.revocation_counter,
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = customers)]
pub(crate) struct CustomerChangeset<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub password_hash: &'a str,
    pub revocation_counter: i64,
}

impl<'a> From<&'a Account> for CustomerChangeset<'a> {
    fn from(account: &'a Account) -> Self {
        Self {
            name: account.profile.name.as_ref(),
            email: account.profile.email.as_ref(),
            phone: account.profile.phone.as_ref(),
            password_hash: account.password_hash.as_str(),
            revocation_counter: account.revocation_counter,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = mechanics)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MechanicRow {
    pub id: i64,
    pub external_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub revocation_counter: i64,
    pub salary: i64,
}

impl TryFrom<MechanicRow> for Mechanic {
    type Error = Error;

    fn try_from(row: MechanicRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: MechanicId::new(row.id),
            account: account(
                row.external_id,
                row.name,
                row.email,
                row.phone,
                row.password_hash,
                row.revocation_counter,
            )?,
            salary: Salary::new(row.salary).map_err(|error| corrupt("salary", error))?,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = mechanics)]
pub(crate) struct NewMechanicRow<'a> {
    pub external_id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub password_hash: &'a str,
    pub revocation_counter: i64,
    pub salary: i64,
}

impl<'a> NewMechanicRow<'a> {
    pub fn new(account: &'a Account, salary: Salary) -> Self {
        Self {
            external_id: *account.external_id.as_uuid(),
            name: account.profile.name.as_ref(),
            email: account.profile.email.as_ref(),
            phone: account.profile.phone.as_ref(),
            password_hash: account.password_hash.as_str(),
            revocation_counter: account.revocation_counter,
            salary: salary.get(),
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = mechanics)]
pub(crate) struct MechanicChangeset<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub password_hash: &'a str,
    pub revocation_counter: i64,
    pub salary: i64,
}

impl<'a> From<&'a Mechanic> for MechanicChangeset<'a> {
    fn from(mechanic: &'a Mechanic) -> Self {
        let account = &mechanic.account;
        Self {
            name: account.profile.name.as_ref(),
            email: account.profile.email.as_ref(),
            phone: account.profile.phone.as_ref(),
            password_hash: account.password_hash.as_str(),
            revocation_counter: account.revocation_counter,
            salary: mechanic.salary.get(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = parts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PartRow {
    pub id: i64,
    pub name: String,
    pub price_cents: i64,
    pub quantity_on_hand: i32,
}

impl TryFrom<PartRow> for Part {
    type Error = Error;

    fn try_from(row: PartRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PartId::new(row.id),
            name: PartName::new(row.name).map_err(|error| corrupt("part name", error))?,
            price: UnitPrice::from_cents(row.price_cents)
                .map_err(|error| corrupt("price", error))?,
            quantity_on_hand: to_quantity(row.quantity_on_hand)?,
        })
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = parts)]
pub(crate) struct PartValues<'a> {
    pub name: &'a str,
    pub price_cents: i64,
    pub quantity_on_hand: i32,
}

impl<'a> PartValues<'a> {
    pub fn new(name: &'a PartName, price: UnitPrice, quantity_on_hand: u32) -> Result<Self, Error> {
        Ok(Self {
            name: name.as_ref(),
            price_cents: price.cents(),
            quantity_on_hand: from_quantity(quantity_on_hand)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = service_tickets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TicketRecord {
    pub id: i64,
    pub vin: String,
    pub service_date: NaiveDate,
    pub service_desc: String,
    pub customer_id: i64,
}

impl TicketRecord {
    pub fn vin(&self) -> Result<Vin, Error> {
        Vin::new(&self.vin).map_err(|error| corrupt("VIN", error))
    }

    pub fn description(&self) -> Result<ServiceDescription, Error> {
        ServiceDescription::new(&self.service_desc).map_err(|error| corrupt("description", error))
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = service_tickets)]
pub(crate) struct TicketValues<'a> {
    pub vin: &'a str,
    pub service_date: NaiveDate,
    pub service_desc: &'a str,
    pub customer_id: i64,
}

#[derive(Debug, Clone, Copy, Queryable, Selectable, Insertable)]
#[diesel(table_name = service_mechanics)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AssignmentRow {
    pub service_ticket_id: i64,
    pub mechanic_id: i64,
}

#[derive(Debug, Clone, Copy, Queryable, Selectable, Insertable)]
#[diesel(table_name = part_usages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UsageRow {
    pub service_ticket_id: i64,
    pub part_id: i64,
    pub quantity_used: i32,
}
