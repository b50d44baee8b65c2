//! Builders shared by domain and adapter unit tests.

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use mockable::Clock;

use super::{
    Account, Customer, CustomerId, EmailAddress, ExternalId, Identity, Mechanic, MechanicId,
    PasswordHash, PersonName, PhoneNumber, Profile, Salary,
};

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixtureClock(pub DateTime<Utc>);

impl FixtureClock {
    /// Clock reading midday UTC on the given date.
    pub fn on(date: NaiveDate) -> Self {
        let noon = date.and_hms_opt(12, 0, 0).expect("valid time");
        Self(Utc.from_utc_datetime(&noon))
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Fixed reference date used across ticket tests.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 6, 15).expect("valid date")
}

/// Distinct phone number for each call.
pub fn unique_phone() -> PhoneNumber {
    static NEXT: AtomicU32 = AtomicU32::new(0);
    let n = NEXT.fetch_add(1, Ordering::Relaxed);
    PhoneNumber::new(format!("555-{:03}-{:04}", n / 10_000 % 1_000, n % 10_000))
        .expect("valid phone")
}

/// Account with predictable contact details derived from `seed`.
pub fn account(seed: &str) -> Account {
    Account {
        external_id: ExternalId::random(),
        profile: Profile {
            name: PersonName::new(format!("Person {seed}")).expect("valid name"),
            email: EmailAddress::new(format!("{seed}@shop.test")).expect("valid email"),
            phone: unique_phone(),
        },
        password_hash: PasswordHash::from_encoded(format!("hash-{seed}")),
        revocation_counter: 0,
    }
}

/// Stored customer identity.
pub fn customer(id: i64) -> Identity {
    Identity::Customer(Customer {
        id: CustomerId::new(id),
        account: account(&format!("customer{id}")),
    })
}

/// Stored mechanic record.
pub fn mechanic_record(id: i64) -> Mechanic {
    Mechanic {
        id: MechanicId::new(id),
        account: account(&format!("mechanic{id}")),
        salary: Salary::new(50_000).expect("valid salary"),
    }
}

/// Stored mechanic identity.
pub fn mechanic(id: i64) -> Identity {
    Identity::Mechanic(mechanic_record(id))
}
