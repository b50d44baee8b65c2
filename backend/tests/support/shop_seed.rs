//! A migrated database with the three Diesel repositories and seed helpers.

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::NaiveDate;
use mechanic_shop::domain::ports::{IdentityRepository, PartRepository, TicketRepository};
use mechanic_shop::domain::{
    Account, CustomerId, EmailAddress, ExternalId, Identity, MechanicId, NewIdentity, NewPart,
    NewTicket, PartId, PartName, PasswordHash, PersonName, PhoneNumber, Profile, Salary,
    ServiceDescription, TicketId, UnitPrice, Vin,
};
use mechanic_shop::outbound::persistence::{
    DbPool, DieselIdentityRepository, DieselPartRepository, DieselTicketRepository, PoolConfig,
};
use pg_embedded_setup_unpriv::TestCluster;
use tokio::runtime::Runtime;

use super::pg_embed::test_cluster;
use super::{migrate_schema, reset_database};

/// Repositories over one freshly migrated database.
pub struct DieselShop {
    pub runtime: Runtime,
    pub identities: DieselIdentityRepository,
    pub parts: DieselPartRepository,
    pub tickets: DieselTicketRepository,
    _cluster: TestCluster,
}

impl DieselShop {
    /// Start a cluster, migrate `database` and open a pool of `pool_size`.
    pub fn start(database: &str, pool_size: u32) -> Result<Self, String> {
        let runtime = Runtime::new().map_err(|err| err.to_string())?;
        let cluster = test_cluster()?;
        reset_database(&cluster, database)?;
        let url = cluster.connection().database_url(database);
        migrate_schema(&url)?;

        let config = PoolConfig::new(&url)
            .with_max_size(pool_size)
            .with_min_idle(Some(1));
        let pool = runtime
            .block_on(DbPool::new(config))
            .map_err(|err| err.to_string())?;

        Ok(Self {
            runtime,
            identities: DieselIdentityRepository::new(pool.clone()),
            parts: DieselPartRepository::new(pool.clone()),
            tickets: DieselTicketRepository::new(pool),
            _cluster: cluster,
        })
    }

    pub async fn customer(&self, seed: &str) -> CustomerId {
        match self
            .identities
            .insert(NewIdentity::Customer {
                account: account(seed),
            })
            .await
            .expect("customer inserted")
        {
            Identity::Customer(customer) => customer.id,
            Identity::Mechanic(_) => panic!("expected a customer"),
        }
    }

    pub async fn mechanic(&self, seed: &str) -> MechanicId {
        match self
            .identities
            .insert(NewIdentity::Mechanic {
                account: account(seed),
                salary: Salary::new(52_000).expect("valid salary"),
            })
            .await
            .expect("mechanic inserted")
        {
            Identity::Mechanic(mechanic) => mechanic.id,
            Identity::Customer(_) => panic!("expected a mechanic"),
        }
    }

    pub async fn part(&self, name: &str, cents: i64, quantity: u32) -> PartId {
        self.parts
            .insert(NewPart {
                name: PartName::new(name).expect("valid name"),
                price: UnitPrice::from_cents(cents).expect("valid price"),
                quantity_on_hand: quantity,
            })
            .await
            .expect("part inserted")
            .id
    }

    pub async fn ticket(&self, customer: CustomerId, mechanics: &[MechanicId]) -> TicketId {
        let ticket = NewTicket::new(
            customer,
            Vin::new("1HGCM82633A123456").expect("valid VIN"),
            service_date(),
            ServiceDescription::new("Replace headlights").expect("valid description"),
            mechanics.iter().copied(),
        )
        .expect("valid ticket");
        self.tickets.insert(ticket).await.expect("ticket inserted").id
    }

    pub async fn on_hand(&self, part: PartId) -> u32 {
        self.parts
            .find(part)
            .await
            .expect("read part")
            .expect("part exists")
            .quantity_on_hand
    }
}

pub fn service_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 6, 15).expect("valid date")
}

fn account(seed: &str) -> Account {
    static NEXT_PHONE: AtomicU32 = AtomicU32::new(0);
    let n = NEXT_PHONE.fetch_add(1, Ordering::Relaxed);
    Account {
        external_id: ExternalId::random(),
        profile: Profile {
            name: PersonName::new(format!("Person {seed}")).expect("valid name"),
            email: EmailAddress::new(format!("{seed}@shop.test")).expect("valid email"),
            phone: PhoneNumber::new(format!("555-200-{:04}", n % 10_000)).expect("valid phone"),
        },
        password_hash: PasswordHash::from_encoded(format!("hash-{seed}")),
        revocation_counter: 0,
    }
}
