//! Behavioural coverage for the in-memory store.

use std::collections::BTreeSet;
use std::sync::Arc;

use rstest::{fixture, rstest};
use tokio::task::JoinSet;

use super::*;
use crate::domain::ports::{IdentityRepository, PartRepository, TicketRepository, TicketScope};
use crate::domain::test_support::{account, today};
use crate::domain::{
    ErrorCode, Identity, IdentityChanges, IdentityKey, MechanicChanges, NewIdentity, NewPart,
    NewTicket, PartChanges, PartName, PartsAdjustment, Salary, UnitPrice,
};

struct Shop {
    store: MemoryStore,
    customer: CustomerId,
    mechanic: MechanicId,
    headlights: PartId,
}

async fn add_customer(store: &MemoryStore, seed: &str) -> CustomerId {
    match IdentityRepository::insert(
        store,
        NewIdentity::Customer {
            account: account(seed),
        },
    )
    .await
    .expect("customer inserted")
    {
        Identity::Customer(customer) => customer.id,
        Identity::Mechanic(_) => panic!("expected a customer"),
    }
}

async fn add_mechanic(store: &MemoryStore, seed: &str) -> MechanicId {
    match IdentityRepository::insert(
        store,
        NewIdentity::Mechanic {
            account: account(seed),
            salary: Salary::new(45_000).expect("valid salary"),
        },
    )
    .await
    .expect("mechanic inserted")
    {
        Identity::Mechanic(mechanic) => mechanic.id,
        Identity::Customer(_) => panic!("expected a mechanic"),
    }
}

async fn open_ticket(shop: &Shop, mechanics: &[MechanicId]) -> TicketId {
    let ticket = NewTicket::new(
        shop.customer,
        Vin::new("1HGCM82633A123456").expect("valid VIN"),
        today(),
        ServiceDescription::new("Replace headlights").expect("valid description"),
        mechanics.iter().copied(),
    )
    .expect("valid ticket");
    TicketRepository::insert(&shop.store, ticket)
        .await
        .expect("ticket inserted")
        .id
}

#[fixture]
async fn shop() -> Shop {
    let store = MemoryStore::new();
    let customer = add_customer(&store, "owner").await;
    let mechanic = add_mechanic(&store, "wrench").await;
    let headlights = PartRepository::insert(
        &store,
        NewPart {
            name: PartName::new("Headlights").expect("valid name"),
            price: UnitPrice::from_cents(5999).expect("valid price"),
            quantity_on_hand: 20,
        },
    )
    .await
    .expect("part inserted")
    .id;
    Shop {
        store,
        customer,
        mechanic,
        headlights,
    }
}

fn adjust(part: PartId, used: u32, returned: u32) -> PartsAdjustment {
    PartsAdjustment::new(part, used, returned).expect("valid adjustment")
}

async fn on_hand(shop: &Shop) -> u32 {
    PartRepository::find(&shop.store, shop.headlights)
        .await
        .expect("read part")
        .expect("part exists")
        .quantity_on_hand
}

#[rstest]
#[tokio::test]
async fn reserve_then_release_moves_stock_both_ways(#[future] shop: Shop) {
    let shop = shop.await;
    let ticket = open_ticket(&shop, &[shop.mechanic]).await;

    let reserved = shop
        .store
        .adjust_parts(ticket, adjust(shop.headlights, 5, 0))
        .await
        .expect("reserve");
    assert_eq!(reserved.position.used_on_ticket, 5);
    assert_eq!(on_hand(&shop).await, 15);

    let released = shop
        .store
        .adjust_parts(ticket, adjust(shop.headlights, 0, 2))
        .await
        .expect("release");
    assert_eq!(released.position.used_on_ticket, 3);
    assert_eq!(on_hand(&shop).await, 17);

    let stored = TicketRepository::find(&shop.store, ticket)
        .await
        .expect("read ticket")
        .expect("ticket exists");
    assert_eq!(stored.parts[0].quantity_used, 3);
    assert_eq!(stored.parts[0].part_name.as_ref(), "Headlights");
}

#[rstest]
#[tokio::test]
async fn oversized_reservation_leaves_stock_untouched(#[future] shop: Shop) {
    let shop = shop.await;
    let ticket = open_ticket(&shop, &[shop.mechanic]).await;

    let err = shop
        .store
        .adjust_parts(ticket, adjust(shop.headlights, 100, 0))
        .await
        .expect_err("insufficient stock");
    assert_eq!(err.code(), ErrorCode::InsufficientStock);
    assert_eq!(on_hand(&shop).await, 20);
}

#[rstest]
#[tokio::test]
async fn failed_release_half_rolls_back_the_reserve(#[future] shop: Shop) {
    let shop = shop.await;
    let ticket = open_ticket(&shop, &[shop.mechanic]).await;

    let err = shop
        .store
        .adjust_parts(ticket, adjust(shop.headlights, 2, 3))
        .await
        .expect_err("over return");
    assert_eq!(err.code(), ErrorCode::OverReturn);
    assert_eq!(on_hand(&shop).await, 20);
}

#[rstest]
#[tokio::test]
async fn removing_the_sole_mechanic_keeps_them_assigned(#[future] shop: Shop) {
    let shop = shop.await;
    let ticket = open_ticket(&shop, &[shop.mechanic]).await;

    let err = shop
        .store
        .update_mechanics(
            ticket,
            MechanicChanges {
                add: Vec::new(),
                remove: vec![shop.mechanic],
            },
        )
        .await
        .expect_err("last mechanic");
    assert_eq!(err.code(), ErrorCode::LastMechanicViolation);

    let stored = TicketRepository::find(&shop.store, ticket)
        .await
        .expect("read ticket")
        .expect("ticket exists");
    assert_eq!(stored.mechanic_ids, BTreeSet::from([shop.mechanic]));
}

#[rstest]
#[tokio::test]
async fn tickets_reject_unknown_references(#[future] shop: Shop) {
    let shop = shop.await;
    let ticket = NewTicket::new(
        shop.customer,
        Vin::new("1HGCM82633A123456").expect("valid VIN"),
        today(),
        ServiceDescription::new("Brake pads").expect("valid description"),
        [MechanicId::new(404)],
    )
    .expect("valid ticket");

    let err = TicketRepository::insert(&shop.store, ticket)
        .await
        .expect_err("unknown mechanic");
    assert_eq!(err.code(), ErrorCode::InvalidReference);
    let remaining = TicketRepository::list(&shop.store, TicketScope::All)
        .await
        .expect("list");
    assert!(remaining.is_empty());
}

#[rstest]
#[tokio::test]
async fn deleting_a_customer_cascades_to_their_tickets(#[future] shop: Shop) {
    let shop = shop.await;
    open_ticket(&shop, &[shop.mechanic]).await;

    IdentityRepository::delete(&shop.store, IdentityKey::Customer(shop.customer))
        .await
        .expect("customer deleted");

    let remaining = TicketRepository::list(&shop.store, TicketScope::All)
        .await
        .expect("list");
    assert!(remaining.is_empty());
}

#[rstest]
#[tokio::test]
async fn sole_mechanics_cannot_be_deleted(#[future] shop: Shop) {
    let shop = shop.await;
    open_ticket(&shop, &[shop.mechanic]).await;

    let err = IdentityRepository::delete(&shop.store, IdentityKey::Mechanic(shop.mechanic))
        .await
        .expect_err("would orphan");
    assert_eq!(err.code(), ErrorCode::WouldOrphanTicket);
}

#[rstest]
#[tokio::test]
async fn shared_mechanics_are_unassigned_on_delete(#[future] shop: Shop) {
    let shop = shop.await;
    let helper = add_mechanic(&shop.store, "helper").await;
    let ticket = open_ticket(&shop, &[shop.mechanic, helper]).await;

    IdentityRepository::delete(&shop.store, IdentityKey::Mechanic(helper))
        .await
        .expect("mechanic deleted");

    let stored = TicketRepository::find(&shop.store, ticket)
        .await
        .expect("read ticket")
        .expect("ticket exists");
    assert_eq!(stored.mechanic_ids, BTreeSet::from([shop.mechanic]));
}

#[rstest]
#[tokio::test]
async fn contact_details_are_unique_per_role(#[future] shop: Shop) {
    let shop = shop.await;
    let taken = account("owner");

    let err = IdentityRepository::insert(
        &shop.store,
        NewIdentity::Customer {
            account: taken.clone(),
        },
    )
    .await
    .expect_err("duplicate email");
    assert_eq!(err.code(), ErrorCode::DuplicateValue);

    IdentityRepository::insert(
        &shop.store,
        NewIdentity::Mechanic {
            account: taken,
            salary: Salary::new(1).expect("valid salary"),
        },
    )
    .await
    .expect("same email is free in the mechanic partition");
}

#[rstest]
#[tokio::test]
async fn revocation_bumps_the_counter(#[future] shop: Shop) {
    let shop = shop.await;
    let key = IdentityKey::Customer(shop.customer);

    let changes = IdentityChanges {
        revoke_tokens: true,
        ..IdentityChanges::default()
    };
    let updated = IdentityRepository::update(&shop.store, key, changes)
        .await
        .expect("update");
    assert_eq!(updated.revocation_counter(), 1);
}

#[rstest]
#[tokio::test]
async fn parts_in_use_cannot_be_deleted(#[future] shop: Shop) {
    let shop = shop.await;
    let ticket = open_ticket(&shop, &[shop.mechanic]).await;
    shop.store
        .adjust_parts(ticket, adjust(shop.headlights, 1, 0))
        .await
        .expect("reserve");

    let err = PartRepository::delete(&shop.store, shop.headlights)
        .await
        .expect_err("in use");
    assert_eq!(err.code(), ErrorCode::Conflict);

    shop.store
        .adjust_parts(ticket, adjust(shop.headlights, 0, 1))
        .await
        .expect("release");
    PartRepository::delete(&shop.store, shop.headlights)
        .await
        .expect("part free again");
}

#[rstest]
#[tokio::test]
async fn renaming_a_part_excludes_its_own_row(#[future] shop: Shop) {
    let shop = shop.await;
    let same_name = PartChanges {
        name: Some(PartName::new("Headlights").expect("valid name")),
        ..PartChanges::default()
    };
    PartRepository::update(&shop.store, shop.headlights, same_name)
        .await
        .expect("own name is not a duplicate");
}

#[rstest]
#[tokio::test]
async fn deleting_a_ticket_does_not_restock(#[future] shop: Shop) {
    let shop = shop.await;
    let ticket = open_ticket(&shop, &[shop.mechanic]).await;
    shop.store
        .adjust_parts(ticket, adjust(shop.headlights, 4, 0))
        .await
        .expect("reserve");

    TicketRepository::delete(&shop.store, ticket)
        .await
        .expect("deleted");
    assert_eq!(on_hand(&shop).await, 16);
}

#[rstest]
#[tokio::test]
async fn loads_count_assignments_per_mechanic(#[future] shop: Shop) {
    let shop = shop.await;
    let idle = add_mechanic(&shop.store, "idle").await;
    open_ticket(&shop, &[shop.mechanic]).await;
    open_ticket(&shop, &[shop.mechanic]).await;

    let loads = shop.store.mechanic_loads().await.expect("loads");
    let counts: Vec<(MechanicId, u64)> = loads
        .iter()
        .map(|load| (load.mechanic.id, load.ticket_count))
        .collect();
    assert_eq!(counts, vec![(shop.mechanic, 2), (idle, 0)]);
}

async fn race_reservations(
    store: &Arc<MemoryStore>,
    part: PartId,
    claims: &[(TicketId, u32)],
) -> Vec<Result<u32, ErrorCode>> {
    let mut tasks = JoinSet::new();
    for &(ticket, quantity) in claims {
        let store = Arc::clone(store);
        tasks.spawn(async move {
            store
                .adjust_parts(ticket, adjust(part, quantity, 0))
                .await
                .map(|outcome| outcome.position.used_on_ticket)
                .map_err(|err| err.code())
        });
    }
    let mut outcomes = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        outcomes.push(joined.expect("task completes"));
    }
    outcomes
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_reservations_never_overdraw_stock(#[future] shop: Shop) {
    let shop = shop.await;
    let first = open_ticket(&shop, &[shop.mechanic]).await;
    let second = open_ticket(&shop, &[shop.mechanic]).await;
    let part = shop.headlights;
    let store = Arc::new(shop.store);

    let outcomes = race_reservations(&store, part, &[(first, 15), (second, 15)]).await;

    let granted: Vec<_> = outcomes.iter().filter_map(|outcome| outcome.ok()).collect();
    assert_eq!(granted, vec![15], "exactly one reservation fits: {outcomes:?}");
    assert!(outcomes.contains(&Err(ErrorCode::InsufficientStock)));
    let remaining = PartRepository::find(store.as_ref(), part)
        .await
        .expect("read part")
        .expect("part exists")
        .quantity_on_hand;
    assert_eq!(remaining, 5);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_small_reservations_conserve_stock(#[future] shop: Shop) {
    let shop = shop.await;
    let mut claims = Vec::new();
    for _ in 0..10 {
        claims.push((open_ticket(&shop, &[shop.mechanic]).await, 3));
    }
    let part = shop.headlights;
    let store = Arc::new(shop.store);

    let outcomes = race_reservations(&store, part, &claims).await;

    let granted = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    let refused = outcomes
        .iter()
        .filter(|outcome| **outcome == Err(ErrorCode::InsufficientStock))
        .count();
    assert_eq!((granted, refused), (6, 4));
    let tickets = TicketRepository::list(store.as_ref(), TicketScope::All)
        .await
        .expect("list");
    let used: u32 = tickets
        .iter()
        .flat_map(|ticket| ticket.parts.iter())
        .map(|usage| usage.quantity_used)
        .sum();
    let remaining = PartRepository::find(store.as_ref(), part)
        .await
        .expect("read part")
        .expect("part exists")
        .quantity_on_hand;
    assert_eq!(remaining + used, 20);
    assert_eq!(remaining, 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_unassignments_leave_one_mechanic(#[future] shop: Shop) {
    let shop = shop.await;
    let helper = add_mechanic(&shop.store, "helper").await;
    let ticket = open_ticket(&shop, &[shop.mechanic, helper]).await;
    let store = Arc::new(shop.store);

    let mut tasks = JoinSet::new();
    for mechanic in [shop.mechanic, helper] {
        let store = Arc::clone(&store);
        tasks.spawn(async move {
            store
                .update_mechanics(
                    ticket,
                    MechanicChanges {
                        add: Vec::new(),
                        remove: vec![mechanic],
                    },
                )
                .await
                .map(|_| ())
                .map_err(|err| err.code())
        });
    }
    let mut outcomes = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        outcomes.push(joined.expect("task completes"));
    }

    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert!(outcomes.contains(&Err(ErrorCode::LastMechanicViolation)));
    let stored = TicketRepository::find(store.as_ref(), ticket)
        .await
        .expect("read ticket")
        .expect("ticket exists");
    assert_eq!(stored.mechanic_ids.len(), 1);
}
