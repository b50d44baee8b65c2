//! Integration tests for `DieselTicketRepository` against embedded PostgreSQL.
//!
//! Covers the ledger transactions (conditional decrement, usage upsert,
//! rollback of failed halves), the staffing rule and concurrent writers
//! racing for the same stock or crew.

use std::collections::BTreeSet;

use mechanic_shop::domain::ports::{PartRepository, TicketRepository, TicketScope};
use mechanic_shop::domain::{
    CustomerId, ErrorCode, MechanicChanges, NewTicket, PartId, PartsAdjustment,
    ServiceDescription, TicketId, Vin,
};
use rstest::{fixture, rstest};
use tokio::task::JoinSet;

mod support;

use support::handle_cluster_setup_failure;
use support::shop_seed::{DieselShop, service_date};

const TEST_DB: &str = "diesel_ticket_repo_test";

#[fixture]
fn shop_context() -> Option<DieselShop> {
    match DieselShop::start(TEST_DB, 4) {
        Ok(shop) => Some(shop),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn adjust(part: PartId, used: u32, returned: u32) -> PartsAdjustment {
    PartsAdjustment::new(part, used, returned).expect("valid adjustment")
}

async fn usage_on(shop: &DieselShop, ticket: TicketId) -> Vec<(PartId, u32)> {
    shop.tickets
        .find(ticket)
        .await
        .expect("read ticket")
        .expect("ticket exists")
        .parts
        .iter()
        .map(|usage| (usage.part_id, usage.quantity_used))
        .collect()
}

async fn race_reservations(
    shop: &DieselShop,
    part: PartId,
    claims: &[(TicketId, u32)],
) -> Vec<Result<u32, ErrorCode>> {
    let mut tasks = JoinSet::new();
    for &(ticket, quantity) in claims {
        let tickets = shop.tickets.clone();
        tasks.spawn(async move {
            tickets
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
fn reserve_then_release_updates_stock_and_usage(shop_context: Option<DieselShop>) {
    let Some(shop) = shop_context else {
        eprintln!("SKIP-TEST-CLUSTER: reserve_then_release_updates_stock_and_usage skipped");
        return;
    };

    shop.runtime.block_on(async {
        let customer = shop.customer("owner").await;
        let mechanic = shop.mechanic("wrench").await;
        let headlights = shop.part("Headlights", 5999, 20).await;
        let ticket = shop.ticket(customer, &[mechanic]).await;

        let reserved = shop
            .tickets
            .adjust_parts(ticket, adjust(headlights, 5, 0))
            .await
            .expect("reserve 5");
        assert_eq!(reserved.position.used_on_ticket, 5);
        assert_eq!(reserved.part_name.as_ref(), "Headlights");
        assert_eq!(shop.on_hand(headlights).await, 15);

        let released = shop
            .tickets
            .adjust_parts(ticket, adjust(headlights, 0, 2))
            .await
            .expect("release 2");
        assert_eq!(released.position.used_on_ticket, 3);
        assert_eq!(shop.on_hand(headlights).await, 17);

        assert_eq!(usage_on(&shop, ticket).await, vec![(headlights, 3)]);
    });
}

#[rstest]
fn oversized_reservation_changes_nothing(shop_context: Option<DieselShop>) {
    let Some(shop) = shop_context else {
        eprintln!("SKIP-TEST-CLUSTER: oversized_reservation_changes_nothing skipped");
        return;
    };

    shop.runtime.block_on(async {
        let customer = shop.customer("owner").await;
        let mechanic = shop.mechanic("wrench").await;
        let headlights = shop.part("Headlights", 5999, 20).await;
        let ticket = shop.ticket(customer, &[mechanic]).await;

        let err = shop
            .tickets
            .adjust_parts(ticket, adjust(headlights, 100, 0))
            .await
            .expect_err("insufficient stock");
        assert_eq!(err.code(), ErrorCode::InsufficientStock);
        assert_eq!(err.message(), "Not enough Headlightss in inventory");
        assert_eq!(shop.on_hand(headlights).await, 20);
        assert!(usage_on(&shop, ticket).await.is_empty());
    });
}

#[rstest]
fn combined_adjustments_apply_or_roll_back_as_one(shop_context: Option<DieselShop>) {
    let Some(shop) = shop_context else {
        eprintln!("SKIP-TEST-CLUSTER: combined_adjustments_apply_or_roll_back_as_one skipped");
        return;
    };

    shop.runtime.block_on(async {
        let customer = shop.customer("owner").await;
        let mechanic = shop.mechanic("wrench").await;
        let filters = shop.part("Oil filter", 1250, 4).await;
        let ticket = shop.ticket(customer, &[mechanic]).await;

        let err = shop
            .tickets
            .adjust_parts(ticket, adjust(filters, 2, 3))
            .await
            .expect_err("release half exceeds usage");
        assert_eq!(err.code(), ErrorCode::OverReturn);
        assert_eq!(shop.on_hand(filters).await, 4);
        assert!(usage_on(&shop, ticket).await.is_empty());

        let outcome = shop
            .tickets
            .adjust_parts(ticket, adjust(filters, 4, 3))
            .await
            .expect("release draws on the reserved units");
        assert_eq!(outcome.position.used_on_ticket, 1);
        assert_eq!(shop.on_hand(filters).await, 3);
        assert_eq!(usage_on(&shop, ticket).await, vec![(filters, 1)]);
    });
}

#[rstest]
fn unknown_references_are_rejected(shop_context: Option<DieselShop>) {
    let Some(shop) = shop_context else {
        eprintln!("SKIP-TEST-CLUSTER: unknown_references_are_rejected skipped");
        return;
    };

    shop.runtime.block_on(async {
        let customer = shop.customer("owner").await;
        let mechanic = shop.mechanic("wrench").await;

        let orphan = NewTicket::new(
            CustomerId::new(9_999),
            Vin::new("1HGCM82633A123456").expect("valid VIN"),
            service_date(),
            ServiceDescription::new("Brake pads").expect("valid description"),
            [mechanic],
        )
        .expect("valid ticket");
        let err = shop.tickets.insert(orphan).await.expect_err("unknown customer");
        assert_eq!(err.code(), ErrorCode::InvalidReference);
        assert_eq!(err.message(), "Customer with ID 9999 does not exist");

        let ticket = shop.ticket(customer, &[mechanic]).await;
        let err = shop
            .tickets
            .adjust_parts(ticket, adjust(PartId::new(9_999), 1, 0))
            .await
            .expect_err("unknown part");
        assert_eq!(err.code(), ErrorCode::InvalidReference);

        let listed = shop.tickets.list(TicketScope::All).await.expect("list");
        assert_eq!(listed.len(), 1);
    });
}

#[rstest]
fn sole_mechanic_cannot_be_unassigned(shop_context: Option<DieselShop>) {
    let Some(shop) = shop_context else {
        eprintln!("SKIP-TEST-CLUSTER: sole_mechanic_cannot_be_unassigned skipped");
        return;
    };

    shop.runtime.block_on(async {
        let customer = shop.customer("owner").await;
        let mechanic = shop.mechanic("wrench").await;
        let helper = shop.mechanic("helper").await;
        let ticket = shop.ticket(customer, &[mechanic]).await;

        let err = shop
            .tickets
            .update_mechanics(
                ticket,
                MechanicChanges {
                    add: Vec::new(),
                    remove: vec![mechanic],
                },
            )
            .await
            .expect_err("last mechanic");
        assert_eq!(err.code(), ErrorCode::LastMechanicViolation);

        let swapped = shop
            .tickets
            .update_mechanics(
                ticket,
                MechanicChanges {
                    add: vec![helper],
                    remove: vec![mechanic],
                },
            )
            .await
            .expect("adds apply before removals");
        assert_eq!(swapped.mechanic_ids, BTreeSet::from([helper]));
    });
}

#[rstest]
fn deleting_tickets_keeps_stock_consumed(shop_context: Option<DieselShop>) {
    let Some(shop) = shop_context else {
        eprintln!("SKIP-TEST-CLUSTER: deleting_tickets_keeps_stock_consumed skipped");
        return;
    };

    shop.runtime.block_on(async {
        let customer = shop.customer("owner").await;
        let mechanic = shop.mechanic("wrench").await;
        let headlights = shop.part("Headlights", 5999, 20).await;
        let ticket = shop.ticket(customer, &[mechanic]).await;
        shop.tickets
            .adjust_parts(ticket, adjust(headlights, 6, 0))
            .await
            .expect("reserve");

        let err = shop.parts.delete(headlights).await.expect_err("part in use");
        assert_eq!(err.code(), ErrorCode::Conflict);

        shop.tickets.delete(ticket).await.expect("ticket deleted");
        assert_eq!(shop.on_hand(headlights).await, 14);
        assert!(shop.tickets.find(ticket).await.expect("read").is_none());
        let err = shop.tickets.delete(ticket).await.expect_err("already gone");
        assert_eq!(err.code(), ErrorCode::NotFound);
    });
}

#[rstest]
fn racing_reservations_never_overdraw_stock(shop_context: Option<DieselShop>) {
    let Some(shop) = shop_context else {
        eprintln!("SKIP-TEST-CLUSTER: racing_reservations_never_overdraw_stock skipped");
        return;
    };

    shop.runtime.block_on(async {
        let customer = shop.customer("owner").await;
        let mechanic = shop.mechanic("wrench").await;
        let headlights = shop.part("Headlights", 5999, 20).await;
        let first = shop.ticket(customer, &[mechanic]).await;
        let second = shop.ticket(customer, &[mechanic]).await;

        let outcomes =
            race_reservations(&shop, headlights, &[(first, 15), (second, 15)]).await;

        let granted: Vec<_> = outcomes.iter().filter_map(|outcome| outcome.ok()).collect();
        assert_eq!(granted, vec![15], "exactly one reservation fits: {outcomes:?}");
        assert!(outcomes.contains(&Err(ErrorCode::InsufficientStock)));
        assert_eq!(shop.on_hand(headlights).await, 5);
    });
}

#[rstest]
fn many_racing_reservations_conserve_stock(shop_context: Option<DieselShop>) {
    let Some(shop) = shop_context else {
        eprintln!("SKIP-TEST-CLUSTER: many_racing_reservations_conserve_stock skipped");
        return;
    };

    shop.runtime.block_on(async {
        let customer = shop.customer("owner").await;
        let mechanic = shop.mechanic("wrench").await;
        let headlights = shop.part("Headlights", 5999, 20).await;
        let mut claims = Vec::new();
        for _ in 0..10 {
            claims.push((shop.ticket(customer, &[mechanic]).await, 3));
        }

        let outcomes = race_reservations(&shop, headlights, &claims).await;

        let granted = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
        let refused = outcomes
            .iter()
            .filter(|outcome| **outcome == Err(ErrorCode::InsufficientStock))
            .count();
        assert_eq!((granted, refused), (6, 4), "{outcomes:?}");

        let used: u32 = shop
            .tickets
            .list(TicketScope::All)
            .await
            .expect("list")
            .iter()
            .flat_map(|ticket| ticket.parts.iter())
            .map(|usage| usage.quantity_used)
            .sum();
        let remaining = shop.on_hand(headlights).await;
        assert_eq!(remaining + used, 20);
        assert_eq!(remaining, 2);
    });
}

#[rstest]
fn racing_unassignments_leave_one_mechanic(shop_context: Option<DieselShop>) {
    let Some(shop) = shop_context else {
        eprintln!("SKIP-TEST-CLUSTER: racing_unassignments_leave_one_mechanic skipped");
        return;
    };

    shop.runtime.block_on(async {
        let customer = shop.customer("owner").await;
        let mechanic = shop.mechanic("wrench").await;
        let helper = shop.mechanic("helper").await;
        let ticket = shop.ticket(customer, &[mechanic, helper]).await;

        let mut tasks = JoinSet::new();
        for leaving in [mechanic, helper] {
            let tickets = shop.tickets.clone();
            tasks.spawn(async move {
                tickets
                    .update_mechanics(
                        ticket,
                        MechanicChanges {
                            add: Vec::new(),
                            remove: vec![leaving],
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
        let stored = shop
            .tickets
            .find(ticket)
            .await
            .expect("read ticket")
            .expect("ticket exists");
        assert_eq!(stored.mechanic_ids.len(), 1);
    });
}
