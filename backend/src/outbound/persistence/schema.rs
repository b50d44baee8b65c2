//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `migrations/` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Customer accounts.
    customers (id) {
        id -> Int8,
        /// Opaque identifier embedded in tokens.
        external_id -> Uuid,
        name -> Varchar,
        /// Unique within the table.
        email -> Varchar,
        /// Unique within the table.
        phone -> Varchar,
        password_hash -> Varchar,
        /// Incremented to revoke every outstanding token.
        revocation_counter -> Int8,
    }
}

diesel::table! {
    /// Mechanic accounts; same shape as `customers` plus salary.
    mechanics (id) {
        id -> Int8,
        external_id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        phone -> Varchar,
        password_hash -> Varchar,
        revocation_counter -> Int8,
        salary -> Int8,
    }
}

diesel::table! {
    /// Inventory parts.
    parts (id) {
        id -> Int8,
        /// Unique, case-sensitive.
        name -> Varchar,
        /// Unit price in cents.
        price_cents -> Int8,
        /// Never negative.
        quantity_on_hand -> Int4,
    }
}

diesel::table! {
    /// Open service tickets.
    service_tickets (id) {
        id -> Int8,
        vin -> Varchar,
        service_date -> Date,
        service_desc -> Varchar,
        customer_id -> Int8,
    }
}

diesel::table! {
    /// Ticket to mechanic assignments.
    service_mechanics (service_ticket_id, mechanic_id) {
        service_ticket_id -> Int8,
        mechanic_id -> Int8,
    }
}

diesel::table! {
    /// Cumulative part usage per ticket.
    part_usages (service_ticket_id, part_id) {
        service_ticket_id -> Int8,
        part_id -> Int8,
        quantity_used -> Int4,
    }
}

diesel::joinable!(service_tickets -> customers (customer_id));
diesel::joinable!(service_mechanics -> service_tickets (service_ticket_id));
diesel::joinable!(service_mechanics -> mechanics (mechanic_id));
diesel::joinable!(part_usages -> service_tickets (service_ticket_id));
diesel::joinable!(part_usages -> parts (part_id));

diesel::allow_tables_to_appear_in_same_query!(
    customers,
    mechanics,
    parts,
    service_tickets,
    service_mechanics,
    part_usages,
);
