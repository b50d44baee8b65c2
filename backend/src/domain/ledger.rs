//! Inventory ledger arithmetic.
//!
//! Pure functions over the stock position of one part on one ticket. Storage
//! adapters load the position under a row lock, run [`apply_adjustment`], and
//! write back the result in the same transaction, so every adapter enforces
//! identical rules.
//!
//! The conservation law holds for every successful step:
//! `on_hand + used_on_ticket` is unchanged by reserve and release.

use super::error::Error;
use super::part::{MAX_QUANTITY, PartName};
use super::ticket::PartsAdjustment;

/// Stock of one part as seen from one ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockPosition {
    /// Units on the shelf.
    pub on_hand: u32,
    /// Units currently charged to the ticket.
    pub used_on_ticket: u32,
}

/// Move `quantity` units from the shelf onto the ticket.
///
/// # Errors
/// [`ErrorCode::InsufficientStock`](super::ErrorCode::InsufficientStock) when
/// fewer than `quantity` units are on hand.
pub fn reserve(position: StockPosition, part: &PartName, quantity: u32) -> Result<StockPosition, Error> {
    let on_hand = position
        .on_hand
        .checked_sub(quantity)
        .ok_or_else(|| Error::insufficient_stock(format!("Not enough {part}s in inventory")))?;
    let used_on_ticket = bounded_add(position.used_on_ticket, quantity, "quantity_used")?;
    Ok(StockPosition {
        on_hand,
        used_on_ticket,
    })
}

/// Move `quantity` units from the ticket back onto the shelf.
///
/// # Errors
/// [`ErrorCode::OverReturn`](super::ErrorCode::OverReturn) when the ticket holds
/// fewer than `quantity` units.
pub fn release(position: StockPosition, part: &PartName, quantity: u32) -> Result<StockPosition, Error> {
    let used_on_ticket = position.used_on_ticket.checked_sub(quantity).ok_or_else(|| {
        Error::over_return(format!("Cannot return more {part}s than used in this ticket"))
    })?;
    let on_hand = bounded_add(position.on_hand, quantity, "quantity_returned")?;
    Ok(StockPosition {
        on_hand,
        used_on_ticket,
    })
}

fn bounded_add(current: u32, quantity: u32, field: &str) -> Result<u32, Error> {
    current
        .checked_add(quantity)
        .filter(|total| *total <= MAX_QUANTITY)
        .ok_or_else(|| Error::validation(format!("{field} is too large")))
}

/// Apply the reserve half, then the release half, of an adjustment.
///
/// Each half is validated against the position left by the previous step, so
/// a request may return units it reserves in the same call. Nothing is
/// returned on failure; callers discard the whole operation.
pub fn apply_adjustment(
    position: StockPosition,
    part: &PartName,
    adjustment: &PartsAdjustment,
) -> Result<StockPosition, Error> {
    let mut next = position;
    if adjustment.quantity_used() > 0 {
        next = reserve(next, part, adjustment.quantity_used())?;
    }
    if adjustment.quantity_returned() > 0 {
        next = release(next, part, adjustment.quantity_returned())?;
    }
    Ok(next)
}
