//! Service tickets and their field rules.
//!
//! A ticket is open while it exists and deleted when removed; there are no
//! intermediate workflow states. The assigned mechanic set is never empty.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::Error;
use super::ids::{CustomerId, MechanicId, PartId, TicketId};
use super::part::PartName;

/// Minimum accepted description length after trimming.
pub const DESCRIPTION_MIN: usize = 5;

/// Validation errors raised by ticket value constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketValidationError {
    /// VIN is not 17 characters of the allowed charset.
    InvalidVin,
    /// Service date lies before today.
    DateInPast,
    /// Description shorter than [`DESCRIPTION_MIN`] characters.
    DescriptionTooShort { min: usize },
    /// No mechanic was supplied.
    NoMechanics,
    /// A parts update carried neither a used nor a returned quantity.
    EmptyPartsAdjustment,
}

impl fmt::Display for TicketValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidVin => write!(
                f,
                "Invalid VIN. Must be 17 characters (letters/digits, no I, O, Q)"
            ),
            Self::DateInPast => write!(f, "Service date cannot be in the past"),
            Self::DescriptionTooShort { min } => write!(
                f,
                "Service description must be at least {min} characters long"
            ),
            Self::NoMechanics => write!(f, "At least one mechanic must be assigned"),
            Self::EmptyPartsAdjustment => write!(
                f,
                "Either quantityUsed or quantityReturned must be greater than zero"
            ),
        }
    }
}

impl std::error::Error for TicketValidationError {}

impl TicketValidationError {
    /// Request field the violation refers to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::InvalidVin => "vin",
            Self::DateInPast => "serviceDate",
            Self::DescriptionTooShort { .. } => "serviceDesc",
            Self::NoMechanics => "mechanicIds",
            Self::EmptyPartsAdjustment => "quantityUsed",
        }
    }

    const fn code(&self) -> &'static str {
        match self {
            Self::InvalidVin => "invalid_vin",
            Self::DateInPast => "date_in_past",
            Self::DescriptionTooShort { .. } => "too_short",
            Self::NoMechanics => "empty",
            Self::EmptyPartsAdjustment => "not_positive",
        }
    }
}

impl From<TicketValidationError> for Error {
    fn from(value: TicketValidationError) -> Self {
        Self::invalid_field(value.field(), value.code(), value.to_string())
    }
}

static VIN_RE: OnceLock<Regex> = OnceLock::new();

fn vin_regex() -> &'static Regex {
    VIN_RE.get_or_init(|| {
        Regex::new("^[A-HJ-NPR-Z0-9]{17}$")
            .unwrap_or_else(|error| panic!("VIN regex failed to compile: {error}"))
    })
}

/// Vehicle identification number.
///
/// Input is trimmed and upper-cased before validation. The letters I, O and Q
/// are excluded from the charset.
///
/// # Examples
/// ```
/// use mechanic_shop::domain::Vin;
///
/// let vin = Vin::new(" 1hgcm82633a123456 ").expect("valid VIN");
/// assert_eq!(vin.as_ref(), "1HGCM82633A123456");
/// assert!(Vin::new("1HGCM82633A12345O").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Vin(String);

impl Vin {
    /// Normalise and validate a VIN.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, TicketValidationError> {
        let normalized = raw.as_ref().trim().to_ascii_uppercase();
        if !vin_regex().is_match(&normalized) {
            return Err(TicketValidationError::InvalidVin);
        }
        Ok(Self(normalized))
    }
}

/// Free-text description of the requested service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceDescription(String);

impl ServiceDescription {
    /// Validate a description; it must hold at least five non-blank characters.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, TicketValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.chars().count() < DESCRIPTION_MIN {
            return Err(TicketValidationError::DescriptionTooShort {
                min: DESCRIPTION_MIN,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

macro_rules! ticket_string {
    ($name:ident) => {
        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_ref())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = TicketValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

ticket_string!(Vin);
ticket_string!(ServiceDescription);

/// Reject service dates before `today`.
pub fn ensure_not_past(date: NaiveDate, today: NaiveDate) -> Result<NaiveDate, TicketValidationError> {
    if date < today {
        return Err(TicketValidationError::DateInPast);
    }
    Ok(date)
}

/// Cumulative quantity of one part charged to one ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartUsage {
    /// Part being consumed.
    pub part_id: PartId,
    /// Part name at read time.
    pub part_name: PartName,
    /// Units currently charged to the ticket.
    pub quantity_used: u32,
}

/// An open service ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTicket {
    /// Primary key.
    pub id: TicketId,
    /// Vehicle being serviced.
    pub vin: Vin,
    /// Scheduled service date.
    pub service_date: NaiveDate,
    /// Requested work.
    pub description: ServiceDescription,
    /// Owning customer.
    pub customer_id: CustomerId,
    /// Assigned mechanics; never empty.
    pub mechanic_ids: BTreeSet<MechanicId>,
    /// Part usage records, ordered by part id.
    pub parts: Vec<PartUsage>,
}

/// Ticket to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    /// Owning customer.
    pub customer_id: CustomerId,
    /// Vehicle being serviced.
    pub vin: Vin,
    /// Scheduled service date.
    pub service_date: NaiveDate,
    /// Requested work.
    pub description: ServiceDescription,
    /// Initial mechanic set; validated non-empty.
    pub mechanic_ids: BTreeSet<MechanicId>,
}

impl NewTicket {
    /// Assemble a new ticket, requiring at least one mechanic.
    pub fn new(
        customer_id: CustomerId,
        vin: Vin,
        service_date: NaiveDate,
        description: ServiceDescription,
        mechanic_ids: impl IntoIterator<Item = MechanicId>,
    ) -> Result<Self, TicketValidationError> {
        let mechanic_ids: BTreeSet<_> = mechanic_ids.into_iter().collect();
        if mechanic_ids.is_empty() {
            return Err(TicketValidationError::NoMechanics);
        }
        Ok(Self {
            customer_id,
            vin,
            service_date,
            description,
            mechanic_ids,
        })
    }
}

/// Allow-listed partial update of ticket information.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketInfoChanges {
    /// Replacement VIN.
    pub vin: Option<Vin>,
    /// Replacement service date.
    pub service_date: Option<NaiveDate>,
    /// Replacement description.
    pub description: Option<ServiceDescription>,
}

impl TicketInfoChanges {
    /// Merge the changes into `ticket`, field by field.
    pub fn apply_to(&self, ticket: &mut ServiceTicket) {
        if let Some(vin) = &self.vin {
            ticket.vin = vin.clone();
        }
        if let Some(date) = self.service_date {
            ticket.service_date = date;
        }
        if let Some(description) = &self.description {
            ticket.description = description.clone();
        }
    }
}

/// Mechanics to add to and remove from a ticket in one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MechanicChanges {
    /// Mechanics to assign; unknown or already assigned ids are skipped.
    pub add: Vec<MechanicId>,
    /// Mechanics to unassign, in request order.
    pub remove: Vec<MechanicId>,
}

/// Combined reserve/release request for one part on one ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartsAdjustment {
    part_id: PartId,
    quantity_used: u32,
    quantity_returned: u32,
}

impl PartsAdjustment {
    /// Build an adjustment; at least one quantity must be positive.
    pub const fn new(
        part_id: PartId,
        quantity_used: u32,
        quantity_returned: u32,
    ) -> Result<Self, TicketValidationError> {
        if quantity_used == 0 && quantity_returned == 0 {
            return Err(TicketValidationError::EmptyPartsAdjustment);
        }
        Ok(Self {
            part_id,
            quantity_used,
            quantity_returned,
        })
    }

    /// Part being adjusted.
    #[must_use]
    pub const fn part_id(&self) -> PartId {
        self.part_id
    }

    /// Units to reserve from stock.
    #[must_use]
    pub const fn quantity_used(&self) -> u32 {
        self.quantity_used
    }

    /// Units to return to stock.
    #[must_use]
    pub const fn quantity_returned(&self) -> u32 {
        self.quantity_returned
    }

    /// Human-readable summary such as `3 Headlights(s) added and 1 Headlights(s) removed`.
    #[must_use]
    pub fn summary(&self, part_name: &PartName) -> String {
        let mut parts = Vec::with_capacity(2);
        if self.quantity_used > 0 {
            parts.push(format!("{} {part_name}(s) added", self.quantity_used));
        }
        if self.quantity_returned > 0 {
            parts.push(format!("{} {part_name}(s) removed", self.quantity_returned));
        }
        parts.join(" and ")
    }
}
