//! Inventory parts.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::Error;
use super::ids::PartId;

/// Minimum accepted part name length.
pub const PART_NAME_MIN: usize = 2;

/// Validation errors raised by part value constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValidationError {
    /// Name shorter than [`PART_NAME_MIN`] characters once trimmed.
    NameTooShort { min: usize },
    /// Price below one cent.
    PriceTooLow,
    /// Price carries fractions of a cent.
    PriceTooPrecise,
    /// Price does not fit the store's cent column.
    PriceOutOfRange,
}

impl fmt::Display for PartValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameTooShort { min } => {
                write!(f, "Part name must be at least {min} characters long")
            }
            Self::PriceTooLow => write!(f, "Price must be at least 0.01"),
            Self::PriceTooPrecise => write!(f, "Price must have at most two decimal places"),
            Self::PriceOutOfRange => write!(f, "Price is too large"),
        }
    }
}

impl std::error::Error for PartValidationError {}

impl From<PartValidationError> for Error {
    fn from(value: PartValidationError) -> Self {
        let (field, code) = match value {
            PartValidationError::NameTooShort { .. } => ("name", "too_short"),
            PartValidationError::PriceTooLow => ("price", "too_low"),
            PartValidationError::PriceTooPrecise | PartValidationError::PriceOutOfRange => {
                ("price", "invalid_amount")
            }
        };
        Self::invalid_field(field, code, value.to_string())
    }
}

/// Part name, unique across the inventory.
///
/// Uniqueness is case-sensitive: `Headlights` and `headlights` are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartName(String);

impl PartName {
    /// Validate and construct a part name; surrounding whitespace is dropped.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, PartValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.chars().count() < PART_NAME_MIN {
            return Err(PartValidationError::NameTooShort {
                min: PART_NAME_MIN,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for PartName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PartName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<PartName> for String {
    fn from(value: PartName) -> Self {
        value.0
    }
}

impl TryFrom<String> for PartName {
    type Error = PartValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Unit price with cent precision, at least 0.01.
///
/// # Examples
/// ```
/// use mechanic_shop::domain::UnitPrice;
/// use rust_decimal::Decimal;
///
/// let price = UnitPrice::new(Decimal::new(5999, 2)).expect("valid price");
/// assert_eq!(price.cents(), 5999);
/// assert!(UnitPrice::new(Decimal::ZERO).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct UnitPrice(i64);

impl UnitPrice {
    /// Validate a decimal amount.
    pub fn new(amount: Decimal) -> Result<Self, PartValidationError> {
        if amount < Decimal::new(1, 2) {
            return Err(PartValidationError::PriceTooLow);
        }
        let normalized = amount.normalize();
        if normalized.scale() > 2 {
            return Err(PartValidationError::PriceTooPrecise);
        }
        let cents = normalized
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|value| i64::try_from(value).ok())
            .ok_or(PartValidationError::PriceOutOfRange)?;
        Ok(Self(cents))
    }

    /// Rebuild a price from a stored cent amount.
    pub const fn from_cents(cents: i64) -> Result<Self, PartValidationError> {
        if cents < 1 {
            return Err(PartValidationError::PriceTooLow);
        }
        Ok(Self(cents))
    }

    /// Price in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Price as a two-place decimal.
    #[must_use]
    pub fn amount(self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

impl TryFrom<Decimal> for UnitPrice {
    type Error = PartValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UnitPrice> for Decimal {
    fn from(value: UnitPrice) -> Self {
        value.amount()
    }
}

/// Largest stock count any store accepts; matches a PostgreSQL `INTEGER`.
pub const MAX_QUANTITY: u32 = 2_147_483_647;

/// A stocked inventory part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Primary key.
    pub id: PartId,
    /// Unique name.
    pub name: PartName,
    /// Unit price.
    pub price: UnitPrice,
    /// Units currently on the shelf.
    pub quantity_on_hand: u32,
}

/// Part to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPart {
    /// Unique name.
    pub name: PartName,
    /// Unit price.
    pub price: UnitPrice,
    /// Initial stock.
    pub quantity_on_hand: u32,
}

/// Allow-listed partial update of a part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartChanges {
    /// Replacement name; uniqueness excludes the part itself.
    pub name: Option<PartName>,
    /// Replacement price.
    pub price: Option<UnitPrice>,
    /// Replacement on-hand quantity (restock or stocktake correction).
    pub quantity_on_hand: Option<u32>,
}

impl PartChanges {
    /// Whether no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.quantity_on_hand.is_none()
    }

    /// Merge the changes into `part`, field by field.
    pub fn apply_to(&self, part: &mut Part) {
        if let Some(name) = &self.name {
            part.name = name.clone();
        }
        if let Some(price) = self.price {
            part.price = price;
        }
        if let Some(quantity) = self.quantity_on_hand {
            part.quantity_on_hand = quantity;
        }
    }
}
