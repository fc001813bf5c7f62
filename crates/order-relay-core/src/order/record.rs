//! The shared order record and its operations.
//!
//! Operations never mutate the record. Each one inspects the current state
//! and returns the [`StateDelta`] that would carry it forward, or the reason
//! it cannot.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::delta::{OrderChange, StateDelta};
use crate::error::{BusinessRuleViolation, ValidationError};
use crate::projection::format_money;

/// Largest quantity accepted for a single line.
pub const MAX_QUANTITY: i64 = 10_000;

/// One line of the order. `line_total` is always `quantity * unit_price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl LineItem {
    /// Build a line, computing its total. Arguments are assumed validated.
    pub fn priced(name: impl Into<String>, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit_price,
            line_total: Decimal::from(quantity) * unit_price,
        }
    }
}

/// The cart plus customer details shared by every role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub items: Vec<LineItem>,
    /// Always equal to the sum of `items[].line_total`.
    pub total: Decimal,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
}

/// Proof of a placed order, built from the record just before it resets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub confirmation_id: Uuid,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub item_count: usize,
    pub total: Decimal,
    pub placed_at: DateTime<Utc>,
}

impl Confirmation {
    pub fn summary(&self) -> String {
        format!(
            "Order {} placed for {}: {} line(s), total {}",
            self.confirmation_id,
            self.customer_name,
            self.item_count,
            format_money(self.total)
        )
    }
}

impl OrderRecord {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all line totals.
    pub fn items_total(&self) -> Decimal {
        self.items.iter().map(|i| i.line_total).sum()
    }

    /// `true` when `total` matches the items.
    pub fn total_is_consistent(&self) -> bool {
        self.total == self.items_total()
    }

    /// Customer name, or `""` when unset.
    pub fn customer_name(&self) -> &str {
        self.customer_name.as_deref().unwrap_or_default()
    }

    /// Customer email, or `""` when unset.
    pub fn customer_email(&self) -> &str {
        self.customer_email.as_deref().unwrap_or_default()
    }

    /// Append a new line. Identical names are never merged.
    pub fn add_item(
        &self,
        name: &str,
        quantity: i64,
        unit_price: Decimal,
    ) -> Result<StateDelta, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyItemName);
        }
        if quantity <= 0 {
            return Err(ValidationError::NonPositiveQuantity { quantity });
        }
        if quantity > MAX_QUANTITY {
            return Err(ValidationError::QuantityTooLarge { quantity });
        }
        if unit_price < Decimal::ZERO {
            return Err(ValidationError::NegativeUnitPrice { unit_price });
        }
        let quantity = u32::try_from(quantity)
            .map_err(|_| ValidationError::QuantityTooLarge { quantity })?;
        let line_total = Decimal::from(quantity)
            .checked_mul(unit_price)
            .filter(|lt| self.total.checked_add(*lt).is_some())
            .ok_or_else(|| ValidationError::AmountOverflow {
                name: name.to_string(),
            })?;

        let item = LineItem {
            name: name.to_string(),
            quantity,
            unit_price,
            line_total,
        };
        let text = format!(
            "Added {}x {} at {} each ({})",
            quantity,
            item.name,
            format_money(unit_price),
            format_money(line_total)
        );
        Ok(StateDelta::with_changes(
            vec![OrderChange::AppendItem { item }],
            text,
        ))
    }

    /// Remove every line named exactly `name`, trimmed the same way
    /// [`add_item`](Self::add_item) trims it. No match is a no-op success.
    pub fn remove_item(&self, name: &str) -> StateDelta {
        let name = name.trim();
        let removed: Vec<&LineItem> = self.items.iter().filter(|i| i.name == name).collect();
        if removed.is_empty() {
            return StateDelta::message(format!("{name} is not in the order; nothing removed"));
        }
        let removed_total: Decimal = removed.iter().map(|i| i.line_total).sum();
        StateDelta::with_changes(
            vec![OrderChange::RemoveItemsNamed {
                name: name.to_string(),
            }],
            format!(
                "Removed {} line(s) of {} ({})",
                removed.len(),
                name,
                format_money(removed_total)
            ),
        )
    }

    /// Partial update: blank or missing fields keep their current value.
    pub fn update_customer_info(&self, name: Option<&str>, email: Option<&str>) -> StateDelta {
        let name = name.map(str::trim).filter(|s| !s.is_empty());
        let email = email.map(str::trim).filter(|s| !s.is_empty());

        let mut changes = Vec::new();
        let mut updated = Vec::new();
        if let Some(name) = name {
            changes.push(OrderChange::SetCustomerName {
                name: name.to_string(),
            });
            updated.push(format!("name {name}"));
        }
        if let Some(email) = email {
            changes.push(OrderChange::SetCustomerEmail {
                email: email.to_string(),
            });
            updated.push(format!("email {email}"));
        }

        if changes.is_empty() {
            return StateDelta::message("No customer details provided; nothing updated");
        }
        StateDelta::with_changes(
            changes,
            format!("Updated customer {}", updated.join(" and ")),
        )
    }

    /// Place the order. On success the delta resets the record.
    pub fn finalize(&self) -> Result<(Confirmation, StateDelta), BusinessRuleViolation> {
        if self.items.is_empty() {
            return Err(BusinessRuleViolation::EmptyOrder);
        }
        let customer_name = self.customer_name().trim();
        if customer_name.is_empty() {
            return Err(BusinessRuleViolation::MissingCustomerName);
        }

        let confirmation = Confirmation {
            confirmation_id: Uuid::new_v4(),
            customer_name: customer_name.to_string(),
            customer_email: self.customer_email.clone(),
            item_count: self.items.len(),
            total: self.total,
            placed_at: Utc::now(),
        };
        let delta = StateDelta::with_changes(vec![OrderChange::Reset], confirmation.summary());
        Ok((confirmation, delta))
    }
}
