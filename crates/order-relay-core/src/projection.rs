//! Role-specific views of the order record.
//!
//! Projections are pure functions of an [`OrderRecord`]. The orchestrator
//! recomputes them at the start of every turn; nothing here is cached.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::order::OrderRecord;
use crate::roles::Role;

/// Shown to checkout when a customer field is unset.
pub const NOT_PROVIDED: &str = "Not provided";

/// `$12.34`, rounded half away from zero.
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("${rounded:.2}")
}

/// Sales view: items and total only, no customer fields.
pub fn sales_projection(order: &OrderRecord) -> String {
    if order.items.is_empty() {
        return "Current Order: Empty\nTotal: $0.00".to_string();
    }

    let lines: Vec<String> = order
        .items
        .iter()
        .map(|item| {
            format!(
                "  - {}x {} @ {} = {}",
                item.quantity,
                item.name,
                format_money(item.unit_price),
                format_money(item.line_total)
            )
        })
        .collect();

    format!(
        "Current Order:\n{}\nTotal: {}",
        lines.join("\n"),
        format_money(order.total)
    )
}

/// Checkout view: customer details, every item, and the total.
pub fn checkout_projection(order: &OrderRecord) -> String {
    let name = order
        .customer_name
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(NOT_PROVIDED);
    let email = order
        .customer_email
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(NOT_PROVIDED);

    let items = if order.items.is_empty() {
        "  (none)".to_string()
    } else {
        order
            .items
            .iter()
            .map(|item| {
                format!(
                    "  - {}x {} @ {}",
                    item.quantity,
                    item.name,
                    format_money(item.unit_price)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Customer: {name}\nEmail: {email}\nOrder Items:\n{items}\nOrder Total: {}",
        format_money(order.total)
    )
}

/// The full working context for `role`: its directive followed by a fresh
/// projection of `order`.
pub fn render_system_context(role: Role, order: &OrderRecord) -> String {
    let template = role.template();
    format!(
        "{}\n\n---\nCURRENT CONTEXT:\n{}\n---\n",
        template.directive,
        (template.projector)(order)
    )
}
