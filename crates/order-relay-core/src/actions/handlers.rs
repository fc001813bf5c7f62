//! Action handlers.
//!
//! A handler reads the current order record and its own arguments and
//! returns an [`ActionOutcome`]. It does not check whether the active role
//! may call it; the orchestrator gates that before dispatch.

use rust_decimal::Decimal;

use super::{ActionCall, ActionKind, ActionOutcome};
use crate::order::{OrderRecord, StateDelta};
use crate::roles::Role;

/// Route `call` to its handler.
pub fn dispatch(order: &OrderRecord, call: &ActionCall) -> ActionOutcome {
    match call {
        ActionCall::AddItem {
            name,
            quantity,
            unit_price,
        } => add_item(order, name, *quantity, *unit_price),
        ActionCall::RemoveItem { name } => remove_item(order, name),
        ActionCall::UpdateCustomerInfo { name, email } => {
            update_customer_info(order, name.as_deref(), email.as_deref())
        }
        ActionCall::FinalizeOrder => finalize_order(order),
        ActionCall::TransferToCheckout => transfer_to_checkout(),
        ActionCall::TransferToSales => transfer_to_sales(),
    }
}

pub fn add_item(order: &OrderRecord, name: &str, quantity: i64, unit_price: Decimal) -> ActionOutcome {
    match order.add_item(name, quantity, unit_price) {
        Ok(delta) => ActionOutcome::applied(delta),
        Err(e) => ActionOutcome::rejected(ActionKind::AddItem, e),
    }
}

pub fn remove_item(order: &OrderRecord, name: &str) -> ActionOutcome {
    ActionOutcome::applied(order.remove_item(name))
}

pub fn update_customer_info(
    order: &OrderRecord,
    name: Option<&str>,
    email: Option<&str>,
) -> ActionOutcome {
    ActionOutcome::applied(order.update_customer_info(name, email))
}

pub fn finalize_order(order: &OrderRecord) -> ActionOutcome {
    match order.finalize() {
        Ok((confirmation, delta)) => ActionOutcome::Applied {
            delta,
            confirmation: Some(confirmation),
        },
        Err(e) => ActionOutcome::rejected(ActionKind::FinalizeOrder, e),
    }
}

pub fn transfer_to_checkout() -> ActionOutcome {
    ActionOutcome::applied(StateDelta::handoff(
        Role::Checkout,
        "Transferring to checkout",
    ))
}

pub fn transfer_to_sales() -> ActionOutcome {
    ActionOutcome::applied(StateDelta::handoff(Role::Sales, "Transferring to sales"))
}
