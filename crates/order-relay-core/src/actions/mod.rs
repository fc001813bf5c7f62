//! Named operations a role can invoke.
//!
//! # Module layout
//!
//! - [`ActionKind`]: identifiers used in role allow-lists
//! - [`ActionCall`]: an invocation with typed arguments, as requested by
//!   the reasoning collaborator
//! - [`ActionOutcome`]: `Applied(StateDelta)` or `Rejected`
//! - [`handlers`]: `dispatch` and the per-action handlers

pub mod handlers;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Rejection;
use crate::order::{Confirmation, StateDelta};

pub use handlers::dispatch;

/// Identifier of an action, independent of its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    AddItem,
    RemoveItem,
    UpdateCustomerInfo,
    FinalizeOrder,
    TransferToCheckout,
    TransferToSales,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActionKind::AddItem => "add_item",
            ActionKind::RemoveItem => "remove_item",
            ActionKind::UpdateCustomerInfo => "update_customer_info",
            ActionKind::FinalizeOrder => "finalize_order",
            ActionKind::TransferToCheckout => "transfer_to_checkout",
            ActionKind::TransferToSales => "transfer_to_sales",
        };
        write!(f, "{s}")
    }
}

/// An action invocation with its arguments.
///
/// `quantity` is signed on purpose: the collaborator may ask for a negative
/// quantity, which must come back as a validation rejection rather than a
/// decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionCall {
    AddItem {
        name: String,
        quantity: i64,
        unit_price: Decimal,
    },
    RemoveItem {
        name: String,
    },
    UpdateCustomerInfo {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        email: Option<String>,
    },
    FinalizeOrder,
    TransferToCheckout,
    TransferToSales,
}

impl ActionCall {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionCall::AddItem { .. } => ActionKind::AddItem,
            ActionCall::RemoveItem { .. } => ActionKind::RemoveItem,
            ActionCall::UpdateCustomerInfo { .. } => ActionKind::UpdateCustomerInfo,
            ActionCall::FinalizeOrder => ActionKind::FinalizeOrder,
            ActionCall::TransferToCheckout => ActionKind::TransferToCheckout,
            ActionCall::TransferToSales => ActionKind::TransferToSales,
        }
    }

    pub fn add_item(name: impl Into<String>, quantity: i64, unit_price: Decimal) -> Self {
        ActionCall::AddItem {
            name: name.into(),
            quantity,
            unit_price,
        }
    }

    pub fn remove_item(name: impl Into<String>) -> Self {
        ActionCall::RemoveItem { name: name.into() }
    }

    pub fn update_customer_info(name: Option<&str>, email: Option<&str>) -> Self {
        ActionCall::UpdateCustomerInfo {
            name: name.map(str::to_string),
            email: email.map(str::to_string),
        }
    }
}

/// Result of running one handler. Never partially applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied {
        delta: StateDelta,
        /// Present only for a successful `finalize_order`.
        confirmation: Option<Confirmation>,
    },
    Rejected {
        reason: Rejection,
        /// Explanation appended to the conversation log.
        message: String,
    },
}

impl ActionOutcome {
    pub fn applied(delta: StateDelta) -> Self {
        ActionOutcome::Applied {
            delta,
            confirmation: None,
        }
    }

    pub fn rejected(kind: ActionKind, reason: impl Into<Rejection>) -> Self {
        let reason = reason.into();
        let message = format!("{kind} rejected: {reason}");
        ActionOutcome::Rejected { reason, message }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, ActionOutcome::Rejected { .. })
    }

    /// Messages this outcome contributes to the log. Never empty.
    pub fn messages(&self) -> Vec<&str> {
        match self {
            ActionOutcome::Applied { delta, .. } => {
                delta.messages.iter().map(String::as_str).collect()
            }
            ActionOutcome::Rejected { message, .. } => vec![message.as_str()],
        }
    }
}
