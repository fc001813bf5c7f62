//! Typed state deltas and the pure merge that applies them.
//!
//! Handlers never touch an [`OrderRecord`] directly. They describe what
//! should change as a [`StateDelta`], and the orchestrator folds the delta
//! into its working copy with [`merge`]. The merge semantics of each change
//! are fixed by its variant:
//!
//! | change                | semantics                                   |
//! |-----------------------|---------------------------------------------|
//! | `AppendItem`          | append at the end, never merged by name     |
//! | `RemoveItemsNamed`    | drop every item whose name matches exactly  |
//! | `SetCustomerName`     | overwrite                                   |
//! | `SetCustomerEmail`    | overwrite                                   |
//! | `Reset`               | back to the empty lifecycle state           |
//!
//! `total` is never carried by a delta; it is recomputed from the items
//! after every change, so the total invariant holds after any merge.

use serde::{Deserialize, Serialize};

use super::record::{LineItem, OrderRecord};
use crate::roles::Role;

/// One change to the order record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OrderChange {
    AppendItem { item: LineItem },
    RemoveItemsNamed { name: String },
    SetCustomerName { name: String },
    SetCustomerEmail { email: String },
    Reset,
}

/// The successful result of an action: order changes, an optional role
/// switch, and the messages describing the outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDelta {
    pub changes: Vec<OrderChange>,
    /// Requested owner of the conversation from the next turn on.
    pub handoff: Option<Role>,
    pub messages: Vec<String>,
}

impl StateDelta {
    /// A delta that only reports something.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            changes: Vec::new(),
            handoff: None,
            messages: vec![text.into()],
        }
    }

    /// A delta carrying order changes plus one outcome message.
    pub fn with_changes(changes: Vec<OrderChange>, text: impl Into<String>) -> Self {
        Self {
            changes,
            handoff: None,
            messages: vec![text.into()],
        }
    }

    /// A pure role-pointer write.
    pub fn handoff(to: Role, text: impl Into<String>) -> Self {
        Self {
            changes: Vec::new(),
            handoff: Some(to),
            messages: vec![text.into()],
        }
    }

    /// `true` when applying the delta cannot change the order record.
    pub fn leaves_order_untouched(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Fold `changes` into a copy of `order`, in order.
pub fn merge(order: &OrderRecord, changes: &[OrderChange]) -> OrderRecord {
    let mut next = order.clone();
    for change in changes {
        match change {
            OrderChange::AppendItem { item } => next.items.push(item.clone()),
            OrderChange::RemoveItemsNamed { name } => next.items.retain(|i| &i.name != name),
            OrderChange::SetCustomerName { name } => next.customer_name = Some(name.clone()),
            OrderChange::SetCustomerEmail { email } => next.customer_email = Some(email.clone()),
            OrderChange::Reset => next = OrderRecord::default(),
        }
    }
    if !changes.is_empty() {
        next.total = next.items_total();
    }
    next
}
