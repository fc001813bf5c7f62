//! Error taxonomy for order-relay.
//!
//! Two families live here:
//!
//! - [`Rejection`] (and the [`ValidationError`] / [`BusinessRuleViolation`]
//!   it wraps) is user-facing. A rejected action never mutates state; its
//!   text is appended to the conversation log and the turn continues.
//! - [`RelayError`] is fatal to the turn. Nothing from the turn is committed.

use rust_decimal::Decimal;

use crate::actions::ActionKind;
use crate::roles::Role;

/// Bad arguments supplied to an action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("item name must not be empty")]
    EmptyItemName,

    #[error("quantity must be greater than zero, got {quantity}")]
    NonPositiveQuantity { quantity: i64 },

    #[error("quantity {quantity} is too large")]
    QuantityTooLarge { quantity: i64 },

    #[error("unit price must not be negative, got {unit_price}")]
    NegativeUnitPrice { unit_price: Decimal },

    #[error("amount overflow while pricing {name}")]
    AmountOverflow { name: String },
}

/// Business rules checked when finalizing an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BusinessRuleViolation {
    #[error("cannot finalize an empty order")]
    EmptyOrder,

    #[error("customer name is required before finalizing")]
    MissingCustomerName,
}

/// Why an action was rejected. Surfaced as a conversation message, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    BusinessRule(#[from] BusinessRuleViolation),
}

/// Failures of the reasoning collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    #[error("reasoning collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("reasoning collaborator returned an invalid decision: {0}")]
    InvalidDecision(String),

    #[error("scripted reasoner has no decision left for turn {turn}")]
    Exhausted { turn: usize },
}

/// Failures of the persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("stored conversation {id} is corrupt: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("storage task failed: {0}")]
    Task(String),
}

/// Errors that abort a turn.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Wiring bug: the collaborator picked an action its role does not own.
    #[error("role {role} is not allowed to invoke {action}")]
    ActionNotAllowed { role: Role, action: ActionKind },

    #[error("decision requested {requested} actions, limit is {limit}")]
    TooManyActions { requested: usize, limit: usize },

    #[error("reasoning failure: {0}")]
    Reasoning(#[from] CollaboratorError),

    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}

impl RelayError {
    /// `true` for failures of an external collaborator rather than of the
    /// orchestrator's own wiring.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(self, RelayError::Reasoning(_) | RelayError::Storage(_))
    }

    /// `true` for configuration errors (role/action wiring, limits).
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            RelayError::ActionNotAllowed { .. } | RelayError::TooManyActions { .. }
        )
    }
}

/// Result type for orchestrator operations.
pub type RelayResult<T> = std::result::Result<T, RelayError>;

/// Result type for persistence operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
