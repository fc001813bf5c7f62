//! Order Relay Core Library
//!
//! A sales role and a checkout role share one order record and hand the
//! conversation to each other. This crate holds the handoff orchestrator:
//! the active-role state machine, the typed delta protocol that mutates the
//! shared order, and the per-role projections of that order.
//!
//! Reasoning (which actions to run) and persistence are external
//! collaborators, consumed through [`ReasoningCollaborator`] and
//! [`ConversationStore`].

pub mod actions;
pub mod config;
pub mod conversation;
pub mod error;
pub mod obs;
pub mod orchestrator;
pub mod order;
pub mod projection;
pub mod reasoning;
pub mod roles;
pub mod store;
pub mod telemetry;

pub use actions::{dispatch, ActionCall, ActionKind, ActionOutcome};
pub use config::{ConfigError, RelayConfig};
pub use conversation::{ConversationId, ConversationState, Speaker, TurnEffects, TurnRecord};
pub use error::{
    BusinessRuleViolation, CollaboratorError, Rejection, RelayError, RelayResult, StorageError,
    StorageResult, ValidationError,
};
pub use obs::{turn_span, NoopSink, RelaySink, TracingSink, TurnEvent};
pub use orchestrator::{Orchestrator, TurnOutcome};
pub use order::{merge, Confirmation, LineItem, OrderChange, OrderRecord, StateDelta};
pub use projection::{
    checkout_projection, format_money, render_system_context, sales_projection,
};
pub use reasoning::{Decision, ReasoningCollaborator, ReasoningRequest, ScriptedReasoner};
pub use roles::{Role, RoleTemplate};
pub use store::{ConversationStore, FsConversationStore, MemoryConversationStore};
pub use telemetry::init_tracing;

/// Order Relay version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
