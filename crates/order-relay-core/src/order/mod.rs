//! The shared order record and the typed deltas that move it forward.
//!
//! - [`record`]: `OrderRecord`, `LineItem`, `Confirmation` and the
//!   delta-producing operations
//! - [`delta`]: `StateDelta`, `OrderChange`, `merge`

pub mod delta;
pub mod record;

pub use delta::{merge, OrderChange, StateDelta};
pub use record::{Confirmation, LineItem, OrderRecord, MAX_QUANTITY};
