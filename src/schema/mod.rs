//! Raw interaction input schema
//!
//! Platform-level interaction records (as a browser or desktop hook would
//! report them) and the classifier that turns them into the monitor's typed
//! [`InteractionEvent`](crate::types::InteractionEvent)s. Malformed records
//! are rejected here, before they reach the logger.

mod classifier;
mod raw_interaction;

pub use classifier::*;
pub use raw_interaction::*;
