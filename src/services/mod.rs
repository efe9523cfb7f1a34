//! Service module
//!
//! Model catalog, routing, token budgeting and completion orchestration

pub mod budget;
pub mod catalog;
pub mod orchestrator;
pub mod router;

pub use catalog::Capability;
pub use orchestrator::{Completer, FragmentSink, Orchestrator};
pub use router::CallVariant;
