//! Utilities module
//!
//! Contains error handling, logging helpers and file helpers

pub mod error;
pub mod files;
pub mod logging;
