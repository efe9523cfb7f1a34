//! Configuration management module
//!
//! Responsible for loading and managing application configuration from
//! command-line flags, environment variables and the optional config file

pub mod file;
pub mod settings;

pub use file::FileConfig;
pub use settings::{BackendConfig, LoggingConfig, RequestConfig, Settings, WorkspaceConfig};
