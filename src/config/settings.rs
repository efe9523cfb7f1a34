//! Application configuration settings
//!
//! Builds the immutable settings struct from command-line arguments,
//! environment variables and the optional configuration file

use super::file::FileConfig;
use crate::cli::GlobalArgs;
use crate::utils::error::{helpers::config_error, AppResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Default Azure/OpenAI API version
pub const DEFAULT_API_VERSION: &str = "2023-03-15-preview";

/// Default OpenAI base URL
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

static DEPLOYMENT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9]+([_-]?[a-zA-Z0-9]+)*$").expect("deployment name pattern is valid")
});

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Settings {
    /// Backend selection and credentials
    pub backend: BackendConfig,
    /// Model or deployment name addressed by every request
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Request configuration
    pub request: RequestConfig,
    /// Terraform workspace configuration
    pub workspace: WorkspaceConfig,
    /// Print completions as they stream in
    pub stream: bool,
    /// Custom deployment name -> known model name
    pub model_mapping: HashMap<String, String>,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Backend configuration; exactly one backend per process
#[derive(Debug, Clone)]
pub enum BackendConfig {
    OpenAI {
        api_key: String,
        base_url: String,
    },
    Azure {
        endpoint: String,
        api_key: String,
        deployment: String,
    },
}

/// Request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// `api-version` query parameter sent with every request
    pub api_version: String,
    /// Non-streaming request timeout in seconds
    pub timeout: u64,
    /// Streaming request timeout in seconds
    pub stream_timeout: u64,
}

/// Terraform workspace configuration
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    /// Directory templates are written to and terraform runs in
    pub working_dir: PathBuf,
    /// Path of the terraform executable
    pub terraform_path: PathBuf,
    /// Ask before applying a draft
    pub require_confirmation: bool,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (text/json)
    pub format: String,
}

impl BackendConfig {
    pub fn api_key(&self) -> &str {
        match self {
            BackendConfig::OpenAI { api_key, .. } | BackendConfig::Azure { api_key, .. } => api_key,
        }
    }
}

impl RequestConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn stream_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_timeout)
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: 30,
            stream_timeout: 300,
        }
    }
}

impl Settings {
    /// Build settings from parsed arguments and an optional config file
    pub fn from_args(args: &GlobalArgs, file: Option<FileConfig>) -> AppResult<Self> {
        let backend = match args.azure_openai_endpoint.as_deref().map(str::trim) {
            Some(endpoint) if !endpoint.is_empty() => BackendConfig::Azure {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                api_key: args.openai_api_key.clone(),
                deployment: args.openai_deployment_name.clone(),
            },
            _ => BackendConfig::OpenAI {
                api_key: args.openai_api_key.clone(),
                base_url: args.openai_base_url.trim_end_matches('/').to_string(),
            },
        };

        let working_dir = match &args.working_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };

        let settings = Self {
            backend,
            model: args.openai_deployment_name.clone(),
            temperature: args.temperature,
            request: RequestConfig {
                api_version: args.api_version.clone(),
                timeout: args.timeout,
                stream_timeout: args.stream_timeout,
            },
            workspace: WorkspaceConfig {
                working_dir,
                terraform_path: args.exec_dir.clone().unwrap_or_else(|| PathBuf::from("terraform")),
                require_confirmation: args.require_confirmation,
            },
            stream: args.stream,
            model_mapping: file.map(|f| f.model_mapping).unwrap_or_default(),
            logging: LoggingConfig {
                level: get_env_or_default("RUST_LOG", "info"),
                format: get_env_or_default("LOG_FORMAT", "text"),
            },
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration validity
    pub fn validate(&self) -> AppResult<()> {
        let api_key = self.backend.api_key();
        if api_key.is_empty() {
            return Err(config_error("API key cannot be empty, set OPENAI_API_KEY"));
        }

        if api_key.contains(char::is_whitespace) {
            return Err(config_error("API key cannot contain whitespace characters"));
        }

        match &self.backend {
            BackendConfig::OpenAI { base_url, .. } => {
                if !base_url.starts_with("http") {
                    return Err(config_error(format!("Invalid OpenAI base URL '{}', should start with 'http'", base_url)));
                }
            }
            BackendConfig::Azure { endpoint, deployment, .. } => {
                if !endpoint.starts_with("http") {
                    return Err(config_error(format!("Invalid Azure OpenAI endpoint '{}', should start with 'http'", endpoint)));
                }
                validate_deployment_name(deployment)?;
            }
        }

        if self.model.trim().is_empty() {
            return Err(config_error("Model or deployment name cannot be empty"));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(config_error(format!("Temperature must be between 0.0 and 2.0, got {}", self.temperature)));
        }

        if self.request.timeout == 0 || self.request.stream_timeout == 0 {
            return Err(config_error("Timeout values cannot be 0"));
        }

        if self.request.api_version.trim().is_empty() {
            return Err(config_error("API version cannot be empty"));
        }

        if let Err(e) = EnvFilter::try_new(&self.logging.level) {
            return Err(config_error(format!("Invalid log level '{}': {}", self.logging.level, e)));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(config_error(format!("Invalid log format: {}", self.logging.format)));
        }

        Ok(())
    }
}

/// Check an Azure deployment name
///
/// Alphanumeric segments joined by single `_` or `-`; may not start or end
/// with a separator.
pub fn validate_deployment_name(name: &str) -> AppResult<()> {
    if DEPLOYMENT_NAME.is_match(name) {
        Ok(())
    } else {
        Err(config_error(format!(
            "Azure OpenAI deployment '{}' can only include alphanumeric characters, '_' and '-', and can't end with '_' or '-'",
            name
        )))
    }
}

/// Get environment variable or default value
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::AppError;

    pub(crate) fn create_test_settings() -> Settings {
        Settings {
            backend: BackendConfig::OpenAI {
                api_key: "sk-test-key".to_string(),
                base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            },
            model: "gpt-4".to_string(),
            temperature: 0.0,
            request: RequestConfig::default(),
            workspace: WorkspaceConfig {
                working_dir: PathBuf::from("."),
                terraform_path: PathBuf::from("terraform"),
                require_confirmation: true,
            },
            stream: false,
            model_mapping: HashMap::new(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "text".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_settings() {
        assert!(create_test_settings().validate().is_ok());
    }

    #[test]
    fn test_temperature_range() {
        let mut settings = create_test_settings();
        settings.temperature = 2.5;
        assert!(settings.validate().is_err());

        settings.temperature = 2.0;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_deployment_names() {
        for name in ["gpt-35-turbo", "prod_gpt4", "a", "a1-b2_c3"] {
            assert!(validate_deployment_name(name).is_ok(), "{}", name);
        }
        for name in ["gpt-4-", "gpt4_", "-gpt4", "gpt--4", "gpt.4", "gpt 4", ""] {
            assert!(validate_deployment_name(name).is_err(), "{}", name);
        }
    }

    #[test]
    fn test_log_level_validation() {
        let mut settings = create_test_settings();
        settings.logging.level = "terraform_ai=debug,reqwest=warn".to_string();
        assert!(settings.validate().is_ok());

        settings.logging.level = "terraform_ai=loud".to_string();
        assert!(matches!(settings.validate(), Err(AppError::Configuration(_))));
    }
}
