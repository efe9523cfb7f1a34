//! Logging utilities
//!
//! Logging initialization and compact request summaries for debug logs

use crate::config::LoggingConfig;
use crate::models::CompletionRequest;
use tracing_subscriber::EnvFilter;

/// Prompts longer than this are cut in debug logs
const MAX_LOGGED_PROMPT: usize = 200;

/// Truncate a string with a note about original length
pub fn truncate_content(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }

    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} chars truncated)", &s[..end], s.len() - end)
}

/// Create a filtered summary of a completion request for logging
pub fn summarize_request(request: &CompletionRequest) -> serde_json::Value {
    serde_json::json!({
        "model": request.model(),
        "role": request.role().as_str(),
        "temperature": request.temperature(),
        "max_tokens": request.max_tokens(),
        "prompt": truncate_content(request.prompt(), MAX_LOGGED_PROMPT),
    })
}

/// Initialize the global tracing subscriber
///
/// Logs go to stderr so stdout only ever carries generated templates.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if config.format == "json" {
        // JSON format logs
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .finish(),
        )
    } else {
        // Human readable format
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .finish(),
        )
    };

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("Tracing subscriber already set");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_content() {
        assert_eq!(truncate_content("short", 10), "short");
        assert_eq!(truncate_content("abcdefghij", 4), "abcd... (6 chars truncated)");
        // never splits a multi-byte character
        assert_eq!(truncate_content("héllo", 2), "h... (5 chars truncated)");
    }

    #[test]
    fn test_summarize_request() {
        let request = CompletionRequest::new("gpt-4", "x".repeat(500), 0.3, 42);
        let summary = summarize_request(&request);

        assert_eq!(summary["model"], "gpt-4");
        assert_eq!(summary["role"], "user");
        assert_eq!(summary["max_tokens"], 42);
        assert!(summary["prompt"].as_str().unwrap().contains("300 chars truncated"));
    }
}
