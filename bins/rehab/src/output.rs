//! Terminal output utilities
//!
//! Provides consistent formatting for CLI output.

use clap::ValueEnum;
use owo_colors::OwoColorize;
use rehab_api_client::{ApiError, ApiResponse};
use rehab_core::error::exit_codes;
use serde::Serialize;
use std::time::Duration;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable text
    Text,
    /// `{ ok, data | error }` JSON envelope
    Json,
}

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue(), message);
    }

    /// Print a header
    pub fn header(message: &str) {
        println!();
        println!("{}", message.bold());
        println!("{}", "─".repeat(message.chars().count()));
    }
}

/// Marker appended to lines served from the local cache
pub fn cache_marker(from_cache: bool) -> String {
    if from_cache {
        format!(" {}", "(cached)".dimmed())
    } else {
        String::new()
    }
}

/// Print `data` as JSON, or hand it to `text` for the human-readable form
pub fn emit<T: Serialize>(format: Format, data: &T, text: impl FnOnce(&T)) -> anyhow::Result<()> {
    match format {
        Format::Json => {
            let envelope = ApiResponse {
                ok: true,
                data: Some(data),
                error: None,
            };
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
        Format::Text => text(data),
    }
    Ok(())
}

/// Report a failed command
pub fn report_error(err: &anyhow::Error, format: Format) {
    match format {
        Format::Json => {
            let envelope = ApiResponse::<()> {
                ok: false,
                data: None,
                error: Some(err.to_string()),
            };
            match serde_json::to_string_pretty(&envelope) {
                Ok(json) => println!("{json}"),
                Err(_) => Status::error(&err.to_string()),
            }
        }
        Format::Text => {
            Status::error(&err.to_string());
            if let Some(hint) = hint_for(err) {
                eprintln!("  {}", hint.dimmed());
            }
        }
    }
}

fn hint_for(err: &anyhow::Error) -> Option<&'static str> {
    let api = err.downcast_ref::<ApiError>()?;
    if api.is_unauthorized() {
        Some("Run `rehab login <email>` to start a session")
    } else if api.is_offline() {
        Some("Check your connection or the --api-url setting")
    } else {
        None
    }
}

/// Process exit code for a failed command
pub fn exit_code(err: &anyhow::Error) -> u8 {
    let code = match err.downcast_ref::<ApiError>() {
        Some(api) if api.is_unauthorized() => exit_codes::AUTH_REQUIRED,
        Some(api) if api.is_offline() => exit_codes::OFFLINE,
        Some(api) if api.is_validation() => exit_codes::VALIDATION_ERROR,
        Some(ApiError::Config(_) | ApiError::InvalidUrl(_)) => exit_codes::CONFIG_ERROR,
        Some(ApiError::Storage(_)) => exit_codes::STORAGE_ERROR,
        _ => exit_codes::FAILURE,
    };
    u8::try_from(code).unwrap_or(1)
}

/// Format a duration for display
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f32();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else {
        format!("{secs:.1}s")
    }
}
