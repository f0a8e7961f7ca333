//! Logging setup and PII redaction

use once_cell::sync::Lazy;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LogFormat;

pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_span_events(FmtSpan::CLOSE))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE),
                )
                .init();
        }
    }

    tracing::info!("Logging initialized with level: {}", config.level);
}

static HOME_DIR: Lazy<Option<String>> =
    Lazy::new(|| dirs::home_dir().map(|p| p.to_string_lossy().into_owned()));

fn strip_home(part: &str) -> Option<String> {
    let home = HOME_DIR.as_deref()?;
    if part.len() >= home.len() && part[..home.len()].eq_ignore_ascii_case(home) {
        let rest = part[home.len()..].trim_start_matches(['/', '\\']);
        return Some(format!("~/{}", rest));
    }
    None
}

/// Replace the user's home directory prefix with `~` in a filesystem path.
/// Usernames embedded in paths must not leave the service in logs or errors.
pub fn redact_path(path: &str) -> String {
    strip_home(path).unwrap_or_else(|| path.to_string())
}

/// Redact home-directory prefixes from every word of a message, e.g. an
/// error body quoting a local path.
pub fn redact_message(msg: &str) -> String {
    if msg.trim().is_empty() {
        return msg.to_string();
    }

    msg.split(' ')
        .map(|part| strip_home(part).unwrap_or_else(|| part.to_string()))
        .collect::<Vec<_>>()
        .join(" ")
}
