//! Tracing setup and request spans.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use axum::extract::Request;
use tracing::{Level, Span};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::Result;

/// Query parameters whose values never reach the logs.
const REDACTED_PARAMS: &[&str] = &["token"];

fn parse_level(level: &str) -> Level {
    level.trim().parse().unwrap_or(Level::INFO)
}

/// `RUST_LOG` wins; the configured level is added as a default directive.
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::from_default_env().add_directive(parse_level(level).into())
}

/// Log to stdout and to `config.file`, creating its directory if needed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    if let Some(dir) = Path::new(&config.file).parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    let log_file = Arc::new(File::create(&config.file)?);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout.and(log_file))
                .with_ansi(false)
                .with_target(true),
        )
        .with(env_filter(&config.level))
        .init();

    Ok(())
}

/// Console-only logging, used when the log file cannot be opened.
pub fn init_console_only(level: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(env_filter(level))
        .init();
}

/// Path and query of a URI with access tokens masked.
///
/// Download links may carry the JWT as `?token=`; the trace span must not.
pub fn redact_uri(path: &str, query: Option<&str>) -> String {
    let Some(query) = query else {
        return path.to_string();
    };

    let masked: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if REDACTED_PARAMS.contains(&key) => format!("{key}=[redacted]"),
            _ => pair.to_string(),
        })
        .collect();
    format!("{}?{}", path, masked.join("&"))
}

/// Span for `TraceLayer`, recording the request with a redacted URI.
pub fn request_span(request: &Request) -> Span {
    let uri = request.uri();
    tracing::debug_span!(
        "request",
        method = %request.method(),
        uri = %redact_uri(uri.path(), uri.query()),
        version = ?request.version(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level(" WARN "), Level::WARN);
        assert_eq!(parse_level("verbose"), Level::INFO);
    }

    #[test]
    fn test_redact_uri_masks_token() {
        assert_eq!(
            redact_uri("/api/files/a.txt", Some("token=abc.def.ghi&inline=1")),
            "/api/files/a.txt?token=[redacted]&inline=1"
        );
        assert_eq!(redact_uri("/api/dashboard", None), "/api/dashboard");
        assert_eq!(redact_uri("/api/x", Some("tokens=1")), "/api/x?tokens=1");
    }

    #[test]
    fn test_request_span_builds() {
        let request = Request::builder()
            .uri("/api/files/a.txt?token=secret")
            .body(axum::body::Body::empty())
            .unwrap();
        let _span = request_span(&request);
    }
}
