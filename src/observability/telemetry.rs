//! Telemetry & Observability
//!
//! Structured logging for playback and authoring.
//! Features:
//! - One-time subscriber setup writing to stderr
//! - Filter precedence: `RUST_LOG`, then the configured filter, then `warn`
//! - Per-scenario spans so interleaved sessions stay readable
//! - Log-safe rendering of authored text

use tracing::{info_span, Span};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when nothing else is configured
pub const DEFAULT_FILTER: &str = "warn";

/// Pick the effective filter directive.
///
/// `RUST_LOG` always wins. Otherwise `verbose` forces `info`, and failing
/// that the configured directive is used.
pub fn resolve_filter(env: Option<&str>, configured: &str, verbose: bool) -> String {
    match env {
        Some(directive) if !directive.trim().is_empty() => directive.to_string(),
        _ if verbose => "info".to_string(),
        _ if configured.trim().is_empty() => DEFAULT_FILTER.to_string(),
        _ => configured.to_string(),
    }
}

/// Initialize tracing from the environment and configuration.
pub fn init_tracing(configured: &str, verbose: bool) {
    let env = std::env::var("RUST_LOG").ok();
    init_tracing_with_filter(&resolve_filter(env.as_deref(), configured, verbose));
}

/// Initialize with custom filter string
pub fn init_tracing_with_filter(filter: &str) {
    // Skip if already initialized
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(false)
            .with_line_number(false)
            .with_level(true)
            .compact()
            .with_writer(std::io::stderr);

        let filter_layer =
            EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .try_init();
    });
}

/// Span covering everything done to one scenario session
pub fn scenario_span(id: &str) -> Span {
    info_span!("scenario", id = %sanitize_for_log(id))
}

/// Sanitize a string for safe log output by escaping control characters.
/// Authored message content may contain newlines that would otherwise forge log lines.
pub fn sanitize_for_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x1b' => out.push_str("\\e"),
            '\x00' => out.push_str("\\0"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            _ => out.push(c),
        }
    }
    out
}
