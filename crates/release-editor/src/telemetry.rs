//! Tracing initialisation for release editor binaries.
//!
//! Call [`init_tracing`] once at program start. Later calls are ignored
//! because the global subscriber can only be set once per process.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates that log at the requested level; everything else stays at `warn`
/// so HTTP client internals do not drown the editor's own events.
const EDITOR_TARGETS: [&str; 3] = ["release_editor", "release_gateway", "release_editor_cli"];

fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    std::iter::once("warn".to_string())
        .chain(EDITOR_TARGETS.iter().map(|target| format!("{}={}", target, level)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialise the global tracing subscriber.
///
/// * `json`: emit newline-delimited JSON, each line carrying the fields of
///   the enclosing release span.
/// * `level`: verbosity of the editor crates when `RUST_LOG` is not set.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false))
            .try_init()
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_scopes_level_to_editor_crates() {
        assert_eq!(
            default_directives(Level::DEBUG),
            "warn,release_editor=debug,release_gateway=debug,release_editor_cli=debug"
        );
        assert!(EnvFilter::try_new(default_directives(Level::TRACE)).is_ok());
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_tracing(false, Level::WARN);
        init_tracing(true, Level::DEBUG);
        tracing::info!("still logging");
    }
}
