//! Opt-in `tracing` subscriber for the extension.
//!
//! The extension runs inside a host process that owns stdout, so nothing is
//! installed unless `CPF_SHEET_LOG` carries a filter directive. Events go to
//! stderr, as JSON lines when `CPF_SHEET_LOG_JSON` is truthy.
use std::env;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter directive, e.g. `cpf_sheet=debug`
pub(crate) const LOG_ENV: &str = "CPF_SHEET_LOG";
pub(crate) const LOG_JSON_ENV: &str = "CPF_SHEET_LOG_JSON";

/// Installs the global subscriber when `CPF_SHEET_LOG` is set.
///
/// A subscriber already installed by the host wins; the failure to install
/// ours is ignored.
pub(crate) fn init() {
    let Some(filter) = env::var(LOG_ENV).ok().and_then(|directive| parse_filter(&directive)) else {
        return;
    };
    let registry = tracing_subscriber::registry().with(filter);
    let installed = if env_bool(LOG_JSON_ENV, false) {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if installed.is_ok() {
        tracing::debug!(filter = %env::var(LOG_ENV).unwrap_or_default(), "cpf_sheet logging enabled");
    }
}

/// Parses a filter directive; blank or malformed directives disable logging.
fn parse_filter(directive: &str) -> Option<EnvFilter> {
    let directive = directive.trim();
    if directive.is_empty() {
        return None;
    }
    EnvFilter::try_new(directive).ok()
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_bool(&value))
        .unwrap_or(default)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_flags() {
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn filter_directives() {
        assert!(parse_filter("cpf_sheet=debug").is_some());
        assert!(parse_filter("warn").is_some());
        assert!(parse_filter("   ").is_none());
        assert!(parse_filter("cpf_sheet=loudest").is_none());
    }
}
