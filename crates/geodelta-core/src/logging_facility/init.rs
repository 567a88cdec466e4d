//! Subscriber installation

use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Output profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable, `debug` and up
    Development,
    /// JSON lines, `info` and up
    Production,
    /// Bare registry; tests attach [`init_test_capture`](super::init_test_capture)
    Test,
}

static INIT_ONCE: Once = Once::new();

/// Default directive when `RUST_LOG` is unset
fn default_filter(profile: Profile) -> &'static str {
    match profile {
        Profile::Development => "geodelta=debug",
        Profile::Production | Profile::Test => "geodelta=info",
    }
}

fn env_filter(profile: Profile) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(profile)))
}

/// Install the global subscriber for `profile`.
///
/// Only the first call in a process has any effect.
///
/// ```
/// use geodelta_core::logging_facility::{init, Profile};
///
/// init(Profile::Production);
/// init(Profile::Development); // ignored
/// ```
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| match profile {
        Profile::Development => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(profile))
                .init();
        }
        Profile::Production => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(env_filter(profile))
                .init();
        }
        Profile::Test => {
            // try_init: a capture layer may already own the global slot
            let _ = tracing_subscriber::registry().try_init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_idempotent() {
        init(Profile::Test);
        init(Profile::Test);
        init(Profile::Production);
    }

    #[test]
    fn test_default_filter_per_profile() {
        assert_eq!(default_filter(Profile::Development), "geodelta=debug");
        assert_eq!(default_filter(Profile::Production), "geodelta=info");
    }
}
