//! Tracing subscriber setup for the command-line tool

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::io::configuration::LOG_ENV_VAR;

/// Console verbosity chosen on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Warnings and errors only
    Quiet,
    /// Stage summaries
    Normal,
    /// Per-stage detail
    Verbose,
}

impl Verbosity {
    /// Pick a verbosity from the quiet and verbose flags; quiet wins
    pub const fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    /// Filter directive used when the environment sets none
    pub const fn default_directive(self) -> &'static str {
        match self {
            Self::Quiet => "greedymosaic=warn",
            Self::Normal => "greedymosaic=info",
            Self::Verbose => "greedymosaic=debug",
        }
    }
}

/// Build the event filter, preferring the environment over `verbosity`
pub fn build_filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_directive()))
}

/// Install the global subscriber
///
/// Returns `false` if a subscriber was already installed.
pub fn init_logging(verbosity: Verbosity) -> bool {
    tracing_subscriber::registry()
        .with(build_filter(verbosity))
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init()
        .is_ok()
}
