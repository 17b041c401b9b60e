//! Logging handle passed to pipelines and components
//!
//! A `Logger` is owned by each pipeline and handed to components when they
//! describe themselves. It carries a `tracing` span naming its owner so
//! every line it emits can be attributed, and keeps no global state.
//! Process-wide subscriber setup happens once through [`init_logging`].

use tracing::{info, Span};

const DEFAULT_FILTER: &str = "automl_pipelines=info";

/// Install the global `tracing` subscriber.
///
/// Honors `RUST_LOG`; falls back to `automl_pipelines=info`. Calling this
/// more than once is a no-op.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .try_init();
}

/// Structured log sink used by `describe`
#[derive(Debug, Clone)]
pub struct Logger {
    span: Span,
}

impl Logger {
    /// Create a logger whose lines are attributed to `owner`
    pub fn new(owner: &str) -> Self {
        Self {
            span: tracing::info_span!("pipeline", name = %owner),
        }
    }

    /// Span the logger emits under
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Log a title framed by asterisks
    pub fn log_title(&self, title: &str) {
        let _guard = self.span.enter();
        let frame = "*".repeat(title.chars().count() + 4);
        info!("{}", frame);
        info!("* {} *", title);
        info!("{}", frame);
    }

    /// Log a subtitle underlined with `=`
    pub fn log_subtitle(&self, title: &str) {
        let _guard = self.span.enter();
        info!("{}", title);
        info!("{}", "=".repeat(title.chars().count()));
    }

    /// Log a single line
    pub fn log(&self, message: &str) {
        let _guard = self.span.enter();
        info!("{}", message);
    }
}
