use tracing::trace_span;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};
use tracing_tree::HierarchicalLayer;

const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let tree = HierarchicalLayer::default()
        .with_indent_amount(2)
        .with_targets(true)
        .with_bracketed_fields(true);
    if Registry::default().with(filter).with(tree).try_init().is_err() {
        tracing::debug!("global subscriber already installed");
    }
}

/// Runs `f` inside a trace span named after the engine operation.
pub fn trace_misc<T>(name: &'static str, f: impl FnOnce() -> T) -> T {
    let _span = trace_span!("misc", op = name).entered();
    f()
}
