use tracing_subscriber::EnvFilter;

/// Structured logging setup (spec's ambient stack; mirrors the
/// teacher's `tracing_subscriber::fmt` + `EnvFilter` init in
/// `meilisearch::main`, minus the reload-layer machinery that exists
/// there only to support runtime log-route changes over HTTP).
pub fn init(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}
