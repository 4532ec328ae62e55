use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Installs the global subscriber. Refresh cycles report at `info`, so the
/// crate logs at `info` by default and at `debug` when `verbose` is set.
/// A non-empty `RUST_LOG` replaces both levels. Logs go to stderr so JSON
/// output on stdout stays clean.
pub fn init_logging(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let from_env = rust_log.as_deref().is_some_and(|v| !v.trim().is_empty());
    let directives = filter_directives(verbose, rust_log.as_deref());
    let env_filter = EnvFilter::try_new(&directives)
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(verbose, None)));

    // The crate-level cap only applies when RUST_LOG is not set.
    let app_filter = (!from_env).then(|| {
        Targets::new()
            .with_target("metalwatch", if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO })
            .with_default(LevelFilter::WARN)
    });

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time().with_writer(std::io::stderr))
        .with(app_filter)
        .with(env_filter)
        .init();
}

fn filter_directives(verbose: bool, rust_log: Option<&str>) -> String {
    match rust_log.map(str::trim) {
        Some(directives) if !directives.is_empty() => directives.to_string(),
        _ => {
            let level = if verbose { "debug" } else { "info" };
            format!("warn,metalwatch={level}")
        }
    }
}
