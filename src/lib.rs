pub mod ai;
pub mod config;
pub mod inspection;
pub mod report;
pub mod standards;
pub mod store;

#[cfg(test)]
mod testing;

use tracing_subscriber::EnvFilter;

/// Load `.env` from the working directory, falling back to its parent
pub fn load_env() {
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_path("../.env");
    }
}

/// Initialize tracing with the RUST_LOG env filter.
/// Default: warn for dependencies, info for this crate.
/// Use RUST_LOG=debug for per-request logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,vigia_lib=info,vigia=info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
