//! Headless game server.
//!
//! Composition root: loads configuration and map templates, builds the
//! runtime and hosts demo rooms of virtual players until every game ends
//! or the process is interrupted.
//!
//! ```bash
//! ROOM_COUNT=4 RNG_SEED=7 RUST_LOG=runtime=debug cargo run -p game-server
//! ```
mod config;
mod demo;
mod logging;

use std::sync::Arc;

use anyhow::Result;

use config::ServerConfig;
use runtime::Runtime;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = ServerConfig::from_env();
    let _guard = logging::setup_logging(config.log_dir.as_deref())?;

    let templates = demo::load_templates(&config)?;
    tracing::info!(
        rooms = config.room_count,
        templates = templates.len(),
        seed = ?config.runtime.rng_seed,
        "starting game server"
    );

    let runtime = Runtime::builder()
        .config(config.runtime.clone())
        .templates(Arc::new(templates))
        .build();

    let result = tokio::select! {
        result = demo::run(&runtime, &config) => result,
        signal = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, shutting down");
            signal.map_err(Into::into)
        }
    };

    runtime.shutdown().await?;
    result
}
