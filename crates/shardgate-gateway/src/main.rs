//! shardgate entry point
//!
//! Run with:
//! ```bash
//! cargo run -p shardgate-gateway --bin shardgate
//! ```
//!
//! Configuration is loaded from environment variables (and `.env` when present).

use shardgate_common::{
    install_panic_hook, try_init_tracing, try_init_tracing_with_config, AppConfig, TracingConfig,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            if let Err(e) = try_init_tracing() {
                eprintln!("Warning: Failed to initialize tracing: {e}");
            }
            error!(error = %e, "Failed to load configuration");
            std::process::exit(2);
        }
    };

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }
    install_panic_hook();

    info!(
        name = %config.app.name,
        env = ?config.app.env,
        app_id = config.bot.app_id,
        "Starting shardgate"
    );

    if let Err(e) = shardgate_gateway::app::run(config, CancellationToken::new()).await {
        error!(error = %e, code = e.error_code(), "shardgate stopped");
        std::process::exit(e.exit_code());
    }
    info!("shardgate stopped");
}
