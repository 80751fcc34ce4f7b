// Signage engine server.
//
// Serves the display snapshot and the admin API:
//   - Screens poll /api/v1/display-state
//   - The back office manages schedules and videos under /api/v1
//   - Run behind a reverse proxy (nginx) for HTTPS and internet exposure

use anyhow::Context;
use tracing::info;

use signage_engine::api::{build_router, AppState};
use signage_engine::config::{Clock, Config};
use signage_engine::db::Database;
use signage_engine::shutdown_signal;
use signage_engine::state::StateComputer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?),
        )
        .init();

    let version = env!("CARGO_PKG_VERSION").to_string();
    let config = Config::from_env()?;

    let db = Database::open(&config.db_path)
        .with_context(|| format!("opening database at {}", config.db_path))?;

    let computer = StateComputer::new(config.berbuka_window);
    info!(
        offset = %config.utc_offset,
        berbuka_window_secs = computer.berbuka_window().whole_seconds(),
        "schedule times are local civil time"
    );

    let state = AppState {
        version,
        db,
        computer,
        clock: Clock::System(config.utc_offset),
    };

    let app = build_router(state);

    // Loopback by default; put Nginx/Caddy in front for LAN/Internet.
    let addr = config.bind;
    info!("Signage engine starting on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
