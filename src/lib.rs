// Signage display state engine.
//
// The server side (`api`, `db`, `state`, `schedule`) turns today's prayer
// schedule and the video library into a display snapshot. The display side
// (`client`, `sync`, `playlist`, `player`) polls that snapshot and keeps a
// screen playing the right thing.

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod model;
pub mod player;
pub mod playlist;
pub mod schedule;
pub mod state;
pub mod sync;

use tracing::warn;

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let term = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("sigterm handler unavailable: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let term = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = term => {},
    }

    warn!("Shutdown signal received.");
}
