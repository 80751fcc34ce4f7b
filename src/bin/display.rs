// Signage display client.
//
// Polls the engine for the display snapshot and drives a local media player.
// Viewer controls come in on stdin, one per line:
//   m   toggle mute
//   r   refresh now

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use signage_engine::client::HttpSnapshotSource;
use signage_engine::player::{CommandPlayer, PlayerConfig};
use signage_engine::shutdown_signal;
use signage_engine::sync::{DisplayCommand, DisplaySession, Synchronizer};

#[derive(Debug, Parser)]
#[command(name = "signage-display", version, about = "Signage display client")]
struct Cli {
    /// Base URL of the signage engine.
    #[arg(long, env = "SIGNAGE_SERVER_URL", default_value = "http://127.0.0.1:3000")]
    server_url: String,

    /// Seconds between display-state polls.
    #[arg(long, env = "SIGNAGE_POLL_SECS", default_value_t = 30)]
    poll_secs: u64,

    /// Per-request timeout for polls, in seconds.
    #[arg(long, env = "SIGNAGE_HTTP_TIMEOUT_SECS", default_value_t = 10)]
    http_timeout_secs: u64,

    /// Media player program.
    #[arg(long, env = "SIGNAGE_PLAYER", default_value = "mpv")]
    player: String,

    /// Player arguments, whitespace separated. Replaces the mpv defaults.
    #[arg(long, env = "SIGNAGE_PLAYER_ARGS", allow_hyphen_values = true)]
    player_args: Option<String>,

    /// Extra player arguments for muted playback, whitespace separated.
    #[arg(long, env = "SIGNAGE_PLAYER_MUTE_ARGS", allow_hyphen_values = true)]
    mute_args: Option<String>,

    /// Image shown when there is nothing playable.
    #[arg(long, env = "SIGNAGE_BRAND_CARD")]
    brand_card: Option<String>,

    /// mpv IPC socket used to change mute on the running clip.
    #[arg(long, env = "SIGNAGE_PLAYER_IPC_SOCKET")]
    ipc_socket: Option<PathBuf>,

    /// Do not pass an IPC socket to the player; mute then applies from the
    /// next clip.
    #[arg(long, env = "SIGNAGE_NO_IPC", conflicts_with = "ipc_socket")]
    no_ipc: bool,

    /// Start with sound off.
    #[arg(long, env = "SIGNAGE_START_MUTED")]
    start_muted: bool,
}

impl Cli {
    fn player_config(&self) -> PlayerConfig {
        let defaults = PlayerConfig::default();
        let split = |s: &str| s.split_whitespace().map(str::to_string).collect::<Vec<_>>();
        PlayerConfig {
            program: self.player.clone(),
            args: self.player_args.as_deref().map(split).unwrap_or(defaults.args),
            mute_args: self.mute_args.as_deref().map(split).unwrap_or(defaults.mute_args),
            brand_card: self.brand_card.clone(),
            brand_card_args: defaults.brand_card_args,
            ipc_socket: if self.no_ipc {
                None
            } else {
                // The default socket only makes sense for mpv.
                let mpv = self.player.ends_with("mpv");
                self.ipc_socket.clone().or(defaults.ipc_socket.filter(|_| mpv))
            },
        }
    }
}

fn parse_command(line: &str) -> Option<DisplayCommand> {
    match line.trim() {
        "m" | "mute" => Some(DisplayCommand::ToggleMute),
        "r" | "refresh" => Some(DisplayCommand::Refresh),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let source = Arc::new(HttpSnapshotSource::new(
        &cli.server_url,
        Duration::from_secs(cli.http_timeout_secs),
    )?);
    info!(url = source.url(), "signage display starting");

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::channel(8);

    let player = CommandPlayer::new(cli.player_config(), event_tx);

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match parse_command(&line) {
                    Some(command) => {
                        if command_tx.send(command).await.is_err() {
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => warn!("unknown command {:?} (m = mute, r = refresh)", line.trim()),
                },
                Ok(None) => break,
                Err(e) => {
                    warn!("stdin: {e}");
                    break;
                }
            }
        }
    });

    let session = Synchronizer::new(
        source,
        player,
        DisplaySession::new(cli.start_muted),
        event_rx,
        command_rx,
    )
    .with_poll_interval(Duration::from_secs(cli.poll_secs.max(1)))
    .run(shutdown_signal())
    .await;

    info!(state = ?session.state(), muted = session.muted(), "signage display stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdin_commands() {
        assert!(matches!(parse_command("m\n"), Some(DisplayCommand::ToggleMute)));
        assert!(matches!(parse_command(" refresh "), Some(DisplayCommand::Refresh)));
        assert!(parse_command("quit").is_none());
    }

    #[test]
    fn player_args_override_defaults() {
        let cli = Cli::parse_from([
            "signage-display",
            "--player",
            "vlc",
            "--player-args",
            "--fullscreen --play-and-exit",
        ]);
        let config = cli.player_config();
        assert_eq!(config.program, "vlc");
        assert_eq!(config.args, vec!["--fullscreen", "--play-and-exit"]);
        assert_eq!(config.mute_args, PlayerConfig::default().mute_args);
        assert_eq!(config.ipc_socket, None);
        assert_eq!(config.brand_card, None);
    }

    #[test]
    fn brand_card_and_ipc_flags() {
        let cli = Cli::parse_from([
            "signage-display",
            "--brand-card",
            "/srv/signage/brand.png",
            "--no-ipc",
        ]);
        let config = cli.player_config();
        assert_eq!(config.brand_card.as_deref(), Some("/srv/signage/brand.png"));
        assert_eq!(config.ipc_socket, None);

        let cli = Cli::parse_from(["signage-display"]);
        assert!(cli.player_config().ipc_socket.is_some());
    }
}
