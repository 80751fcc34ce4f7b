// External-process media surface.
//
// Each clip is played by spawning the configured player (mpv by default)
// with the clip URL as the last argument. The player exiting cleanly is the
// end-of-clip signal; a non-zero exit or a spawn error is a playback
// failure. The brand card is the same player showing a still image until it
// is replaced. Mute changes reach the running player over mpv's JSON IPC
// socket. The countdown overlay is not drawn by the player and goes to the
// log.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::model::{DisplayStateSnapshot, Video};
use crate::sync::{MediaEvent, MediaSurface};

#[derive(Debug, Clone)]
pub struct PlayerConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Extra arguments used when the clip should start muted.
    pub mute_args: Vec<String>,
    /// Still image shown when there is nothing playable.
    pub brand_card: Option<String>,
    /// Arguments that keep the brand card on screen indefinitely.
    pub brand_card_args: Vec<String>,
    /// mpv `--input-ipc-server` socket used for live mute changes.
    pub ipc_socket: Option<PathBuf>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            program: "mpv".to_string(),
            args: vec![
                "--fs".to_string(),
                "--no-terminal".to_string(),
                "--keep-open=no".to_string(),
            ],
            mute_args: vec!["--mute=yes".to_string()],
            brand_card: None,
            brand_card_args: vec![
                "--image-display-duration=inf".to_string(),
                "--loop-file=inf".to_string(),
            ],
            ipc_socket: Some(std::env::temp_dir().join("signage-display-mpv.sock")),
        }
    }
}

struct Running {
    /// `None` for the brand card, which reports nothing back.
    generation: Option<u64>,
    kill: oneshot::Sender<()>,
    wait_task: JoinHandle<()>,
    stderr_task: JoinHandle<()>,
}

pub struct CommandPlayer {
    config: PlayerConfig,
    events: mpsc::UnboundedSender<MediaEvent>,
    running: Option<Running>,
}

impl CommandPlayer {
    pub fn new(config: PlayerConfig, events: mpsc::UnboundedSender<MediaEvent>) -> Self {
        Self {
            config,
            events,
            running: None,
        }
    }

    fn base_command(&self) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args);
        if let Some(socket) = &self.config.ipc_socket {
            cmd.arg(format!("--input-ipc-server={}", socket.display()));
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn command(&self, clip: &Video, muted: bool) -> Command {
        let mut cmd = self.base_command();
        if muted {
            cmd.args(&self.config.mute_args);
        }
        cmd.arg(&clip.url);
        cmd
    }

    fn brand_card_command(&self, image: &str) -> Command {
        let mut cmd = self.base_command();
        cmd.args(&self.config.brand_card_args).arg(image);
        cmd
    }

    /// Spawn `cmd` as the one running player. With a generation, its exit is
    /// reported as a `MediaEvent`.
    fn launch(&mut self, mut cmd: Command, generation: Option<u64>) -> anyhow::Result<()> {
        self.stop();

        let mut child = cmd.spawn()?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow::anyhow!("player stderr unavailable"))?;

        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if !line.trim().is_empty() {
                    debug!(?generation, "player: {line}");
                }
            }
        });

        let (kill_tx, kill_rx) = oneshot::channel::<()>();
        let events = self.events.clone();
        let wait_task = tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    let Some(generation) = generation else {
                        warn!("brand card player exited: {status:?}");
                        return;
                    };
                    let event = match status {
                        Ok(s) if s.success() => MediaEvent::Ended { generation },
                        Ok(s) => MediaEvent::Failed {
                            generation,
                            reason: format!("player exited: {s}"),
                        },
                        Err(e) => MediaEvent::Failed {
                            generation,
                            reason: format!("waiting on player: {e}"),
                        },
                    };
                    let _ = events.send(event);
                }
                _ = kill_rx => {
                    let _ = child.kill().await;
                }
            }
        });

        self.running = Some(Running {
            generation,
            kill: kill_tx,
            wait_task,
            stderr_task,
        });
        Ok(())
    }
}

fn mute_command(muted: bool) -> String {
    format!(
        "{}\n",
        serde_json::json!({"command": ["set_property", "mute", muted]})
    )
}

#[cfg(unix)]
async fn send_ipc(socket: &Path, line: &str) -> anyhow::Result<()> {
    let mut stream = tokio::net::UnixStream::connect(socket)
        .await
        .with_context(|| format!("connecting to {}", socket.display()))?;
    stream.write_all(line.as_bytes()).await?;
    stream.flush().await?;
    Ok(())
}

#[cfg(not(unix))]
async fn send_ipc(socket: &Path, _line: &str) -> anyhow::Result<()> {
    anyhow::bail!("player ipc over {} needs a unix socket", socket.display())
}

impl MediaSurface for CommandPlayer {
    fn play(&mut self, clip: &Video, muted: bool, generation: u64) -> anyhow::Result<()> {
        let cmd = self.command(clip, muted);
        self.launch(cmd, Some(generation))?;
        info!(clip = %clip.name, url = %clip.url, muted, generation, "player started");
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            debug!(generation = ?running.generation, "stopping player");
            // The wait task kills the child when it sees this; if it already
            // finished, the clip ended on its own.
            if running.kill.send(()).is_err() {
                running.wait_task.abort();
            }
            running.stderr_task.abort();
        }
    }

    fn set_muted(&mut self, muted: bool) {
        let playing = self.running.as_ref().is_some_and(|r| r.generation.is_some());
        let Some(socket) = self.config.ipc_socket.clone().filter(|_| playing) else {
            info!(muted, "mute preference changed, applies from the next clip");
            return;
        };
        tokio::spawn(async move {
            match send_ipc(&socket, &mute_command(muted)).await {
                Ok(()) => debug!(muted, "mute sent to player"),
                Err(e) => warn!("live mute failed, applies from the next clip: {e:#}"),
            }
        });
    }

    fn show_fallback(&mut self, snapshot: Option<&DisplayStateSnapshot>) {
        match snapshot.and_then(|s| s.maghrib_time.as_deref()) {
            Some(maghrib) => info!(maghrib, "showing brand card"),
            None => info!("showing brand card (no schedule for today)"),
        }
        let Some(image) = self.config.brand_card.clone() else {
            self.stop();
            warn!("no brand card configured, screen left blank");
            return;
        };
        let cmd = self.brand_card_command(&image);
        if let Err(e) = self.launch(cmd, None) {
            warn!(image = %image, "could not show brand card: {e:#}");
        }
    }

    fn show_countdown(&mut self, seconds: u64, snapshot: &DisplayStateSnapshot) {
        debug!(
            remaining = %format_countdown(seconds),
            maghrib = snapshot.maghrib_time.as_deref().unwrap_or("--:--"),
            "countdown"
        );
    }
}

impl Drop for CommandPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// `HH:MM:SS`, hours not capped at 24.
pub fn format_countdown(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_formats_as_clock() {
        assert_eq!(format_countdown(0), "00:00:00");
        assert_eq!(format_countdown(28800), "08:00:00");
        assert_eq!(format_countdown(3 * 3600 + 25 * 60 + 7), "03:25:07");
    }

    fn args(cmd: &Command) -> Vec<String> {
        cmd.as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn mute_args_only_when_muted() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let player = CommandPlayer::new(PlayerConfig::default(), tx);
        let clip = Video {
            id: uuid::Uuid::new_v4(),
            name: "a".to_string(),
            url: "https://cdn.example/a.mp4".to_string(),
            is_active: true,
            category: crate::model::VideoCategory::Tvc,
            order: Some(0),
            duration_seconds: None,
        };

        let muted = args(&player.command(&clip, true));
        assert!(muted.contains(&"--mute=yes".to_string()));
        assert!(muted.iter().any(|a| a.starts_with("--input-ipc-server=")));
        assert_eq!(muted.last().map(String::as_str), Some("https://cdn.example/a.mp4"));

        let loud = args(&player.command(&clip, false));
        assert!(!loud.contains(&"--mute=yes".to_string()));
    }

    #[test]
    fn brand_card_is_held_on_screen() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let config = PlayerConfig {
            brand_card: Some("/srv/signage/brand.png".to_string()),
            ipc_socket: None,
            ..PlayerConfig::default()
        };
        let player = CommandPlayer::new(config, tx);

        let card = args(&player.brand_card_command("/srv/signage/brand.png"));
        assert_eq!(
            card,
            vec![
                "--fs",
                "--no-terminal",
                "--keep-open=no",
                "--image-display-duration=inf",
                "--loop-file=inf",
                "/srv/signage/brand.png",
            ]
        );
    }

    #[test]
    fn mute_command_is_mpv_json() {
        let line = mute_command(true);
        assert!(line.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value, serde_json::json!({"command": ["set_property", "mute", true]}));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn live_mute_reaches_the_player_socket() {
        let socket = std::env::temp_dir()
            .join(format!("signage-test-{}.sock", uuid::Uuid::new_v4()));
        let listener = tokio::net::UnixListener::bind(&socket).unwrap();

        let reader = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut lines = BufReader::new(stream).lines();
            lines.next_line().await.unwrap()
        });

        send_ipc(&socket, &mute_command(false)).await.unwrap();
        let line = reader.await.unwrap().unwrap();
        let _ = std::fs::remove_file(&socket);

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["command"][2], false);
    }
}
