// Display-side control loop.
//
// The screen polls the engine every 30s and predicts the countdown locally
// in between. `DisplaySession` holds everything the loop knows and makes
// every decision; `Synchronizer` only owns the timers and carries those
// decisions out on a `MediaSurface`.
//
// Rules the session enforces:
//   - a poll with the same state and playlist identity never touches media
//   - a poll with a different state or identity is a hard transition:
//     stop, reset to clip 0, start again
//   - the local countdown is replaced (not adjusted) by every poll
//   - at 0 locally it polls every second until the state moves on
//   - mute is the viewer's preference and survives polls and transitions
//   - a screen left on the brand card retries playback on the next poll

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::model::{DisplayState, DisplayStateSnapshot, Video};
use crate::playlist::{ClipEnd, Playlist, PlaylistCursor};

/// Poll cadence used by the display.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Where the display gets canonical state from.
#[async_trait::async_trait]
pub trait SnapshotSource: Send + Sync + 'static {
    async fn fetch(&self) -> anyhow::Result<DisplayStateSnapshot>;
}

/// The thing that actually puts pixels and sound out.
///
/// `play` starts `clip` from position 0, replacing whatever was playing.
/// Completion or failure is reported later as a `MediaEvent` tagged with the
/// same `generation`.
pub trait MediaSurface: Send {
    fn play(&mut self, clip: &Video, muted: bool, generation: u64) -> anyhow::Result<()>;
    fn stop(&mut self);
    fn set_muted(&mut self, muted: bool);
    /// Static brand card. Used when there is nothing (or nothing playable).
    fn show_fallback(&mut self, snapshot: Option<&DisplayStateSnapshot>);
    fn show_countdown(&mut self, seconds: u64, snapshot: &DisplayStateSnapshot);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    Ended { generation: u64 },
    Failed { generation: u64, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayCommand {
    ToggleMute,
    /// Poll now instead of waiting for the next cycle.
    Refresh,
}

/// Outcome of applying a polled snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    HardTransition,
    Continue,
}

/// Outcome of one local countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Counting(u64),
    /// Local countdown just reached zero; poll early.
    Expired,
    Idle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaAction {
    Play {
        clip: Video,
        muted: bool,
        generation: u64,
    },
    Fallback,
    Nothing,
}

#[derive(Debug, Clone)]
pub struct DisplaySession {
    snapshot: Option<DisplayStateSnapshot>,
    cursor: PlaylistCursor,
    countdown: Option<u64>,
    muted: bool,
    generation: u64,
    on_fallback: bool,
}

impl DisplaySession {
    pub fn new(muted: bool) -> Self {
        Self {
            snapshot: None,
            cursor: PlaylistCursor::default(),
            countdown: None,
            muted,
            generation: 0,
            on_fallback: false,
        }
    }

    pub fn snapshot(&self) -> Option<&DisplayStateSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn state(&self) -> Option<DisplayState> {
        self.snapshot.as_ref().map(|s| s.state)
    }

    pub fn countdown(&self) -> Option<u64> {
        self.countdown
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn index(&self) -> usize {
        self.cursor.index()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn current_clip(&self) -> Option<&Video> {
        self.snapshot
            .as_ref()
            .and_then(|s| s.playlist_videos().get(self.cursor.index()))
    }

    /// Replace local state with a freshly polled snapshot.
    pub fn apply_snapshot(&mut self, snapshot: DisplayStateSnapshot) -> Reconcile {
        let state_changed = self.state() != Some(snapshot.state);
        let identity_changed = self.cursor.advance(&Playlist::from_snapshot(&snapshot));
        // Sitting on the brand card with something playable: try again.
        let recover = self.on_fallback && !snapshot.playlist_videos().is_empty();

        self.countdown = snapshot.countdown_seconds;
        self.snapshot = Some(snapshot);

        if state_changed || identity_changed || recover {
            Reconcile::HardTransition
        } else {
            Reconcile::Continue
        }
    }

    /// One second of local prediction. Returns `Expired` on every tick spent
    /// at zero.
    pub fn tick(&mut self) -> Tick {
        if self.state() != Some(DisplayState::Countdown) {
            return Tick::Idle;
        }
        match self.countdown {
            Some(n) if n > 1 => {
                self.countdown = Some(n - 1);
                Tick::Counting(n - 1)
            }
            // The server floors, so it can still say COUNTDOWN 0 for up to a
            // second past our zero. Keep asking; the in-flight guard stops
            // overlapping polls.
            Some(_) => {
                self.countdown = Some(0);
                Tick::Expired
            }
            None => Tick::Idle,
        }
    }

    /// Start the clip the cursor points at under a new generation.
    pub fn begin_playback(&mut self) -> MediaAction {
        let Some(clip) = self.current_clip().cloned() else {
            self.on_fallback = true;
            return MediaAction::Fallback;
        };
        self.on_fallback = false;
        self.generation += 1;
        MediaAction::Play {
            clip,
            muted: self.muted,
            generation: self.generation,
        }
    }

    pub fn clip_ended(&mut self, generation: u64) -> MediaAction {
        if generation != self.generation {
            return MediaAction::Nothing;
        }
        match self.cursor.on_clip_end() {
            ClipEnd::Advance(_) | ClipEnd::Restart(_) => self.begin_playback(),
            ClipEnd::Idle => {
                self.on_fallback = true;
                MediaAction::Fallback
            }
        }
    }

    /// Playback of `generation` could not start or died. Retry once muted,
    /// then give up to the static card.
    pub fn playback_failed(&mut self, generation: u64) -> MediaAction {
        if generation != self.generation {
            return MediaAction::Nothing;
        }
        if self.muted {
            self.on_fallback = true;
            return MediaAction::Fallback;
        }
        self.muted = true;
        self.begin_playback()
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }
}

type PollResult = anyhow::Result<DisplayStateSnapshot>;

pub struct Synchronizer<S, M> {
    source: Arc<S>,
    surface: M,
    session: DisplaySession,
    poll_every: Duration,
    events: mpsc::UnboundedReceiver<MediaEvent>,
    commands: mpsc::Receiver<DisplayCommand>,
}

impl<S: SnapshotSource, M: MediaSurface> Synchronizer<S, M> {
    pub fn new(
        source: Arc<S>,
        surface: M,
        session: DisplaySession,
        events: mpsc::UnboundedReceiver<MediaEvent>,
        commands: mpsc::Receiver<DisplayCommand>,
    ) -> Self {
        Self {
            source,
            surface,
            session,
            poll_every: DEFAULT_POLL_INTERVAL,
            events,
            commands,
        }
    }

    pub fn with_poll_interval(mut self, poll_every: Duration) -> Self {
        self.poll_every = poll_every;
        self
    }

    /// Run until `shutdown` resolves. Every timer lives inside this future and
    /// the in-flight poll is aborted on the way out, so nothing touches the
    /// session after teardown. Returns the final session.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> DisplaySession {
        tokio::pin!(shutdown);

        let (poll_tx, mut poll_rx) = mpsc::channel::<PollResult>(1);
        let mut in_flight: Option<JoinHandle<()>> = None;

        let mut poll = tokio::time::interval(self.poll_every);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(every = ?self.poll_every, "display synchronizer started");

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => break,

                Some(result) = poll_rx.recv() => {
                    in_flight = None;
                    match result {
                        Ok(snapshot) => self.apply(snapshot),
                        // Keep whatever is on screen; next cycle retries.
                        Err(e) => warn!("display-state poll failed: {e:#}"),
                    }
                }

                Some(event) = self.events.recv() => self.handle_event(event),

                Some(command) = self.commands.recv() => match command {
                    DisplayCommand::ToggleMute => {
                        let muted = self.session.toggle_mute();
                        info!(muted, "mute toggled");
                        self.surface.set_muted(muted);
                    }
                    DisplayCommand::Refresh => {
                        self.spawn_poll(&mut in_flight, &poll_tx);
                        poll.reset();
                    }
                },

                _ = ticker.tick() => match self.session.tick() {
                    Tick::Counting(seconds) => {
                        if let Some(snapshot) = self.session.snapshot() {
                            self.surface.show_countdown(seconds, snapshot);
                        }
                    }
                    Tick::Expired => {
                        debug!("countdown reached zero, polling early");
                        if let Some(snapshot) = self.session.snapshot() {
                            self.surface.show_countdown(0, snapshot);
                        }
                        self.spawn_poll(&mut in_flight, &poll_tx);
                        poll.reset();
                    }
                    Tick::Idle => {}
                },

                _ = poll.tick() => self.spawn_poll(&mut in_flight, &poll_tx),
            }
        }

        if let Some(handle) = in_flight.take() {
            handle.abort();
        }
        self.surface.stop();
        info!("display synchronizer stopped");

        self.session
    }

    fn spawn_poll(&self, in_flight: &mut Option<JoinHandle<()>>, tx: &mpsc::Sender<PollResult>) {
        if in_flight.is_some() {
            debug!("poll already in flight, skipping");
            return;
        }
        let source = Arc::clone(&self.source);
        let tx = tx.clone();
        *in_flight = Some(tokio::spawn(async move {
            let result = source.fetch().await;
            let _ = tx.send(result).await;
        }));
    }

    fn apply(&mut self, snapshot: DisplayStateSnapshot) {
        let to = snapshot.state;
        let from = self.session.state();

        match self.session.apply_snapshot(snapshot) {
            Reconcile::HardTransition => {
                info!(from = ?from, to = %to, "display transition");
                self.surface.stop();
                let action = self.session.begin_playback();
                self.perform(action);
            }
            Reconcile::Continue => debug!(state = %to, "poll unchanged"),
        }

        if let (Some(seconds), Some(snapshot)) =
            (self.session.countdown(), self.session.snapshot())
        {
            self.surface.show_countdown(seconds, snapshot);
        }
    }

    fn handle_event(&mut self, event: MediaEvent) {
        let action = match event {
            MediaEvent::Ended { generation } => self.session.clip_ended(generation),
            MediaEvent::Failed { generation, reason } => {
                if generation == self.session.generation() {
                    warn!(generation, "playback failed: {reason}");
                }
                self.session.playback_failed(generation)
            }
        };
        self.perform(action);
    }

    fn perform(&mut self, mut action: MediaAction) {
        loop {
            match action {
                MediaAction::Play {
                    clip,
                    muted,
                    generation,
                } => match self.surface.play(&clip, muted, generation) {
                    Ok(()) => {
                        debug!(clip = %clip.name, generation, muted, "playing");
                        return;
                    }
                    Err(e) => {
                        warn!(clip = %clip.name, "could not start playback: {e:#}");
                        action = self.session.playback_failed(generation);
                    }
                },
                MediaAction::Fallback => {
                    self.surface.show_fallback(self.session.snapshot());
                    return;
                }
                MediaAction::Nothing => return,
            }
        }
    }
}
