use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One day's schedule as the store keeps it.
///
/// Dates and times are kept as the strings the operator entered
/// (`YYYY-MM-DD`, `HH:MM` or `HH:MM:SS`). They are only parsed when the
/// engine needs them, so a bad row degrades the display instead of breaking
/// the load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub id: Uuid,
    pub date: String,
    pub subuh_time: String,
    pub maghrib_time: String,
    pub location: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VideoCategory {
    Tvc,
    Berbuka,
}

impl VideoCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            VideoCategory::Tvc => "TVC",
            VideoCategory::Berbuka => "BERBUKA",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub is_active: bool,
    pub category: VideoCategory,
    /// Playlist position. TVC only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    /// Advisory clip length. BERBUKA only; playback never relies on it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DisplayState {
    Tvc,
    Countdown,
    Berbuka,
}

impl std::fmt::Display for DisplayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DisplayState::Tvc => "TVC",
            DisplayState::Countdown => "COUNTDOWN",
            DisplayState::Berbuka => "BERBUKA",
        };
        f.write_str(s)
    }
}

/// What the screen should be showing right now.
///
/// `countdown_seconds` is `Some` only in `COUNTDOWN`; `berbuka_video` and
/// `berbuka_end_time` only in `BERBUKA`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayStateSnapshot {
    pub state: DisplayState,
    pub countdown_seconds: Option<u64>,
    pub subuh_time: Option<String>,
    pub maghrib_time: Option<String>,
    pub location: Option<String>,
    pub current_tvc_videos: Vec<Video>,
    pub berbuka_video: Option<Video>,
    #[serde(default)]
    pub berbuka_end_time: Option<String>,
}

impl DisplayStateSnapshot {
    /// The clips this snapshot wants looped, in play order.
    ///
    /// The TVC reel keeps running behind the countdown overlay.
    pub fn playlist_videos(&self) -> &[Video] {
        match self.state {
            DisplayState::Tvc | DisplayState::Countdown => &self.current_tvc_videos,
            DisplayState::Berbuka => self.berbuka_video.as_slice(),
        }
    }
}
