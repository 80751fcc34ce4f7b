use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::model::{DisplayState, DisplayStateSnapshot, Video};

/// Fingerprint of "what is being looped": the state plus the ordered clip ids.
///
/// Two polls that return the same identity must not restart playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaylistIdentity(u64);

impl PlaylistIdentity {
    pub fn of(state: DisplayState, videos: &[Video]) -> Self {
        let mut hasher = DefaultHasher::new();
        state.hash(&mut hasher);
        videos.len().hash(&mut hasher);
        for video in videos {
            video.id.hash(&mut hasher);
        }
        Self(hasher.finish())
    }
}

/// The shape of a playlist, without the clips themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Playlist {
    pub identity: PlaylistIdentity,
    pub state: DisplayState,
    pub len: usize,
}

impl Playlist {
    pub fn from_snapshot(snapshot: &DisplayStateSnapshot) -> Self {
        let videos = snapshot.playlist_videos();
        Self {
            identity: PlaylistIdentity::of(snapshot.state, videos),
            state: snapshot.state,
            len: videos.len(),
        }
    }
}

/// What to do when the current clip finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipEnd {
    /// Move on to the clip at this index.
    Advance(usize),
    /// Play the clip at this index again from the start.
    Restart(usize),
    /// Nothing to play.
    Idle,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistCursor {
    current: Option<Playlist>,
    index: usize,
}

impl PlaylistCursor {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn identity(&self) -> Option<PlaylistIdentity> {
        self.current.map(|p| p.identity)
    }

    /// Observe the playlist from a fresh poll. Resets to the first clip and
    /// returns `true` only when the identity differs from the one in play.
    pub fn advance(&mut self, playlist: &Playlist) -> bool {
        if self.identity() == Some(playlist.identity) {
            return false;
        }
        self.current = Some(*playlist);
        self.index = 0;
        true
    }

    /// Called on natural end of playback, never on a poll.
    pub fn on_clip_end(&mut self) -> ClipEnd {
        let Some(playlist) = self.current else {
            return ClipEnd::Idle;
        };

        match playlist.state {
            _ if playlist.len == 0 => ClipEnd::Idle,
            DisplayState::Tvc | DisplayState::Countdown if playlist.len > 1 => {
                self.index = (self.index + 1) % playlist.len;
                ClipEnd::Advance(self.index)
            }
            _ => ClipEnd::Restart(self.index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VideoCategory;
    use uuid::Uuid;

    fn clips(n: usize) -> Vec<Video> {
        (0..n)
            .map(|i| Video {
                id: Uuid::new_v4(),
                name: format!("clip-{i}"),
                url: format!("https://cdn.example/{i}.mp4"),
                is_active: true,
                category: VideoCategory::Tvc,
                order: Some(i as i64),
                duration_seconds: None,
            })
            .collect()
    }

    fn playlist(state: DisplayState, videos: &[Video]) -> Playlist {
        Playlist {
            identity: PlaylistIdentity::of(state, videos),
            state,
            len: videos.len(),
        }
    }

    #[test]
    fn reel_cycles_through_every_index_in_order() {
        let videos = clips(4);
        let mut cursor = PlaylistCursor::default();
        assert!(cursor.advance(&playlist(DisplayState::Tvc, &videos)));
        assert_eq!(cursor.index(), 0);

        let visited: Vec<ClipEnd> = (0..9).map(|_| cursor.on_clip_end()).collect();
        let expected: Vec<ClipEnd> = [1, 2, 3, 0, 1, 2, 3, 0, 1]
            .into_iter()
            .map(ClipEnd::Advance)
            .collect();
        assert_eq!(visited, expected);
    }

    #[test]
    fn unchanged_identity_keeps_position() {
        let videos = clips(4);
        let list = playlist(DisplayState::Tvc, &videos);
        let mut cursor = PlaylistCursor::default();
        cursor.advance(&list);
        cursor.on_clip_end();
        cursor.on_clip_end();
        assert_eq!(cursor.index(), 2);

        assert!(!cursor.advance(&list));
        assert_eq!(cursor.index(), 2);
    }

    #[test]
    fn identity_change_resets_to_first_clip() {
        let videos = clips(3);
        let mut cursor = PlaylistCursor::default();
        cursor.advance(&playlist(DisplayState::Tvc, &videos));
        cursor.on_clip_end();
        assert_eq!(cursor.index(), 1);

        // Same clips, different state.
        assert!(cursor.advance(&playlist(DisplayState::Countdown, &videos)));
        assert_eq!(cursor.index(), 0);

        // Same state, reordered clips.
        cursor.on_clip_end();
        let mut reordered = videos.clone();
        reordered.swap(0, 2);
        assert!(cursor.advance(&playlist(DisplayState::Countdown, &reordered)));
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn single_clip_and_berbuka_loop_in_place() {
        let one = clips(1);
        let mut cursor = PlaylistCursor::default();
        cursor.advance(&playlist(DisplayState::Tvc, &one));
        assert_eq!(cursor.on_clip_end(), ClipEnd::Restart(0));
        assert_eq!(cursor.on_clip_end(), ClipEnd::Restart(0));

        let mut berbuka = clips(1);
        berbuka[0].category = VideoCategory::Berbuka;
        cursor.advance(&playlist(DisplayState::Berbuka, &berbuka));
        assert_eq!(cursor.on_clip_end(), ClipEnd::Restart(0));
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn empty_or_unset_playlist_is_idle() {
        let mut cursor = PlaylistCursor::default();
        assert_eq!(cursor.on_clip_end(), ClipEnd::Idle);

        cursor.advance(&playlist(DisplayState::Berbuka, &[]));
        assert_eq!(cursor.on_clip_end(), ClipEnd::Idle);
    }

    #[test]
    fn identity_ignores_unrelated_metadata() {
        let videos = clips(2);
        let mut renamed = videos.clone();
        renamed[1].name = "renamed".to_string();
        assert_eq!(
            PlaylistIdentity::of(DisplayState::Tvc, &videos),
            PlaylistIdentity::of(DisplayState::Tvc, &renamed)
        );
    }
}
