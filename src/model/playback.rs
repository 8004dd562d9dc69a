//! Playback-related types and state management

use super::queue::Queue;
use super::types::{RepeatMode, Track};

/// One status tick from a loaded sound.
///
/// Engines report milliseconds; the player state keeps whole seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackStatus {
    pub position_ms: u64,
    pub duration_ms: Option<u64>,
    pub is_playing: bool,
    pub did_just_finish: bool,
}

impl PlaybackStatus {
    pub fn position_secs(&self) -> u32 {
        millis_to_secs(self.position_ms)
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_ms.map(millis_to_secs).unwrap_or(0)
    }
}

fn millis_to_secs(ms: u64) -> u32 {
    u32::try_from(ms / 1000).unwrap_or(u32::MAX)
}

/// Everything the UI renders about the player.
///
/// `session_id` changes exactly once per accepted play request; per-track UI
/// state (seek sliders and the like) should reset when it changes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaybackState {
    pub current_track: Option<Track>,
    pub queue: Queue,
    pub is_playing: bool,
    pub position_secs: u32,
    pub duration_secs: u32,
    pub is_loading: bool,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub session_id: u64,
}

impl PlaybackState {
    pub fn current_index(&self) -> Option<usize> {
        self.queue.current_index()
    }

    /// Take position and play flag from a tick. An engine that cannot tell
    /// the duration leaves the catalog duration in place.
    pub fn apply_status(&mut self, status: &PlaybackStatus) {
        self.position_secs = status.position_secs();
        if status.duration_ms.is_some() {
            self.duration_secs = status.duration_secs();
        }
        self.is_playing = status.is_playing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_floored_to_whole_seconds() {
        let status = PlaybackStatus {
            position_ms: 12_999,
            duration_ms: Some(181_500),
            is_playing: true,
            did_just_finish: false,
        };
        let mut state = PlaybackState::default();
        state.apply_status(&status);
        assert_eq!(state.position_secs, 12);
        assert_eq!(state.duration_secs, 181);
        assert!(state.is_playing);
    }

    #[test]
    fn unknown_duration_reads_as_zero() {
        let status = PlaybackStatus {
            position_ms: 500,
            ..PlaybackStatus::default()
        };
        assert_eq!(status.duration_secs(), 0);

        let mut state = PlaybackState {
            duration_secs: 30,
            ..PlaybackState::default()
        };
        state.apply_status(&status);
        assert_eq!(state.duration_secs, 30);
    }
}
