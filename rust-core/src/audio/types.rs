//! Shared player types
//!
//! Plain data passed between the player, its audio callback and consumers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Current playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Stopped => write!(f, "Stopped"),
            PlaybackState::Playing => write!(f, "Playing"),
            PlaybackState::Paused => write!(f, "Paused"),
        }
    }
}

/// Playback position report
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Progress {
    pub current_secs: f64,
    pub duration_secs: f64,
    /// Set once, when playback runs off the end of the file
    pub ended: bool,
}

impl Progress {
    /// Position as a fraction of the duration (0 for empty audio)
    pub fn fraction(&self) -> f64 {
        if self.duration_secs <= 0.0 {
            0.0
        } else {
            (self.current_secs / self.duration_secs).clamp(0.0, 1.0)
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {}",
            format_clock(self.current_secs),
            format_clock(self.duration_secs)
        )
    }
}

/// Snapshot of what is playing, for "now playing" style displays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlaying {
    pub title: String,
    pub elapsed_secs: f64,
    pub duration_secs: f64,
    pub source: Option<PathBuf>,
}

/// Remote-control style transport commands
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    Play,
    Pause,
    Stop,
    TogglePlayPause,
    /// Jump to a position in seconds and play from there
    Seek(f64),
}

/// Notifications emitted by the player
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    StateChanged(PlaybackState),
    Progress(Progress),
    /// Stream or device failure; playback has been paused
    Error(String),
}

/// `m:ss` formatting used by progress displays
pub fn format_clock(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 { secs.floor() as u64 } else { 0 };
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_state_display() {
        assert_eq!(PlaybackState::default(), PlaybackState::Stopped);
        assert_eq!(PlaybackState::Paused.to_string(), "Paused");
    }

    #[test]
    fn test_progress_fraction_and_display() {
        let progress = Progress {
            current_secs: 75.4,
            duration_secs: 150.0,
            ended: false,
        };
        assert!((progress.fraction() - 0.50266).abs() < 1e-3);
        assert_eq!(progress.to_string(), "1:15 / 2:30");

        assert_eq!(Progress::default().fraction(), 0.0);
    }

    #[test]
    fn test_format_clock_handles_garbage() {
        assert_eq!(format_clock(-3.0), "0:00");
        assert_eq!(format_clock(f64::NAN), "0:00");
        assert_eq!(format_clock(3599.9), "59:59");
    }
}
