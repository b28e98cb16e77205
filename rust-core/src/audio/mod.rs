//! Audio capture, playback and file handling with cpal and hound

pub mod buffer;
pub mod input;
pub mod join;
pub mod output;
pub mod player;
pub mod recorder;
pub mod resample;
pub mod tap;
pub mod types;
pub mod wav;

pub use buffer::AudioRingBuffer;
pub use input::{AudioError, AudioInput};
pub use join::join_wav_files;
pub use output::AudioOutput;
pub use player::{AudioPlayer, PlayerConfig, Transport};
pub use recorder::{AudioRecorder, RecorderConfig, RecorderEvent, RecorderState, RecordingSession};
pub use tap::SpectrumSlot;
pub use types::{NowPlaying, PlaybackState, PlayerCommand, PlayerEvent, Progress};
