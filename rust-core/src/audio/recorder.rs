//! Microphone recorder: capture to a 16-bit WAV file with a live spectrum
//!
//! [`RecordingSession`] holds everything that does not need a device (file
//! writing, channel mapping, analysis) and runs on the tap thread.
//! [`AudioRecorder`] wires it to the default input device.

use super::buffer::AudioRingBuffer;
use super::input::{AudioError, AudioInput};
use super::output::StreamFault;
use super::tap::{AnalysisTap, SampleSink, SpectrumPipeline, SpectrumSlot};
use super::wav::{pcm16_spec, remap_channels, write_pcm16};
use crate::spectrum::{AnalyzerConfig, RealtimeAnalyzer, Spectra};
use crossbeam_channel::{unbounded, Receiver, Sender};
use hound::WavWriter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Recorder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Directory the take is written to (created if missing)
    pub directory: PathBuf,

    /// File name without extension
    pub file_name: String,

    /// Channels written to the file
    pub channels: u16,

    /// Sample rate to ask the device for; the device default is used otherwise
    pub sample_rate: Option<u32>,

    /// Ring buffer length between the callback and the writer thread
    pub buffer_seconds: f64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            file_name: "recording".to_string(),
            channels: 1,
            sample_rate: Some(22050),
            buffer_seconds: 2.0,
        }
    }
}

impl RecorderConfig {
    /// `<directory>/<file_name>.wav`
    pub fn output_path(&self) -> PathBuf {
        let name = if self.file_name.to_ascii_lowercase().ends_with(".wav") {
            self.file_name.clone()
        } else {
            format!("{}.wav", self.file_name)
        };
        self.directory.join(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecorderState {
    #[default]
    Idle,
    Recording,
    Paused,
    Finished,
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecorderState::Idle => write!(f, "Idle"),
            RecorderState::Recording => write!(f, "Recording"),
            RecorderState::Paused => write!(f, "Paused"),
            RecorderState::Finished => write!(f, "Finished"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecorderEvent {
    StateChanged(RecorderState),
    /// A take was finalized
    Saved { path: PathBuf, frames: u64 },
    Error(String),
}

/// One take: WAV writer plus analysis
pub struct RecordingSession {
    writer: Option<WavWriter<BufWriter<File>>>,
    path: PathBuf,
    input_channels: usize,
    output_channels: u16,
    sample_rate: u32,
    frames_written: u64,
    pipeline: SpectrumPipeline,
    events: Option<Sender<RecorderEvent>>,
    /// First write error; the take stops growing once set
    failure: Option<String>,
}

impl RecordingSession {
    /// Create (or truncate) `path` and get ready to accept samples
    ///
    /// # Arguments
    /// * `input_channels` - Channel count of the interleaved blocks pushed in
    /// * `output_channels` - Channel count written to the file
    /// * `sample_rate` - Rate of the incoming audio
    pub fn create<P: AsRef<Path>>(
        path: P,
        input_channels: u16,
        output_channels: u16,
        sample_rate: u32,
        analyzer: RealtimeAnalyzer,
        slot: SpectrumSlot,
    ) -> Result<Self, AudioError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let output_channels = output_channels.max(1);
        let writer = WavWriter::create(&path, pcm16_spec(output_channels, sample_rate))?;
        let pipeline = SpectrumPipeline::new(analyzer, output_channels as usize, sample_rate, slot);

        log::info!(
            "Recording to {} ({} Hz, {} -> {} channel(s))",
            path.display(),
            sample_rate,
            input_channels,
            output_channels
        );

        Ok(Self {
            writer: Some(writer),
            path,
            input_channels: input_channels.max(1) as usize,
            output_channels,
            sample_rate,
            frames_written: 0,
            pipeline,
            events: None,
            failure: None,
        })
    }

    /// Report write failures on this channel
    pub fn with_events(mut self, events: Sender<RecorderEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Append a block of interleaved input samples
    pub fn push(&mut self, interleaved: &[f32]) -> Result<(), AudioError> {
        let samples = remap_channels(interleaved, self.input_channels, self.output_channels as usize);

        let writer = self.writer.as_mut().ok_or(AudioError::NotRecording)?;
        write_pcm16(writer, &samples)?;
        self.frames_written += (samples.len() / self.output_channels as usize) as u64;

        self.pipeline.process(&samples);
        Ok(())
    }

    /// Publish the silent frame
    pub fn go_silent(&mut self) {
        self.pipeline.go_silent();
    }

    /// Write the final header and close the file
    ///
    /// # Returns
    /// Frames written over the whole take, or the write error that ended it
    pub fn finalize(mut self) -> Result<u64, AudioError> {
        if let Some(failure) = self.failure.take() {
            return Err(AudioError::Recording(failure));
        }
        let writer = self.writer.take().ok_or(AudioError::NotRecording)?;
        writer.finalize()?;
        log::info!(
            "Saved {} ({:.2} s)",
            self.path.display(),
            self.duration_secs()
        );
        Ok(self.frames_written)
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames_written as f64 / self.sample_rate as f64
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SampleSink for RecordingSession {
    fn consume(&mut self, interleaved: &[f32]) {
        if self.writer.is_none() {
            return;
        }

        if let Err(e) = self.push(interleaved) {
            log::error!("Recording to {} failed: {}", self.path.display(), e);
            if let Some(events) = &self.events {
                let _ = events.send(RecorderEvent::Error(e.to_string()));
            }
            self.failure = Some(e.to_string());
            if let Some(writer) = self.writer.take() {
                let _ = writer.finalize();
            }
            self.pipeline.go_silent();
        }
    }

    fn idle(&mut self) {
        self.go_silent();
    }
}

struct ActiveTake {
    input: AudioInput,
    tap: AnalysisTap<RecordingSession>,
}

/// Records the default input device into a WAV file
pub struct AudioRecorder {
    config: RecorderConfig,
    analyzer_config: AnalyzerConfig,
    state: RecorderState,
    slot: SpectrumSlot,
    events_tx: Sender<RecorderEvent>,
    events_rx: Receiver<RecorderEvent>,
    take: Option<ActiveTake>,
}

impl AudioRecorder {
    pub fn new(config: RecorderConfig, analyzer_config: AnalyzerConfig) -> Result<Self, AudioError> {
        analyzer_config.validate()?;
        let (events_tx, events_rx) = unbounded();

        Ok(Self {
            config,
            analyzer_config,
            state: RecorderState::Idle,
            slot: SpectrumSlot::new(),
            events_tx,
            events_rx,
            take: None,
        })
    }

    /// Start a new take, or resume a paused one
    pub fn record(&mut self) -> Result<(), AudioError> {
        if let Some(take) = &self.take {
            if self.state == RecorderState::Recording {
                return Ok(());
            }
            take.tap.set_active(true);
            take.input.start()?;
        } else {
            // No live take, whatever the state says
            let take = self.open_take()?;
            take.tap.set_active(true);
            take.input.start()?;
            self.take = Some(take);
        }

        self.set_state(RecorderState::Recording);
        Ok(())
    }

    /// Stop capturing but keep the file open
    pub fn pause(&mut self) -> Result<(), AudioError> {
        let take = self.take.as_ref().ok_or(AudioError::NotRecording)?;
        if self.state == RecorderState::Recording {
            take.input.pause()?;
            take.tap.set_active(false);
            self.set_state(RecorderState::Paused);
        }
        Ok(())
    }

    /// Finish the take and finalize the file
    ///
    /// # Returns
    /// Path of the written file
    pub fn stop(&mut self) -> Result<PathBuf, AudioError> {
        let take = self.take.take().ok_or(AudioError::NotRecording)?;
        let ActiveTake { input, tap } = take;

        if let Err(e) = input.pause() {
            log::warn!("Failed to pause input before stopping: {}", e);
        }
        drop(input);

        let finished = tap
            .stop()
            .ok_or_else(|| AudioError::Thread("recorder thread exited abnormally".to_string()))
            .and_then(|session| {
                let path = session.path().to_path_buf();
                session.finalize().map(|frames| (path, frames))
            });

        // The take is over whatever happened to the file
        self.slot.publish(Spectra::silent(2, self.analyzer_config.frequency_bands));
        self.set_state(RecorderState::Finished);

        let (path, frames) = finished?;
        let _ = self.events_tx.send(RecorderEvent::Saved {
            path: path.clone(),
            frames,
        });
        Ok(path)
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    /// Where the current (or next) take is written
    pub fn output_path(&self) -> PathBuf {
        self.config.output_path()
    }

    /// Newest spectrum, if one arrived since the last call
    pub fn latest_spectrum(&self) -> Option<Spectra> {
        self.slot.take()
    }

    pub fn spectrum_slot(&self) -> SpectrumSlot {
        self.slot.clone()
    }

    /// Event stream (state changes, saved takes, errors)
    pub fn events(&self) -> Receiver<RecorderEvent> {
        self.events_rx.clone()
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    fn open_take(&self) -> Result<ActiveTake, AudioError> {
        let path = self.config.output_path();
        let analyzer = RealtimeAnalyzer::new(self.analyzer_config.clone())?;

        let rate_hint = self.config.sample_rate.unwrap_or(48000);
        let ring = AudioRingBuffer::for_duration(self.config.buffer_seconds.max(0.1), rate_hint, 2);
        let (producer, consumer) = ring.split();

        let fault_events = self.events_tx.clone();
        let on_fault = Box::new(move |fault: StreamFault| {
            let _ = fault_events.send(RecorderEvent::Error(fault.to_string()));
        });

        let input = AudioInput::from_default_device(producer, on_fault, self.config.sample_rate)?;
        let info = input.device_info().clone();

        let session = RecordingSession::create(
            &path,
            info.channels,
            self.config.channels,
            info.sample_rate,
            analyzer,
            self.slot.clone(),
        )?
        .with_events(self.events_tx.clone());

        let tap = AnalysisTap::spawn("recorder-tap", consumer, info.channels as usize, session)?;
        Ok(ActiveTake { input, tap })
    }

    fn set_state(&mut self, state: RecorderState) {
        if self.state != state {
            log::debug!("Recorder {} -> {}", self.state, state);
            self.state = state;
            let _ = self.events_tx.send(RecorderEvent::StateChanged(state));
        }
    }
}

impl Drop for AudioRecorder {
    fn drop(&mut self) {
        if self.take.is_some() {
            if let Err(e) = self.stop() {
                log::error!("Failed to finalize recording: {}", e);
            }
        }
    }
}
