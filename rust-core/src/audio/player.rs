//! File player with transport controls and a live spectrum
//!
//! The whole file is decoded and resampled to the output rate up front. The
//! cpal callback reads from a shared [`Transport`] under a short lock, copies
//! what it played into the analysis ring buffer and reports progress over a
//! crossbeam channel.

use super::buffer::{AudioProducer, AudioRingBuffer};
use super::input::AudioError;
use super::output::{AudioOutput, StreamFault};
use super::resample::resample;
use super::tap::{AnalysisTap, SpectrumPipeline, SpectrumSlot};
use super::types::{NowPlaying, PlaybackState, PlayerCommand, PlayerEvent, Progress};
use super::wav::{read_wav, DecodedAudio};
use crate::spectrum::{AnalyzerConfig, RealtimeAnalyzer, Spectra};
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

const EVENT_QUEUE: usize = 256;

/// Player settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Output rate to ask the device for; the device default is used otherwise
    pub sample_rate: Option<u32>,

    /// Minimum spacing between progress events
    pub progress_interval_ms: u64,

    /// Ring buffer length between the callback and the analysis thread
    pub buffer_seconds: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            sample_rate: None,
            progress_interval_ms: 100,
            buffer_seconds: 1.0,
        }
    }
}

/// What one render call did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderReport {
    /// First source frame rendered
    pub start: usize,
    /// Source frames rendered
    pub frames: usize,
    /// Playback ran off the end during this call
    pub ended: bool,
}

/// Device-independent playback position and state
#[derive(Debug, Clone, Default)]
pub struct Transport {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
    position: usize,
    state: PlaybackState,
}

impl Transport {
    pub fn new(audio: DecodedAudio) -> Self {
        Self {
            channels: audio.channels.max(1) as usize,
            sample_rate: audio.sample_rate,
            samples: audio.samples,
            position: 0,
            state: PlaybackState::Stopped,
        }
    }

    pub fn is_loaded(&self) -> bool {
        !self.samples.is_empty() && self.sample_rate > 0
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn channels(&self) -> usize {
        self.channels.max(1)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels()
    }

    pub fn position_frames(&self) -> usize {
        self.position
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames_to_secs(self.frames())
    }

    pub fn position_secs(&self) -> f64 {
        self.frames_to_secs(self.position)
    }

    pub fn progress(&self) -> Progress {
        Progress {
            current_secs: self.position_secs(),
            duration_secs: self.duration_secs(),
            ended: false,
        }
    }

    /// Play from the current position, or from the top if we are at the end
    ///
    /// # Returns
    /// `false` when nothing is loaded
    pub fn play(&mut self) -> bool {
        if !self.is_loaded() {
            return false;
        }
        if self.position >= self.frames() {
            self.position = 0;
        }
        self.state = PlaybackState::Playing;
        true
    }

    /// Jump to `secs` (clamped to the file) and play
    pub fn play_at(&mut self, secs: f64) -> bool {
        if !self.is_loaded() {
            return false;
        }
        self.seek(secs);
        self.state = PlaybackState::Playing;
        true
    }

    /// Move the position without changing state
    pub fn seek(&mut self, secs: f64) {
        let secs = if secs.is_finite() { secs } else { 0.0 };
        let secs = secs.clamp(0.0, self.duration_secs());
        self.position = ((secs * self.sample_rate as f64).round() as usize).min(self.frames());
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Halt and rewind
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.position = 0;
    }

    /// Fill an interleaved output buffer
    ///
    /// Source channels are mapped onto `out_channels`: mono is duplicated,
    /// anything is averaged down to mono, otherwise shared channels are
    /// copied and extra output channels stay silent. Outside of `Playing`
    /// the buffer is zeroed.
    pub fn render(&mut self, out: &mut [f32], out_channels: usize) -> RenderReport {
        let out_channels = out_channels.max(1);

        if self.state != PlaybackState::Playing {
            out.fill(0.0);
            return RenderReport {
                start: self.position,
                frames: 0,
                ended: false,
            };
        }

        let start = self.position;
        let channels = self.channels();
        let wanted = out.len() / out_channels;
        let n = wanted.min(self.frames().saturating_sub(start));

        for (i, dst) in out.chunks_exact_mut(out_channels).take(n).enumerate() {
            let idx = (start + i) * channels;
            map_frame(&self.samples[idx..idx + channels], dst);
        }
        out[n * out_channels..].fill(0.0);

        self.position += n;
        let ended = self.position >= self.frames();
        if ended {
            self.state = PlaybackState::Paused;
        }

        RenderReport {
            start,
            frames: n,
            ended,
        }
    }

    /// Interleaved source samples for a frame range
    pub fn source_samples(&self, start: usize, frames: usize) -> &[f32] {
        let channels = self.channels();
        let from = (start * channels).min(self.samples.len());
        let to = ((start + frames) * channels).min(self.samples.len());
        &self.samples[from..to]
    }

    fn frames_to_secs(&self, frames: usize) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            frames as f64 / self.sample_rate as f64
        }
    }
}

#[inline]
fn map_frame(src: &[f32], dst: &mut [f32]) {
    if src.len() == 1 {
        dst.fill(src[0]);
    } else if dst.len() == 1 {
        dst[0] = src.iter().sum::<f32>() / src.len() as f32;
    } else {
        for (c, out) in dst.iter_mut().enumerate() {
            *out = src.get(c).copied().unwrap_or(0.0);
        }
    }
}

/// State owned by the output callback
struct PlaybackRenderer {
    transport: Arc<Mutex<Transport>>,
    producer: Arc<Mutex<Option<AudioProducer>>>,
    analysis_active: Arc<AtomicBool>,
    events: Sender<PlayerEvent>,
    interval_ms: u64,
    last_reported: Option<usize>,
}

impl PlaybackRenderer {
    fn render(&mut self, out: &mut [f32], out_channels: usize) {
        let mut transport = match self.transport.lock() {
            Ok(t) => t,
            Err(_) => {
                out.fill(0.0);
                return;
            }
        };

        let report = transport.render(out, out_channels);

        if report.frames > 0 {
            if let Ok(mut producer) = self.producer.lock() {
                if let Some(producer) = producer.as_mut() {
                    producer.write(transport.source_samples(report.start, report.frames));
                }
            }
        }

        if report.ended {
            self.analysis_active.store(false, Ordering::SeqCst);
            let duration = transport.duration_secs();
            let _ = self.events.try_send(PlayerEvent::StateChanged(PlaybackState::Paused));
            let _ = self.events.try_send(PlayerEvent::Progress(Progress {
                current_secs: duration,
                duration_secs: duration,
                ended: true,
            }));
            self.last_reported = None;
        } else if report.frames > 0 {
            let position = transport.position_frames();
            // The transport runs at the device rate once loaded
            let interval_frames =
                (self.interval_ms as usize * transport.sample_rate() as usize / 1000).max(1);
            let due = self
                .last_reported
                .map_or(true, |last| position.abs_diff(last) >= interval_frames);
            if due {
                self.last_reported = Some(position);
                let _ = self.events.try_send(PlayerEvent::Progress(transport.progress()));
            }
        }
    }
}

/// Plays WAV files on the default output device
pub struct AudioPlayer {
    config: PlayerConfig,
    analyzer_config: AnalyzerConfig,
    transport: Arc<Mutex<Transport>>,
    producer: Arc<Mutex<Option<AudioProducer>>>,
    analysis_active: Arc<AtomicBool>,
    device_lost: Arc<AtomicBool>,
    slot: SpectrumSlot,
    events_tx: Sender<PlayerEvent>,
    events_rx: Receiver<PlayerEvent>,
    output: Option<AudioOutput>,
    output_rate: u32,
    tap: Option<AnalysisTap<SpectrumPipeline>>,
    source: Option<PathBuf>,
}

impl AudioPlayer {
    /// Open the default output device
    pub fn new(config: PlayerConfig, analyzer_config: AnalyzerConfig) -> Result<Self, AudioError> {
        analyzer_config.validate()?;
        let (events_tx, events_rx) = bounded(EVENT_QUEUE);

        let mut player = Self {
            config,
            analyzer_config,
            transport: Arc::new(Mutex::new(Transport::default())),
            producer: Arc::new(Mutex::new(None)),
            analysis_active: Arc::new(AtomicBool::new(false)),
            device_lost: Arc::new(AtomicBool::new(false)),
            slot: SpectrumSlot::new(),
            events_tx,
            events_rx,
            output: None,
            output_rate: 0,
            tap: None,
            source: None,
        };

        let output = player.open_output(player.config.sample_rate)?;
        player.output_rate = output.device_info().sample_rate;
        player.output = Some(output);
        Ok(player)
    }

    /// Decode `path` and get ready to play it from the start
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<Progress, AudioError> {
        let path = path.as_ref();
        let decoded = read_wav(path)?;
        let channels = decoded.channels.max(1);
        let samples = resample(
            &decoded.samples,
            channels as usize,
            decoded.sample_rate,
            self.output_rate,
        )?;
        let audio = DecodedAudio {
            samples,
            channels,
            sample_rate: self.output_rate,
        };

        log::info!(
            "Loaded {} ({:.2} s, {} ch, {} Hz -> {} Hz)",
            path.display(),
            audio.duration_secs(),
            channels,
            decoded.sample_rate,
            self.output_rate
        );

        self.pause_output();
        self.analysis_active.store(false, Ordering::SeqCst);
        self.rebuild_tap(channels as usize)?;

        let (previous, progress) = {
            let mut transport = self.transport()?;
            let previous = transport.state();
            *transport = Transport::new(audio);
            (previous, transport.progress())
        };

        self.source = Some(path.to_path_buf());
        if previous != PlaybackState::Stopped {
            self.emit(PlayerEvent::StateChanged(PlaybackState::Stopped));
        }
        self.emit(PlayerEvent::Progress(progress));
        Ok(progress)
    }

    pub fn play(&mut self) -> Result<(), AudioError> {
        self.ensure_output()?;
        let started = self.transport()?.play();
        self.after_start(started)
    }

    /// Play from `secs`, clamped to `[0, duration]`
    pub fn play_at(&mut self, secs: f64) -> Result<(), AudioError> {
        self.ensure_output()?;
        let started = self.transport()?.play_at(secs);
        self.after_start(started)
    }

    pub fn pause(&mut self) -> Result<(), AudioError> {
        let changed = {
            let mut transport = self.transport()?;
            let before = transport.state();
            transport.pause();
            before != transport.state()
        };

        self.analysis_active.store(false, Ordering::SeqCst);
        self.pause_output();
        if changed {
            self.emit(PlayerEvent::StateChanged(PlaybackState::Paused));
        }
        Ok(())
    }

    /// Halt, rewind to the start and clear the spectrum
    pub fn stop(&mut self) -> Result<(), AudioError> {
        let (changed, progress) = {
            let mut transport = self.transport()?;
            let before = transport.state();
            transport.stop();
            (before != PlaybackState::Stopped, transport.progress())
        };

        self.analysis_active.store(false, Ordering::SeqCst);
        self.pause_output();
        self.slot
            .publish(Spectra::silent(2, self.analyzer_config.frequency_bands));
        if changed {
            self.emit(PlayerEvent::StateChanged(PlaybackState::Stopped));
            self.emit(PlayerEvent::Progress(progress));
        }
        Ok(())
    }

    pub fn toggle(&mut self) -> Result<(), AudioError> {
        if self.state() == PlaybackState::Playing {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Dispatch a remote-control style command
    pub fn handle(&mut self, command: PlayerCommand) -> Result<(), AudioError> {
        log::debug!("Player command {:?}", command);
        match command {
            PlayerCommand::Play => self.play(),
            PlayerCommand::Pause => self.pause(),
            PlayerCommand::Stop => self.stop(),
            PlayerCommand::TogglePlayPause => self.toggle(),
            PlayerCommand::Seek(secs) => self.play_at(secs),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.transport
            .lock()
            .map(|t| t.state())
            .unwrap_or(PlaybackState::Stopped)
    }

    pub fn progress(&self) -> Progress {
        self.transport
            .lock()
            .map(|t| t.progress())
            .unwrap_or_default()
    }

    pub fn now_playing(&self) -> NowPlaying {
        let progress = self.progress();
        NowPlaying {
            title: self
                .source
                .as_deref()
                .and_then(Path::file_stem)
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Now Playing".to_string()),
            elapsed_secs: progress.current_secs,
            duration_secs: progress.duration_secs,
            source: self.source.clone(),
        }
    }

    /// Newest spectrum, if one arrived since the last call
    pub fn latest_spectrum(&self) -> Option<Spectra> {
        self.slot.take()
    }

    pub fn spectrum_slot(&self) -> SpectrumSlot {
        self.slot.clone()
    }

    pub fn events(&self) -> Receiver<PlayerEvent> {
        self.events_rx.clone()
    }

    /// Sample rate everything is rendered at
    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    fn after_start(&mut self, started: bool) -> Result<(), AudioError> {
        if !started {
            return Err(AudioError::NoAudio);
        }

        self.analysis_active.store(true, Ordering::SeqCst);
        if let Some(output) = &self.output {
            output.start()?;
        }
        self.emit(PlayerEvent::StateChanged(PlaybackState::Playing));
        Ok(())
    }

    /// Reopen the device after it went away
    fn ensure_output(&mut self) -> Result<(), AudioError> {
        if !self.device_lost.load(Ordering::SeqCst) && self.output.is_some() {
            return Ok(());
        }

        log::info!("Reopening audio output");
        self.output = None;
        let output = self.open_output(Some(self.output_rate))?;
        let rate = output.device_info().sample_rate;
        self.output = Some(output);
        self.device_lost.store(false, Ordering::SeqCst);

        if rate != self.output_rate {
            log::warn!("Output rate changed from {} Hz to {} Hz", self.output_rate, rate);
            self.output_rate = rate;
            if let Some(source) = self.source.clone() {
                let position = self.progress().current_secs;
                self.load(&source)?;
                self.transport()?.seek(position);
            }
        }
        Ok(())
    }

    fn open_output(&self, preferred_rate: Option<u32>) -> Result<AudioOutput, AudioError> {
        let mut renderer = PlaybackRenderer {
            transport: Arc::clone(&self.transport),
            producer: Arc::clone(&self.producer),
            analysis_active: Arc::clone(&self.analysis_active),
            events: self.events_tx.clone(),
            interval_ms: self.config.progress_interval_ms,
            last_reported: None,
        };

        let transport = Arc::clone(&self.transport);
        let analysis_active = Arc::clone(&self.analysis_active);
        let device_lost = Arc::clone(&self.device_lost);
        let events = self.events_tx.clone();

        let on_fault = Box::new(move |fault: StreamFault| {
            if fault == StreamFault::DeviceLost {
                device_lost.store(true, Ordering::SeqCst);
            }

            let was_playing = transport
                .lock()
                .map(|mut t| {
                    let playing = t.state() == PlaybackState::Playing;
                    t.pause();
                    playing
                })
                .unwrap_or(false);
            analysis_active.store(false, Ordering::SeqCst);

            let _ = events.try_send(PlayerEvent::Error(fault.to_string()));
            if was_playing {
                let _ = events.try_send(PlayerEvent::StateChanged(PlaybackState::Paused));
            }
        });

        AudioOutput::from_default_device(
            Box::new(move |out: &mut [f32], channels: usize| renderer.render(out, channels)),
            on_fault,
            preferred_rate,
        )
    }

    fn rebuild_tap(&mut self, channels: usize) -> Result<(), AudioError> {
        // Join the old worker before handing out a new producer
        self.tap = None;

        let ring = AudioRingBuffer::for_duration(
            self.config.buffer_seconds.max(0.1),
            self.output_rate.max(1),
            channels as u16,
        );
        let (producer, consumer) = ring.split();
        if let Ok(mut slot) = self.producer.lock() {
            *slot = Some(producer);
        }

        let analyzer = RealtimeAnalyzer::new(self.analyzer_config.clone())?;
        let pipeline = SpectrumPipeline::new(analyzer, channels, self.output_rate, self.slot.clone());
        self.tap = Some(AnalysisTap::spawn_with_flag(
            "player-tap",
            consumer,
            channels,
            pipeline,
            Arc::clone(&self.analysis_active),
        )?);
        Ok(())
    }

    fn pause_output(&self) {
        if let Some(output) = &self.output {
            if let Err(e) = output.pause() {
                log::warn!("Failed to pause output: {}", e);
            }
        }
    }

    fn transport(&self) -> Result<MutexGuard<'_, Transport>, AudioError> {
        self.transport
            .lock()
            .map_err(|_| AudioError::Thread("player state lock poisoned".to_string()))
    }

    fn emit(&self, event: PlayerEvent) {
        if self.events_tx.try_send(event).is_err() {
            log::debug!("Player event queue full; dropping event");
        }
    }
}
