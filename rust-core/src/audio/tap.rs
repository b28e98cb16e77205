//! Analysis tap - keeps the FFT off the audio callback
//!
//! The audio callback only pushes samples into a ring buffer. A worker thread
//! drains it, assembles per-channel frames and publishes the newest spectrum
//! into a [`SpectrumSlot`]. Consumers read whatever is newest; frames they
//! never looked at are simply overwritten.

use super::buffer::AudioConsumer;
use super::input::AudioError;
use crate::spectrum::{RealtimeAnalyzer, Spectra};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// Last-value-wins mailbox for spectrum frames
#[derive(Clone, Default)]
pub struct SpectrumSlot {
    latest: Arc<Mutex<Option<Spectra>>>,
}

impl SpectrumSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever is waiting with `spectra`
    pub fn publish(&self, spectra: Spectra) {
        if let Ok(mut latest) = self.latest.lock() {
            *latest = Some(spectra);
        }
    }

    /// Take the newest frame, leaving the slot empty
    pub fn take(&self) -> Option<Spectra> {
        self.latest.lock().ok().and_then(|mut latest| latest.take())
    }

    /// Copy of the newest frame without consuming it
    pub fn peek(&self) -> Option<Spectra> {
        self.latest.lock().ok().and_then(|latest| latest.clone())
    }
}

/// Something that eats interleaved sample blocks on the tap thread
pub trait SampleSink: Send {
    /// Handle a block of whole interleaved frames
    fn consume(&mut self, interleaved: &[f32]);

    /// The source went quiet (paused or stopped)
    fn idle(&mut self) {}
}

/// Collects interleaved samples into one `fft_size` buffer per channel
pub struct FrameAssembler {
    channels: usize,
    frame_len: usize,
    pending: Vec<Vec<f64>>,
}

impl FrameAssembler {
    pub fn new(channels: usize, frame_len: usize) -> Self {
        let channels = channels.max(1);
        Self {
            channels,
            frame_len,
            pending: vec![Vec::with_capacity(frame_len); channels],
        }
    }

    /// De-interleave `samples`, calling `on_frame` for every completed frame
    pub fn push<F>(&mut self, samples: &[f32], mut on_frame: F)
    where
        F: FnMut(&[Vec<f64>]),
    {
        for frame in samples.chunks_exact(self.channels) {
            for (channel, &sample) in self.pending.iter_mut().zip(frame) {
                channel.push(sample as f64);
            }

            if self.pending[0].len() >= self.frame_len {
                on_frame(&self.pending);
                for channel in self.pending.iter_mut() {
                    channel.clear();
                }
            }
        }
    }

    /// Drop any partial frame
    pub fn clear(&mut self) {
        for channel in self.pending.iter_mut() {
            channel.clear();
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }
}

/// Analyzer + framing + output slot
pub struct SpectrumPipeline {
    analyzer: RealtimeAnalyzer,
    assembler: FrameAssembler,
    slot: SpectrumSlot,
    sample_rate: f64,
}

impl SpectrumPipeline {
    pub fn new(analyzer: RealtimeAnalyzer, channels: usize, sample_rate: u32, slot: SpectrumSlot) -> Self {
        let assembler = FrameAssembler::new(channels, analyzer.fft_size());
        Self {
            analyzer,
            assembler,
            slot,
            sample_rate: sample_rate as f64,
        }
    }

    /// Feed interleaved samples; publishes one spectrum per completed frame
    pub fn process(&mut self, interleaved: &[f32]) {
        let analyzer = &mut self.analyzer;
        let slot = &self.slot;
        let sample_rate = self.sample_rate;

        // Consumers always get at least left and right
        self.assembler.push(interleaved, |frame| {
            slot.publish(analyzer.analyse(frame, sample_rate).into_stereo());
        });
    }

    /// Publish the "no spectrum" frame and forget smoothing history
    pub fn go_silent(&mut self) {
        self.assembler.clear();
        self.analyzer.reset();
        let channels = self.assembler.channels().max(2);
        self.slot.publish(self.analyzer.silence(channels));
    }

    pub fn slot(&self) -> &SpectrumSlot {
        &self.slot
    }

    pub fn frequency_bands(&self) -> usize {
        self.analyzer.frequency_bands()
    }
}

impl SampleSink for SpectrumPipeline {
    fn consume(&mut self, interleaved: &[f32]) {
        self.process(interleaved);
    }

    fn idle(&mut self) {
        self.go_silent();
    }
}

/// Worker thread that drains a ring buffer into a [`SampleSink`]
pub struct AnalysisTap<S: SampleSink + 'static> {
    running: Arc<AtomicBool>,
    active: Arc<AtomicBool>,
    handle: Option<JoinHandle<S>>,
}

impl<S: SampleSink + 'static> AnalysisTap<S> {
    /// Spawn the worker
    ///
    /// # Arguments
    /// * `name` - Thread name
    /// * `consumer` - Ring buffer fed by the audio callback
    /// * `channels` - Interleaved channel count of the stream
    /// * `sink` - Receives every whole frame written to the ring buffer
    pub fn spawn(
        name: &str,
        consumer: AudioConsumer,
        channels: usize,
        sink: S,
    ) -> Result<Self, AudioError> {
        Self::spawn_with_flag(name, consumer, channels, sink, Arc::new(AtomicBool::new(false)))
    }

    /// Spawn the worker with an activity flag owned by the caller
    ///
    /// Lets an audio callback switch analysis off (for example at end of
    /// track) without going through the tap.
    pub fn spawn_with_flag(
        name: &str,
        mut consumer: AudioConsumer,
        channels: usize,
        mut sink: S,
        active: Arc<AtomicBool>,
    ) -> Result<Self, AudioError> {
        let running = Arc::new(AtomicBool::new(true));

        let thread_running = Arc::clone(&running);
        let thread_active = Arc::clone(&active);
        let channels = channels.max(1);

        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut buffer = vec![0.0_f32; 1024 * channels];
                // Set while the sink has seen activity it has not yet idled after
                let mut pending_idle = false;

                while thread_running.load(Ordering::SeqCst) {
                    let is_active = thread_active.load(Ordering::SeqCst);
                    pending_idle |= is_active;

                    // Anything queued was captured while the source was live
                    let n = consumer.read_frames(&mut buffer, channels);
                    if n > 0 {
                        sink.consume(&buffer[..n]);
                        pending_idle = true;
                    } else {
                        if !is_active && pending_idle {
                            sink.idle();
                            pending_idle = false;
                        }
                        std::thread::sleep(Duration::from_millis(2));
                    }
                }

                // Flush what the callback managed to queue before shutdown
                loop {
                    let n = consumer.read_frames(&mut buffer, channels);
                    if n == 0 {
                        break;
                    }
                    sink.consume(&buffer[..n]);
                    pending_idle = true;
                }
                if pending_idle || thread_active.load(Ordering::SeqCst) {
                    sink.idle();
                }
                sink
            })
            .map_err(|e| AudioError::Thread(e.to_string()))?;

        Ok(Self {
            running,
            active,
            handle: Some(handle),
        })
    }

    /// Mark the source live or stopped
    ///
    /// Once stopped, the sink goes idle as soon as the queue is drained.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop the worker and hand the sink back
    pub fn stop(mut self) -> Option<S> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Option<S> {
        self.running.store(false, Ordering::SeqCst);
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(sink) => Some(sink),
            Err(_) => {
                log::error!("Analysis thread panicked");
                None
            }
        }
    }
}

impl<S: SampleSink + 'static> Drop for AnalysisTap<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
