//! Audio input capture using cpal
//!
//! Real-time capture from the microphone or line-in into a ring buffer

use super::buffer::AudioProducer;
use super::output::{FaultFn, StreamFault};
use crate::spectrum::ConfigError;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No audio device found")]
    NoDevice,

    #[error("Failed to get device name: {0}")]
    DeviceName(String),

    #[error("Failed to get default config: {0}")]
    DefaultConfig(String),

    #[error("Failed to build stream: {0}")]
    BuildStream(String),

    #[error("Failed to play stream: {0}")]
    PlayStream(String),

    #[error("Unsupported sample format: {0}")]
    UnsupportedSampleFormat(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Resampling failed: {0}")]
    Resample(String),

    #[error("Invalid analyzer configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("No input files to join")]
    NothingToJoin,

    #[error("Output file {} is also one of the inputs", .0.display())]
    OutputIsInput(std::path::PathBuf),

    #[error("No audio loaded")]
    NoAudio,

    #[error("Recorder is not running")]
    NotRecording,

    #[error("Recording failed: {0}")]
    Recording(String),

    #[error("Failed to spawn worker thread: {0}")]
    Thread(String),
}

/// Audio device information
#[derive(Debug, Clone)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Audio input stream
pub struct AudioInput {
    stream: Stream,
    device_info: AudioDeviceInfo,
}

impl AudioInput {
    /// Create audio input from default device
    ///
    /// # Arguments
    /// * `producer` - Ring buffer producer for captured (interleaved) audio
    /// * `on_fault` - Called when the stream reports an error
    /// * `preferred_rate` - Sample rate to request if the device supports it
    pub fn from_default_device(
        producer: AudioProducer,
        on_fault: FaultFn,
        preferred_rate: Option<u32>,
    ) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(AudioError::NoDevice)?;

        Self::from_device(device, producer, on_fault, preferred_rate)
    }

    /// Create audio input from specific device
    pub fn from_device(
        device: Device,
        producer: AudioProducer,
        on_fault: FaultFn,
        preferred_rate: Option<u32>,
    ) -> Result<Self, AudioError> {
        let name = device
            .name()
            .map_err(|e| AudioError::DeviceName(e.to_string()))?;

        let default_config = device
            .default_input_config()
            .map_err(|e| AudioError::DefaultConfig(e.to_string()))?;

        let config = match preferred_rate {
            Some(rate) => find_input_config(&device, default_config.sample_format(), rate)
                .unwrap_or(default_config),
            None => default_config,
        };

        let sample_format = config.sample_format();
        let device_info = AudioDeviceInfo {
            name,
            sample_rate: config.sample_rate().0,
            channels: config.channels(),
        };
        log::info!(
            "Input device '{}' at {} Hz, {} channel(s), {:?}",
            device_info.name,
            device_info.sample_rate,
            device_info.channels,
            sample_format
        );

        let stream_config: StreamConfig = config.into();
        let producer = Arc::new(Mutex::new(producer));

        let stream = match sample_format {
            SampleFormat::F32 => build_input::<f32>(&device, &stream_config, producer, on_fault)?,
            SampleFormat::I16 => build_input::<i16>(&device, &stream_config, producer, on_fault)?,
            SampleFormat::U16 => build_input::<u16>(&device, &stream_config, producer, on_fault)?,
            SampleFormat::I32 => build_input::<i32>(&device, &stream_config, producer, on_fault)?,
            other => return Err(AudioError::UnsupportedSampleFormat(format!("{:?}", other))),
        };

        Ok(Self {
            stream,
            device_info,
        })
    }

    /// Start capturing audio
    pub fn start(&self) -> Result<(), AudioError> {
        self.stream
            .play()
            .map_err(|e| AudioError::PlayStream(e.to_string()))
    }

    /// Pause audio capture
    pub fn pause(&self) -> Result<(), AudioError> {
        self.stream
            .pause()
            .map_err(|e| AudioError::PlayStream(e.to_string()))
    }

    /// Get device information
    pub fn device_info(&self) -> &AudioDeviceInfo {
        &self.device_info
    }
}

/// Build an input stream that converts any sample type to `f32`
fn build_input<T>(
    device: &Device,
    config: &StreamConfig,
    producer: Arc<Mutex<AudioProducer>>,
    mut on_fault: FaultFn,
) -> Result<Stream, AudioError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let mut converted: Vec<f32> = Vec::new();

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                converted.clear();
                converted.extend(data.iter().map(|&s| f32::from_sample(s)));

                if let Ok(mut prod) = producer.lock() {
                    prod.write(&converted);
                }
            },
            move |err| {
                log::error!("Audio input error: {}", err);
                on_fault(StreamFault::from(err));
            },
            None,
        )
        .map_err(|e| AudioError::BuildStream(e.to_string()))
}

/// Look for a supported config at `rate` with the given sample format
fn find_input_config(
    device: &Device,
    format: SampleFormat,
    rate: u32,
) -> Option<cpal::SupportedStreamConfig> {
    let rate = cpal::SampleRate(rate);
    device
        .supported_input_configs()
        .ok()?
        .filter(|c| c.sample_format() == format)
        .find(|c| c.min_sample_rate() <= rate && rate <= c.max_sample_rate())
        .map(|c| c.with_sample_rate(rate))
}

/// List available audio input devices
pub fn list_input_devices() -> Result<Vec<AudioDeviceInfo>, AudioError> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    let device_iter = host
        .input_devices()
        .map_err(|e| AudioError::DeviceName(e.to_string()))?;

    for device in device_iter {
        if let Ok(name) = device.name() {
            if let Ok(config) = device.default_input_config() {
                devices.push(AudioDeviceInfo {
                    name,
                    sample_rate: config.sample_rate().0,
                    channels: config.channels(),
                });
            }
        }
    }

    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_devices() {
        // Just ensure it doesn't crash on hosts without audio
        let _ = list_input_devices();
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(AudioError::NoDevice.to_string(), "No audio device found");
        let err: AudioError = ConfigError::NoBands.into();
        assert!(err.to_string().contains("frequency band"));
    }
}
