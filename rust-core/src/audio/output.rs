//! Audio output playback using cpal
//!
//! Pulls interleaved `f32` frames from a render callback and converts them to
//! whatever sample type the device wants.

use super::input::{AudioDeviceInfo, AudioError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig, StreamError};
use thiserror::Error;

/// Runtime failure reported by a cpal stream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamFault {
    /// The device went away (unplugged headphones, Bluetooth dropped, ...)
    #[error("Audio device is no longer available")]
    DeviceLost,
    /// Any other backend error
    #[error("Audio backend error: {0}")]
    Backend(String),
}

impl From<StreamError> for StreamFault {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::DeviceNotAvailable => StreamFault::DeviceLost,
            other => StreamFault::Backend(other.to_string()),
        }
    }
}

/// Render callback: fill an interleaved buffer with `channels` channels
pub type RenderFn = Box<dyn FnMut(&mut [f32], usize) + Send + 'static>;

/// Fault callback, invoked on the backend's error thread
pub type FaultFn = Box<dyn FnMut(StreamFault) + Send + 'static>;

/// Audio output stream
pub struct AudioOutput {
    stream: Stream,
    device_info: AudioDeviceInfo,
}

impl AudioOutput {
    /// Create audio output from default device
    ///
    /// # Arguments
    /// * `render` - Called from the audio thread to produce samples
    /// * `on_fault` - Called when the stream reports an error
    /// * `preferred_rate` - Sample rate to request if the device supports it
    pub fn from_default_device(
        render: RenderFn,
        on_fault: FaultFn,
        preferred_rate: Option<u32>,
    ) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        Self::from_device(device, render, on_fault, preferred_rate)
    }

    /// Create audio output from specific device
    pub fn from_device(
        device: Device,
        render: RenderFn,
        on_fault: FaultFn,
        preferred_rate: Option<u32>,
    ) -> Result<Self, AudioError> {
        let name = device
            .name()
            .map_err(|e| AudioError::DeviceName(e.to_string()))?;

        let default_config = device
            .default_output_config()
            .map_err(|e| AudioError::DefaultConfig(e.to_string()))?;

        let config = match preferred_rate {
            Some(rate) => find_output_config(&device, default_config.sample_format(), rate)
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
            "Output device '{}' at {} Hz, {} channel(s), {:?}",
            device_info.name,
            device_info.sample_rate,
            device_info.channels,
            sample_format
        );

        let stream_config: StreamConfig = config.into();

        let stream = match sample_format {
            SampleFormat::F32 => build_output::<f32>(&device, &stream_config, render, on_fault)?,
            SampleFormat::I16 => build_output::<i16>(&device, &stream_config, render, on_fault)?,
            SampleFormat::U16 => build_output::<u16>(&device, &stream_config, render, on_fault)?,
            SampleFormat::I32 => build_output::<i32>(&device, &stream_config, render, on_fault)?,
            other => return Err(AudioError::UnsupportedSampleFormat(format!("{:?}", other))),
        };

        Ok(Self {
            stream,
            device_info,
        })
    }

    /// Start playing audio
    pub fn start(&self) -> Result<(), AudioError> {
        self.stream
            .play()
            .map_err(|e| AudioError::PlayStream(e.to_string()))
    }

    /// Pause audio playback
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

fn build_output<T>(
    device: &Device,
    config: &StreamConfig,
    mut render: RenderFn,
    mut on_fault: FaultFn,
) -> Result<Stream, AudioError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let mut scratch: Vec<f32> = Vec::new();

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                scratch.clear();
                scratch.resize(data.len(), 0.0);
                render(&mut scratch, channels);

                for (out, &sample) in data.iter_mut().zip(scratch.iter()) {
                    *out = T::from_sample(sample);
                }
            },
            move |err| {
                log::error!("Audio output error: {}", err);
                on_fault(StreamFault::from(err));
            },
            None,
        )
        .map_err(|e| AudioError::BuildStream(e.to_string()))
}

fn find_output_config(
    device: &Device,
    format: SampleFormat,
    rate: u32,
) -> Option<cpal::SupportedStreamConfig> {
    let rate = cpal::SampleRate(rate);
    device
        .supported_output_configs()
        .ok()?
        .filter(|c| c.sample_format() == format)
        .find(|c| c.min_sample_rate() <= rate && rate <= c.max_sample_rate())
        .map(|c| c.with_sample_rate(rate))
}

/// List available audio output devices
pub fn list_output_devices() -> Result<Vec<AudioDeviceInfo>, AudioError> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    let device_iter = host
        .output_devices()
        .map_err(|e| AudioError::DeviceName(e.to_string()))?;

    for device in device_iter {
        if let Ok(name) = device.name() {
            if let Ok(config) = device.default_output_config() {
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
    fn test_device_loss_maps_to_fault() {
        assert_eq!(
            StreamFault::from(StreamError::DeviceNotAvailable),
            StreamFault::DeviceLost
        );
    }

    #[test]
    fn test_list_output_devices() {
        let _ = list_output_devices();
    }
}
