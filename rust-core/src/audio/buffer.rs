//! Lock-free ring buffer for audio samples
//!
//! Single-producer single-consumer queue that carries interleaved `f32`
//! samples from an audio callback to a worker thread.

use ringbuf::{HeapConsumer, HeapProducer, HeapRb};

/// Thread-safe audio ring buffer
pub struct AudioRingBuffer {
    producer: HeapProducer<f32>,
    consumer: HeapConsumer<f32>,
    capacity: usize,
}

impl AudioRingBuffer {
    /// Create new ring buffer with given capacity
    ///
    /// # Arguments
    /// * `capacity` - Buffer capacity in samples
    pub fn new(capacity: usize) -> Self {
        let rb = HeapRb::<f32>::new(capacity);
        let (producer, consumer) = rb.split();

        Self {
            producer,
            consumer,
            capacity,
        }
    }

    /// Capacity for `seconds` of audio at the given format
    pub fn for_duration(seconds: f64, sample_rate: u32, channels: u16) -> Self {
        let samples = (seconds * sample_rate as f64).ceil() as usize * channels.max(1) as usize;
        Self::new(samples.max(1))
    }

    /// Split into producer and consumer ends
    pub fn split(self) -> (AudioProducer, AudioConsumer) {
        (
            AudioProducer {
                producer: self.producer,
                dropped: 0,
            },
            AudioConsumer {
                consumer: self.consumer,
                capacity: self.capacity,
            },
        )
    }

    /// Get buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Producer end of audio ring buffer (audio callback side)
pub struct AudioProducer {
    producer: HeapProducer<f32>,
    dropped: u64,
}

impl AudioProducer {
    /// Write samples to buffer without blocking
    ///
    /// # Returns
    /// Number of samples actually written; the rest are dropped and counted
    pub fn write(&mut self, samples: &[f32]) -> usize {
        let written = self.producer.push_slice(samples);
        self.dropped += (samples.len() - written) as u64;
        written
    }

    /// Samples discarded because the consumer fell behind
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Consumer end of audio ring buffer (worker side)
pub struct AudioConsumer {
    consumer: HeapConsumer<f32>,
    capacity: usize,
}

impl AudioConsumer {
    /// Read samples from buffer
    ///
    /// # Returns
    /// Number of samples actually read (may be less than `buffer.len()`)
    pub fn read(&mut self, buffer: &mut [f32]) -> usize {
        self.consumer.pop_slice(buffer)
    }

    /// Read whole interleaved frames only
    ///
    /// Never splits a frame across two reads, so de-interleaving stays aligned.
    ///
    /// # Returns
    /// Number of samples read (always a multiple of `channels`)
    pub fn read_frames(&mut self, buffer: &mut [f32], channels: usize) -> usize {
        let channels = channels.max(1);
        let available = self.consumer.len().min(buffer.len());
        let whole = available - available % channels;
        self.consumer.pop_slice(&mut buffer[..whole])
    }

    /// Discard everything currently queued
    pub fn clear(&mut self) -> usize {
        let mut scratch = [0.0_f32; 1024];
        let mut total = 0;
        loop {
            let n = self.consumer.pop_slice(&mut scratch);
            if n == 0 {
                break total;
            }
            total += n;
        }
    }

    /// Get number of available samples
    pub fn len(&self) -> usize {
        self.consumer.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }

    /// Get buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_write_read() {
        let rb = AudioRingBuffer::new(1024);
        let (mut producer, mut consumer) = rb.split();

        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(producer.write(&data), 5);

        let mut output = vec![0.0; 5];
        assert_eq!(consumer.read(&mut output), 5);
        assert_eq!(output, data);
    }

    #[test]
    fn test_ring_buffer_overflow_is_counted() {
        let rb = AudioRingBuffer::new(10);
        let (mut producer, mut consumer) = rb.split();

        let written = producer.write(&[1.0; 20]);
        assert!(written <= 10);
        assert_eq!(producer.dropped(), (20 - written) as u64);

        let mut output = vec![0.0; 20];
        assert_eq!(consumer.read(&mut output), written);
    }

    #[test]
    fn test_read_frames_keeps_alignment() {
        let rb = AudioRingBuffer::new(64);
        let (mut producer, mut consumer) = rb.split();

        // Two and a half stereo frames
        producer.write(&[0.1, 0.2, 0.3, 0.4, 0.5]);

        let mut output = vec![0.0; 16];
        assert_eq!(consumer.read_frames(&mut output, 2), 4);
        assert_eq!(&output[..4], &[0.1, 0.2, 0.3, 0.4]);
        assert_eq!(consumer.len(), 1);
    }

    #[test]
    fn test_clear_and_underflow() {
        let rb = AudioRingBuffer::for_duration(0.5, 48000, 2);
        assert_eq!(rb.capacity(), 48000);
        let (mut producer, mut consumer) = rb.split();

        producer.write(&[0.5; 300]);
        assert_eq!(consumer.clear(), 300);
        assert!(consumer.is_empty());

        let mut output = vec![0.0; 10];
        assert_eq!(consumer.read(&mut output), 0);
    }
}
