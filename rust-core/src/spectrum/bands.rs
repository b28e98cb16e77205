//! Logarithmic frequency banding
//!
//! Splits `[start, end]` Hz into bands of equal width in octaves and reduces
//! an amplitude spectrum to one value per band.

/// A frequency band in Hz
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyBand {
    pub lower_hz: f64,
    pub upper_hz: f64,
}

impl FrequencyBand {
    /// Geometric centre of the band
    pub fn center_hz(&self) -> f64 {
        (self.lower_hz * self.upper_hz).sqrt()
    }

    /// Does `freq_hz` fall inside this band (upper edge inclusive)
    pub fn contains(&self, freq_hz: f64) -> bool {
        freq_hz >= self.lower_hz && freq_hz <= self.upper_hz
    }

    /// Inclusive FFT bin range for this band, clamped to `num_bins`
    ///
    /// Edges are rounded to the nearest bin. Returns `None` when the band
    /// lies entirely above the last bin.
    pub fn bin_range(&self, bin_width_hz: f64, num_bins: usize) -> Option<(usize, usize)> {
        if num_bins == 0 || bin_width_hz <= 0.0 {
            return None;
        }

        let last = num_bins - 1;
        let start = (self.lower_hz / bin_width_hz).round() as usize;
        let end = ((self.upper_hz / bin_width_hz).round() as usize).min(last);

        if start > end {
            None
        } else {
            Some((start, end))
        }
    }
}

/// Build `count` log-spaced bands covering `[start_hz, end_hz]`
///
/// Every band spans the same number of octaves:
/// `n = log2(end / start) / count`, band i = `[start·2^(n·i), start·2^(n·(i+1))]`.
pub fn log_bands(start_hz: f64, end_hz: f64, count: usize) -> Vec<FrequencyBand> {
    if count == 0 || start_hz <= 0.0 || end_hz <= start_hz {
        return Vec::new();
    }

    let n = (end_hz / start_hz).log2() / count as f64;

    (0..count)
        .map(|i| {
            let lower_hz = start_hz * 2f64.powf(n * i as f64);
            let upper_hz = lower_hz * 2f64.powf(n);
            FrequencyBand { lower_hz, upper_hz }
        })
        .collect()
}

/// Largest amplitude inside the band, or 0 when the band has no bins
pub fn band_peak(band: &FrequencyBand, amplitudes: &[f64], bin_width_hz: f64) -> f64 {
    match band.bin_range(bin_width_hz, amplitudes.len()) {
        Some((start, end)) => amplitudes[start..=end]
            .iter()
            .copied()
            .fold(0.0, f64::max),
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_bands_cover_range() {
        let bands = log_bands(100.0, 18000.0, 80);

        assert_eq!(bands.len(), 80);
        assert!((bands[0].lower_hz - 100.0).abs() < 1e-9);
        assert!((bands[79].upper_hz - 18000.0).abs() < 1e-6);

        // Contiguous
        for pair in bands.windows(2) {
            assert!((pair[0].upper_hz - pair[1].lower_hz).abs() < 1e-6);
        }
    }

    #[test]
    fn test_log_bands_equal_octave_width() {
        let bands = log_bands(100.0, 1600.0, 4);

        // 4 octaves in 4 bands: each band doubles
        let edges: Vec<f64> = bands.iter().map(|b| b.lower_hz).collect();
        for (edge, expected) in edges.iter().zip([100.0, 200.0, 400.0, 800.0]) {
            assert!((edge - expected).abs() < 1e-9);
        }
        assert!((bands[1].center_hz() - 200.0 * 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_ranges_produce_no_bands() {
        assert!(log_bands(100.0, 100.0, 10).is_empty());
        assert!(log_bands(0.0, 1000.0, 10).is_empty());
        assert!(log_bands(100.0, 1000.0, 0).is_empty());
    }

    #[test]
    fn test_bin_range_rounds_and_clamps() {
        let band = FrequencyBand { lower_hz: 100.0, upper_hz: 130.0 };
        // 21.5 Hz bins: 100/21.5 = 4.65 -> 5, 130/21.5 = 6.05 -> 6
        assert_eq!(band.bin_range(21.5, 1024), Some((5, 6)));

        let high = FrequencyBand { lower_hz: 30000.0, upper_hz: 40000.0 };
        assert_eq!(high.bin_range(21.5, 1024), None);

        let straddling = FrequencyBand { lower_hz: 21000.0, upper_hz: 23000.0 };
        assert_eq!(straddling.bin_range(21.5, 1024), Some((977, 1023)));
    }

    #[test]
    fn test_band_peak() {
        let amps = vec![0.0, 0.1, 0.7, 0.3, 0.0];
        let band = FrequencyBand { lower_hz: 10.0, upper_hz: 30.0 };

        assert_eq!(band_peak(&band, &amps, 10.0), 0.7);
        assert_eq!(band_peak(&band, &[], 10.0), 0.0);
    }
}
