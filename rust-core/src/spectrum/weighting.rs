//! A-weighting curve
//!
//! Approximates the ear's sensitivity so low rumble does not dominate the bars.

const C1: f64 = 12194.217 * 12194.217;
const C2: f64 = 20.598997 * 20.598997;
const C3: f64 = 107.65265 * 107.65265;
const C4: f64 = 737.86223 * 737.86223;

/// Gain that normalises the curve to 0 dB at 1 kHz
const GAIN_1K: f64 = 1.2589;

/// Linear A-weighting gain at `freq_hz`
pub fn a_weight(freq_hz: f64) -> f64 {
    let f2 = freq_hz * freq_hz;
    let num = C1 * f2 * f2;
    let den = (f2 + C2) * ((f2 + C3) * (f2 + C4)).sqrt() * (f2 + C1);

    if den <= 0.0 {
        0.0
    } else {
        GAIN_1K * num / den
    }
}

/// A-weighting gain for every amplitude bin of an FFT
///
/// # Arguments
/// * `num_bins` - Number of amplitude bins
/// * `bin_width_hz` - Frequency step between bins
pub fn a_weights(num_bins: usize, bin_width_hz: f64) -> Vec<f64> {
    (0..num_bins)
        .map(|k| a_weight(k as f64 * bin_width_hz))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_db(gain: f64) -> f64 {
        20.0 * gain.log10()
    }

    #[test]
    fn test_unity_at_1khz() {
        assert!(to_db(a_weight(1000.0)).abs() < 0.05);
    }

    #[test]
    fn test_reference_points() {
        // Published A-weighting values
        assert!((to_db(a_weight(100.0)) + 19.1).abs() < 0.2);
        assert!((to_db(a_weight(50.0)) + 30.2).abs() < 0.2);
        assert!((to_db(a_weight(10000.0)) + 2.5).abs() < 0.2);
    }

    #[test]
    fn test_dc_is_silenced() {
        assert_eq!(a_weight(0.0), 0.0);

        let weights = a_weights(1024, 44100.0 / 2048.0);
        assert_eq!(weights.len(), 1024);
        assert_eq!(weights[0], 0.0);
    }
}
