//! Spatial and temporal smoothing of band values

/// Default highlight kernel; the centre tap is the band's own weight
pub const DEFAULT_HIGHLIGHT_KERNEL: [f32; 7] = [1.0, 2.0, 3.0, 5.0, 3.0, 2.0, 1.0];

/// Weighted moving average across neighbouring bands
///
/// The kernel must have odd length. The first and last `kernel.len() / 2`
/// bands have no full neighbourhood and pass through unchanged, as does any
/// spectrum shorter than the kernel.
pub fn highlight(spectrum: &[f32], kernel: &[f32]) -> Vec<f32> {
    let half = kernel.len() / 2;
    let total: f32 = kernel.iter().sum();

    if kernel.is_empty() || spectrum.len() < kernel.len() || total <= 0.0 {
        return spectrum.to_vec();
    }

    let mut out = Vec::with_capacity(spectrum.len());
    out.extend_from_slice(&spectrum[..half]);

    for i in half..spectrum.len() - half {
        let window = &spectrum[i - half..=i + half];
        let weighted: f32 = window.iter().zip(kernel).map(|(v, w)| v * w).sum();
        out.push(weighted / total);
    }

    out.extend_from_slice(&spectrum[spectrum.len() - half..]);
    out
}

/// Exponential smoothing between frames
///
/// `prev[i] = prev[i]·factor + next[i]·(1 - factor)`. A `factor` of 0 keeps
/// only the new frame, 1 freezes the display.
pub fn smooth_into(prev: &mut [f32], next: &[f32], factor: f32) {
    let factor = factor.clamp(0.0, 1.0);
    for (p, &n) in prev.iter_mut().zip(next) {
        *p = *p * factor + n * (1.0 - factor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_preserves_constant() {
        let flat = vec![0.4_f32; 20];
        let out = highlight(&flat, &DEFAULT_HIGHLIGHT_KERNEL);

        assert_eq!(out.len(), 20);
        assert!(out.iter().all(|v| (v - 0.4).abs() < 1e-6));
    }

    #[test]
    fn test_highlight_spreads_a_spike() {
        let mut spectrum = vec![0.0_f32; 11];
        spectrum[5] = 17.0;

        let out = highlight(&spectrum, &DEFAULT_HIGHLIGHT_KERNEL);

        // Sum of the kernel is 17, so each neighbour gets its tap weight
        assert!((out[5] - 5.0).abs() < 1e-6);
        assert!((out[4] - 3.0).abs() < 1e-6);
        assert!((out[6] - 3.0).abs() < 1e-6);
        assert!((out[3] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_highlight_edges_pass_through() {
        let spectrum: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let out = highlight(&spectrum, &DEFAULT_HIGHLIGHT_KERNEL);

        assert_eq!(&out[..3], &spectrum[..3]);
        assert_eq!(&out[7..], &spectrum[7..]);
    }

    #[test]
    fn test_highlight_short_spectrum_unchanged() {
        let spectrum = vec![1.0, 0.0, 1.0];
        assert_eq!(highlight(&spectrum, &DEFAULT_HIGHLIGHT_KERNEL), spectrum);
    }

    #[test]
    fn test_smoothing_halves_a_step() {
        let mut prev = vec![0.0_f32; 4];
        smooth_into(&mut prev, &[1.0; 4], 0.5);
        assert!(prev.iter().all(|&v| (v - 0.5).abs() < 1e-6));

        smooth_into(&mut prev, &[1.0; 4], 0.5);
        assert!(prev.iter().all(|&v| (v - 0.75).abs() < 1e-6));
    }

    #[test]
    fn test_smoothing_factor_zero_takes_new_frame() {
        let mut prev = vec![0.9_f32, 0.1];
        smooth_into(&mut prev, &[0.2, 0.3], 0.0);
        assert_eq!(prev, vec![0.2, 0.3]);
    }
}
