//! Left-to-right recursive blend across the bin axis of one spectral snapshot.

/// Blend weight on the current bin used by the visualizer.
pub const DEFAULT_SMOOTHING_FACTOR: f64 = 0.85;

/// Smooths a byte spectrum across its bins.
///
/// `out[0] = data[0]` and `out[i] = alpha * data[i] + (1 - alpha) * out[i - 1]`,
/// truncated back to a byte. Each call starts from the snapshot's own first
/// bin; nothing carries over from a previous frame.
pub fn smooth(data: &[u8], alpha: f64) -> Vec<u8> {
    let mut out = vec![0u8; data.len()];
    smooth_into(data, alpha, &mut out);
    out
}

/// Same as [`smooth`], writing into `out` (which must have the same length).
pub fn smooth_into(data: &[u8], alpha: f64, out: &mut [u8]) {
    debug_assert_eq!(data.len(), out.len());

    let Some(&first) = data.first() else {
        return;
    };
    out[0] = first;

    for i in 1..data.len() {
        let blended = alpha * f64::from(data[i]) + (1.0 - alpha) * f64::from(out[i - 1]);
        // Byte storage truncates toward zero
        out[i] = blended.clamp(0.0, 255.0) as u8;
    }
}

/// Reusable smoother owning the per-frame output buffer.
///
/// The buffer length is fixed when the analysis source is created and stays
/// constant for the lifetime of the render loop.
#[derive(Debug, Clone)]
pub struct SpectralSmoother {
    alpha: f64,
    smoothed: Vec<u8>,
}

impl SpectralSmoother {
    pub fn new(bin_count: usize, alpha: f64) -> Self {
        Self {
            alpha,
            smoothed: vec![0u8; bin_count],
        }
    }

    /// Smooths `raw` and returns the smoothed snapshot.
    ///
    /// `raw` is truncated or zero-extended to the smoother's bin count.
    pub fn apply(&mut self, raw: &[u8]) -> &[u8] {
        let len = self.smoothed.len();
        if raw.len() == len {
            smooth_into(raw, self.alpha, &mut self.smoothed);
        } else {
            let mut padded = raw[..raw.len().min(len)].to_vec();
            padded.resize(len, 0);
            smooth_into(&padded, self.alpha, &mut self.smoothed);
        }
        &self.smoothed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_bin_passes_through() {
        for alpha in [0.01, 0.3, 0.5, DEFAULT_SMOOTHING_FACTOR, 0.99] {
            let data = [173u8, 4, 250, 0, 90];
            assert_eq!(smooth(&data, alpha)[0], 173);
        }
    }

    #[test]
    fn test_identity_factor_returns_input() {
        let data: Vec<u8> = (0..=255).rev().chain(0..=255).collect();
        assert_eq!(smooth(&data, 1.0), data);
    }

    #[test]
    fn test_empty_snapshot() {
        assert!(smooth(&[], DEFAULT_SMOOTHING_FACTOR).is_empty());
    }

    #[test]
    fn test_recursive_blend_truncates() {
        // 0.85 * 0 + 0.15 * 255 = 38.25 -> 38, then 0.15 * 38 = 5.7 -> 5
        let out = smooth(&[255, 0, 0, 0], DEFAULT_SMOOTHING_FACTOR);
        assert_eq!(out, vec![255, 38, 5, 0]);
    }

    #[test]
    fn test_does_not_carry_between_frames() {
        let mut smoother = SpectralSmoother::new(3, 0.5);
        smoother.apply(&[200, 200, 200]);
        assert_eq!(smoother.apply(&[0, 0, 0]), &[0, 0, 0]);
    }

    #[test]
    fn test_smoother_pads_short_input() {
        let mut smoother = SpectralSmoother::new(4, 1.0);
        assert_eq!(smoother.apply(&[9, 8]), &[9, 8, 0, 0]);
    }
}
