//! Per-frame pipeline: snapshot -> smoothing -> (m, n) -> wave field -> painted grid.

use super::field::{field_at, Grid};
use super::modal::{extract_modal_params, ModalParams};
use super::smoothing::SpectralSmoother;
use super::surface::{Rgb, Surface};
use crate::error::ChladniError;

/// Pull-based provider of byte frequency snapshots.
pub trait SpectralSource {
    /// Number of bins in each snapshot.
    fn frequency_bin_count(&self) -> usize;

    /// Fills `out` with the current magnitudes, one byte per bin.
    fn byte_frequency_data(&mut self, out: &mut [u8]);
}

/// Magenta-green color for a field value: intensity `|f| * 255` drives the
/// red and blue channels, its complement the green channel.
pub fn cell_color(field: f64) -> Rgb {
    let intensity = (field.abs() * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb(intensity, 255 - intensity, intensity)
}

/// What a rendered frame was driven by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSummary {
    pub params: ModalParams,
}

/// Renders one Chladni frame per call from a spectral source onto a surface.
pub struct FrameRenderer {
    grid: Grid,
    smoother: SpectralSmoother,
    raw: Vec<u8>,
}

impl FrameRenderer {
    pub fn new(bin_count: usize, smoothing_factor: f64) -> Self {
        Self::with_grid(Grid::default(), bin_count, smoothing_factor)
    }

    pub fn with_grid(grid: Grid, bin_count: usize, smoothing_factor: f64) -> Self {
        Self {
            grid,
            smoother: SpectralSmoother::new(bin_count, smoothing_factor),
            raw: vec![0u8; bin_count],
        }
    }

    /// Samples `source`, derives the modal parameters and paints the frame.
    ///
    /// # Errors
    /// - `BinOutOfRange` if the source provides fewer than 201 bins
    pub fn render<S, T>(&mut self, source: &mut S, surface: &mut T) -> Result<FrameSummary, ChladniError>
    where
        S: SpectralSource + ?Sized,
        T: Surface + ?Sized,
    {
        source.byte_frequency_data(&mut self.raw);
        let smoothed = self.smoother.apply(&self.raw);
        tracing::trace!(bins = ?smoothed, "Smoothed frequency data");

        let params = extract_modal_params(smoothed)?;
        tracing::trace!("m: {}, n: {}", params.m, params.n);

        self.paint(params, surface);
        Ok(FrameSummary { params })
    }

    /// Clears `surface` and paints every grid cell for the given modes.
    ///
    /// Each cell leaves a one pixel gap on its right and bottom edge.
    pub fn paint<T: Surface + ?Sized>(&self, params: ModalParams, surface: &mut T) {
        let width = f64::from(surface.width());
        let height = f64::from(surface.height());
        let cell = self.grid.cell_size(width, height);

        surface.clear();

        for (i, j) in self.grid.cells() {
            let value = field_at(i, j, cell, width, params);
            surface.fill_rect(
                i as f64 * cell.width,
                j as f64 * cell.height,
                cell.width - 1.0,
                cell.height - 1.0,
                cell_color(value),
            );
        }
    }
}
