//! Derives the two modal integers (m, n) from fixed bins of a smoothed spectrum.

use crate::error::ChladniError;

/// Bin that drives `m`.
pub const M_BIN: usize = 100;
/// Bin that drives `n`.
pub const N_BIN: usize = 200;
/// Smallest snapshot length that contains both bins.
pub const MIN_BIN_COUNT: usize = N_BIN + 1;

pub const MIN_MODE: u32 = 2;
pub const MAX_MODE: u32 = 12;

/// Spatial frequencies of the two interfering plate modes, both in [2, 12].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalParams {
    pub m: u32,
    pub n: u32,
}

impl Default for ModalParams {
    fn default() -> Self {
        Self {
            m: MIN_MODE,
            n: MIN_MODE,
        }
    }
}

/// Maps a byte magnitude to a mode number: `floor(2 + 10 * v / 255)`.
pub fn mode_from_byte(value: u8) -> u32 {
    let normalized = f64::from(value) / 255.0;
    (f64::from(MIN_MODE) + normalized * 10.0).floor() as u32
}

/// Reads bins 100 and 200 of `smoothed` and converts them to (m, n).
///
/// # Errors
/// - `BinOutOfRange` if the snapshot has fewer than 201 bins
pub fn extract_modal_params(smoothed: &[u8]) -> Result<ModalParams, ChladniError> {
    let read = |index: usize| {
        smoothed
            .get(index)
            .copied()
            .ok_or(ChladniError::BinOutOfRange {
                index,
                len: smoothed.len(),
            })
    };

    Ok(ModalParams {
        m: mode_from_byte(read(M_BIN)?),
        n: mode_from_byte(read(N_BIN)?),
    })
}
