//! Cooperative, self-rescheduling render loop.
//!
//! The host calls [`FrameLoop::tick`] once per display refresh on its single
//! UI thread. A tick draws only when a frame was requested; after drawing,
//! the loop requests the next frame only while playback is active.

use super::renderer::{FrameRenderer, FrameSummary, SpectralSource};
use super::surface::Surface;
use crate::error::ChladniError;

pub struct FrameLoop {
    renderer: FrameRenderer,
    frame_requested: bool,
    cancelled: bool,
    frames_drawn: u64,
}

impl FrameLoop {
    /// Creates a loop with its first frame already requested.
    pub fn start(renderer: FrameRenderer) -> Self {
        Self {
            renderer,
            frame_requested: true,
            cancelled: false,
            frames_drawn: 0,
        }
    }

    /// Runs the requested frame, if any, and reschedules while `playing`.
    ///
    /// Returns the summary of the frame drawn during this tick.
    ///
    /// # Errors
    /// - Propagates renderer failures; the loop does not reschedule after one
    pub fn tick<S, T>(
        &mut self,
        playing: bool,
        source: &mut S,
        surface: &mut T,
    ) -> Result<Option<FrameSummary>, ChladniError>
    where
        S: SpectralSource + ?Sized,
        T: Surface + ?Sized,
    {
        if !self.frame_requested {
            return Ok(None);
        }
        self.frame_requested = false;

        let summary = self.renderer.render(source, surface)?;
        self.frames_drawn += 1;

        if playing && !self.cancelled {
            self.frame_requested = true;
        } else {
            tracing::debug!("Render loop idle after {} frames", self.frames_drawn);
        }

        Ok(Some(summary))
    }

    /// Drops any pending frame and prevents further rescheduling.
    ///
    /// A frame already being drawn is not interrupted.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.frame_requested = false;
    }

    pub fn is_scheduled(&self) -> bool {
        self.frame_requested
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }
}
