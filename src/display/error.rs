/*
 *  display/error.rs
 *
 *  SWRPanel - remote panel for the ESP32 SWR controller
 *  (c) 2024-26 SWRPanel contributors
 *
 *  Error types for the surface layer
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use thiserror::Error;

/// Errors a surface can report on flush.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The surface went away; the render loop ends quietly on this one.
    #[error("surface has been disposed")]
    Disposed,

    /// Writing the frame out failed
    #[error("surface I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Framebuffer size mismatch
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl SurfaceError {
    pub fn is_disposed(&self) -> bool {
        matches!(self, SurfaceError::Disposed)
    }
}
