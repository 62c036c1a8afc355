/*
 *  display/traits.rs
 *
 *  SWRPanel - remote panel for the ESP32 SWR controller
 *  (c) 2024-26 SWRPanel contributors
 *
 *  Core trait definitions for render surfaces
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

use core::convert::Infallible;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;

use crate::display::error::SurfaceError;

/// Surface capabilities and metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceCapabilities {
    /// Surface width in pixels
    pub width: u32,

    /// Surface height in pixels
    pub height: u32,

    /// Short name for logs
    pub name: &'static str,
}

/// Something the panel can be painted on.
///
/// Drawing goes through `DrawTarget` into a local framebuffer and cannot
/// fail; `flush` pushes the finished frame to wherever the surface lives.
/// DrawTarget is not dyn compatible, so callers stay generic over `S: Surface`.
pub trait Surface: DrawTarget<Color = Rgb888, Error = Infallible> + OriginDimensions + Send {
    fn capabilities(&self) -> &SurfaceCapabilities;

    /// Returns the surface dimensions as (width, height)
    fn dimensions(&self) -> (u32, u32) {
        let caps = self.capabilities();
        (caps.width, caps.height)
    }

    /// Push the current frame out. `SurfaceError::Disposed` once the
    /// surface has been torn down.
    fn flush(&mut self) -> Result<(), SurfaceError>;

    /// Tear the surface down; later flushes report `Disposed`.
    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;
}
