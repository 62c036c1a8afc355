/*
 *  display/drivers/memory.rs
 *
 *  SWRPanel - remote panel for the ESP32 SWR controller
 *  (c) 2024-26 SWRPanel contributors
 *
 *  In-memory surface, headless runs and tests
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
use std::sync::{Arc, Mutex, MutexGuard};

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::display::color::BACKGROUND;
use crate::display::error::SurfaceError;
use crate::display::traits::{Surface, SurfaceCapabilities};
use crate::vframebuf::VarFrameBuf;

/// Surface that keeps its frames in memory.
///
/// Every flush copies the working buffer into the shared state, so a test
/// can watch what a running render loop produced without owning the surface.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    framebuffer: VarFrameBuf<Rgb888>,
    capabilities: SurfaceCapabilities,
    state: Arc<Mutex<MemorySurfaceState>>,
}

/// Shared, inspectable state of a `MemorySurface`.
#[derive(Debug, Default)]
pub struct MemorySurfaceState {
    /// Successful flushes
    pub flush_count: usize,

    /// Last flushed frame
    pub last_frame: Option<VarFrameBuf<Rgb888>>,

    pub disposed: bool,

    /// Simulate failures (for error testing)
    pub simulate_flush_failure: bool,
}

impl MemorySurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            framebuffer: VarFrameBuf::new(width, height, BACKGROUND),
            capabilities: SurfaceCapabilities { width, height, name: "memory" },
            state: Arc::new(Mutex::new(MemorySurfaceState::default())),
        }
    }

    /// Working buffer (what has been drawn since the last clear).
    pub fn framebuffer(&self) -> &VarFrameBuf<Rgb888> {
        &self.framebuffer
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Rgb888> {
        self.framebuffer.pixel(x, y)
    }

    pub fn state(&self) -> Arc<Mutex<MemorySurfaceState>> {
        Arc::clone(&self.state)
    }

    fn lock(&self) -> MutexGuard<'_, MemorySurfaceState> {
        // a panicking test holding the lock must not hide the frame from the rest
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Surface for MemorySurface {
    fn capabilities(&self) -> &SurfaceCapabilities {
        &self.capabilities
    }

    fn flush(&mut self) -> Result<(), SurfaceError> {
        let frame = self.framebuffer.clone();
        let mut state = self.lock();
        if state.disposed {
            return Err(SurfaceError::Disposed);
        }
        if state.simulate_flush_failure {
            return Err(SurfaceError::Other("simulated flush failure".to_string()));
        }
        state.flush_count += 1;
        state.last_frame = Some(frame);
        Ok(())
    }

    fn dispose(&mut self) {
        self.lock().disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.lock().disposed
    }
}

impl DrawTarget for MemorySurface {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.framebuffer.draw_iter(pixels)
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.framebuffer.clear(color)
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        self.framebuffer.fill_contiguous(area, colors)
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        self.framebuffer.fill_solid(area, color)
    }
}

impl OriginDimensions for MemorySurface {
    fn size(&self) -> Size {
        Size::new(self.capabilities.width, self.capabilities.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{Line, PrimitiveStyle};

    #[test]
    fn test_memory_surface_creation() {
        let surface = MemorySurface::new(128, 64);
        assert_eq!(surface.dimensions(), (128, 64));
        assert_eq!(surface.size(), Size::new(128, 64));
        assert_eq!(surface.framebuffer().count(BACKGROUND), 128 * 64);
        assert!(surface.state().lock().unwrap().last_frame.is_none());
    }

    #[test]
    fn test_flush_publishes_frame() {
        let mut surface = MemorySurface::new(16, 16);
        Line::new(Point::new(0, 0), Point::new(5, 5))
            .into_styled(PrimitiveStyle::with_stroke(Rgb888::WHITE, 1))
            .draw(&mut surface)
            .unwrap();
        assert_eq!(surface.get_pixel(0, 0), Some(Rgb888::WHITE));

        let state = surface.state();
        assert!(state.lock().unwrap().last_frame.is_none());
        surface.flush().unwrap();
        let guard = state.lock().unwrap();
        assert_eq!(guard.flush_count, 1);
        assert_eq!(guard.last_frame.as_ref().unwrap().pixel(5, 5), Some(Rgb888::WHITE));
    }

    #[test]
    fn test_simulated_failure() {
        let mut surface = MemorySurface::new(8, 8);
        surface.state().lock().unwrap().simulate_flush_failure = true;
        assert!(matches!(surface.flush(), Err(SurfaceError::Other(_))));
        surface.state().lock().unwrap().simulate_flush_failure = false;
        assert!(surface.flush().is_ok());
    }

    #[test]
    fn test_dispose() {
        let mut surface = MemorySurface::new(8, 8);
        assert!(!surface.is_disposed());
        surface.dispose();
        assert!(surface.is_disposed());
        assert!(surface.flush().unwrap_err().is_disposed());
        assert_eq!(surface.state().lock().unwrap().flush_count, 0);
    }
}
