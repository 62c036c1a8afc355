/*
 *  display/drivers/ppm.rs
 *
 *  SWRPanel - remote panel for the ESP32 SWR controller
 *  (c) 2024-26 SWRPanel contributors
 *
 *  Snapshot surface, writes the panel out as a binary PPM image
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
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::{debug, warn};

use crate::display::color::BACKGROUND;
use crate::display::error::SurfaceError;
use crate::display::traits::{Surface, SurfaceCapabilities};
use crate::pacer::Pacer;
use crate::vframebuf::VarFrameBuf;

/// Surface that mirrors the panel into a P6 image file.
///
/// The file is only rewritten when the frame differs from the last one
/// written, and at most `max_writes_per_sec` times a second. A frame held
/// back by the pacer is written by a later flush or on dispose.
pub struct PpmSurface {
    path: PathBuf,
    framebuffer: VarFrameBuf<Rgb888>,
    capabilities: SurfaceCapabilities,
    pacer: Pacer,
    written: Option<Vec<u8>>,
    pending: Option<Vec<u8>>,
    writes: usize,
    disposed: bool,
}

impl PpmSurface {
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32, max_writes_per_sec: u32) -> Self {
        Self {
            path: path.into(),
            framebuffer: VarFrameBuf::new(width, height, BACKGROUND),
            capabilities: SurfaceCapabilities { width, height, name: "ppm" },
            pacer: Pacer::new(max_writes_per_sec),
            written: None,
            pending: None,
            writes: 0,
            disposed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of times the file has been (re)written.
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn write_frame(&mut self, rgb: Vec<u8>) -> Result<(), SurfaceError> {
        let expected = self.capabilities.width as usize * self.capabilities.height as usize * 3;
        if rgb.len() != expected {
            return Err(SurfaceError::BufferSizeMismatch { expected, actual: rgb.len() });
        }

        let tmp = self.path.with_extension("ppm.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            write!(file, "P6\n{} {}\n255\n", self.capabilities.width, self.capabilities.height)?;
            file.write_all(&rgb)?;
            file.flush()?;
        }
        // readers never see a half written image
        fs::rename(&tmp, &self.path)?;

        self.writes += 1;
        self.written = Some(rgb);
        debug!("snapshot {} written ({})", self.path.display(), self.writes);
        Ok(())
    }
}

impl Surface for PpmSurface {
    fn capabilities(&self) -> &SurfaceCapabilities {
        &self.capabilities
    }

    fn flush(&mut self) -> Result<(), SurfaceError> {
        if self.disposed {
            return Err(SurfaceError::Disposed);
        }

        let rgb = self.framebuffer.to_rgb_bytes();
        if self.written.as_ref() == Some(&rgb) {
            self.pending = None;
            return Ok(());
        }
        if !self.pacer.should_flush() {
            self.pending = Some(rgb);
            return Ok(());
        }
        self.pending = None;
        self.write_frame(rgb)
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if let Some(rgb) = self.pending.take() {
            if let Err(e) = self.write_frame(rgb) {
                warn!("final snapshot to {} failed: {e}", self.path.display());
            }
        }
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl DrawTarget for PpmSurface {
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

impl OriginDimensions for PpmSurface {
    fn size(&self) -> Size {
        Size::new(self.capabilities.width, self.capabilities.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_and_body(path: &Path) -> (String, Vec<u8>) {
        let bytes = fs::read(path).unwrap();
        let header = b"P6\n4 2\n255\n";
        assert_eq!(&bytes[..header.len()], header);
        (String::from_utf8_lossy(header).into_owned(), bytes[header.len()..].to_vec())
    }

    #[test]
    fn test_first_flush_writes_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.ppm");
        let mut surface = PpmSurface::new(&path, 4, 2, 10);

        Pixel(Point::new(3, 1), Rgb888::new(9, 8, 7)).draw(&mut surface).unwrap();
        surface.flush().unwrap();

        assert_eq!(surface.writes(), 1);
        let (_, body) = header_and_body(&path);
        assert_eq!(body.len(), 4 * 2 * 3);
        assert_eq!(&body[body.len() - 3..], &[9, 8, 7]);
        assert!(!path.with_extension("ppm.tmp").exists());
    }

    #[test]
    fn test_unchanged_frame_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.ppm");
        let mut surface = PpmSurface::new(&path, 4, 2, 1000);

        surface.flush().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        surface.flush().unwrap();
        surface.flush().unwrap();
        assert_eq!(surface.writes(), 1);
    }

    #[test]
    fn test_throttled_frame_lands_on_dispose() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.ppm");
        // one write a second: the second frame is held back
        let mut surface = PpmSurface::new(&path, 4, 2, 1);

        surface.flush().unwrap();
        Pixel(Point::new(0, 0), Rgb888::WHITE).draw(&mut surface).unwrap();
        surface.flush().unwrap();
        assert_eq!(surface.writes(), 1);

        surface.dispose();
        assert_eq!(surface.writes(), 2);
        let (_, body) = header_and_body(&path);
        assert_eq!(&body[..3], &[255, 255, 255]);

        assert!(surface.is_disposed());
        assert!(surface.flush().unwrap_err().is_disposed());
    }
}
