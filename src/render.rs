/*
 *  render.rs
 *
 *  SWRPanel - remote panel for the ESP32 SWR controller
 *  (c) 2024-26 SWRPanel contributors
 *
 *  The render loop: one frame per clock tick until stopped
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

use std::sync::Arc;

use embedded_graphics::prelude::*;
use log::{debug, info, warn};
use tokio::sync::watch;

use crate::display::color::BACKGROUND;
use crate::display::{LayoutConfig, MeterRenderer, PanelView, Surface, SurfaceError};
use crate::level::LevelReader;
use crate::meter::{ConfigurationError, MeterConfig, SegmentState};
use crate::pacer::FrameClock;
use crate::panel::PanelReader;

/// Asks every holder of a `StopSignal` to wind down.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

/// Observes a `StopHandle`. Cheap to clone, one per task.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx: Arc::new(tx) }, StopSignal { rx })
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn signal(&self) -> StopSignal {
        StopSignal { rx: self.tx.subscribe() }
    }
}

impl StopSignal {
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once stop is requested, or once every handle is gone.
    pub async fn stopped(&mut self) {
        // Err means all handles were dropped, which counts as a stop
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

/// Why `RenderLoop::run` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Stopped,
    Disposed,
}

/// Paints the panel and the meter onto a surface, once per frame.
///
/// The loop is the only reader of the level cell and the panel state; it
/// never writes either.
pub struct RenderLoop<S: Surface> {
    surface: S,
    meter: MeterRenderer,
    panel_view: PanelView,
    level: LevelReader,
    panel: PanelReader,
    frames: u64,
}

impl<S: Surface> RenderLoop<S> {
    /// Lay the surface out and build the meter. Bad meter settings, or a
    /// meter strip too small for them, fail here and nowhere else.
    pub fn new(
        surface: S,
        meter_config: MeterConfig,
        meter_fraction: f32,
        level: LevelReader,
        panel: PanelReader,
    ) -> Result<Self, ConfigurationError> {
        let layout = LayoutConfig::for_surface(surface.capabilities(), meter_fraction);
        let meter = MeterRenderer::new(layout.meter_area, meter_config)?;
        let panel_view = PanelView::new(layout.indicator_area);

        debug!(
            "{} surface {}x{}: indicators {:?}, meter {:?}",
            surface.capabilities().name,
            layout.width,
            layout.height,
            layout.indicator_area,
            layout.meter_area
        );

        Ok(Self { surface, meter, panel_view, level, panel, frames: 0 })
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn meter(&self) -> &MeterRenderer {
        &self.meter
    }

    /// Frames flushed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Paint and flush one frame. Returns the meter states that were drawn.
    pub fn tick(&mut self) -> Result<Vec<SegmentState>, SurfaceError> {
        let value = self.level.value();
        let state = self.panel.borrow_and_update().clone();

        let Ok(()) = self.surface.clear(BACKGROUND);
        let Ok(()) = self.panel_view.paint(&mut self.surface, &state);
        let Ok(states) = self.meter.paint(&mut self.surface, value);

        self.surface.flush()?;
        self.frames += 1;
        Ok(states)
    }

    /// Tick on every frame of `clock` until `stop` fires or the surface is
    /// disposed. A frame in progress always completes.
    pub async fn run<C: FrameClock>(&mut self, clock: &mut C, stop: &mut StopSignal) -> LoopExit {
        info!("render loop started on {} surface", self.surface.capabilities().name);
        loop {
            tokio::select! {
                biased;
                _ = stop.stopped() => {
                    info!("render loop stopped after {} frames", self.frames);
                    return LoopExit::Stopped;
                }
                _ = clock.next_frame() => {}
            }

            match self.tick() {
                Ok(_) => {}
                Err(e) if e.is_disposed() => {
                    info!("surface disposed, render loop ends after {} frames", self.frames);
                    return LoopExit::Disposed;
                }
                Err(e) => warn!("frame {} not shown: {}", self.frames + 1, e),
            }
        }
    }
}
