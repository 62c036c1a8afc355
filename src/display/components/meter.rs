/*
 *  display/components/meter.rs
 *
 *  SWRPanel - remote panel for the ESP32 SWR controller
 *  (c) 2024-26 SWRPanel contributors
 *
 *  Level meter renderer
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

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, StrokeAlignment};

use crate::display::color::{glow, BACKGROUND};
use crate::meter::{ConfigurationError, LevelMeter, MeterConfig, SegmentState};

/// Paints a `LevelMeter` into a fixed area of a draw target.
///
/// Segment rectangles are snapped to pixels once, here, so a frame is
/// only a background fill plus one styled rectangle per segment.
#[derive(Debug, Clone)]
pub struct MeterRenderer {
    meter: LevelMeter,
    area: Rectangle,
    rects: Vec<Rectangle>,
}

impl MeterRenderer {
    pub fn new(area: Rectangle, config: MeterConfig) -> Result<Self, ConfigurationError> {
        let meter = LevelMeter::new(area.size.width as f64, area.size.height as f64, config)?;
        let rects = meter
            .geometry()
            .segments()
            .iter()
            .map(|s| s.to_rectangle(area.top_left))
            .collect();
        Ok(Self { meter, area, rects })
    }

    pub fn meter(&self) -> &LevelMeter {
        &self.meter
    }

    pub fn area(&self) -> Rectangle {
        self.area
    }

    /// Pixel rectangle of segment `index` (1-based).
    pub fn segment_rect(&self, index: usize) -> Option<Rectangle> {
        index.checked_sub(1).and_then(|i| self.rects.get(i)).copied()
    }

    /// Clear the meter area and paint every segment for `value`.
    /// Returns the states that were painted.
    pub fn paint<D>(&self, target: &mut D, value: f64) -> Result<Vec<SegmentState>, D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        self.area
            .into_styled(PrimitiveStyle::with_fill(BACKGROUND))
            .draw(target)?;

        let states = self.meter.segment_states(value);
        for (state, rect) in states.iter().zip(&self.rects) {
            let fill = state.band.color(state.on);
            let style = if state.on {
                // lit segments get a lighter rim
                PrimitiveStyleBuilder::new()
                    .fill_color(fill)
                    .stroke_color(glow(fill))
                    .stroke_width(1)
                    .stroke_alignment(StrokeAlignment::Inside)
                    .build()
            } else {
                PrimitiveStyle::with_fill(fill)
            };
            rect.into_styled(style).draw(target)?;
        }
        Ok(states)
    }
}
