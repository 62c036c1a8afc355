/*
 *  display/components/panel.rs
 *
 *  SWRPanel - remote panel for the ESP32 SWR controller
 *  (c) 2024-26 SWRPanel contributors
 *
 *  Status dot and directional lamp ring
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
use embedded_graphics::primitives::{Circle, PrimitiveStyle, Rectangle};

use crate::display::color::{status_color, BACKGROUND, LAMP_OFF, LAMP_ON};
use crate::panel::{Lamp, PanelState};

/// Indicator half of the panel: a status dot in the middle with the
/// eight direction lamps on a compass ring around it.
#[derive(Debug, Clone)]
pub struct PanelView {
    area: Rectangle,
    status_dot: Option<Circle>,
    lamps: [Option<Circle>; 8],
}

impl PanelView {
    pub fn new(area: Rectangle) -> Self {
        let side = area.size.width.min(area.size.height);
        if side < 8 {
            // too small for anything legible
            return Self { area, status_dot: None, lamps: [None; 8] };
        }

        let center = area.center();
        let lamp_d = (side / 8).max(3);
        let ring_r = (side as f32 / 2.0) - lamp_d as f32;
        let status_d = (side / 4).max(3);

        let mut lamps = [None; 8];
        for lamp in Lamp::ALL {
            let theta = lamp.bearing().to_radians();
            let x = center.x as f32 + ring_r * theta.sin();
            let y = center.y as f32 - ring_r * theta.cos();
            let at = Point::new(x.round() as i32, y.round() as i32);
            lamps[lamp.slot()] = Some(Circle::with_center(at, lamp_d));
        }

        Self {
            area,
            status_dot: Some(Circle::with_center(center, status_d)),
            lamps,
        }
    }

    pub fn area(&self) -> Rectangle {
        self.area
    }

    pub fn status_dot(&self) -> Option<Circle> {
        self.status_dot
    }

    pub fn lamp_circle(&self, lamp: Lamp) -> Option<Circle> {
        self.lamps[lamp.slot()]
    }

    pub fn paint<D>(&self, target: &mut D, state: &PanelState) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        if self.area.is_zero_sized() {
            return Ok(());
        }
        self.area
            .into_styled(PrimitiveStyle::with_fill(BACKGROUND))
            .draw(target)?;

        if let Some(dot) = self.status_dot {
            dot.into_styled(PrimitiveStyle::with_fill(status_color(&state.status)))
                .draw(target)?;
        }

        for lamp in Lamp::ALL {
            if let Some(circle) = self.lamps[lamp.slot()] {
                let color = if state.lamp(lamp) { LAMP_ON } else { LAMP_OFF };
                circle.into_styled(PrimitiveStyle::with_fill(color)).draw(target)?;
            }
        }
        Ok(())
    }
}
