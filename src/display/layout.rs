/*
 *  display/layout.rs
 *
 *  SWRPanel - remote panel for the ESP32 SWR controller
 *  (c) 2024-26 SWRPanel contributors
 *
 *  Splits the surface into indicator and meter areas
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

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::display::traits::SurfaceCapabilities;

pub const DEFAULT_METER_FRACTION: f32 = 0.25;

/// Layout configuration for a given surface size.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Surface width in pixels
    pub width: u32,

    /// Surface height in pixels
    pub height: u32,

    /// Status dot and lamp ring
    pub indicator_area: Rectangle,

    /// Level meter strip along the bottom edge
    pub meter_area: Rectangle,
}

impl LayoutConfig {
    /// `meter_fraction` of the height (at least one pixel row, at most all
    /// of it) goes to the meter; the rest is the indicator area.
    pub fn for_surface(caps: &SurfaceCapabilities, meter_fraction: f32) -> Self {
        let (width, height) = (caps.width, caps.height);
        let fraction = if meter_fraction.is_finite() { meter_fraction.clamp(0.0, 1.0) } else { DEFAULT_METER_FRACTION };
        let meter_h = ((height as f32 * fraction).round() as u32).clamp(1u32.min(height), height);
        let indicator_h = height - meter_h;

        Self {
            width,
            height,
            indicator_area: Rectangle::new(Point::zero(), Size::new(width, indicator_h)),
            meter_area: Rectangle::new(Point::new(0, indicator_h as i32), Size::new(width, meter_h)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(width: u32, height: u32) -> SurfaceCapabilities {
        SurfaceCapabilities { width, height, name: "test" }
    }

    #[test]
    fn test_layout_320x240() {
        let layout = LayoutConfig::for_surface(&caps(320, 240), 0.25);
        assert_eq!(layout.meter_area, Rectangle::new(Point::new(0, 180), Size::new(320, 60)));
        assert_eq!(layout.indicator_area.size, Size::new(320, 180));
    }

    #[test]
    fn test_layout_meter_only() {
        let layout = LayoutConfig::for_surface(&caps(300, 40), 1.0);
        assert_eq!(layout.meter_area.size, Size::new(300, 40));
        assert_eq!(layout.indicator_area.size.height, 0);
    }

    #[test]
    fn test_layout_keeps_a_meter_row() {
        let layout = LayoutConfig::for_surface(&caps(100, 100), 0.0);
        assert_eq!(layout.meter_area.size.height, 1);
        let layout = LayoutConfig::for_surface(&caps(100, 100), f32::NAN);
        assert_eq!(layout.meter_area.size.height, 25);
    }
}
