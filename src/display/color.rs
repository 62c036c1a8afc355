/*
 *  display/color.rs
 *
 *  SWRPanel - remote panel for the ESP32 SWR controller
 *  (c) 2024-26 SWRPanel contributors
 *
 *  Panel palette
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

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

use crate::meter::Band;
use crate::panel::Status;

/// Surface background, also the meter trough.
pub const BACKGROUND: Rgb888 = Rgb888::new(32, 32, 32);

// the controller's own web page meter, drawn opaque
pub const GREEN_ON: Rgb888 = Rgb888::new(53, 255, 30);
pub const GREEN_OFF: Rgb888 = Rgb888::new(13, 64, 8);
pub const YELLOW_ON: Rgb888 = Rgb888::new(255, 215, 5);
pub const YELLOW_OFF: Rgb888 = Rgb888::new(64, 53, 0);
pub const RED_ON: Rgb888 = Rgb888::new(255, 47, 30);
pub const RED_OFF: Rgb888 = Rgb888::new(64, 12, 8);

pub const LAMP_ON: Rgb888 = Rgb888::new(0xff, 0x9f, 0x1a);
pub const LAMP_OFF: Rgb888 = Rgb888::new(0x2e, 0x24, 0x16);

pub const STATUS_ON: Rgb888 = GREEN_ON;
pub const STATUS_OFF: Rgb888 = Rgb888::new(0x8b, 0x10, 0x10);
pub const STATUS_UNKNOWN: Rgb888 = Rgb888::new(0x55, 0x55, 0x55);

impl Band {
    pub fn on_color(self) -> Rgb888 {
        match self {
            Band::Green => GREEN_ON,
            Band::Yellow => YELLOW_ON,
            Band::Red => RED_ON,
        }
    }

    pub fn off_color(self) -> Rgb888 {
        match self {
            Band::Green => GREEN_OFF,
            Band::Yellow => YELLOW_OFF,
            Band::Red => RED_OFF,
        }
    }

    pub fn color(self, on: bool) -> Rgb888 {
        if on { self.on_color() } else { self.off_color() }
    }
}

pub fn status_color(status: &Status) -> Rgb888 {
    match status {
        Status::On => STATUS_ON,
        Status::Off => STATUS_OFF,
        Status::Unknown | Status::Other(_) => STATUS_UNKNOWN,
    }
}

/// Mix `c` toward white by `amount` (0..=1).
pub fn lighten(c: Rgb888, amount: f32) -> Rgb888 {
    let amount = amount.clamp(0.0, 1.0);
    let mix = |v: u8| (v as f32 + (255.0 - v as f32) * amount).round() as u8;
    Rgb888::new(mix(c.r()), mix(c.g()), mix(c.b()))
}

/// Rim colour for a lit segment.
pub fn glow(c: Rgb888) -> Rgb888 {
    lighten(c, 0.55)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_colors_distinct() {
        let all = [
            GREEN_ON, GREEN_OFF, YELLOW_ON, YELLOW_OFF, RED_ON, RED_OFF,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
            assert_ne!(*a, BACKGROUND);
        }
    }

    #[test]
    fn test_meter_palette_matches_controller_page() {
        assert_eq!(BACKGROUND, Rgb888::new(32, 32, 32));
        assert_eq!(Band::Green.color(true), Rgb888::new(53, 255, 30));
        assert_eq!(Band::Green.color(false), Rgb888::new(13, 64, 8));
        assert_eq!(Band::Yellow.color(true), Rgb888::new(255, 215, 5));
        assert_eq!(Band::Yellow.color(false), Rgb888::new(64, 53, 0));
        assert_eq!(Band::Red.color(true), Rgb888::new(255, 47, 30));
        assert_eq!(Band::Red.color(false), Rgb888::new(64, 12, 8));
    }

    #[test]
    fn test_lighten() {
        assert_eq!(lighten(Rgb888::BLACK, 0.0), Rgb888::BLACK);
        assert_eq!(lighten(Rgb888::BLACK, 1.0), Rgb888::WHITE);
        assert_eq!(lighten(Rgb888::new(0, 100, 255), 0.5), Rgb888::new(128, 178, 255));
        assert_ne!(glow(RED_ON), RED_ON);
    }

    #[test]
    fn test_status_colors() {
        assert_eq!(status_color(&Status::On), STATUS_ON);
        assert_eq!(status_color(&Status::Off), STATUS_OFF);
        assert_eq!(status_color(&Status::Other("x".into())), STATUS_UNKNOWN);
    }
}
