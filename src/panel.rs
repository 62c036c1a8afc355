/*
 *  panel.rs
 *
 *  SWRPanel - remote panel for the ESP32 SWR controller
 *  (c) 2024-26 SWRPanel contributors
 *
 *  Indicator state mirrored from the device
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

use tokio::sync::watch;

use crate::message::DeviceMessage;

/// Directional lamps in rotary switch order (position 1 is south).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lamp {
    S,
    SW,
    W,
    NW,
    N,
    NE,
    E,
    SE,
}

impl Lamp {
    pub const ALL: [Lamp; 8] = [
        Lamp::S, Lamp::SW, Lamp::W, Lamp::NW,
        Lamp::N, Lamp::NE, Lamp::E, Lamp::SE,
    ];

    /// Switch position 1..=8, anything else is no lamp.
    pub fn from_position(position: u8) -> Option<Lamp> {
        match position {
            1..=8 => Some(Self::ALL[position as usize - 1]),
            _ => None,
        }
    }

    pub fn position(self) -> u8 {
        self as u8 + 1
    }

    pub fn slot(self) -> usize {
        self as usize
    }

    /// Compass bearing in degrees, north = 0, clockwise.
    pub fn bearing(self) -> f32 {
        match self {
            Lamp::N => 0.0,
            Lamp::NE => 45.0,
            Lamp::E => 90.0,
            Lamp::SE => 135.0,
            Lamp::S => 180.0,
            Lamp::SW => 225.0,
            Lamp::W => 270.0,
            Lamp::NW => 315.0,
        }
    }
}

/// Device status class.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    On,
    Off,
    #[default]
    Unknown,
    Other(String),
}

impl Status {
    pub fn from_wire(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "on" => Status::On,
            "off" => Status::Off,
            "" => Status::Unknown,
            _ => Status::Other(s.trim().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PanelState {
    pub status: Status,
    pub lamps: [bool; 8],
}

impl PanelState {
    pub fn lamp(&self, lamp: Lamp) -> bool {
        self.lamps[lamp.slot()]
    }

    pub fn lit_lamps(&self) -> Vec<Lamp> {
        Lamp::ALL.into_iter().filter(|l| self.lamp(*l)).collect()
    }

    /// Fold a device frame into the panel. Per-lamp flags take precedence;
    /// a lone `direction` lights exactly one lamp. Returns true on change.
    pub fn apply(&mut self, msg: &DeviceMessage) -> bool {
        let before = self.clone();

        if let Some(status) = msg.status.as_deref() {
            self.status = Status::from_wire(status);
        }

        if msg.has_lamp_fields() {
            for (slot, flag) in msg.lamp_fields().into_iter().enumerate() {
                if let Some(on) = flag {
                    self.lamps[slot] = on;
                }
            }
        } else if let Some(position) = msg.direction {
            // any direction clears; only a valid position relights
            self.lamps = [false; 8];
            if let Some(lamp) = position.and_then(Lamp::from_position) {
                self.lamps[lamp.slot()] = true;
            }
        }

        *self != before
    }
}

pub type PanelWriter = watch::Sender<PanelState>;
pub type PanelReader = watch::Receiver<PanelState>;

pub fn channel() -> (PanelWriter, PanelReader) {
    watch::channel(PanelState::default())
}
