/*
 *  level.rs
 *
 *  SWRPanel - remote panel for the ESP32 SWR controller
 *  (c) 2024-26 SWRPanel contributors
 *
 *  Single-writer / single-reader cell carrying the live meter reading
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

use serde_json::Value;
use tokio::sync::watch;

use crate::deutils::lenient_number;

/// Latest reading as delivered by the device. `None` covers both "never
/// sent" and "sent something that is not a number".
pub type Reading = Option<f64>;

/// Writing half, owned by the connection manager.
#[derive(Debug)]
pub struct LevelWriter {
    tx: watch::Sender<Reading>,
}

/// Reading half, owned by the render loop.
#[derive(Debug, Clone)]
pub struct LevelReader {
    rx: watch::Receiver<Reading>,
}

pub fn channel() -> (LevelWriter, LevelReader) {
    let (tx, rx) = watch::channel(None);
    (LevelWriter { tx }, LevelReader { rx })
}

impl LevelWriter {
    pub fn set(&self, value: f64) {
        let reading = value.is_finite().then_some(value);
        self.tx.send_replace(reading);
    }

    /// Store a raw JSON field. Numbers and numeric strings are kept,
    /// anything else stores an absent reading.
    pub fn set_raw(&self, value: &Value) {
        self.tx.send_replace(lenient_number(value));
    }

    pub fn clear(&self) {
        self.tx.send_replace(None);
    }
}

impl LevelReader {
    /// Current value, absent reads as zero. Marks the reading as seen.
    pub fn value(&mut self) -> f64 {
        self.rx.borrow_and_update().unwrap_or(0.0)
    }

    /// Peek without marking as seen.
    pub fn peek(&self) -> Reading {
        *self.rx.borrow()
    }

    /// True when a reading arrived since the last `value()`.
    /// A dropped writer counts as no change.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }
}
