/*
 *  lib.rs
 *
 *  SWRPanel - remote panel for the ESP32 SWR controller
 *	(c) 2024-26 SWRPanel contributors
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

pub mod config;
pub mod connection;
pub mod deutils;
// New modular display system
pub mod display;
pub mod level;
pub mod message;
pub mod meter;
pub mod pacer;
pub mod panel;
pub mod render;
pub mod vframebuf;

pub use connection::{forward_clicks, ActionSender, ConnectionConfig, ConnectionError, ConnectionHandle, ConnectionManager};
pub use meter::{Band, ConfigurationError, LevelMeter, MeterConfig, SegmentState};
pub use render::{stop_channel, LoopExit, RenderLoop, StopHandle, StopSignal};
