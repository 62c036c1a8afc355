/*
 *  display/mod.rs
 *
 *  SWRPanel - remote panel for the ESP32 SWR controller
 *  (c) 2024-26 SWRPanel contributors
 *
 *  Display subsystem - surfaces, layout and panel components
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

// Core trait definitions
pub mod traits;
pub mod error;
pub mod color;

// Surface drivers
pub mod drivers;

// Layout system
pub mod layout;

// UI components
pub mod components;

// Re-exports for convenience
pub use traits::{Surface, SurfaceCapabilities};
pub use error::SurfaceError;
pub use layout::{LayoutConfig, DEFAULT_METER_FRACTION};
pub use components::{MeterRenderer, PanelView};
pub use drivers::memory::{MemorySurface, MemorySurfaceState};
pub use drivers::ppm::PpmSurface;
