/*
 *  meter.rs
 *
 *  SWRPanel - remote panel for the ESP32 SWR controller
 *  (c) 2024-26 SWRPanel contributors
 *
 *  Segmented level meter: configuration, geometry and segment state
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
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Full-scale reading of the device ADC (12 bit).
pub const DEFAULT_MAXIMUM: f64 = 4095.0;
pub const DEFAULT_SEGMENT_COUNT: i32 = 15;
pub const DEFAULT_RED_SEGMENTS: i32 = 2;
pub const DEFAULT_YELLOW_SEGMENTS: i32 = 3;
pub const DEFAULT_GAP_FRACTION: f64 = 0.25;

/// Raised once, at meter construction, for geometry or band settings
/// that cannot produce a sane segment bank.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("meter width must be > 0 (got {0})")]
    Width(f64),
    #[error("meter height must be > 0 (got {0})")]
    Height(f64),
    #[error("meter maximum must be > 0 (got {0})")]
    Maximum(f64),
    #[error("segment count must be > 0 (got {0})")]
    SegmentCount(i32),
    #[error("band sizes must not be negative (red {red}, yellow {yellow})")]
    NegativeBand { red: i32, yellow: i32 },
    #[error("red ({red}) + yellow ({yellow}) segments exceed segment count {segments}")]
    BandOverflow { red: i32, yellow: i32, segments: i32 },
    #[error("segment gap fraction must be in 0..1 (got {0})")]
    GapFraction(f64),
    #[error("meter too short for its gaps: segment height would be {0}")]
    SegmentHeight(f64),
}

/// Meter tuning. Every field falls back to its default when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    pub maximum: f64,
    pub segment_count: i32,
    pub red_segment_count: i32,
    pub yellow_segment_count: i32,
    pub segment_gap_fraction: f64,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            maximum: DEFAULT_MAXIMUM,
            segment_count: DEFAULT_SEGMENT_COUNT,
            red_segment_count: DEFAULT_RED_SEGMENTS,
            yellow_segment_count: DEFAULT_YELLOW_SEGMENTS,
            segment_gap_fraction: DEFAULT_GAP_FRACTION,
        }
    }
}

impl MeterConfig {
    /// Checks everything that does not depend on the surface size.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.maximum > 0.0) || !self.maximum.is_finite() {
            return Err(ConfigurationError::Maximum(self.maximum));
        }
        if self.segment_count <= 0 {
            return Err(ConfigurationError::SegmentCount(self.segment_count));
        }
        if self.red_segment_count < 0 || self.yellow_segment_count < 0 {
            return Err(ConfigurationError::NegativeBand {
                red: self.red_segment_count,
                yellow: self.yellow_segment_count,
            });
        }
        if self.red_segment_count + self.yellow_segment_count > self.segment_count {
            return Err(ConfigurationError::BandOverflow {
                red: self.red_segment_count,
                yellow: self.yellow_segment_count,
                segments: self.segment_count,
            });
        }
        let gap = self.segment_gap_fraction;
        if !gap.is_finite() || !(0.0..1.0).contains(&gap) {
            return Err(ConfigurationError::GapFraction(gap));
        }
        Ok(())
    }

    pub fn green_segment_count(&self) -> i32 {
        self.segment_count - self.red_segment_count - self.yellow_segment_count
    }
}

/// Colour band a segment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    Green,
    Yellow,
    Red,
}

/// Placement of one segment, relative to the meter origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentRect {
    /// 1-based, left to right
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SegmentRect {
    /// Snap to whole pixels. Edges are rounded independently so that
    /// neighbouring segments never overlap.
    pub fn to_rectangle(&self, origin: Point) -> Rectangle {
        let left = self.x.round() as i32;
        let top = self.y.round() as i32;
        let right = (self.x + self.width).round() as i32;
        let bottom = (self.y + self.height).round() as i32;
        Rectangle::new(
            origin + Point::new(left, top),
            Size::new((right - left).max(1) as u32, (bottom - top).max(1) as u32),
        )
    }
}

/// Geometry computed once from the surface size and the config.
#[derive(Debug, Clone, PartialEq)]
pub struct MeterGeometry {
    pub width: f64,
    pub height: f64,
    pub segment_width: f64,
    pub segment_height: f64,
    pub gap_x: f64,
    pub gap_y: f64,
    segments: Vec<SegmentRect>,
}

impl MeterGeometry {
    pub fn new(width: f64, height: f64, config: &MeterConfig) -> Result<Self, ConfigurationError> {
        if !(width > 0.0) || !width.is_finite() {
            return Err(ConfigurationError::Width(width));
        }
        if !(height > 0.0) || !height.is_finite() {
            return Err(ConfigurationError::Height(height));
        }
        config.validate()?;

        let count = config.segment_count as f64;
        let gap = config.segment_gap_fraction;
        let segment_width = width / (count + (count + 1.0) * gap);
        let gap_x = segment_width * gap;
        let segment_height = height - 2.0 * gap_x;
        if !(segment_height > 0.0) {
            return Err(ConfigurationError::SegmentHeight(segment_height));
        }
        let gap_y = (height - segment_height) / 2.0;

        let segments = (1..=config.segment_count as usize)
            .map(|index| SegmentRect {
                index,
                x: gap_x + (index - 1) as f64 * (segment_width + gap_x),
                y: gap_y,
                width: segment_width,
                height: segment_height,
            })
            .collect();

        Ok(Self { width, height, segment_width, segment_height, gap_x, gap_y, segments })
    }

    pub fn segments(&self) -> &[SegmentRect] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> Option<&SegmentRect> {
        index.checked_sub(1).and_then(|i| self.segments.get(i))
    }
}

/// Per-frame state of one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentState {
    pub index: usize,
    pub band: Band,
    pub on: bool,
}

/// The meter model: validated config plus precomputed geometry.
/// Painting lives in `display::components::meter`.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelMeter {
    config: MeterConfig,
    geometry: MeterGeometry,
}

impl LevelMeter {
    pub fn new(width: f64, height: f64, config: MeterConfig) -> Result<Self, ConfigurationError> {
        let geometry = MeterGeometry::new(width, height, &config)?;
        Ok(Self { config, geometry })
    }

    pub fn config(&self) -> &MeterConfig {
        &self.config
    }

    pub fn geometry(&self) -> &MeterGeometry {
        &self.geometry
    }

    pub fn segment_count(&self) -> usize {
        self.config.segment_count as usize
    }

    /// Number of lit segments for `value`: `ceil(value / maximum * count)`
    /// clamped to the bank. NaN and infinities read as zero.
    pub fn active_segments(&self, value: f64) -> usize {
        let value = if value.is_finite() { value } else { 0.0 };
        let count = self.config.segment_count as f64;
        // multiply first so exact multiples of maximum/count stay exact
        let threshold = (value * count / self.config.maximum).ceil();
        threshold.clamp(0.0, count) as usize
    }

    pub fn band_of(&self, index: usize) -> Band {
        let count = self.config.segment_count as usize;
        let red = self.config.red_segment_count as usize;
        let yellow = self.config.yellow_segment_count as usize;
        if index > count - red {
            Band::Red
        } else if index > count - red - yellow {
            Band::Yellow
        } else {
            Band::Green
        }
    }

    pub fn segment_states(&self, value: f64) -> Vec<SegmentState> {
        let active = self.active_segments(value);
        (1..=self.segment_count())
            .map(|index| SegmentState { index, band: self.band_of(index), on: index <= active })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn default_meter() -> LevelMeter {
        LevelMeter::new(300.0, 40.0, MeterConfig::default()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cfg = MeterConfig::default();
        assert_eq!(cfg.maximum, 4095.0);
        assert_eq!(cfg.segment_count, 15);
        assert_eq!(cfg.red_segment_count, 2);
        assert_eq!(cfg.yellow_segment_count, 3);
        assert_eq!(cfg.segment_gap_fraction, 0.25);
        assert_eq!(cfg.green_segment_count(), 10);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let cfg: MeterConfig = serde_yaml::from_str("segment_count: 20\n").unwrap();
        assert_eq!(cfg.segment_count, 20);
        assert_eq!(cfg.maximum, 4095.0);
        assert_eq!(cfg.red_segment_count, 2);
    }

    #[test]
    fn test_geometry_formulae() {
        let meter = default_meter();
        let g = meter.geometry();
        let expected_w = 300.0 / (15.0 + 16.0 * 0.25);
        assert!((g.segment_width - expected_w).abs() < 1e-9);
        assert!((g.gap_x - expected_w * 0.25).abs() < 1e-9);
        assert!((g.segment_height - (40.0 - 2.0 * g.gap_x)).abs() < 1e-9);
        assert!((g.gap_y - g.gap_x).abs() < 1e-9);
        assert_eq!(g.segments().len(), 15);

        // last segment ends one gap short of the right edge
        let last = g.segment(15).unwrap();
        assert!((last.x + last.width + g.gap_x - 300.0).abs() < 1e-9);
        assert!(g.segment(0).is_none());
        assert!(g.segment(16).is_none());
    }

    #[test]
    fn test_pixel_rectangles_do_not_overlap() {
        let meter = default_meter();
        let rects: Vec<Rectangle> = meter
            .geometry()
            .segments()
            .iter()
            .map(|s| s.to_rectangle(Point::zero()))
            .collect();
        for pair in rects.windows(2) {
            let right_edge = pair[0].top_left.x + pair[0].size.width as i32;
            assert!(right_edge <= pair[1].top_left.x);
        }
    }

    #[test]
    fn test_configuration_errors() {
        let cfg = MeterConfig::default();
        assert_eq!(LevelMeter::new(0.0, 40.0, cfg.clone()), Err(ConfigurationError::Width(0.0)));
        assert_eq!(LevelMeter::new(100.0, -1.0, cfg.clone()), Err(ConfigurationError::Height(-1.0)));

        let bad_max = MeterConfig { maximum: 0.0, ..MeterConfig::default() };
        assert_eq!(LevelMeter::new(100.0, 40.0, bad_max), Err(ConfigurationError::Maximum(0.0)));

        let no_segments = MeterConfig { segment_count: 0, ..MeterConfig::default() };
        assert_eq!(
            LevelMeter::new(100.0, 40.0, no_segments),
            Err(ConfigurationError::SegmentCount(0))
        );

        let overflow = MeterConfig { segment_count: 4, ..MeterConfig::default() };
        assert!(matches!(
            LevelMeter::new(100.0, 40.0, overflow),
            Err(ConfigurationError::BandOverflow { red: 2, yellow: 3, segments: 4 })
        ));

        let gap = MeterConfig { segment_gap_fraction: 1.5, ..MeterConfig::default() };
        assert!(matches!(LevelMeter::new(100.0, 40.0, gap), Err(ConfigurationError::GapFraction(_))));
    }

    #[test]
    fn test_flat_surface_rejected() {
        // gaps eat the whole height
        let err = LevelMeter::new(300.0, 2.0, MeterConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigurationError::SegmentHeight(_)));
    }

    #[test]
    fn test_midscale_example() {
        let meter = default_meter();
        assert_eq!(meter.active_segments(2048.0), 8);
        let on: Vec<usize> = meter
            .segment_states(2048.0)
            .into_iter()
            .filter(|s| s.on)
            .map(|s| s.index)
            .collect();
        assert_eq!(on, (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn test_boundaries() {
        let meter = default_meter();
        assert_eq!(meter.active_segments(0.0), 0);
        assert_eq!(meter.active_segments(4095.0), 15);
        assert_eq!(meter.active_segments(10_000.0), 15);
        assert_eq!(meter.active_segments(f64::INFINITY), 0);
        assert_eq!(meter.active_segments(f64::NAN), 0);
        assert_eq!(meter.active_segments(-50.0), 0);
        // smallest positive reading lights the first segment
        assert_eq!(meter.active_segments(1.0), 1);
        // exact step boundary stays on the lower count
        assert_eq!(meter.active_segments(273.0), 1);
        assert_eq!(meter.active_segments(274.0), 2);
    }

    #[test]
    fn test_band_layout() {
        let meter = default_meter();
        for i in 1..=10 {
            assert_eq!(meter.band_of(i), Band::Green, "segment {i}");
        }
        for i in 11..=13 {
            assert_eq!(meter.band_of(i), Band::Yellow, "segment {i}");
        }
        for i in 14..=15 {
            assert_eq!(meter.band_of(i), Band::Red, "segment {i}");
        }
    }

    #[test]
    fn test_bands_partition_bank() {
        for (count, red, yellow) in [(15, 2, 3), (1, 1, 0), (5, 0, 0), (8, 4, 4), (12, 0, 5)] {
            let cfg = MeterConfig {
                segment_count: count,
                red_segment_count: red,
                yellow_segment_count: yellow,
                ..MeterConfig::default()
            };
            // tall enough that a single wide segment keeps a positive height
            let meter = LevelMeter::new(200.0, 120.0, cfg).unwrap();
            let states = meter.segment_states(0.0);
            let reds = states.iter().filter(|s| s.band == Band::Red).count();
            let yellows = states.iter().filter(|s| s.band == Band::Yellow).count();
            let greens = states.iter().filter(|s| s.band == Band::Green).count();
            assert_eq!(reds, red as usize);
            assert_eq!(yellows, yellow as usize);
            assert_eq!(reds + yellows + greens, count as usize);
        }
    }

    #[test]
    fn test_count_matches_formula_and_is_monotonic() {
        let meter = default_meter();
        let mut rng = StdRng::seed_from_u64(0x5157);
        let mut readings: Vec<u32> = (0..500).map(|_| rng.random_range(0..=4095)).collect();
        readings.sort_unstable();

        let mut last = 0;
        for r in readings {
            // integer ceil of r * 15 / 4095
            let expected = ((r as u64 * 15 + 4094) / 4095) as usize;
            let got = meter.active_segments(r as f64);
            assert_eq!(got, expected, "reading {r}");
            assert!(got >= last);
            last = got;
        }
    }

    #[test]
    fn test_states_idempotent() {
        let meter = default_meter();
        assert_eq!(meter.segment_states(3000.0), meter.segment_states(3000.0));
    }
}
