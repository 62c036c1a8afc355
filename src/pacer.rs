/*
 *  pacer.rs
 *
 *  SWRPanel - remote panel for the ESP32 SWR controller
 *	(c) 2024-26 SWRPanel contributors
 *
 *	Frame pacing: the render loop clock and the flush throttle
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
use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Time between frames at `fps`, zero is treated as one.
pub fn frame_duration(fps: u32) -> Duration {
    Duration::from_micros((1_000_000u32 / fps.max(1)) as u64)
}

/// Throttle for surfaces with a slow or expensive flush.
pub struct Pacer {
    next_deadline: Instant,
    frame: Duration,
}

impl Pacer {
    pub fn new(target_fps: u32) -> Self {
        Self { next_deadline: Instant::now(), frame: frame_duration(target_fps) }
    }

    /// Returns true if we should flush now; if true, it also schedules the next deadline.
    #[inline]
    pub fn should_flush(&mut self) -> bool {
        let now = Instant::now();
        if now >= self.next_deadline {
            self.next_deadline = now + self.frame;
            true
        } else {
            false
        }
    }
}

/// Source of frame ticks for the render loop.
pub trait FrameClock: Send {
    /// Resolves when the next frame is due.
    fn next_frame(&mut self) -> impl Future<Output = ()> + Send;
}

/// Wall clock ticks at a fixed rate. Late ticks are skipped, never bunched.
pub struct IntervalClock {
    interval: Interval,
}

impl IntervalClock {
    pub fn new(fps: u32) -> Self {
        let mut interval = interval(frame_duration(fps));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}

impl FrameClock for IntervalClock {
    async fn next_frame(&mut self) {
        self.interval.tick().await;
    }
}

/// Clock driven by hand, one tick per `ManualTrigger::tick`.
pub struct ManualClock {
    rx: mpsc::UnboundedReceiver<()>,
}

#[derive(Clone)]
pub struct ManualTrigger {
    tx: mpsc::UnboundedSender<()>,
}

pub fn manual_clock() -> (ManualTrigger, ManualClock) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ManualTrigger { tx }, ManualClock { rx })
}

impl ManualTrigger {
    /// Queue one frame. False once the clock is gone.
    pub fn tick(&self) -> bool {
        self.tx.send(()).is_ok()
    }
}

impl FrameClock for ManualClock {
    async fn next_frame(&mut self) {
        if self.rx.recv().await.is_none() {
            // every trigger dropped: no frame will ever come
            std::future::pending::<()>().await;
        }
    }
}
