//! Timeline telemetry for an external display.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clock::PlaybackClock;

/// Play-status icon shown next to the timeline counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayStatus {
    /// Rewind held, speed below zero.
    Reverse,
    /// Rewind not held: live simulation.
    Playing,
    /// Rewind held, speed zero.
    Paused,
    /// Rewind held, speed above zero.
    Forward,
}

impl PlayStatus {
    /// Derive the icon from the clock's rewind hold and speed.
    pub fn from_clock(clock: &PlaybackClock) -> Self {
        if !clock.rewind_held() {
            return Self::Playing;
        }
        match clock.speed().value() {
            v if v < 0 => Self::Reverse,
            0 => Self::Paused,
            _ => Self::Forward,
        }
    }

    /// Index into the status sprite sheet.
    pub fn icon_index(self) -> usize {
        match self {
            Self::Reverse => 0,
            Self::Playing => 1,
            Self::Paused => 2,
            Self::Forward => 3,
        }
    }
}

/// Counters describing the timeline at the end of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTelemetry {
    /// Highest recorded tick.
    pub max_tick: u32,
    /// Current seek tick.
    pub seek_tick: u32,
    /// Bytes held by all channel buffers and change mask logs.
    pub footprint_bytes: usize,
    /// Number of tracked objects.
    pub tracked_objects: usize,
    /// Play-status icon.
    pub status: PlayStatus,
}

impl fmt::Display for HistoryTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Max Index: {}\nSeek Index: {}\nBytes: {}",
            self.max_tick, self.seek_tick, self.footprint_bytes
        )
    }
}
