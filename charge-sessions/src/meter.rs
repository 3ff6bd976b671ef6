//! Validation and deltaing of the ordered meter log stream.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::types::{
    electricity::{Ampere, Kw, Kwh, Volt},
    time::DateTime,
};
use crate::{Error, Result};

/// One telemetry reading reported during an active session.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MeterLog {
    /// Cumulative meter reading, monotonically non-decreasing.
    pub meter_value: Kwh,

    /// Wall-clock time of the reading, monotonically non-decreasing.
    pub timestamp: DateTime,

    /// State of charge of the vehicle in percent.
    #[serde(default)]
    pub percent: u8,

    /// Instantaneous power at the time of the reading.
    #[serde(default)]
    pub power: Kw,

    /// Instantaneous current at the time of the reading.
    #[serde(default)]
    pub current: Ampere,

    /// Instantaneous voltage at the time of the reading.
    #[serde(default)]
    pub voltage: Volt,
}

/// The deltaed view of one accepted meter log, the unit of work for
/// restriction matching and billing.
#[derive(Clone, Debug)]
pub struct LogDelta {
    /// Wall-clock time of the reading.
    pub timestamp: DateTime,

    /// Energy delivered since the previous accepted log.
    pub delta_energy: Kwh,

    /// Time passed since the previous accepted log.
    pub delta_duration: Duration,

    /// Elapsed session duration at the time of the reading.
    pub elapsed: Duration,

    /// Cumulative session energy including this delta.
    pub total_energy: Kwh,

    /// Instantaneous power of the reading.
    pub power: Kw,

    /// Instantaneous current of the reading.
    pub current: Ampere,
}

/// Validates and deltas the meter log stream of one session.
///
/// Each incoming log is validated against the previous accepted one (or
/// against the session start for the first log). A rejected log leaves the
/// processor untouched, a later valid log still deltas from the last accepted
/// reading.
#[derive(Debug)]
pub struct MeterLogProcessor {
    meter_start: Kwh,
    started_at: DateTime,
    last_meter: Kwh,
    last_timestamp: DateTime,
}

impl MeterLogProcessor {
    /// Start a processor at the session's start meter value and timestamp.
    pub fn new(meter_start: Kwh, started_at: DateTime) -> Self {
        Self {
            meter_start,
            started_at,
            last_meter: meter_start,
            last_timestamp: started_at,
        }
    }

    /// Validate `log` and produce its delta, committing the reading as the new
    /// reference point. Fails with [`Error::OutOfOrderLog`] when the meter
    /// value or timestamp regresses, without committing anything.
    pub fn ingest(&mut self, log: &MeterLog) -> Result<LogDelta> {
        if log.meter_value < self.last_meter {
            return Err(Error::OutOfOrderLog {
                reason: "meter value regressed",
            });
        }

        if log.timestamp < self.last_timestamp {
            return Err(Error::OutOfOrderLog {
                reason: "timestamp regressed",
            });
        }

        let delta = LogDelta {
            timestamp: log.timestamp,
            delta_energy: log.meter_value.saturating_sub(self.last_meter),
            delta_duration: log.timestamp.signed_duration_since(self.last_timestamp),
            elapsed: log.timestamp.signed_duration_since(self.started_at),
            total_energy: log.meter_value.saturating_sub(self.meter_start),
            power: log.power,
            current: log.current,
        };

        self.last_meter = log.meter_value;
        self.last_timestamp = log.timestamp;

        Ok(delta)
    }

    /// The last accepted cumulative meter value.
    pub fn last_meter(&self) -> Kwh {
        self.last_meter
    }

    /// The wall-clock time of the last accepted reading.
    pub fn last_timestamp(&self) -> DateTime {
        self.last_timestamp
    }
}
