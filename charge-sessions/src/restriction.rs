//! Matching of meter deltas against tariff element restrictions.
//!
//! Restrictions are compiled per element into a flat list of predicates. An
//! element accepts a delta when every predicate accepts it; the first
//! accepting element in tariff order wins. A delta that no element accepts is
//! priced at zero while its energy still counts towards the session total.

use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveTime, Weekday};
use chrono_tz::Tz;

use crate::meter::LogDelta;
use crate::tariff::{Tariff, TariffRestriction};
use crate::types::{
    electricity::{Ampere, Kw, Kwh},
    time::DateTime,
};

/// Compile the restriction sets of every element in `tariff`, in element
/// order.
pub(crate) fn compile(tariff: &Tariff) -> Vec<Vec<Restriction>> {
    tariff
        .elements
        .iter()
        .map(|element| {
            element
                .restrictions
                .as_ref()
                .map(collect_restrictions)
                .unwrap_or_default()
        })
        .collect()
}

/// The index of the first element whose restrictions all accept `delta`.
pub(crate) fn first_match(
    elements: &[Vec<Restriction>],
    delta: &LogDelta,
    timezone: Tz,
) -> Option<usize> {
    elements
        .iter()
        .position(|restrictions| restrictions.iter().all(|r| r.accepts(delta, timezone)))
}

fn collect_restrictions(restriction: &TariffRestriction) -> Vec<Restriction> {
    let mut collected = Vec::new();

    match (restriction.start_time, restriction.end_time) {
        (Some(start_time), Some(end_time))
            if NaiveTime::from(end_time) < NaiveTime::from(start_time) =>
        {
            collected.push(Restriction::WrappingTime {
                start_time: start_time.into(),
                end_time: end_time.into(),
            });
        }
        (start_time, end_time) => {
            if let Some(start_time) = start_time {
                collected.push(Restriction::StartTime(start_time.into()));
            }

            if let Some(end_time) = end_time {
                collected.push(Restriction::EndTime(end_time.into()));
            }
        }
    }

    if let Some(start_date) = restriction.start_date {
        collected.push(Restriction::StartDate(start_date));
    }

    if let Some(end_date) = restriction.end_date {
        collected.push(Restriction::EndDate(end_date));
    }

    if restriction.min_kwh != Kwh::default() {
        collected.push(Restriction::MinKwh(restriction.min_kwh));
    }

    if restriction.max_kwh != Kwh::default() {
        collected.push(Restriction::MaxKwh(restriction.max_kwh));
    }

    if restriction.min_current != Ampere::default() {
        collected.push(Restriction::MinCurrent(restriction.min_current));
    }

    if restriction.max_current != Ampere::default() {
        collected.push(Restriction::MaxCurrent(restriction.max_current));
    }

    if restriction.min_power != Kw::default() {
        collected.push(Restriction::MinPower(restriction.min_power));
    }

    if restriction.max_power != Kw::default() {
        collected.push(Restriction::MaxPower(restriction.max_power));
    }

    if restriction.min_duration != 0 {
        collected.push(Restriction::MinDuration(Duration::seconds(
            restriction.min_duration as i64,
        )));
    }

    if restriction.max_duration != 0 {
        collected.push(Restriction::MaxDuration(Duration::seconds(
            restriction.max_duration as i64,
        )));
    }

    if !restriction.day_of_week.is_empty() {
        collected.push(Restriction::DayOfWeek(HashSet::from_iter(
            restriction.day_of_week.iter().copied().map(Into::into),
        )));
    }

    collected
}

#[derive(Debug, Clone)]
pub(crate) enum Restriction {
    StartTime(NaiveTime),
    EndTime(NaiveTime),
    WrappingTime {
        start_time: NaiveTime,
        end_time: NaiveTime,
    },
    StartDate(DateTime),
    EndDate(DateTime),
    MinKwh(Kwh),
    MaxKwh(Kwh),
    MinCurrent(Ampere),
    MaxCurrent(Ampere),
    MinPower(Kw),
    MaxPower(Kw),
    MinDuration(Duration),
    MaxDuration(Duration),
    DayOfWeek(HashSet<Weekday>),
}

impl Restriction {
    /// Checks if this restriction accepts `delta`. All bounds are inclusive.
    ///
    /// The kWh tier compares against the post-delta cumulative energy so a
    /// single delta is never split across tiers; current and power compare
    /// against the reading's own instantaneous values. Wall-clock dimensions
    /// are evaluated in `timezone`.
    pub(crate) fn accepts(&self, delta: &LogDelta, timezone: Tz) -> bool {
        let local = delta.timestamp.with_timezone(&timezone);

        match self {
            &Self::WrappingTime {
                start_time,
                end_time,
            } => local.time() >= start_time || local.time() <= end_time,
            &Self::StartTime(start_time) => local.time() >= start_time,
            &Self::EndTime(end_time) => local.time() <= end_time,
            &Self::StartDate(start_date) => delta.timestamp >= start_date,
            &Self::EndDate(end_date) => delta.timestamp <= end_date,
            &Self::MinKwh(min_energy) => delta.total_energy >= min_energy,
            &Self::MaxKwh(max_energy) => delta.total_energy <= max_energy,
            &Self::MinCurrent(min_current) => delta.current >= min_current,
            &Self::MaxCurrent(max_current) => delta.current <= max_current,
            &Self::MinPower(min_power) => delta.power >= min_power,
            &Self::MaxPower(max_power) => delta.power <= max_power,
            &Self::MinDuration(min_duration) => delta.elapsed >= min_duration,
            &Self::MaxDuration(max_duration) => delta.elapsed <= max_duration,
            Self::DayOfWeek(days) => days.contains(&local.weekday()),
        }
    }
}
