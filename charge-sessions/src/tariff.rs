//! The tariff structure a session is priced against.

use serde::{Deserialize, Serialize};

use crate::types::{
    electricity::{Ampere, Kw, Kwh},
    money::{Money, Price, Vat},
    time::{unix_seconds_opt, DateTime, DayOfWeek, TimeOfDay},
};

/// A multi-dimensional tariff: an ordered list of restriction-gated elements
/// plus optional clamp bounds on the session total.
///
/// The element order is significant, the first element whose restrictions
/// accept a meter delta prices that delta.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Tariff {
    /// Identifier of this tariff in the catalog.
    pub id: String,

    /// Currency of this tariff, ISO 4217 Code.
    pub currency: String,

    /// The minimum amount a session under this tariff will cost. An all-zero
    /// price means no floor.
    #[serde(default)]
    pub min_price: Price,

    /// The maximum amount a session under this tariff will cost. An all-zero
    /// price means no ceiling.
    #[serde(default)]
    pub max_price: Price,

    /// Ordered list of tariff elements.
    pub elements: Vec<TariffElement>,

    /// Start time from which this tariff is valid.
    pub start_date_time: Option<DateTime>,

    /// End time until which this tariff is valid.
    pub end_date_time: Option<DateTime>,
}

impl Tariff {
    /// Whether this tariff is valid for a session starting at `start_time`.
    pub fn is_active(&self, start_time: DateTime) -> bool {
        let is_after_start = self
            .start_date_time
            .map(|s| start_time >= s)
            .unwrap_or(true);
        let is_before_end = self.end_date_time.map(|e| start_time < e).unwrap_or(true);

        is_after_start && is_before_end
    }
}

/// A restriction set plus the price components it unlocks.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TariffElement {
    /// List of price components that make up the pricing of this element.
    pub price_components: Vec<PriceComponent>,

    /// Restrictions gating this element, absent means always applicable.
    pub restrictions: Option<TariffRestriction>,
}

/// Component of a tariff element price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PriceComponent {
    /// Type of tariff dimension this component prices.
    #[serde(rename = "type")]
    pub component_type: ComponentType,

    /// Price per unit (excluding VAT) for this dimension, in minor currency
    /// units.
    pub price: Money,

    /// VAT percentage applied on top of this component's cost.
    pub vat: Vat,

    /// Minimum billable block for this dimension. Carried for catalog
    /// compatibility, costing does not consume it (see [`crate::lint`]).
    #[serde(default)]
    pub step_size: u64,
}

/// Type of tariff component.
#[derive(Debug, Copy, PartialEq, Eq, Clone, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentType {
    /// Priced per kWh delivered.
    Energy,
    /// Flat fee, charged once when the element is hit.
    Flat,
    /// Priced per whole minute between stop and end of the session.
    ParkingTime,
    /// Priced per whole minute of the active charging interval.
    Time,
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Energy => "ENERGY",
            Self::Flat => "FLAT",
            Self::ParkingTime => "PARKING_TIME",
            Self::Time => "TIME",
        };

        f.write_str(display)
    }
}

/// Indicates when a tariff element applies.
///
/// Every populated dimension must accept a meter delta for the element to
/// match. All bounds are inclusive; a numeric zero bound means the dimension
/// is unbounded on that side.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TariffRestriction {
    /// Start time of day, for example 13:30, valid from this time of the day.
    /// A window that ends before it starts wraps around midnight.
    pub start_time: Option<TimeOfDay>,

    /// End time of day, valid until this time of the day.
    pub end_time: Option<TimeOfDay>,

    /// Valid from this instant, unix seconds, zero means unbounded.
    #[serde(default, with = "unix_seconds_opt")]
    pub start_date: Option<DateTime>,

    /// Valid until this instant, unix seconds, zero means unbounded.
    #[serde(default, with = "unix_seconds_opt")]
    pub end_date: Option<DateTime>,

    /// Valid from this amount of cumulative session energy.
    #[serde(default)]
    pub min_kwh: Kwh,

    /// Valid until this amount of cumulative session energy.
    #[serde(default)]
    pub max_kwh: Kwh,

    /// The minimum instantaneous current in A.
    #[serde(default)]
    pub min_current: Ampere,

    /// The maximum instantaneous current in A.
    #[serde(default)]
    pub max_current: Ampere,

    /// Minimum instantaneous power in kW.
    #[serde(default)]
    pub min_power: Kw,

    /// Maximum instantaneous power in kW.
    #[serde(default)]
    pub max_power: Kw,

    /// Valid from this elapsed session duration, in seconds.
    #[serde(default)]
    pub min_duration: u64,

    /// Valid until this elapsed session duration, in seconds.
    #[serde(default)]
    pub max_duration: u64,

    /// Which day(s) of the week this element is valid, empty means every day.
    #[serde(default)]
    pub day_of_week: Vec<DayOfWeek>,
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{Tariff, TariffRestriction};

    #[test]
    fn validity_window_bounds_the_tariff() {
        let tariff: Tariff = serde_json::from_str(
            r#"{
                "id": "T-window",
                "currency": "EUR",
                "elements": [],
                "start_date_time": "2024-01-01T00:00:00Z",
                "end_date_time": "2025-01-01T00:00:00Z"
            }"#,
        )
        .unwrap();

        assert!(tariff.is_active(Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap()));
        assert!(!tariff.is_active(Utc.with_ymd_and_hms(2023, 6, 3, 12, 0, 0).unwrap()));
        assert!(!tariff.is_active(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn zero_date_bounds_mean_unbounded() {
        let restriction: TariffRestriction =
            serde_json::from_str(r#"{ "start_date": 0, "end_date": 1717416000 }"#).unwrap();

        assert_eq!(restriction.start_date, None);
        assert_eq!(
            restriction.end_date,
            Some(Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap())
        );
    }
}
