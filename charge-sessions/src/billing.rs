//! Accumulation of matched meter deltas into priced line items.

use std::collections::BTreeMap;

use chrono::Duration;
use chrono_tz::Tz;

use crate::cdr::{Cdr, CdrComponent, CdrElement};
use crate::meter::LogDelta;
use crate::restriction::{self, Restriction};
use crate::session::SessionId;
use crate::tariff::{ComponentType, Tariff};
use crate::types::{
    electricity::{Ampere, Kw, Kwh},
    money::Price,
    time::DateTime,
};

/// Builds the charge detail record of one session by accumulating matched
/// meter deltas per `(element, component)`.
///
/// The tariff is snapshotted at construction and stays immutable for the
/// session's lifetime. Costing happens in a single finalization pass:
/// components are priced with floor arithmetic, VAT is applied per component,
/// and the session total is clamped to the tariff bounds without touching the
/// per-component breakdown.
#[derive(Debug)]
pub struct CdrBuilder {
    tariff: Tariff,
    compiled: Vec<Vec<Restriction>>,
    timezone: Tz,
    started_at: DateTime,
    total_energy: Kwh,
    usage: BTreeMap<usize, ElementUsage>,
}

#[derive(Debug)]
struct ElementUsage {
    energy: Kwh,
    charging: Duration,
}

impl ElementUsage {
    fn new() -> Self {
        Self {
            energy: Kwh::zero(),
            charging: Duration::zero(),
        }
    }
}

impl CdrBuilder {
    /// Snapshot `tariff` and start accumulating for a session that became
    /// active at `started_at`.
    pub fn new(tariff: Tariff, timezone: Tz, started_at: DateTime) -> Self {
        let compiled = restriction::compile(&tariff);

        Self {
            tariff,
            compiled,
            timezone,
            started_at,
            total_energy: Kwh::zero(),
            usage: BTreeMap::new(),
        }
    }

    /// Accumulate one accepted meter delta.
    ///
    /// The delta's energy always counts towards the session total. When no
    /// element's restrictions accept the delta it contributes no cost, that
    /// pass-through is deliberate (see the tariff linter for catching the
    /// configurations that cause it).
    pub fn record(&mut self, delta: &LogDelta) {
        self.total_energy = self.total_energy.saturating_add(delta.delta_energy);

        let Some(index) = restriction::first_match(&self.compiled, delta, self.timezone) else {
            return;
        };

        let usage = self.usage.entry(index).or_insert_with(ElementUsage::new);
        usage.energy = usage.energy.saturating_add(delta.delta_energy);
        usage.charging = usage.charging + delta.delta_duration;
    }

    /// The projected session cost so far, clamped like the final total.
    pub fn running_total(&self) -> Price {
        let (_, total) = self.lines(None);
        self.clamp(total)
    }

    /// Total energy accumulated so far, matched or not.
    pub fn total_energy(&self) -> Kwh {
        self.total_energy
    }

    /// Produce the final record. Parking time is `end_timestamp −
    /// stop_timestamp`, attributed through the matcher evaluated at the stop
    /// instant with zero instantaneous current and power.
    pub fn finalize(
        &self,
        session_id: SessionId,
        stop_timestamp: DateTime,
        end_timestamp: DateTime,
    ) -> Cdr {
        let parked = end_timestamp.signed_duration_since(stop_timestamp);

        let parking = (parked > Duration::zero())
            .then(|| {
                let at_stop = LogDelta {
                    timestamp: stop_timestamp,
                    delta_energy: Kwh::zero(),
                    delta_duration: parked,
                    elapsed: stop_timestamp.signed_duration_since(self.started_at),
                    total_energy: self.total_energy,
                    power: Kw::default(),
                    current: Ampere::default(),
                };

                restriction::first_match(&self.compiled, &at_stop, self.timezone)
                    .map(|index| (index, parked))
            })
            .flatten();

        let (elements, total) = self.lines(parking);

        Cdr {
            session_id,
            currency: self.tariff.currency.clone(),
            start_date_time: self.started_at,
            end_date_time: end_timestamp,
            total_energy: self.total_energy,
            total_cost: self.clamp(total),
            elements,
        }
    }

    /// Price every accumulated `(element, component)` pair and sum the totals.
    /// VAT is applied per component; the total is the sum of already-VAT'd
    /// values and VAT is never reapplied to it.
    fn lines(&self, parking: Option<(usize, Duration)>) -> (Vec<CdrElement>, Price) {
        let mut indices: Vec<usize> = self.usage.keys().copied().collect();
        if let Some((index, _)) = parking {
            if !self.usage.contains_key(&index) {
                indices.push(index);
                indices.sort_unstable();
            }
        }

        let mut elements = Vec::new();
        let mut total = Price::zero();

        for index in indices {
            let energy = self
                .usage
                .get(&index)
                .map(|usage| usage.energy)
                .unwrap_or_else(Kwh::zero);
            let charging = self
                .usage
                .get(&index)
                .map(|usage| usage.charging)
                .unwrap_or_else(Duration::zero);
            let parked = match parking {
                Some((parking_index, duration)) if parking_index == index => duration,
                _ => Duration::zero(),
            };

            let mut components = Vec::new();

            for component in &self.tariff.elements[index].price_components {
                let quantity_cost = match component.component_type {
                    ComponentType::Energy if energy != Kwh::zero() => Some((
                        rust_decimal::Decimal::from(energy),
                        component.price.energy_cost(energy),
                    )),
                    ComponentType::Time if charging > Duration::zero() => {
                        let seconds = charging.num_seconds();
                        Some((seconds.into(), component.price.minutes_cost(seconds / 60)))
                    }
                    ComponentType::ParkingTime if parked > Duration::zero() => {
                        let seconds = parked.num_seconds();
                        Some((seconds.into(), component.price.minutes_cost(seconds / 60)))
                    }
                    ComponentType::Flat => Some((1.into(), component.price)),
                    _ => None,
                };

                let Some((quantity, excl_vat)) = quantity_cost else {
                    continue;
                };

                let price = Price {
                    excl_vat,
                    incl_vat: component.vat.apply(excl_vat),
                };

                total += price;
                components.push(CdrComponent {
                    component_type: component.component_type,
                    quantity,
                    price,
                });
            }

            if !components.is_empty() {
                elements.push(CdrElement {
                    element_index: index,
                    components,
                });
            }
        }

        (elements, total)
    }

    /// Clamp `total` to the tariff's price bounds. The bounds replace the
    /// total wholesale so the excluding/including pair stays consistent.
    fn clamp(&self, total: Price) -> Price {
        let min = self.tariff.min_price;
        if !min.excl_vat.is_zero() && total.excl_vat < min.excl_vat {
            return min;
        }

        let max = self.tariff.max_price;
        if !max.excl_vat.is_zero() && total.excl_vat > max.excl_vat {
            return max;
        }

        total
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use chrono_tz::Tz;
    use rust_decimal_macros::dec;

    use super::CdrBuilder;
    use crate::meter::LogDelta;
    use crate::session::SessionId;
    use crate::tariff::Tariff;
    use crate::types::electricity::Kwh;
    use crate::types::time::DateTime;

    fn start() -> DateTime {
        Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap()
    }

    fn time_tariff() -> Tariff {
        serde_json::from_str(
            r#"{
                "id": "T-1",
                "currency": "EUR",
                "elements": [{
                    "price_components": [
                        { "type": "TIME", "price": 10, "vat": 0, "step_size": 0 }
                    ]
                }],
                "start_date_time": null,
                "end_date_time": null
            }"#,
        )
        .unwrap()
    }

    fn delta(minute: u32, seconds_len: i64, energy: rust_decimal::Decimal) -> LogDelta {
        LogDelta {
            timestamp: Utc.with_ymd_and_hms(2024, 6, 3, 12, minute, 30).unwrap(),
            delta_energy: energy.into(),
            delta_duration: Duration::seconds(seconds_len),
            elapsed: Duration::minutes(minute.into()),
            total_energy: energy.into(),
            power: dec!(11).into(),
            current: dec!(16).into(),
        }
    }

    #[test]
    fn minutes_floor_over_total_not_per_delta() {
        let mut builder = CdrBuilder::new(time_tariff(), Tz::UTC, start());

        // Three deltas of 50 seconds each: per-delta flooring would bill zero
        // minutes, flooring over the accumulated 150 seconds bills two.
        for minute in 1..=3 {
            builder.record(&delta(minute, 50, dec!(0.1)));
        }

        let end = Utc.with_ymd_and_hms(2024, 6, 3, 12, 3, 0).unwrap();
        let cdr = builder.finalize(SessionId::new(1), end, end);

        let line = &cdr.elements[0].components[0];
        assert_eq!(line.quantity, dec!(150));
        assert_eq!(line.price.excl_vat, 20.into());
        assert_eq!(cdr.total_cost.excl_vat, 20.into());
    }

    #[test]
    fn unmatched_energy_counts_without_cost() {
        let tariff: Tariff = serde_json::from_str(
            r#"{
                "id": "T-2",
                "currency": "EUR",
                "elements": [{
                    "price_components": [
                        { "type": "ENERGY", "price": 100, "vat": 0, "step_size": 0 }
                    ],
                    "restrictions": { "min_kwh": 50 }
                }],
                "start_date_time": null,
                "end_date_time": null
            }"#,
        )
        .unwrap();

        let mut builder = CdrBuilder::new(tariff, Tz::UTC, start());
        builder.record(&delta(1, 60, dec!(0.2)));

        let end = Utc.with_ymd_and_hms(2024, 6, 3, 12, 1, 0).unwrap();
        let cdr = builder.finalize(SessionId::new(1), end, end);

        assert_eq!(cdr.total_energy, Kwh::from(dec!(0.2)));
        assert!(cdr.elements.is_empty());
        assert!(cdr.total_cost.excl_vat.is_zero());
    }

    #[test]
    fn parking_can_hit_an_element_no_charging_delta_matched() {
        // The only delta matches nothing (energy tier starts at 50 kWh), the
        // parking interval still matches the second, unrestricted element.
        let tariff: Tariff = serde_json::from_str(
            r#"{
                "id": "T-3",
                "currency": "EUR",
                "elements": [
                    {
                        "price_components": [{ "type": "ENERGY", "price": 100, "vat": 0 }],
                        "restrictions": { "min_kwh": 50 }
                    },
                    {
                        "price_components": [{ "type": "PARKING_TIME", "price": 10, "vat": 0 }],
                        "restrictions": { "min_duration": 120 }
                    }
                ],
                "start_date_time": null,
                "end_date_time": null
            }"#,
        )
        .unwrap();

        let mut builder = CdrBuilder::new(tariff, Tz::UTC, start());
        builder.record(&delta(1, 60, dec!(0.2)));

        let stop = Utc.with_ymd_and_hms(2024, 6, 3, 12, 5, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 6, 3, 12, 15, 0).unwrap();
        let cdr = builder.finalize(SessionId::new(1), stop, end);

        assert_eq!(cdr.elements.len(), 1);
        assert_eq!(cdr.elements[0].element_index, 1);
        assert_eq!(cdr.elements[0].components[0].quantity, dec!(600));
        assert_eq!(cdr.total_cost.excl_vat, 100.into());
    }
}
