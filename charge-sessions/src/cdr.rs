//! The charge detail record: the finalized itemized invoice for one session.

use serde::{Deserialize, Serialize};

use crate::session::SessionId;
use crate::tariff::ComponentType;
use crate::types::{electricity::Kwh, money::Price, time::DateTime};

/// The finalized, itemized invoice for one charging session.
///
/// A CDR is produced exactly once, when the session ends, and is never mutated
/// afterwards.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Cdr {
    /// The session this record settles.
    pub session_id: SessionId,

    /// Currency of all monetary amounts, ISO 4217 Code.
    pub currency: String,

    /// Start of the charging session.
    pub start_date_time: DateTime,

    /// End of the session, including any parking after the charge stopped.
    pub end_date_time: DateTime,

    /// Total energy delivered, including energy priced by no tariff element.
    pub total_energy: Kwh,

    /// The tariff elements that were actually hit, in tariff order.
    pub elements: Vec<CdrElement>,

    /// Total session cost. Clamped to the tariff's `min_price`/`max_price`
    /// when those are set; the per-element breakdown is never clamped.
    pub total_cost: Price,
}

/// One tariff element that priced part of the session.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CdrElement {
    /// Index of this element in the tariff's element list.
    pub element_index: usize,

    /// The priced components of this element, in component order.
    pub components: Vec<CdrComponent>,
}

/// One priced line item.
///
/// The price always reflects the raw consumption-derived cost, even when the
/// session total was clamped.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CdrComponent {
    /// The dimension this line prices.
    #[serde(rename = "type")]
    pub component_type: ComponentType,

    /// The billed quantity: kWh for energy, seconds for (parking) time, `1`
    /// for a flat fee.
    pub quantity: rust_decimal::Decimal,

    /// The cost of this line, excluding and including VAT.
    pub price: Price,
}
