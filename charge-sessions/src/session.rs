//! Session and reservation domain entities.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::billing::CdrBuilder;
use crate::cdr::Cdr;
use crate::meter::{MeterLog, MeterLogProcessor};
use crate::types::{electricity::Kwh, time::DateTime};

/// Identifier of a charging session, assigned monotonically by the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    /// Wrap a raw session id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a reservation, assigned monotonically by the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ReservationId(u64);

impl ReservationId {
    /// Wrap a raw reservation id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl Display for ReservationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The account owning a reservation or session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Wrap a raw account identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a charging location (EVSE).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct EvseId(String);

impl EvseId {
    /// Wrap a raw EVSE identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl Display for EvseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The lifecycle of a charging session.
///
/// `Requested` sessions wait for the charge point to acknowledge the start,
/// `StopRequested` sessions wait for it to acknowledge the stop. `Ended` is
/// terminal: the CDR is computed and the ledger settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum SessionState {
    /// Start requested, waiting for the charge point.
    Requested,
    /// Charging, accepting meter logs.
    Active,
    /// Stop requested by the owner or by a breached limit.
    StopRequested,
    /// Charging stopped, final meter value recorded, awaiting settlement.
    Stopped,
    /// Settled. The session is immutable from here on.
    Ended,
}

impl SessionState {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "Requested",
            Self::Active => "Active",
            Self::StopRequested => "StopRequested",
            Self::Stopped => "Stopped",
            Self::Ended => "Ended",
        }
    }
}

impl Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The lifecycle of a reservation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum ReservationState {
    /// Requested, waiting for the charge point to confirm.
    Requested,
    /// Confirmed, the connector is held for the owning account.
    Confirmed,
    /// Released, terminal unless the reservation was already consumed.
    Cancelled,
}

impl ReservationState {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "Requested",
            Self::Confirmed => "Confirmed",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// A time-boxed hold on a connector prior to session start.
#[derive(Clone, Debug)]
pub struct Reservation {
    /// Unique reservation id.
    pub id: ReservationId,
    /// The charging location the connector belongs to.
    pub evse_id: EvseId,
    /// The reserved connector.
    pub connector_id: u32,
    /// The account holding the reservation.
    pub account: AccountId,
    /// Expiry instant, checked lazily by the next relevant operation.
    pub time_expire: DateTime,
    /// Current state.
    pub state: ReservationState,
    /// The session that consumed this reservation, if any.
    pub consumed_by: Option<SessionId>,
}

impl Reservation {
    /// Whether this reservation currently holds `connector_id` at `evse_id`
    /// for `account`.
    pub fn holds_for(&self, evse_id: &EvseId, connector_id: u32, account: &AccountId) -> bool {
        self.state == ReservationState::Confirmed
            && self.consumed_by.is_none()
            && self.evse_id == *evse_id
            && self.connector_id == connector_id
            && self.account == *account
    }

    /// Whether the expiry instant has passed at `now`.
    pub fn is_expired(&self, now: DateTime) -> bool {
        now > self.time_expire
    }
}

/// One charging session and, while it is active, its billing machinery.
#[derive(Debug)]
pub struct Session {
    /// Unique session id.
    pub id: SessionId,
    /// The charging location.
    pub evse_id: EvseId,
    /// The connector delivering the charge.
    pub connector_id: u32,
    /// The account paying for the session.
    pub owner: AccountId,
    /// The reservation this session consumed, if any.
    pub reservation: Option<ReservationId>,
    /// Current state.
    pub state: SessionState,
    /// Id of the tariff snapshotted at session start.
    pub tariff_id: String,
    /// Meter value at the start of the charge.
    pub meter_start: Kwh,
    /// Meter value reported by the stop acknowledgement.
    pub meter_stop: Option<Kwh>,
    /// When the charge became active.
    pub started_at: Option<DateTime>,
    /// When the charge stopped.
    pub stopped_at: Option<DateTime>,
    /// When the session was settled.
    pub ended_at: Option<DateTime>,
    /// Every accepted meter log, in arrival order.
    pub logs: Vec<MeterLog>,
    /// The last message reported by the charge point, e.g. a failure reason.
    pub message: Option<String>,

    pub(crate) processor: Option<MeterLogProcessor>,
    pub(crate) billing: Option<CdrBuilder>,
    pub(crate) cdr: Option<Cdr>,
}

impl Session {
    pub(crate) fn new(
        id: SessionId,
        evse_id: EvseId,
        connector_id: u32,
        owner: AccountId,
        reservation: Option<ReservationId>,
        tariff_id: String,
    ) -> Self {
        Self {
            id,
            evse_id,
            connector_id,
            owner,
            reservation,
            state: SessionState::Requested,
            tariff_id,
            meter_start: Kwh::zero(),
            meter_stop: None,
            started_at: None,
            stopped_at: None,
            ended_at: None,
            logs: Vec::new(),
            message: None,
            processor: None,
            billing: None,
            cdr: None,
        }
    }

    /// The finalized record, available once the session has ended.
    pub fn cdr(&self) -> Option<&Cdr> {
        self.cdr.as_ref()
    }
}
