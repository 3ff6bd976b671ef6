//! The reservation/session state machines and their collaborator ports.
//!
//! The registry owns every reservation and session and orchestrates the
//! billing pipeline. Cross-module concerns are injected as ports: the
//! connector inventory and tariff catalog are read-only for a session's
//! lifetime, the ledger is mutated exactly once at session end. Every public
//! operation is synchronous and all-or-nothing: it either fully applies its
//! transition or is rejected with no side effect.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, info};

use crate::billing::CdrBuilder;
use crate::cdr::Cdr;
use crate::meter::{MeterLog, MeterLogProcessor};
use crate::session::{
    AccountId, EvseId, Reservation, ReservationId, ReservationState, Session, SessionId,
    SessionState,
};
use crate::types::{electricity::Kwh, money::Money, time::DateTime};
use crate::{Error, Result};

/// The party invoking a registry operation.
///
/// Owners are EV-driver accounts acting on their own reservations and
/// sessions; the oracle is the trusted charge-point proxy reporting outcomes
/// from the field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Actor {
    /// An account, subject to permission checks and ownership.
    Owner(AccountId),
    /// The charge-point proxy / settlement oracle.
    Oracle,
}

impl Actor {
    fn role(&self) -> Role {
        match self {
            Self::Owner(_) => Role::Owner,
            Self::Oracle => Role::Oracle,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Role {
    Owner,
    Oracle,
}

/// The session messages gated by the transition table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Message {
    StartResponse,
    Update,
    StopRequest,
    StopResponse,
    End,
}

/// The session transition table: every `(state, role, message)` combination
/// not listed here is rejected.
fn permits(state: SessionState, role: Role, message: Message) -> bool {
    use SessionState::{Active, Requested, StopRequested, Stopped};

    matches!(
        (state, role, message),
        (Requested, Role::Oracle, Message::StartResponse)
            | (Active, Role::Oracle, Message::Update)
            | (Active, Role::Owner, Message::StopRequest)
            | (StopRequested, Role::Owner, Message::StopRequest)
            | (StopRequested, Role::Oracle, Message::StopResponse)
            | (Stopped, Role::Oracle, Message::End)
    )
}

/// Access levels consumed by the permission port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessLevel {
    /// Reading sessions and records.
    Read,
    /// Creating and mutating reservations and sessions.
    Write,
}

/// Status of a connector as reported by the inventory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectorStatus {
    /// Free for reservations and sessions.
    Available,
    /// Physically in use.
    Occupied,
    /// Out of service.
    Unavailable,
}

/// The inventory's view of one connector.
#[derive(Clone, Debug)]
pub struct ConnectorInfo {
    /// Current status.
    pub status: ConnectorStatus,
    /// The tariff assigned to this connector, if any.
    pub tariff_id: Option<String>,
}

/// Read-only lookup into the connector/location inventory.
pub trait ConnectorPort: Send + Sync {
    /// The status and assigned tariff of a connector, `None` if it does not
    /// exist.
    fn lookup(&self, evse_id: &EvseId, connector_id: u32) -> Option<ConnectorInfo>;
}

/// Read-only lookup into the tariff catalog.
pub trait TariffPort: Send + Sync {
    /// Resolve a tariff by id.
    fn tariff(&self, tariff_id: &str) -> Option<crate::tariff::Tariff>;
}

/// Marker for a rejected ledger debit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InsufficientFunds;

/// The account ledger. Read during a session for limit projection, debited
/// exactly once at session end.
pub trait LedgerPort: Send + Sync {
    /// Funds currently available to `account`.
    fn available(&self, account: &AccountId) -> Money;

    /// Atomically debit `amount` from `account`.
    fn debit(&self, account: &AccountId, amount: Money) -> std::result::Result<(), InsufficientFunds>;
}

/// The permission oracle for owner-initiated operations.
pub trait AccessPort: Send + Sync {
    /// Whether `caller` may act on `object` at `level`.
    fn allowed(&self, caller: &AccountId, object: &str, level: AccessLevel) -> bool;
}

const ACCESS_OBJECT: &str = "Sessions";

/// Emitted towards the charge point when a reservation is requested.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReservationRequest {
    /// The new reservation.
    pub id: ReservationId,
    /// The account holding it.
    pub account: AccountId,
    /// When the hold lapses, checked lazily.
    pub time_expire: DateTime,
}

/// Emitted towards the charge point when a session start is requested.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionStartRequest {
    /// The new session.
    pub uid: SessionId,
    /// The charging location.
    pub evse_id: EvseId,
    /// The connector to energize.
    pub connector_id: u32,
    /// The account paying for the session.
    pub account: AccountId,
}

/// The recorded effect of one accepted meter log.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionUpdate {
    /// The updated session.
    pub session_id: SessionId,
    /// Cumulative meter value of the accepted reading.
    pub meter_value: Kwh,
    /// Vehicle state of charge in percent.
    pub percent: u8,
}

/// Emitted towards the charge point when a stop is requested, either by the
/// owner or spontaneously by a breached limit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionStopRequest {
    /// The session to stop.
    pub session_id: SessionId,
}

/// The result of ingesting one meter log: the update itself plus, when a
/// limit was breached, the spontaneous stop request.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionUpdateOutcome {
    /// The recorded update.
    pub update: SessionUpdate,
    /// Present when this update pushed the session into `StopRequested`.
    pub stop_request: Option<SessionStopRequest>,
}

/// Tunables of the registry.
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    /// Timezone for evaluating local-time tariff restrictions.
    pub timezone: Tz,
    /// How long a reservation holds its connector.
    pub reservation_ttl: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            reservation_ttl: Duration::minutes(30),
        }
    }
}

/// Owns the reservation/session state machines and drives billing.
pub struct SessionRegistry {
    config: RegistryConfig,
    connectors: Arc<dyn ConnectorPort>,
    tariffs: Arc<dyn TariffPort>,
    ledger: Arc<dyn LedgerPort>,
    access: Arc<dyn AccessPort>,
    sessions: HashMap<SessionId, Session>,
    reservations: HashMap<ReservationId, Reservation>,
    next_session: u64,
    next_reservation: u64,
}

impl SessionRegistry {
    /// Create a registry wired to its collaborator ports.
    pub fn new(
        config: RegistryConfig,
        connectors: Arc<dyn ConnectorPort>,
        tariffs: Arc<dyn TariffPort>,
        ledger: Arc<dyn LedgerPort>,
        access: Arc<dyn AccessPort>,
    ) -> Self {
        Self {
            config,
            connectors,
            tariffs,
            ledger,
            access,
            sessions: HashMap::new(),
            reservations: HashMap::new(),
            next_session: 0,
            next_reservation: 0,
        }
    }

    /// Request a hold on a connector. Fails `NotFound` for an unknown
    /// connector and `InvalidState` when the connector is not free.
    pub fn create_reservation_request(
        &mut self,
        actor: &Actor,
        evse_id: &EvseId,
        connector_id: u32,
    ) -> Result<ReservationRequest> {
        let account = self.require_owner(actor, "createReservationRequest", AccessLevel::Write)?;

        let info = self.lookup_connector(evse_id, connector_id)?;
        let now = chrono::Utc::now();

        if info.status != ConnectorStatus::Available
            || !self.connector_is_free(evse_id, connector_id, now)
        {
            return Err(Error::InvalidState {
                operation: "createReservationRequest",
                state: "ConnectorUnavailable",
            });
        }

        self.next_reservation += 1;
        let id = ReservationId::new(self.next_reservation);
        let time_expire = now + self.config.reservation_ttl;

        self.reservations.insert(
            id,
            Reservation {
                id,
                evse_id: evse_id.clone(),
                connector_id,
                account: account.clone(),
                time_expire,
                state: ReservationState::Requested,
                consumed_by: None,
            },
        );

        info!(reservation = %id, account = %account, "reservation requested");

        Ok(ReservationRequest {
            id,
            account,
            time_expire,
        })
    }

    /// Oracle acknowledgement of a reservation: confirm the hold or release
    /// it.
    pub fn create_reservation_response(
        &mut self,
        actor: &Actor,
        id: ReservationId,
        status: bool,
    ) -> Result<ReservationState> {
        self.require_oracle(actor, "createReservationResponse")?;

        let reservation = self.reservation_mut(id)?;
        if reservation.state != ReservationState::Requested {
            return Err(Error::InvalidState {
                operation: "createReservationResponse",
                state: reservation.state.as_str(),
            });
        }

        reservation.state = if status {
            ReservationState::Confirmed
        } else {
            ReservationState::Cancelled
        };

        info!(reservation = %id, status, "reservation acknowledged");

        Ok(reservation.state)
    }

    /// Owner-initiated release of a reservation.
    pub fn cancel_reservation_request(&mut self, actor: &Actor, id: ReservationId) -> Result<()> {
        let account = self.require_owner(actor, "cancelReservationRequest", AccessLevel::Write)?;

        let reservation = self.reservation_mut(id)?;
        if reservation.account != account {
            return Err(Error::Unauthorized {
                operation: "cancelReservationRequest",
            });
        }

        if reservation.state == ReservationState::Cancelled || reservation.consumed_by.is_some() {
            return Err(Error::InvalidState {
                operation: "cancelReservationRequest",
                state: reservation.state.as_str(),
            });
        }

        reservation.state = ReservationState::Cancelled;
        info!(reservation = %id, "reservation cancelled by owner");

        Ok(())
    }

    /// Oracle-initiated release, or acknowledgement of an owner cancel. A
    /// `false` status records that the charge point did not release the hold;
    /// the reservation state is left as is.
    pub fn cancel_reservation_response(
        &mut self,
        actor: &Actor,
        id: ReservationId,
        status: bool,
    ) -> Result<ReservationState> {
        self.require_oracle(actor, "cancelReservationResponse")?;

        let reservation = self.reservation_mut(id)?;

        if status && reservation.consumed_by.is_none() {
            reservation.state = ReservationState::Cancelled;
        }

        Ok(reservation.state)
    }

    /// Request a new charging session on a connector, optionally consuming a
    /// confirmed reservation.
    pub fn start_session_request(
        &mut self,
        actor: &Actor,
        evse_id: &EvseId,
        connector_id: u32,
        reservation: Option<ReservationId>,
    ) -> Result<SessionStartRequest> {
        let account = self.require_owner(actor, "startSessionRequest", AccessLevel::Write)?;

        let info = self.lookup_connector(evse_id, connector_id)?;
        let tariff_id = info.tariff_id.ok_or_else(|| Error::NotFound {
            entity: "tariff",
            id: format!("{evse_id}/{connector_id}"),
        })?;

        let now = chrono::Utc::now();

        if self.live_session_on(evse_id, connector_id).is_some()
            || self.get_session_by_auth(&account).is_some()
        {
            return Err(Error::InvalidState {
                operation: "startSessionRequest",
                state: "SessionInProgress",
            });
        }

        if let Some(reservation_id) = reservation {
            let reservation = self
                .reservations
                .get(&reservation_id)
                .ok_or_else(|| Error::NotFound {
                    entity: "reservation",
                    id: reservation_id.to_string(),
                })?;

            if !reservation.holds_for(evse_id, connector_id, &account)
                || reservation.is_expired(now)
            {
                return Err(Error::InvalidState {
                    operation: "startSessionRequest",
                    state: reservation.state.as_str(),
                });
            }
        } else if info.status != ConnectorStatus::Available
            || !self.connector_is_free(evse_id, connector_id, now)
        {
            return Err(Error::InvalidState {
                operation: "startSessionRequest",
                state: "ConnectorUnavailable",
            });
        }

        self.next_session += 1;
        let id = SessionId::new(self.next_session);

        if let Some(reservation_id) = reservation {
            if let Some(held) = self.reservations.get_mut(&reservation_id) {
                held.consumed_by = Some(id);
            }
        }

        self.sessions.insert(
            id,
            Session::new(
                id,
                evse_id.clone(),
                connector_id,
                account.clone(),
                reservation,
                tariff_id,
            ),
        );

        info!(session = %id, evse = %evse_id, connector_id, "session requested");

        Ok(SessionStartRequest {
            uid: id,
            evse_id: evse_id.clone(),
            connector_id,
            account,
        })
    }

    /// Oracle acknowledgement of a session start. On success the session
    /// becomes active and starts accepting meter logs; on failure it is
    /// discarded as a recorded outcome, never an error, and any reservation
    /// is returned to its confirmed state.
    pub fn start_session_response(
        &mut self,
        actor: &Actor,
        id: SessionId,
        timestamp: DateTime,
        meter_start: Kwh,
        status: bool,
        message: Option<String>,
    ) -> Result<()> {
        self.require_oracle(actor, "startSessionResponse")?;
        self.guard(id, actor.role(), Message::StartResponse, "startSessionResponse")?;

        if !status {
            let session = self.sessions.remove(&id).expect("session checked by guard");
            if let Some(reservation_id) = session.reservation {
                if let Some(held) = self.reservations.get_mut(&reservation_id) {
                    held.consumed_by = None;
                }
            }

            info!(session = %id, ?message, "session start rejected by charge point");
            return Ok(());
        }

        let session = self.sessions.get_mut(&id).expect("session checked by guard");
        let tariff = self
            .tariffs
            .tariff(&session.tariff_id)
            .filter(|tariff| tariff.is_active(timestamp))
            .ok_or_else(|| Error::NotFound {
                entity: "tariff",
                id: session.tariff_id.clone(),
            })?;

        session.state = SessionState::Active;
        session.meter_start = meter_start;
        session.started_at = Some(timestamp);
        session.message = message;
        session.processor = Some(MeterLogProcessor::new(meter_start, timestamp));
        session.billing = Some(CdrBuilder::new(tariff, self.config.timezone, timestamp));

        info!(session = %id, %meter_start, "session active");

        Ok(())
    }

    /// Ingest one meter log for an active session.
    ///
    /// Rejected logs (`OutOfOrderLog`) leave the session untouched. When the
    /// projected session cost exceeds the funds available on the ledger the
    /// session transitions to `StopRequested` by itself and the returned
    /// outcome carries the stop request.
    pub fn update_session(
        &mut self,
        actor: &Actor,
        id: SessionId,
        log: MeterLog,
    ) -> Result<SessionUpdateOutcome> {
        self.require_oracle(actor, "updateSession")?;
        self.guard(id, actor.role(), Message::Update, "updateSession")?;

        let available = {
            let session = self.sessions.get(&id).expect("session checked by guard");
            self.ledger.available(&session.owner)
        };

        let session = self.sessions.get_mut(&id).expect("session checked by guard");

        let delta = session
            .processor
            .as_mut()
            .expect("active session has a processor")
            .ingest(&log)?;

        let billing = session.billing.as_mut().expect("active session has billing");
        billing.record(&delta);
        let projected = billing.running_total().incl_vat;

        let update = SessionUpdate {
            session_id: id,
            meter_value: log.meter_value,
            percent: log.percent,
        };
        session.logs.push(log);

        debug!(session = %id, %projected, "meter log accepted");

        let stop_request = if projected > available {
            session.state = SessionState::StopRequested;
            info!(session = %id, %projected, %available, "cost limit breached, requesting stop");
            Some(SessionStopRequest { session_id: id })
        } else {
            None
        };

        Ok(SessionUpdateOutcome {
            update,
            stop_request,
        })
    }

    /// Owner request to stop charging.
    pub fn stop_session_request(
        &mut self,
        actor: &Actor,
        id: SessionId,
    ) -> Result<SessionStopRequest> {
        let account = self.require_owner(actor, "stopSessionRequest", AccessLevel::Write)?;
        self.require_session_owner(id, &account, "stopSessionRequest")?;
        self.guard(id, actor.role(), Message::StopRequest, "stopSessionRequest")?;

        let session = self.sessions.get_mut(&id).expect("session checked by guard");
        session.state = SessionState::StopRequested;

        info!(session = %id, "stop requested by owner");

        Ok(SessionStopRequest { session_id: id })
    }

    /// Oracle acknowledgement of a stop. The final meter value is deltaed
    /// through the billing pipeline like any reading, so the accumulated
    /// energy exactly covers `meter_stop − meter_start`. A `false` status
    /// records the failure and keeps the stop pending.
    pub fn stop_session_response(
        &mut self,
        actor: &Actor,
        id: SessionId,
        meter_stop: Kwh,
        timestamp: DateTime,
        status: bool,
        message: Option<String>,
    ) -> Result<()> {
        self.require_oracle(actor, "stopSessionResponse")?;
        self.guard(id, actor.role(), Message::StopResponse, "stopSessionResponse")?;

        let session = self.sessions.get_mut(&id).expect("session checked by guard");

        if !status {
            session.message = message;
            info!(session = %id, "stop rejected by charge point");
            return Ok(());
        }

        let final_log = MeterLog {
            meter_value: meter_stop,
            timestamp,
            percent: session.logs.last().map(|log| log.percent).unwrap_or(0),
            power: Default::default(),
            current: Default::default(),
            voltage: Default::default(),
        };

        let delta = session
            .processor
            .as_mut()
            .expect("active session has a processor")
            .ingest(&final_log)?;
        session
            .billing
            .as_mut()
            .expect("active session has billing")
            .record(&delta);

        session.state = SessionState::Stopped;
        session.meter_stop = Some(meter_stop);
        session.stopped_at = Some(timestamp);
        session.message = message;

        info!(session = %id, %meter_stop, "session stopped");

        Ok(())
    }

    /// Settle a stopped session: compute the final CDR, debit the ledger once
    /// and seal the session. Fails `InsufficientFunds` with no state change
    /// when the ledger rejects the debit.
    pub fn end_session(&mut self, actor: &Actor, id: SessionId, timestamp: DateTime) -> Result<Cdr> {
        self.require_oracle(actor, "endSession")?;
        self.guard(id, actor.role(), Message::End, "endSession")?;

        let session = self.sessions.get(&id).expect("session checked by guard");
        let stopped_at = session.stopped_at.expect("stopped session has a timestamp");

        let cdr = session
            .billing
            .as_ref()
            .expect("stopped session has billing")
            .finalize(id, stopped_at, timestamp);

        self.ledger
            .debit(&session.owner, cdr.total_cost.incl_vat)
            .map_err(|InsufficientFunds| Error::InsufficientFunds {
                account: session.owner.to_string(),
                amount: cdr.total_cost.incl_vat.to_string(),
            })?;

        let session = self.sessions.get_mut(&id).expect("session checked by guard");
        session.state = SessionState::Ended;
        session.ended_at = Some(timestamp);
        session.cdr = Some(cdr.clone());
        session.processor = None;
        session.billing = None;

        info!(session = %id, total = %cdr.total_cost.incl_vat, "session settled");

        Ok(cdr)
    }

    /// The finalized record of an ended session. Repeated calls return the
    /// identical record.
    pub fn get_cdr(&self, actor: &Actor, id: SessionId) -> Result<&Cdr> {
        let session = self.get_session(actor, id)?;

        session.cdr().ok_or(Error::InvalidState {
            operation: "getCDR",
            state: session.state.as_str(),
        })
    }

    /// Look up a session. Owners can only read their own.
    pub fn get_session(&self, actor: &Actor, id: SessionId) -> Result<&Session> {
        let session = self.sessions.get(&id).ok_or_else(|| Error::NotFound {
            entity: "session",
            id: id.to_string(),
        })?;

        if let Actor::Owner(account) = actor {
            if !self.access.allowed(account, ACCESS_OBJECT, AccessLevel::Read) {
                return Err(Error::Unauthorized {
                    operation: "getSession",
                });
            }
            if session.owner != *account {
                return Err(Error::Unauthorized {
                    operation: "getSession",
                });
            }
        }

        Ok(session)
    }

    /// The live (not yet ended) session owned by `account`, if any.
    pub fn get_session_by_auth(&self, account: &AccountId) -> Option<&Session> {
        self.sessions
            .values()
            .find(|session| session.owner == *account && session.state != SessionState::Ended)
    }

    /// Whether a session with this id exists.
    pub fn exist(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Look up a reservation.
    pub fn get_reservation(&self, id: ReservationId) -> Result<&Reservation> {
        self.reservations.get(&id).ok_or_else(|| Error::NotFound {
            entity: "reservation",
            id: id.to_string(),
        })
    }

    fn reservation_mut(&mut self, id: ReservationId) -> Result<&mut Reservation> {
        self.reservations.get_mut(&id).ok_or_else(|| Error::NotFound {
            entity: "reservation",
            id: id.to_string(),
        })
    }

    fn guard(
        &self,
        id: SessionId,
        role: Role,
        message: Message,
        operation: &'static str,
    ) -> Result<()> {
        let session = self.sessions.get(&id).ok_or_else(|| Error::NotFound {
            entity: "session",
            id: id.to_string(),
        })?;

        if !permits(session.state, role, message) {
            return Err(Error::InvalidState {
                operation,
                state: session.state.as_str(),
            });
        }

        Ok(())
    }

    fn require_owner(
        &self,
        actor: &Actor,
        operation: &'static str,
        level: AccessLevel,
    ) -> Result<AccountId> {
        let Actor::Owner(account) = actor else {
            return Err(Error::Unauthorized { operation });
        };

        if !self.access.allowed(account, ACCESS_OBJECT, level) {
            return Err(Error::Unauthorized { operation });
        }

        Ok(account.clone())
    }

    fn require_oracle(&self, actor: &Actor, operation: &'static str) -> Result<()> {
        match actor {
            Actor::Oracle => Ok(()),
            Actor::Owner(_) => Err(Error::Unauthorized { operation }),
        }
    }

    fn require_session_owner(
        &self,
        id: SessionId,
        account: &AccountId,
        operation: &'static str,
    ) -> Result<()> {
        let session = self.sessions.get(&id).ok_or_else(|| Error::NotFound {
            entity: "session",
            id: id.to_string(),
        })?;

        if session.owner != *account {
            return Err(Error::Unauthorized { operation });
        }

        Ok(())
    }

    fn lookup_connector(&self, evse_id: &EvseId, connector_id: u32) -> Result<ConnectorInfo> {
        self.connectors
            .lookup(evse_id, connector_id)
            .ok_or_else(|| Error::NotFound {
                entity: "connector",
                id: format!("{evse_id}/{connector_id}"),
            })
    }

    fn live_session_on(&self, evse_id: &EvseId, connector_id: u32) -> Option<&Session> {
        self.sessions.values().find(|session| {
            session.evse_id == *evse_id
                && session.connector_id == connector_id
                && session.state != SessionState::Ended
        })
    }

    /// A connector is free when no unexpired confirmed or pending reservation
    /// holds it and no live session runs on it.
    fn connector_is_free(&self, evse_id: &EvseId, connector_id: u32, now: DateTime) -> bool {
        let reserved = self.reservations.values().any(|reservation| {
            reservation.evse_id == *evse_id
                && reservation.connector_id == connector_id
                && reservation.consumed_by.is_none()
                && reservation.state != ReservationState::Cancelled
                && !reservation.is_expired(now)
        });

        !reserved && self.live_session_on(evse_id, connector_id).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::{permits, Message, Role};
    use crate::session::SessionState;

    #[test]
    fn transition_table_rejects_unknown_combinations() {
        // A stop acknowledgement cannot arrive before the start one.
        assert!(!permits(
            SessionState::Requested,
            Role::Oracle,
            Message::StopResponse
        ));
        // Meter logs are rejected once a session has ended.
        assert!(!permits(SessionState::Ended, Role::Oracle, Message::Update));
        // Owners never acknowledge starts, that is the oracle's message.
        assert!(!permits(
            SessionState::Requested,
            Role::Owner,
            Message::StartResponse
        ));
    }

    #[test]
    fn transition_table_permits_the_happy_path() {
        assert!(permits(
            SessionState::Requested,
            Role::Oracle,
            Message::StartResponse
        ));
        assert!(permits(SessionState::Active, Role::Oracle, Message::Update));
        assert!(permits(
            SessionState::Active,
            Role::Owner,
            Message::StopRequest
        ));
        assert!(permits(
            SessionState::StopRequested,
            Role::Oracle,
            Message::StopResponse
        ));
        assert!(permits(SessionState::Stopped, Role::Oracle, Message::End));
    }
}
