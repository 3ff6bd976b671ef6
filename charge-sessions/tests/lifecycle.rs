//! State machine and settlement behavior of the session registry.

use charge_sessions::registry::{Actor, RegistryConfig};
use charge_sessions::session::{AccountId, ReservationState, SessionState};
use charge_sessions::types::electricity::Kwh;
use charge_sessions::Error;
use rust_decimal_macros::dec;

mod common;

use common::{
    account, at, evse, meter_log, oracle, owner, registry, registry_with_config, start_session,
    tariff, CONNECTOR,
};

const ENERGY_TARIFF: &str = r#"{
    "id": "T-energy",
    "currency": "EUR",
    "elements": [{
        "price_components": [{ "type": "ENERGY", "price": 300, "vat": 0 }]
    }],
    "start_date_time": null,
    "end_date_time": null
}"#;

const FLAT_TARIFF: &str = r#"{
    "id": "T-flat",
    "currency": "EUR",
    "elements": [{
        "price_components": [{ "type": "FLAT", "price": 500, "vat": 20 }]
    }],
    "start_date_time": null,
    "end_date_time": null
}"#;

fn stop_and_end(
    registry: &mut charge_sessions::registry::SessionRegistry,
    id: charge_sessions::session::SessionId,
    meter_stop: rust_decimal::Decimal,
    minute: i64,
) -> charge_sessions::cdr::Cdr {
    registry.stop_session_request(&owner(), id).unwrap();
    registry
        .stop_session_response(&oracle(), id, Kwh::from(meter_stop), at(minute), true, None)
        .unwrap();
    registry.end_session(&oracle(), id, at(minute)).unwrap()
}

#[test]
fn stop_response_before_start_response_is_rejected() {
    let (mut registry, _ledger) = registry(tariff(ENERGY_TARIFF), 1_000.into());

    let request = registry
        .start_session_request(&owner(), &evse(), CONNECTOR, None)
        .unwrap();

    let premature = registry.stop_session_response(
        &oracle(),
        request.uid,
        Kwh::default(),
        at(1),
        true,
        None,
    );

    assert!(matches!(premature, Err(Error::InvalidState { .. })));
}

#[test]
fn updates_after_session_end_are_rejected() {
    let (mut registry, _ledger) = registry(tariff(ENERGY_TARIFF), 1_000.into());
    let id = start_session(&mut registry);

    registry
        .update_session(&oracle(), id, meter_log(dec!(0.2), 1))
        .unwrap();
    stop_and_end(&mut registry, id, dec!(0.2), 2);

    let late = registry.update_session(&oracle(), id, meter_log(dec!(0.4), 3));
    assert!(matches!(late, Err(Error::InvalidState { .. })));
}

#[test]
fn out_of_order_logs_are_rejected_atomically() {
    let (mut registry, _ledger) = registry(tariff(ENERGY_TARIFF), 1_000.into());
    let id = start_session(&mut registry);

    registry
        .update_session(&oracle(), id, meter_log(dec!(0.4), 2))
        .unwrap();

    let regressed = registry.update_session(&oracle(), id, meter_log(dec!(0.3), 3));
    assert!(matches!(regressed, Err(Error::OutOfOrderLog { .. })));

    // The rejected log left no trace: the next delta prices from 0.4.
    registry
        .update_session(&oracle(), id, meter_log(dec!(0.6), 4))
        .unwrap();

    let cdr = stop_and_end(&mut registry, id, dec!(0.6), 5);
    assert_eq!(cdr.total_energy, Kwh::from(dec!(0.6)));
    assert_eq!(cdr.total_cost.excl_vat, 180.into());
}

#[test]
fn get_cdr_is_idempotent_after_end() {
    let (mut registry, _ledger) = registry(tariff(FLAT_TARIFF), 1_000.into());
    let id = start_session(&mut registry);

    registry
        .update_session(&oracle(), id, meter_log(dec!(0.2), 1))
        .unwrap();
    let settled = stop_and_end(&mut registry, id, dec!(0.2), 2);

    let first = registry.get_cdr(&oracle(), id).unwrap().clone();
    let second = registry.get_cdr(&owner(), id).unwrap().clone();

    assert_eq!(first, settled);
    assert_eq!(first, second);
}

#[test]
fn breached_cost_limit_requests_a_stop_spontaneously() {
    // 0.2 kWh cost 60, the second reading projects 120 over the 100 balance.
    let (mut registry, _ledger) = registry(tariff(ENERGY_TARIFF), 100.into());
    let id = start_session(&mut registry);

    let first = registry
        .update_session(&oracle(), id, meter_log(dec!(0.2), 1))
        .unwrap();
    assert!(first.stop_request.is_none());

    let second = registry
        .update_session(&oracle(), id, meter_log(dec!(0.4), 2))
        .unwrap();
    let stop = second.stop_request.expect("limit breach should request a stop");
    assert_eq!(stop.session_id, id);

    let session = registry.get_session(&oracle(), id).unwrap();
    assert_eq!(session.state, SessionState::StopRequested);

    // The stream is closed, further updates are rejected.
    let third = registry.update_session(&oracle(), id, meter_log(dec!(0.6), 3));
    assert!(matches!(third, Err(Error::InvalidState { .. })));
}

#[test]
fn insufficient_funds_keeps_the_session_stopped() {
    let (mut registry, ledger) = registry(tariff(FLAT_TARIFF), 0.into());
    let id = start_session(&mut registry);

    // The flat fee is due regardless of the tiny consumption, and the stop
    // request fires immediately because the balance is empty.
    let outcome = registry
        .update_session(&oracle(), id, meter_log(dec!(0.2), 1))
        .unwrap();
    assert!(outcome.stop_request.is_some());

    registry
        .stop_session_response(&oracle(), id, Kwh::from(dec!(0.2)), at(2), true, None)
        .unwrap();

    let rejected = registry.end_session(&oracle(), id, at(2));
    assert!(matches!(rejected, Err(Error::InsufficientFunds { .. })));

    // No partial settlement happened.
    let session = registry.get_session(&oracle(), id).unwrap();
    assert_eq!(session.state, SessionState::Stopped);
    assert!(session.cdr().is_none());

    // Once funds arrive the same call settles the session.
    ledger.credit(&account(), 600.into());
    let cdr = registry.end_session(&oracle(), id, at(2)).unwrap();
    assert_eq!(cdr.total_cost.incl_vat, 600.into());

    let session = registry.get_session(&oracle(), id).unwrap();
    assert_eq!(session.state, SessionState::Ended);
}

#[test]
fn reservation_holds_the_connector_for_its_account() {
    let (mut registry, _ledger) = registry(tariff(ENERGY_TARIFF), 1_000.into());

    let request = registry
        .create_reservation_request(&owner(), &evse(), CONNECTOR)
        .unwrap();
    assert_eq!(request.account, account());

    let state = registry
        .create_reservation_response(&oracle(), request.id, true)
        .unwrap();
    assert_eq!(state, ReservationState::Confirmed);

    // The held connector is not free for other accounts.
    let intruder = Actor::Owner(AccountId::new("acc-9"));
    let denied = registry.create_reservation_request(&intruder, &evse(), CONNECTOR);
    assert!(matches!(denied, Err(Error::InvalidState { .. })));

    let denied = registry.start_session_request(&intruder, &evse(), CONNECTOR, None);
    assert!(matches!(denied, Err(Error::InvalidState { .. })));

    // The holder starts a session through the reservation.
    let start = registry
        .start_session_request(&owner(), &evse(), CONNECTOR, Some(request.id))
        .unwrap();

    let reservation = registry.get_reservation(request.id).unwrap();
    assert_eq!(reservation.consumed_by, Some(start.uid));
}

#[test]
fn expired_reservations_cannot_start_sessions() {
    let config = RegistryConfig {
        reservation_ttl: chrono::Duration::seconds(-1),
        ..RegistryConfig::default()
    };
    let (mut registry, _ledger) =
        registry_with_config(tariff(ENERGY_TARIFF), 1_000.into(), config);

    let request = registry
        .create_reservation_request(&owner(), &evse(), CONNECTOR)
        .unwrap();
    registry
        .create_reservation_response(&oracle(), request.id, true)
        .unwrap();

    let stale = registry.start_session_request(&owner(), &evse(), CONNECTOR, Some(request.id));
    assert!(matches!(stale, Err(Error::InvalidState { .. })));
}

#[test]
fn rejected_start_discards_the_session_and_keeps_the_reservation() {
    let (mut registry, _ledger) = registry(tariff(ENERGY_TARIFF), 1_000.into());

    let reservation = registry
        .create_reservation_request(&owner(), &evse(), CONNECTOR)
        .unwrap();
    registry
        .create_reservation_response(&oracle(), reservation.id, true)
        .unwrap();

    let request = registry
        .start_session_request(&owner(), &evse(), CONNECTOR, Some(reservation.id))
        .unwrap();

    // The charge point reports a failed start: a recorded outcome, not an
    // engine error.
    registry
        .start_session_response(
            &oracle(),
            request.uid,
            at(0),
            Kwh::default(),
            false,
            Some("connector fault".into()),
        )
        .unwrap();

    assert!(!registry.exist(request.uid));

    // The reservation is free to be consumed again.
    let held = registry.get_reservation(reservation.id).unwrap();
    assert_eq!(held.consumed_by, None);
    assert_eq!(held.state, ReservationState::Confirmed);
}

#[test]
fn owners_cannot_speak_for_the_oracle() {
    let (mut registry, _ledger) = registry(tariff(ENERGY_TARIFF), 1_000.into());

    let request = registry
        .start_session_request(&owner(), &evse(), CONNECTOR, None)
        .unwrap();

    let forged = registry.start_session_response(
        &owner(),
        request.uid,
        at(0),
        Kwh::default(),
        true,
        None,
    );
    assert!(matches!(forged, Err(Error::Unauthorized { .. })));

    let forged = registry.update_session(&owner(), request.uid, meter_log(dec!(0.2), 1));
    assert!(matches!(forged, Err(Error::Unauthorized { .. })));
}

#[test]
fn only_the_owner_stops_their_session() {
    let (mut registry, _ledger) = registry(tariff(ENERGY_TARIFF), 1_000.into());
    let id = start_session(&mut registry);

    let intruder = Actor::Owner(AccountId::new("acc-9"));
    let denied = registry.stop_session_request(&intruder, id);
    assert!(matches!(denied, Err(Error::Unauthorized { .. })));

    let denied = registry.get_session(&intruder, id);
    assert!(matches!(denied, Err(Error::Unauthorized { .. })));

    registry.stop_session_request(&owner(), id).unwrap();
}

#[test]
fn session_lookup_by_account_tracks_liveness() {
    let (mut registry, _ledger) = registry(tariff(ENERGY_TARIFF), 1_000.into());

    assert!(registry.get_session_by_auth(&account()).is_none());

    let id = start_session(&mut registry);
    assert!(registry.exist(id));
    assert_eq!(
        registry.get_session_by_auth(&account()).map(|s| s.id),
        Some(id)
    );

    registry
        .update_session(&oracle(), id, meter_log(dec!(0.2), 1))
        .unwrap();
    stop_and_end(&mut registry, id, dec!(0.2), 2);

    // Ended sessions stay queryable by id but no longer count as live.
    assert!(registry.exist(id));
    assert!(registry.get_session_by_auth(&account()).is_none());
}
