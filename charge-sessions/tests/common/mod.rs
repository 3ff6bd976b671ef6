use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use charge_sessions::registry::{
    AccessLevel, AccessPort, Actor, ConnectorInfo, ConnectorPort, ConnectorStatus,
    InsufficientFunds, LedgerPort, RegistryConfig, SessionRegistry, TariffPort,
};
use charge_sessions::session::{AccountId, EvseId, SessionId};
use charge_sessions::tariff::Tariff;
use charge_sessions::types::electricity::Kwh;
use charge_sessions::types::money::Money;
use charge_sessions::types::time::DateTime;
use charge_sessions::meter::MeterLog;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;

pub const CONNECTOR: u32 = 1;

pub fn evse() -> EvseId {
    EvseId::new("EV-001")
}

pub fn account() -> AccountId {
    AccountId::new("acc-7")
}

pub fn owner() -> Actor {
    Actor::Owner(account())
}

pub fn oracle() -> Actor {
    Actor::Oracle
}

/// Minutes after the fixed session start of 19:00 UTC on a monday.
pub fn at(minute: i64) -> DateTime {
    Utc.with_ymd_and_hms(2024, 6, 3, 19, 0, 0).unwrap() + chrono::Duration::minutes(minute)
}

pub fn meter_log(meter: Decimal, minute: i64) -> MeterLog {
    MeterLog {
        meter_value: meter.into(),
        timestamp: at(minute),
        percent: 50,
        power: Decimal::from(11).into(),
        current: Decimal::from(16).into(),
        voltage: Decimal::from(230).into(),
    }
}

pub fn tariff(json: &str) -> Tariff {
    serde_json::from_str(json).expect("test tariff should deserialize")
}

struct StaticInventory {
    connectors: HashMap<(EvseId, u32), ConnectorInfo>,
}

impl ConnectorPort for StaticInventory {
    fn lookup(&self, evse_id: &EvseId, connector_id: u32) -> Option<ConnectorInfo> {
        self.connectors.get(&(evse_id.clone(), connector_id)).cloned()
    }
}

struct StaticCatalog {
    tariffs: HashMap<String, Tariff>,
}

impl TariffPort for StaticCatalog {
    fn tariff(&self, tariff_id: &str) -> Option<Tariff> {
        self.tariffs.get(tariff_id).cloned()
    }
}

pub struct TestLedger {
    balances: Mutex<HashMap<AccountId, Money>>,
}

impl TestLedger {
    pub fn credit(&self, account: &AccountId, amount: Money) {
        let mut balances = self.balances.lock().unwrap();
        let balance = balances.entry(account.clone()).or_insert_with(|| 0.into());
        *balance = *balance + amount;
    }
}

impl LedgerPort for TestLedger {
    fn available(&self, account: &AccountId) -> Money {
        self.balances
            .lock()
            .unwrap()
            .get(account)
            .copied()
            .unwrap_or_else(|| 0.into())
    }

    fn debit(&self, account: &AccountId, amount: Money) -> Result<(), InsufficientFunds> {
        let mut balances = self.balances.lock().unwrap();
        let balance = balances.entry(account.clone()).or_insert_with(|| 0.into());

        if *balance < amount {
            return Err(InsufficientFunds);
        }

        *balance = *balance - amount;
        Ok(())
    }
}

struct AllowAll;

impl AccessPort for AllowAll {
    fn allowed(&self, _caller: &AccountId, _object: &str, _level: AccessLevel) -> bool {
        true
    }
}

/// A registry with one available connector wired to `tariff`, and `balance`
/// minted for the test account.
pub fn registry(tariff: Tariff, balance: Money) -> (SessionRegistry, Arc<TestLedger>) {
    registry_with_config(tariff, balance, RegistryConfig::default())
}

pub fn registry_with_config(
    tariff: Tariff,
    balance: Money,
    config: RegistryConfig,
) -> (SessionRegistry, Arc<TestLedger>) {
    let inventory = StaticInventory {
        connectors: HashMap::from([(
            (evse(), CONNECTOR),
            ConnectorInfo {
                status: ConnectorStatus::Available,
                tariff_id: Some(tariff.id.clone()),
            },
        )]),
    };

    let catalog = StaticCatalog {
        tariffs: HashMap::from([(tariff.id.clone(), tariff)]),
    };

    let ledger = Arc::new(TestLedger {
        balances: Mutex::new(HashMap::from([(account(), balance)])),
    });

    let registry = SessionRegistry::new(
        config,
        Arc::new(inventory),
        Arc::new(catalog),
        ledger.clone(),
        Arc::new(AllowAll),
    );

    (registry, ledger)
}

/// Request a session and acknowledge the start, leaving it active at 19:00
/// with a zero start meter.
pub fn start_session(registry: &mut SessionRegistry) -> SessionId {
    let request = registry
        .start_session_request(&owner(), &evse(), CONNECTOR, None)
        .expect("session request should be accepted");

    registry
        .start_session_response(&oracle(), request.uid, at(0), Kwh::default(), true, None)
        .expect("session start should be acknowledged");

    request.uid
}
