//! # Charge sessions library
//!
//! Functionality to manage the full lifecycle of an EV charging session and to
//! settle it into an itemized, VAT-aware charge detail record (CDR).
//!
//! The [`registry::SessionRegistry`] owns the reservation and session state
//! machines and drives the billing pipeline: every accepted meter log is
//! deltaed by the [`meter::MeterLogProcessor`], matched against the tariff by
//! the restriction matcher and accumulated by the [`billing::CdrBuilder`]. On
//! session end the builder produces the final [`cdr::Cdr`] and the account
//! ledger is debited exactly once.
//!
//! The billing pipeline can also be used standalone to replay a recorded
//! session against a tariff, without going through the registry.

/// Accumulation of matched meter deltas into priced line items.
pub mod billing;

/// The finalized charge detail record.
pub mod cdr;

/// Static validation of tariff definitions.
pub mod lint;

/// Validation and deltaing of the ordered meter log stream.
pub mod meter;

/// The reservation/session state machines and their collaborator ports.
pub mod registry;

/// Session, reservation and meter log domain types.
pub mod session;

/// Structures defining tariffs, elements, components and restrictions.
pub mod tariff;

/// Numeric types used for calculations, serializing and deserializing.
pub mod types;

mod restriction;

type Result<T> = std::result::Result<T, Error>;

/// Possible errors for registry operations and session settlement.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A referenced session, reservation, connector or tariff does not exist.
    #[error("{entity} `{id}` not found")]
    NotFound {
        /// The kind of entity that was looked up.
        entity: &'static str,
        /// The identifier that failed to resolve.
        id: String,
    },

    /// The operation is not allowed in the current state, for the caller's
    /// role, per the session transition table.
    #[error("`{operation}` is not allowed in state `{state}`")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// The state the entity was in.
        state: &'static str,
    },

    /// The caller lacks the required permission, or is not the owner of the
    /// targeted session or reservation.
    #[error("caller is not authorized to perform `{operation}`")]
    Unauthorized {
        /// The rejected operation.
        operation: &'static str,
    },

    /// The ledger could not cover the final debit at session end.
    #[error("account `{account}` cannot cover a debit of {amount}")]
    InsufficientFunds {
        /// The account that was debited.
        account: String,
        /// The amount of the rejected debit.
        amount: String,
    },

    /// A meter log regressed in meter value or timestamp.
    #[error("meter log out of order: {reason}")]
    OutOfOrderLog {
        /// Which monotonicity requirement was violated.
        reason: &'static str,
    },

    /// A numeric overflow occurred during tariff calculation.
    #[error("numeric overflow during tariff calculation")]
    NumericOverflow,
}

impl From<rust_decimal::Error> for Error {
    fn from(_: rust_decimal::Error) -> Self {
        Self::NumericOverflow
    }
}
