/// Electrical quantities: energy, power, current, voltage.
pub mod electricity;

/// Monetary amounts, VAT percentages and price pairs.
pub mod money;

/// Decimal number wrapper used for all calculations.
pub(crate) mod number;

/// Time of day, day of week and duration helpers.
pub mod time;
