//! Error types for the trading system.
//!
//! The per-bar pipeline itself never fails: missing inputs degrade to
//! "do nothing this bar". These errors cover the surfaces around it:
//! configuration, data loading, decision modules and the execution gateway.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TradingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Module(#[from] ModuleError),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error("Instrument {0} is not registered")]
    UnknownInstrument(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Failures building or configuring a decision module.
#[derive(Error, Debug)]
pub enum ModuleError {
    #[error("Invalid module parameters: {0}")]
    InvalidConfig(String),

    #[error("Unknown decision module kind: {0}")]
    NotFound(String),
}

/// Rejections from an execution gateway.
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("No pending order with id {0}")]
    OrderNotFound(String),

    #[error("Gateway does not trade {0}")]
    UnknownInstrument(String),
}

/// Market data loading errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("No usable bars for {0}")]
    NoDataAvailable(String),

    #[error("Failed to parse market data: {0}")]
    ParseError(String),
}

#[derive(Error, Debug)]
pub enum IndicatorError {
    #[error("Indicator needs {required} points, got {available}")]
    InsufficientData { required: usize, available: usize },
}

pub type TradingResult<T> = Result<T, TradingError>;
