//! Core types and traits for the decision and order pipeline.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, BarSeries, MarketSnapshot)
//! - Instruments, orders, pending orders and order patches
//! - Positions and the account snapshot read by the pipeline
//! - Signal votes, decision sets and aggregated actions
//! - The cycle-scoped order book shared by risk and sizing stages
//! - Seams for decision modules, indicators, market data and execution

pub mod types;
pub mod traits;
pub mod error;

pub use error::{TradingError, TradingResult};
pub use types::*;
pub use traits::*;
