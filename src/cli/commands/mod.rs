//! CLI command implementations.

pub mod backtest;
pub mod modules;
pub mod validate;
