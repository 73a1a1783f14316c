//! Observability for the trading desk.

mod logging;

pub use logging::{default_filter, setup_logging, LogFormat};
