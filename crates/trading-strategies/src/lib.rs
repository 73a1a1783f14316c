//! Decision modules.
//!
//! Each module votes independently on the instruments it trades; the
//! pipeline reduces the votes of all modules to one action per instrument.
//! - Moving average crossover
//! - RSI reversal

mod ma_crossover;
mod registry;
mod rsi;

pub use ma_crossover::{MaCrossover, MaCrossoverConfig};
pub use registry::{ModuleInfo, ModuleRegistry};
pub use rsi::{RsiConfig, RsiReversal};
