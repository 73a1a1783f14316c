//! Signal votes, per-bar decision sets and aggregated actions.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::Direction;
use crate::error::TradingError;

/// Vote emitted by a decision module for one instrument on one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    EntryLong,
    EntryShort,
    ExitLong,
    ExitShort,
    Flatten,
    #[default]
    NoAction,
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentState::EntryLong => "ENTRY_LONG",
            AgentState::EntryShort => "ENTRY_SHORT",
            AgentState::ExitLong => "EXIT_LONG",
            AgentState::ExitShort => "EXIT_SHORT",
            AgentState::Flatten => "FLATTEN",
            AgentState::NoAction => "NO_ACTION",
        };
        write!(f, "{s}")
    }
}

/// Single action per instrument, the result of aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    OpenLong,
    OpenShort,
    Flatten,
}

impl Action {
    /// Opening actions are the only ones sized and protected by a stop.
    pub fn is_entry(&self) -> bool {
        matches!(self, Action::OpenLong | Action::OpenShort)
    }

    pub fn direction(&self) -> Direction {
        match self {
            Action::OpenLong => Direction::Long,
            Action::OpenShort => Direction::Short,
            Action::Flatten => Direction::Flat,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::OpenLong => write!(f, "OPEN_LONG"),
            Action::OpenShort => write!(f, "OPEN_SHORT"),
            Action::Flatten => write!(f, "FLATTEN"),
        }
    }
}

/// Votes cast this bar, keyed by instrument.
///
/// Only instruments with at least one registered module may receive votes.
#[derive(Debug, Clone, Default)]
pub struct DecisionSet {
    registered: BTreeSet<String>,
    votes: BTreeMap<String, Vec<AgentState>>,
}

impl DecisionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an empty set that accepts votes for the given instruments.
    pub fn with_instruments<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for symbol in symbols {
            set.register(symbol);
        }
        set
    }

    /// Record that a module trades this instrument.
    pub fn register(&mut self, symbol: impl Into<String>) {
        self.registered.insert(symbol.into());
    }

    pub fn is_registered(&self, symbol: &str) -> bool {
        self.registered.contains(symbol)
    }

    /// Append a vote for an instrument.
    pub fn cast(&mut self, symbol: &str, vote: AgentState) -> Result<(), TradingError> {
        if !self.registered.contains(symbol) {
            return Err(TradingError::Validation(format!(
                "No decision module registered for {symbol}"
            )));
        }
        self.votes.entry(symbol.to_string()).or_default().push(vote);
        Ok(())
    }

    /// Votes for one instrument, in casting order.
    pub fn votes(&self, symbol: &str) -> &[AgentState] {
        self.votes.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Instruments with at least one vote, in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &[AgentState])> {
        self.votes.iter().map(|(s, v)| (s, v.as_slice()))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &String> {
        self.votes.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }
}
