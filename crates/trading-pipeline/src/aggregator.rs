//! Decision aggregation.

use std::collections::BTreeMap;
use tracing::trace;
use trading_core::types::{Account, Action, AgentState, DecisionSet, Direction, Position};

/// Reduce every instrument's votes to at most one action.
///
/// Entries need a unanimous vote and only fire when the instrument is flat
/// or held the other way. Otherwise a held position is flattened when any
/// vote asks to exit it. Anything else, ties and mixed votes included,
/// yields no action.
pub fn aggregate(decisions: &DecisionSet, account: &Account) -> BTreeMap<String, Action> {
    decisions
        .iter()
        .filter_map(|(symbol, votes)| {
            let held = account
                .position(symbol)
                .map(Position::direction)
                .unwrap_or(Direction::Flat);
            let action = resolve(votes, held);
            trace!(
                symbol = %symbol,
                votes = votes.len(),
                held = %held,
                ?action,
                "Aggregated votes"
            );
            action.map(|a| (symbol.clone(), a))
        })
        .collect()
}

fn resolve(votes: &[AgentState], held: Direction) -> Option<Action> {
    let first = *votes.first()?;

    if votes.iter().all(|v| *v == first) {
        match (first, held) {
            (AgentState::EntryLong, Direction::Flat | Direction::Short) => {
                return Some(Action::OpenLong)
            }
            (AgentState::EntryShort, Direction::Flat | Direction::Long) => {
                return Some(Action::OpenShort)
            }
            _ => {}
        }
    }

    if held == Direction::Flat {
        return None;
    }
    let exit = votes.iter().any(|v| match v {
        AgentState::Flatten => true,
        AgentState::ExitLong => held == Direction::Long,
        AgentState::ExitShort => held == Direction::Short,
        _ => false,
    });
    exit.then_some(Action::Flatten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use AgentState::*;

    fn decisions(votes: &[(&str, AgentState)]) -> DecisionSet {
        let mut set = DecisionSet::with_instruments(["EURUSD", "GBPUSD"]);
        for (symbol, vote) in votes {
            set.cast(symbol, *vote).unwrap();
        }
        set
    }

    fn holding(symbol: &str, quantity: rust_decimal::Decimal) -> Account {
        let mut account = Account::new(dec!(10000));
        account
            .positions
            .insert(symbol.into(), Position::new(symbol, quantity, dec!(1.1)));
        account
    }

    #[test]
    fn test_unanimous_entry() {
        let set = decisions(&[("EURUSD", EntryLong), ("EURUSD", EntryLong)]);
        let actions = aggregate(&set, &Account::new(dec!(10000)));
        assert_eq!(actions.get("EURUSD"), Some(&Action::OpenLong));
    }

    #[test]
    fn test_dissent_suppresses_entry() {
        let set = decisions(&[
            ("EURUSD", EntryLong),
            ("EURUSD", EntryLong),
            ("EURUSD", EntryShort),
        ]);
        assert!(aggregate(&set, &Account::new(dec!(10000))).is_empty());

        let set = decisions(&[("EURUSD", EntryShort), ("EURUSD", NoAction)]);
        assert!(aggregate(&set, &Account::new(dec!(10000))).is_empty());
    }

    #[test]
    fn test_entry_only_when_flat_or_opposite() {
        let set = decisions(&[("EURUSD", EntryLong)]);
        assert!(aggregate(&set, &holding("EURUSD", dec!(0.5))).is_empty());
        assert_eq!(
            aggregate(&set, &holding("EURUSD", dec!(-0.5))).get("EURUSD"),
            Some(&Action::OpenLong)
        );
    }

    #[test]
    fn test_exit_votes_match_position_side() {
        let long = holding("EURUSD", dec!(0.5));
        let set = decisions(&[("EURUSD", ExitLong), ("EURUSD", EntryLong)]);
        assert_eq!(aggregate(&set, &long).get("EURUSD"), Some(&Action::Flatten));

        let set = decisions(&[("EURUSD", ExitShort)]);
        assert!(aggregate(&set, &long).is_empty());
    }

    #[test]
    fn test_flatten_requires_position() {
        let set = decisions(&[("EURUSD", Flatten), ("EURUSD", EntryLong)]);
        assert!(aggregate(&set, &Account::new(dec!(10000))).is_empty());
        assert_eq!(
            aggregate(&set, &holding("EURUSD", dec!(-0.2))).get("EURUSD"),
            Some(&Action::Flatten)
        );
    }

    #[test]
    fn test_positions_without_votes_are_skipped() {
        let set = decisions(&[("GBPUSD", EntryShort)]);
        let actions = aggregate(&set, &holding("EURUSD", dec!(0.5)));
        assert_eq!(actions.len(), 1);
        assert_eq!(actions.keys().next().map(String::as_str), Some("GBPUSD"));
    }
}
