//! LR(1) parse tables
//!
//! [ParseTable::build] runs the canonical LR(1) construction over [crate::grammar]. Item sets are ordered
//! collections and symbols are visited in a fixed order, so the same grammar always yields the same state
//! numbering and the same tables.
//!
//! Conflicts are settled once, here, and never at parse time: shift wins over reduce and the lower rule index
//! wins a reduce/reduce conflict. Every settled conflict is recorded in the table.
use crate::grammar::{Fingerprint, NonTerminal, Rule, Symbol, Terminal};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Error,
    /// push the token and go to state
    Shift(u32),
    /// reduce by rule index
    Reduce(u16),
    Accept,
}

/// A table cell that had more than one candidate action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
pub struct Conflict {
    pub state: u32,
    pub terminal: Terminal,
    pub kept: Action,
    pub dropped: Action,
}

/// Immutable action and goto tables
///
/// Rows are states, columns are [Terminal::index] (actions) and [NonTerminal::index] (gotos).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseTable {
    fingerprint: Fingerprint,
    actions: Vec<Vec<Action>>,
    gotos: Vec<Vec<Option<u32>>>,
    conflicts: Vec<Conflict>,
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("malformed parse table: {0}")]
pub struct MalformedTable(String);

impl ParseTable {
    #[tracing::instrument(level = "debug")]
    pub fn build() -> Self {
        let table = Builder::new().build();
        tracing::debug!(
            states = table.state_count(),
            conflicts = table.conflicts.len(),
            fingerprint = %table.fingerprint,
            "parse table built"
        );
        table
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    pub fn state_count(&self) -> usize {
        self.actions.len()
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn action(&self, state: u32, terminal: Terminal) -> Action {
        self.actions
            .get(state as usize)
            .and_then(|row| row.get(terminal.index()))
            .copied()
            .unwrap_or(Action::Error)
    }

    pub fn goto(&self, state: u32, non_terminal: NonTerminal) -> Option<u32> {
        self.gotos
            .get(state as usize)
            .and_then(|row| row.get(non_terminal.index()))
            .copied()
            .flatten()
    }

    /// Terminals with a non-error action in `state`
    pub fn expected(&self, state: u32) -> Vec<Terminal> {
        Terminal::ALL
            .into_iter()
            .filter(|terminal| self.action(state, *terminal) != Action::Error)
            .collect()
    }

    /// Structural sanity check for tables that did not come from [ParseTable::build]
    pub fn validate(&self) -> Result<(), MalformedTable> {
        let states = self.actions.len();
        if states == 0 {
            return Err(MalformedTable("no states".into()));
        }
        if self.gotos.len() != states {
            return Err(MalformedTable(format!(
                "{states} action rows but {} goto rows",
                self.gotos.len()
            )));
        }

        for (state, row) in self.actions.iter().enumerate() {
            if row.len() != Terminal::ALL.len() {
                return Err(MalformedTable(format!("action row {state} has wrong width")));
            }
            for action in row {
                let valid = match *action {
                    Action::Shift(target) => (target as usize) < states,
                    Action::Reduce(rule) => Rule::from_index(rule as usize).is_some(),
                    Action::Error | Action::Accept => true,
                };
                if !valid {
                    return Err(MalformedTable(format!(
                        "state {state} has invalid action {action:?}"
                    )));
                }
            }
        }

        for (state, row) in self.gotos.iter().enumerate() {
            if row.len() != NonTerminal::ALL.len() {
                return Err(MalformedTable(format!("goto row {state} has wrong width")));
            }
            if row.iter().flatten().any(|target| *target as usize >= states) {
                return Err(MalformedTable(format!("state {state} has invalid goto")));
            }
        }

        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn with_fingerprint(mut self, fingerprint: Fingerprint) -> Self {
        self.fingerprint = fingerprint;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Item {
    rule: Rule,
    dot: usize,
    lookahead: Terminal,
}

impl Item {
    fn next_symbol(&self) -> Option<Symbol> {
        self.rule.rhs().get(self.dot).copied()
    }
}

type ItemSet = BTreeSet<Item>;

struct Builder {
    nullable: Vec<bool>,
    first: Vec<BTreeSet<Terminal>>,
}

impl Builder {
    fn new() -> Self {
        let mut nullable = vec![false; NonTerminal::ALL.len()];
        let mut first = vec![BTreeSet::new(); NonTerminal::ALL.len()];

        let mut changed = true;
        while changed {
            changed = false;
            for rule in Rule::ALL {
                let lhs = rule.lhs().index();
                let mut rhs_nullable = true;
                for symbol in rule.rhs() {
                    match symbol {
                        Symbol::T(terminal) => {
                            changed |= first[lhs].insert(*terminal);
                            rhs_nullable = false;
                        }
                        Symbol::N(non_terminal) => {
                            let inherited: Vec<Terminal> =
                                first[non_terminal.index()].iter().copied().collect();
                            for terminal in inherited {
                                changed |= first[lhs].insert(terminal);
                            }
                            rhs_nullable = nullable[non_terminal.index()];
                        }
                    }
                    if !rhs_nullable {
                        break;
                    }
                }
                if rhs_nullable && !nullable[lhs] {
                    nullable[lhs] = true;
                    changed = true;
                }
            }
        }

        Self { nullable, first }
    }

    /// FIRST(symbols lookahead)
    fn first_of(&self, symbols: &[Symbol], lookahead: Terminal) -> BTreeSet<Terminal> {
        let mut result = BTreeSet::new();
        for symbol in symbols {
            match symbol {
                Symbol::T(terminal) => {
                    result.insert(*terminal);
                    return result;
                }
                Symbol::N(non_terminal) => {
                    result.extend(self.first[non_terminal.index()].iter().copied());
                    if !self.nullable[non_terminal.index()] {
                        return result;
                    }
                }
            }
        }
        result.insert(lookahead);
        result
    }

    fn closure(&self, mut items: ItemSet) -> ItemSet {
        let mut pending: Vec<Item> = items.iter().copied().collect();
        while let Some(item) = pending.pop() {
            let Some(Symbol::N(non_terminal)) = item.next_symbol() else {
                continue;
            };

            let lookaheads = self.first_of(&item.rule.rhs()[item.dot + 1..], item.lookahead);
            for rule in Rule::producing(non_terminal) {
                for lookahead in &lookaheads {
                    let new = Item {
                        rule,
                        dot: 0,
                        lookahead: *lookahead,
                    };
                    if items.insert(new) {
                        pending.push(new);
                    }
                }
            }
        }
        items
    }

    fn goto(&self, items: &ItemSet, symbol: Symbol) -> ItemSet {
        let kernel = items
            .iter()
            .filter(|item| item.next_symbol() == Some(symbol))
            .map(|item| Item {
                dot: item.dot + 1,
                ..*item
            })
            .collect();
        self.closure(kernel)
    }

    fn build(&self) -> ParseTable {
        let start = self.closure(BTreeSet::from([Item {
            rule: Rule::Accept,
            dot: 0,
            lookahead: Terminal::Eof,
        }]));

        let mut states = vec![start.clone()];
        let mut index: HashMap<ItemSet, u32> = HashMap::from([(start, 0)]);
        let mut transitions: Vec<BTreeMap<Symbol, u32>> = vec![BTreeMap::new()];

        let mut current = 0;
        while current < states.len() {
            let symbols: BTreeSet<Symbol> =
                states[current].iter().filter_map(Item::next_symbol).collect();

            for symbol in symbols {
                let next = self.goto(&states[current], symbol);
                let target = match index.get(&next) {
                    Some(target) => *target,
                    None => {
                        let target = states.len() as u32;
                        states.push(next.clone());
                        transitions.push(BTreeMap::new());
                        index.insert(next, target);
                        target
                    }
                };
                transitions[current].insert(symbol, target);
            }
            current += 1;
        }

        let mut actions = vec![vec![Action::Error; Terminal::ALL.len()]; states.len()];
        let mut gotos = vec![vec![None; NonTerminal::ALL.len()]; states.len()];
        let mut conflicts = Vec::new();

        for (state, items) in states.iter().enumerate() {
            for item in items {
                let (terminal, action) = match item.next_symbol() {
                    Some(Symbol::T(terminal)) => {
                        let target = transitions[state][&Symbol::T(terminal)];
                        (terminal, Action::Shift(target))
                    }
                    Some(Symbol::N(_)) => continue,
                    None if item.rule == Rule::Accept => (Terminal::Eof, Action::Accept),
                    None => (item.lookahead, Action::Reduce(item.rule.index() as u16)),
                };

                let cell = &mut actions[state][terminal.index()];
                let (kept, dropped) = resolve(*cell, action);
                if let Some(dropped) = dropped {
                    tracing::warn!(state, %terminal, ?kept, ?dropped, "grammar conflict resolved");
                    conflicts.push(Conflict::new(state as u32, terminal, kept, dropped));
                }
                *cell = kept;
            }

            for (symbol, target) in &transitions[state] {
                if let Symbol::N(non_terminal) = symbol {
                    gotos[state][non_terminal.index()] = Some(*target);
                }
            }
        }

        ParseTable {
            fingerprint: Fingerprint::of_grammar(),
            actions,
            gotos,
            conflicts,
        }
    }
}

/// Fixed conflict policy, returns the kept action and the dropped one (if there was a conflict)
fn resolve(existing: Action, new: Action) -> (Action, Option<Action>) {
    match (existing, new) {
        (Action::Error, new) => (new, None),
        (existing, new) if existing == new => (existing, None),
        (Action::Accept, other) | (other, Action::Accept) => (Action::Accept, Some(other)),
        (Action::Shift(_), Action::Reduce(_)) => (existing, Some(new)),
        (Action::Reduce(_), Action::Shift(_)) => (new, Some(existing)),
        (Action::Reduce(a), Action::Reduce(b)) => {
            (Action::Reduce(a.min(b)), Some(Action::Reduce(a.max(b))))
        }
        (existing, new) => (existing, Some(new)),
    }
}
