//! Turn history and per-player views over it
//!
//! A match stores one canonical sequence of [`Turn`]s in seat order. Strategies
//! never see that sequence directly: each gets a [`History`] view that puts its
//! own decision first and its opponent's second, limited to the turns already
//! completed.

use serde::{Deserialize, Serialize};

use crate::strategy::Decision;

/// Seat in a match
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Side 0
    First,
    /// Side 1
    Second,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::First, Side::Second];

    pub fn index(self) -> usize {
        match self {
            Side::First => 0,
            Side::Second => 1,
        }
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }
}

/// Decisions of both seats in one completed turn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub first: Decision,
    pub second: Decision,
}

impl Turn {
    pub fn new(first: Decision, second: Decision) -> Self {
        Self { first, second }
    }

    /// Decision made by `side`
    pub fn decision(&self, side: Side) -> Decision {
        match side {
            Side::First => self.first,
            Side::Second => self.second,
        }
    }

    /// `(own, opponent)` as seen from `viewer`
    pub fn oriented(&self, viewer: Side) -> (Decision, Decision) {
        (self.decision(viewer), self.decision(viewer.opponent()))
    }
}

/// Read-only, viewer-oriented window over completed turns
#[derive(Clone, Copy, Debug)]
pub struct History<'a> {
    turns: &'a [Turn],
    viewer: Side,
}

impl<'a> History<'a> {
    pub fn new(turns: &'a [Turn], viewer: Side) -> Self {
        Self { turns, viewer }
    }

    pub fn viewer(&self) -> Side {
        self.viewer
    }

    /// Turns played so far
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// `(own, opponent)` for turn `index`
    pub fn get(&self, index: usize) -> Option<(Decision, Decision)> {
        self.turns.get(index).map(|t| t.oriented(self.viewer))
    }

    pub fn last(&self) -> Option<(Decision, Decision)> {
        self.turns.last().map(|t| t.oriented(self.viewer))
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Decision, Decision)> + 'a {
        let (turns, viewer) = (self.turns, self.viewer);
        turns.iter().map(move |t| t.oriented(viewer))
    }

    pub fn my_decisions(&self) -> impl DoubleEndedIterator<Item = Decision> + 'a {
        let (turns, viewer) = (self.turns, self.viewer);
        turns.iter().map(move |t| t.decision(viewer))
    }

    pub fn opponent_decisions(&self) -> impl DoubleEndedIterator<Item = Decision> + 'a {
        let (turns, opponent) = (self.turns, self.viewer.opponent());
        turns.iter().map(move |t| t.decision(opponent))
    }

    pub fn my_last(&self) -> Option<Decision> {
        self.last().map(|(mine, _)| mine)
    }

    pub fn opponent_last(&self) -> Option<Decision> {
        self.last().map(|(_, theirs)| theirs)
    }

    pub fn my_defections(&self) -> usize {
        self.my_decisions().filter(|d| d.is_defect()).count()
    }

    pub fn opponent_defections(&self) -> usize {
        self.opponent_decisions().filter(|d| d.is_defect()).count()
    }

    pub fn opponent_ever_defected(&self) -> bool {
        self.opponent_decisions().any(|d| d.is_defect())
    }

    /// Same turns seen from the other seat
    pub fn swapped(&self) -> History<'a> {
        History::new(self.turns, self.viewer.opponent())
    }
}
