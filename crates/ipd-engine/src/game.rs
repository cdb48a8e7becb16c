//! Match execution engine

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::TurnBounds;
use crate::error::{EngineError, Result};
use crate::history::{History, Side, Turn};
use crate::payoff;
use crate::strategy::{Decision, Strategy};

/// Which side came out ahead
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    FirstWins,
    SecondWins,
    Tie,
}

impl Outcome {
    /// Tie only on exactly equal scores
    pub fn from_scores(first: u64, second: u64) -> Self {
        match first.cmp(&second) {
            std::cmp::Ordering::Greater => Outcome::FirstWins,
            std::cmp::Ordering::Less => Outcome::SecondWins,
            std::cmp::Ordering::Equal => Outcome::Tie,
        }
    }

    pub fn winner(self) -> Option<Side> {
        match self {
            Outcome::FirstWins => Some(Side::First),
            Outcome::SecondWins => Some(Side::Second),
            Outcome::Tie => None,
        }
    }

    /// Bucket in a `[first wins, second wins, ties]` record
    pub fn record_index(self) -> usize {
        match self {
            Outcome::FirstWins => 0,
            Outcome::SecondWins => 1,
            Outcome::Tie => 2,
        }
    }
}

/// Result of a single turn
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub turn: u32,
    pub first: Decision,
    pub second: Decision,
    pub payoff_first: u32,
    pub payoff_second: u32,
    pub cumulative_first: u32,
    pub cumulative_second: u32,
}

/// Result of a complete match
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub rounds: Vec<RoundResult>,
    /// Decision pairs in seat order, exactly `turn_count` long
    pub history: Vec<Turn>,
    pub total_score_first: u32,
    pub total_score_second: u32,
    pub outcome: Outcome,
    pub turn_count: u32,
}

impl MatchResult {
    pub fn scores(&self) -> [u32; 2] {
        [self.total_score_first, self.total_score_second]
    }

    pub fn score(&self, side: Side) -> u32 {
        self.scores()[side.index()]
    }

    /// Cooperations by each side
    pub fn cooperation_counts(&self) -> [u32; 2] {
        let mut counts = [0u32; 2];
        for turn in &self.history {
            for side in Side::BOTH {
                if turn.decision(side).is_cooperate() {
                    counts[side.index()] += 1;
                }
            }
        }
        counts
    }
}

enum MatchState {
    Configured,
    Completed(MatchResult),
}

/// One pairing played for a fixed number of turns
///
/// Construction validates the turn count; results are only available after
/// [`Match::run`].
pub struct Match {
    strategies: [Box<dyn Strategy>; 2],
    turns: u32,
    state: MatchState,
}

impl Match {
    pub fn new(
        first: Box<dyn Strategy>,
        second: Box<dyn Strategy>,
        turns: u32,
        bounds: &TurnBounds,
    ) -> Result<Self> {
        bounds.check(turns)?;
        Ok(Self {
            strategies: [first, second],
            turns,
            state: MatchState::Configured,
        })
    }

    pub fn turns(&self) -> u32 {
        self.turns
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, MatchState::Completed(_))
    }

    /// Play every turn. A match runs once.
    pub fn run(&mut self) -> Result<&MatchResult> {
        if self.is_complete() {
            return Err(EngineError::AlreadyRun { stage: "match" });
        }

        let result = self.play();
        self.state = MatchState::Completed(result);
        self.result()
    }

    pub fn result(&self) -> Result<&MatchResult> {
        match &self.state {
            MatchState::Completed(result) => Ok(result),
            MatchState::Configured => Err(EngineError::NotRun { stage: "match" }),
        }
    }

    pub fn into_result(self) -> Result<MatchResult> {
        match self.state {
            MatchState::Completed(result) => Ok(result),
            MatchState::Configured => Err(EngineError::NotRun { stage: "match" }),
        }
    }

    pub fn scores(&self) -> Result<[u32; 2]> {
        Ok(self.result()?.scores())
    }

    pub fn winner(&self) -> Result<Outcome> {
        Ok(self.result()?.outcome)
    }

    pub fn history(&self) -> Result<&[Turn]> {
        Ok(&self.result()?.history)
    }

    fn play(&mut self) -> MatchResult {
        let capacity = self.turns as usize;
        let mut history: Vec<Turn> = Vec::with_capacity(capacity);
        let mut rounds: Vec<RoundResult> = Vec::with_capacity(capacity);
        let mut total_first = 0u32;
        let mut total_second = 0u32;

        for turn in 0..self.turns {
            // Both sides decide on the same completed prefix
            let first = self.strategies[0].choose(&History::new(&history, Side::First));
            let second = self.strategies[1].choose(&History::new(&history, Side::Second));

            let (payoff_first, payoff_second) = payoff(first, second);
            total_first += payoff_first;
            total_second += payoff_second;

            rounds.push(RoundResult {
                turn,
                first,
                second,
                payoff_first,
                payoff_second,
                cumulative_first: total_first,
                cumulative_second: total_second,
            });
            history.push(Turn::new(first, second));
        }

        let outcome = Outcome::from_scores(total_first as u64, total_second as u64);
        trace!(turns = self.turns, total_first, total_second, ?outcome, "match complete");

        MatchResult {
            rounds,
            history,
            total_score_first: total_first,
            total_score_second: total_second,
            outcome,
            turn_count: self.turns,
        }
    }
}

/// Build, run and unwrap a match in one call
pub fn run_match(
    first: Box<dyn Strategy>,
    second: Box<dyn Strategy>,
    turns: u32,
    bounds: &TurnBounds,
) -> Result<MatchResult> {
    let mut game = Match::new(first, second, turns, bounds)?;
    game.run()?;
    game.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SeedSource;
    use crate::strategy::{
        AlwaysCooperate, AlwaysDefect, GrudgeHolder, RandomChoice, StrategyKind, TitForTat,
    };
    use crate::StrategyFactory;
    use Decision::{Cooperate as C, Defect as D};

    fn relaxed() -> TurnBounds {
        TurnBounds::relaxed()
    }

    /// Defects exactly on turn `at`
    struct DefectOnce {
        at: usize,
    }

    impl Strategy for DefectOnce {
        fn choose(&mut self, history: &History<'_>) -> Decision {
            if history.len() == self.at {
                D
            } else {
                C
            }
        }
    }

    /// Records the visible history length at every call
    struct LengthProbe {
        seen: std::sync::Arc<std::sync::Mutex<Vec<usize>>>,
    }

    impl Strategy for LengthProbe {
        fn choose(&mut self, history: &History<'_>) -> Decision {
            self.seen.lock().unwrap().push(history.len());
            C
        }
    }

    #[test]
    fn test_turn_count_validated() {
        let bounds = TurnBounds::standard();
        let err = Match::new(Box::new(TitForTat), Box::new(TitForTat), 9, &bounds).err();
        assert_eq!(err, Some(EngineError::TurnCountOutOfRange { turns: 9, min: 10, max: 599 }));
        assert!(Match::new(Box::new(TitForTat), Box::new(TitForTat), 600, &bounds).is_err());
        assert!(Match::new(Box::new(TitForTat), Box::new(TitForTat), 10, &bounds).is_ok());
    }

    #[test]
    fn test_results_unavailable_before_run() {
        let game = Match::new(Box::new(TitForTat), Box::new(TitForTat), 20, &relaxed()).unwrap();
        assert!(!game.is_complete());
        assert_eq!(game.scores(), Err(EngineError::NotRun { stage: "match" }));
        assert!(game.winner().is_err());
        assert!(game.history().is_err());
    }

    #[test]
    fn test_run_twice_rejected() {
        let mut game = Match::new(Box::new(TitForTat), Box::new(TitForTat), 20, &relaxed()).unwrap();
        assert!(game.run().is_ok());
        assert_eq!(game.run().err(), Some(EngineError::AlreadyRun { stage: "match" }));
    }

    #[test]
    fn test_grudge_vs_cooperate_five_turns_is_tie() {
        let result = run_match(Box::new(GrudgeHolder::default()), Box::new(AlwaysCooperate), 5, &relaxed()).unwrap();
        assert_eq!(result.scores(), [15, 15]);
        assert_eq!(result.outcome, Outcome::Tie);
        assert_eq!(result.outcome.winner(), None);
    }

    #[test]
    fn test_defect_vs_cooperate_single_turn() {
        let result = run_match(Box::new(AlwaysDefect), Box::new(AlwaysCooperate), 1, &relaxed()).unwrap();
        assert_eq!(result.scores(), [5, 0]);
        assert_eq!(result.outcome, Outcome::FirstWins);
    }

    #[test]
    fn test_defect_vs_cooperate() {
        let result = run_match(Box::new(AlwaysDefect), Box::new(AlwaysCooperate), 30, &relaxed()).unwrap();

        for round in &result.rounds {
            assert_eq!(round.first, D);
            assert_eq!(round.second, C);
            assert_eq!(round.payoff_first, 5);
            assert_eq!(round.payoff_second, 0);
        }
        assert_eq!(result.total_score_first, 150);
        assert_eq!(result.total_score_second, 0);
    }

    #[test]
    fn test_second_side_wins() {
        let result = run_match(Box::new(AlwaysCooperate), Box::new(AlwaysDefect), 10, &relaxed()).unwrap();
        assert_eq!(result.outcome, Outcome::SecondWins);
        assert_eq!(result.score(Side::Second), 50);
    }

    #[test]
    fn test_tft_vs_tft() {
        let result = run_match(Box::new(TitForTat), Box::new(TitForTat), 50, &relaxed()).unwrap();
        for round in &result.rounds {
            assert_eq!(round.first, C);
            assert_eq!(round.second, C);
        }
        assert_eq!(result.outcome, Outcome::Tie);
    }

    #[test]
    fn test_tft_vs_always_defect() {
        let result = run_match(Box::new(TitForTat), Box::new(AlwaysDefect), 20, &relaxed()).unwrap();

        // Turn 0: TFT cooperates, AD defects
        assert_eq!(result.rounds[0].first, C);
        assert_eq!(result.rounds[0].second, D);

        // Turn 1+: TFT retaliates, both defect
        for round in result.rounds.iter().skip(1) {
            assert_eq!(round.first, D);
            assert_eq!(round.second, D);
        }
        assert_eq!(result.scores(), [19, 24]);
    }

    #[test]
    fn test_second_side_sees_mirrored_history() {
        // TFT in seat 1 must answer seat 0's decisions, not its own
        let result = run_match(Box::new(AlwaysDefect), Box::new(TitForTat), 3, &relaxed()).unwrap();
        let seconds: Vec<_> = result.rounds.iter().map(|r| r.second).collect();
        assert_eq!(seconds, vec![C, D, D]);
    }

    #[test]
    fn test_grudge_reacts_after_single_defection() {
        let k = 4;
        let result = run_match(
            Box::new(GrudgeHolder::default()),
            Box::new(DefectOnce { at: k }),
            12,
            &relaxed(),
        )
        .unwrap();
        for round in &result.rounds {
            let expected = if (round.turn as usize) <= k { C } else { D };
            assert_eq!(round.first, expected, "turn {}", round.turn);
        }
    }

    #[test]
    fn test_visible_history_length_equals_turn() {
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let probe = LengthProbe { seen: seen.clone() };
        let result = run_match(Box::new(probe), Box::new(AlwaysCooperate), 15, &relaxed()).unwrap();

        assert_eq!(*seen.lock().unwrap(), (0..15).collect::<Vec<_>>());
        assert_eq!(result.history.len(), 15);
        assert_eq!(result.turn_count, 15);
    }

    #[test]
    fn test_cumulative_scores() {
        let rng = SeedSource::new(42);
        let result = run_match(
            Box::new(RandomChoice::new(rng.rng(0))),
            Box::new(TitForTat),
            40,
            &relaxed(),
        )
        .unwrap();

        let mut expected_first = 0u32;
        let mut expected_second = 0u32;
        for round in &result.rounds {
            expected_first += round.payoff_first;
            expected_second += round.payoff_second;
            assert_eq!(round.cumulative_first, expected_first);
            assert_eq!(round.cumulative_second, expected_second);
        }
        assert_eq!(result.scores(), [expected_first, expected_second]);
    }

    #[test]
    fn test_match_determinism() {
        let seeds = SeedSource::new(7);
        let play = || {
            run_match(
                StrategyKind::RandomChoice.build(seeds.rng(0)),
                StrategyKind::joss().build(seeds.rng(1)),
                100,
                &relaxed(),
            )
            .unwrap()
        };
        assert_eq!(play(), play());
    }

    #[test]
    fn test_cooperation_counts() {
        let result = run_match(Box::new(TitForTat), Box::new(AlwaysDefect), 10, &relaxed()).unwrap();
        assert_eq!(result.cooperation_counts(), [1, 0]);
    }

    #[test]
    fn test_outcome_helpers() {
        assert_eq!(Outcome::from_scores(3, 3), Outcome::Tie);
        assert_eq!(Outcome::from_scores(4, 3).record_index(), 0);
        assert_eq!(Outcome::from_scores(2, 3).winner(), Some(Side::Second));
    }
}
