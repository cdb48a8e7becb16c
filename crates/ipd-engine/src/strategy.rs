//! Strategy definitions and factories

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::history::History;
use crate::random::StrategyRng;

/// A decision in the Prisoner's Dilemma
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Cooperate,
    Defect,
}

impl Decision {
    pub fn is_cooperate(self) -> bool {
        self == Decision::Cooperate
    }

    pub fn is_defect(self) -> bool {
        self == Decision::Defect
    }

    /// Row/column in [`PAYOFF_MATRIX`](crate::PAYOFF_MATRIX)
    pub fn index(self) -> usize {
        match self {
            Decision::Cooperate => 0,
            Decision::Defect => 1,
        }
    }

    pub fn flip(self) -> Self {
        match self {
            Decision::Cooperate => Decision::Defect,
            Decision::Defect => Decision::Cooperate,
        }
    }
}

/// Decision rule for one seat of one match.
///
/// Implementations may keep private state, but an instance lives for exactly
/// one match: series and tournaments build a fresh one per match through a
/// [`StrategyFactory`].
pub trait Strategy: Send {
    /// Pick this turn's decision from the turns completed so far.
    fn choose(&mut self, history: &History<'_>) -> Decision;
}

/// Builds fresh [`Strategy`] instances
pub trait StrategyFactory: Send + Sync {
    /// Display name used in reports
    fn name(&self) -> &str;

    /// New instance for one match; `rng` is that seat's private stream
    fn build(&self, rng: StrategyRng) -> Box<dyn Strategy>;
}

/// Factory backed by a closure
pub struct FnFactory<F> {
    name: String,
    make: F,
}

impl<F> FnFactory<F>
where
    F: Fn(StrategyRng) -> Box<dyn Strategy> + Send + Sync,
{
    pub fn new(name: impl Into<String>, make: F) -> Self {
        Self { name: name.into(), make }
    }
}

impl<F> StrategyFactory for FnFactory<F>
where
    F: Fn(StrategyRng) -> Box<dyn Strategy> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn build(&self, rng: StrategyRng) -> Box<dyn Strategy> {
        (self.make)(rng)
    }
}

// ── Built-in strategies ──────────────────────────────────────────────

/// Always cooperate, never defect.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysCooperate;

impl Strategy for AlwaysCooperate {
    fn choose(&mut self, _history: &History<'_>) -> Decision {
        Decision::Cooperate
    }
}

/// Always defect, never cooperate.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysDefect;

impl Strategy for AlwaysDefect {
    fn choose(&mut self, _history: &History<'_>) -> Decision {
        Decision::Defect
    }
}

/// Cooperate until the opponent defects once, then always defect.
#[derive(Clone, Copy, Debug, Default)]
pub struct GrudgeHolder {
    triggered: bool,
}

impl Strategy for GrudgeHolder {
    fn choose(&mut self, history: &History<'_>) -> Decision {
        if !self.triggered && history.opponent_ever_defected() {
            self.triggered = true;
        }
        if self.triggered {
            Decision::Defect
        } else {
            Decision::Cooperate
        }
    }
}

/// Uniformly random choice each turn.
#[derive(Clone, Debug)]
pub struct RandomChoice {
    rng: StrategyRng,
}

impl RandomChoice {
    pub fn new(rng: StrategyRng) -> Self {
        Self { rng }
    }
}

impl Strategy for RandomChoice {
    fn choose(&mut self, _history: &History<'_>) -> Decision {
        if self.rng.gen::<bool>() {
            Decision::Cooperate
        } else {
            Decision::Defect
        }
    }
}

/// Copy the opponent's last decision, start with cooperate.
#[derive(Clone, Copy, Debug, Default)]
pub struct TitForTat;

impl Strategy for TitForTat {
    fn choose(&mut self, history: &History<'_>) -> Decision {
        history.opponent_last().unwrap_or(Decision::Cooperate)
    }
}

/// Tit-for-Tat that sometimes defects after the opponent cooperated.
#[derive(Clone, Debug)]
pub struct Joss {
    rng: StrategyRng,
    defect_probability: f64,
}

impl Joss {
    pub const DEFAULT_DEFECT_PROBABILITY: f64 = 0.1;

    pub fn new(rng: StrategyRng, defect_probability: f64) -> Self {
        Self { rng, defect_probability }
    }
}

impl Strategy for Joss {
    fn choose(&mut self, history: &History<'_>) -> Decision {
        match history.opponent_last() {
            // Opening move is never randomized
            None => Decision::Cooperate,
            Some(Decision::Defect) => Decision::Defect,
            Some(Decision::Cooperate) => {
                if self.rng.gen::<f64>() < self.defect_probability {
                    Decision::Defect
                } else {
                    Decision::Cooperate
                }
            }
        }
    }
}

/// Tit-for-Tat but start with defect.
#[derive(Clone, Copy, Debug, Default)]
pub struct SuspiciousTitForTat;

impl Strategy for SuspiciousTitForTat {
    fn choose(&mut self, history: &History<'_>) -> Decision {
        history.opponent_last().unwrap_or(Decision::Defect)
    }
}

/// Defect only if the opponent defected twice in a row.
#[derive(Clone, Copy, Debug, Default)]
pub struct TitForTwoTats;

impl Strategy for TitForTwoTats {
    fn choose(&mut self, history: &History<'_>) -> Decision {
        let mut recent = history.opponent_decisions().rev();
        match (recent.next(), recent.next()) {
            (Some(Decision::Defect), Some(Decision::Defect)) => Decision::Defect,
            _ => Decision::Cooperate,
        }
    }
}

/// Win-stay, lose-switch
/// - If last turn paid 3+ points, repeat the decision
/// - Otherwise switch
#[derive(Clone, Copy, Debug, Default)]
pub struct Pavlov;

impl Strategy for Pavlov {
    fn choose(&mut self, history: &History<'_>) -> Decision {
        let Some((mine, theirs)) = history.last() else {
            return Decision::Cooperate;
        };
        let (my_score, _) = crate::payoff(mine, theirs);
        if my_score >= 3 {
            mine
        } else {
            mine.flip()
        }
    }
}

/// Escalating retaliation.
/// After N opponent defections, own defections catch up to N(N+1)/2.
#[derive(Clone, Copy, Debug, Default)]
pub struct Gradual;

impl Strategy for Gradual {
    fn choose(&mut self, history: &History<'_>) -> Decision {
        let theirs = history.opponent_defections();
        let expected = theirs * (theirs + 1) / 2;

        if history.my_defections() < expected {
            Decision::Defect
        } else {
            Decision::Cooperate
        }
    }
}

// ── Built-in factory ─────────────────────────────────────────────────

/// Built-in strategy type, usable directly as a factory
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum StrategyKind {
    AlwaysCooperate,
    AlwaysDefect,
    GrudgeHolder,
    RandomChoice,
    TitForTat,
    Joss { defect_probability: f64 },
    SuspiciousTitForTat,
    TitForTwoTats,
    Pavlov,
    Gradual,
}

impl StrategyKind {
    /// Every built-in, Joss at its default probability
    pub const ALL: [StrategyKind; 10] = [
        StrategyKind::AlwaysCooperate,
        StrategyKind::AlwaysDefect,
        StrategyKind::GrudgeHolder,
        StrategyKind::RandomChoice,
        StrategyKind::TitForTat,
        StrategyKind::Joss { defect_probability: Joss::DEFAULT_DEFECT_PROBABILITY },
        StrategyKind::SuspiciousTitForTat,
        StrategyKind::TitForTwoTats,
        StrategyKind::Pavlov,
        StrategyKind::Gradual,
    ];

    pub fn joss() -> Self {
        StrategyKind::Joss { defect_probability: Joss::DEFAULT_DEFECT_PROBABILITY }
    }

    pub fn joss_with(defect_probability: f64) -> Result<Self> {
        let kind = StrategyKind::Joss { defect_probability };
        kind.validate()?;
        Ok(kind)
    }

    pub fn validate(&self) -> Result<()> {
        if let StrategyKind::Joss { defect_probability } = *self {
            if !(0.0..=1.0).contains(&defect_probability) {
                return Err(EngineError::InvalidProbability(defect_probability));
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::AlwaysCooperate => "AlwaysCooperate",
            StrategyKind::AlwaysDefect => "AlwaysDefect",
            StrategyKind::GrudgeHolder => "GrudgeHolder",
            StrategyKind::RandomChoice => "RandomChoice",
            StrategyKind::TitForTat => "TitForTat",
            StrategyKind::Joss { .. } => "Joss",
            StrategyKind::SuspiciousTitForTat => "SuspiciousTitForTat",
            StrategyKind::TitForTwoTats => "TitForTwoTats",
            StrategyKind::Pavlov => "Pavlov",
            StrategyKind::Gradual => "Gradual",
        }
    }

    /// Human-readable description
    pub fn describe(&self) -> String {
        let base = match self {
            StrategyKind::AlwaysCooperate => "Never defects. Always cooperates.",
            StrategyKind::AlwaysDefect => "Never cooperates. Always defects.",
            StrategyKind::GrudgeHolder => "Cooperates until betrayed once, then always defects.",
            StrategyKind::RandomChoice => "Cooperates or defects with equal chance each turn.",
            StrategyKind::TitForTat => "Copies opponent's last move. Starts by cooperating.",
            StrategyKind::Joss { .. } => "Like Tit for Tat, but sometimes defects instead of cooperating.",
            StrategyKind::SuspiciousTitForTat => "Like Tit for Tat, but starts with defect.",
            StrategyKind::TitForTwoTats => "Only retaliates after two consecutive defections.",
            StrategyKind::Pavlov => "Repeats move if outcome was good, switches if bad.",
            StrategyKind::Gradual => "Retaliates with increasing severity, then forgives.",
        };

        match self {
            StrategyKind::Joss { defect_probability } => {
                format!("{} {:.0}% chance to defect.", base, defect_probability * 100.0)
            }
            _ => base.to_string(),
        }
    }

    /// Fresh instance for one match
    pub fn instantiate(&self, rng: StrategyRng) -> Box<dyn Strategy> {
        match *self {
            StrategyKind::AlwaysCooperate => Box::new(AlwaysCooperate),
            StrategyKind::AlwaysDefect => Box::new(AlwaysDefect),
            StrategyKind::GrudgeHolder => Box::new(GrudgeHolder::default()),
            StrategyKind::RandomChoice => Box::new(RandomChoice::new(rng)),
            StrategyKind::TitForTat => Box::new(TitForTat),
            StrategyKind::Joss { defect_probability } => Box::new(Joss::new(rng, defect_probability)),
            StrategyKind::SuspiciousTitForTat => Box::new(SuspiciousTitForTat),
            StrategyKind::TitForTwoTats => Box::new(TitForTwoTats),
            StrategyKind::Pavlov => Box::new(Pavlov),
            StrategyKind::Gradual => Box::new(Gradual),
        }
    }
}

impl StrategyFactory for StrategyKind {
    fn name(&self) -> &str {
        StrategyKind::name(self)
    }

    fn build(&self, rng: StrategyRng) -> Box<dyn Strategy> {
        self.instantiate(rng)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts `TitForTat`, `tit-for-tat`, `tit_for_tat` and friends.
/// Joss takes an optional probability: `joss:0.25`.
impl FromStr for StrategyKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let (name, arg) = match s.split_once(':') {
            Some((name, arg)) => (name, Some(arg.trim())),
            None => (s, None),
        };
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();

        let kind = match key.as_str() {
            "alwayscooperate" | "gullible" => StrategyKind::AlwaysCooperate,
            "alwaysdefect" => StrategyKind::AlwaysDefect,
            "grudgeholder" | "holdsgrudge" | "grimtrigger" => StrategyKind::GrudgeHolder,
            "randomchoice" | "random" => StrategyKind::RandomChoice,
            "titfortat" | "tft" => StrategyKind::TitForTat,
            "joss" => match arg {
                Some(arg) => {
                    let p: f64 = arg
                        .parse()
                        .map_err(|_| EngineError::UnknownStrategy(s.to_string()))?;
                    StrategyKind::joss_with(p)?
                }
                None => StrategyKind::joss(),
            },
            "suspicioustitfortat" => StrategyKind::SuspiciousTitForTat,
            "titfortwotats" => StrategyKind::TitForTwoTats,
            "pavlov" => StrategyKind::Pavlov,
            "gradual" => StrategyKind::Gradual,
            _ => return Err(EngineError::UnknownStrategy(s.to_string())),
        };

        if arg.is_some() && !matches!(kind, StrategyKind::Joss { .. }) {
            return Err(EngineError::UnknownStrategy(s.to_string()));
        }
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{Side, Turn};
    use crate::random::SeedSource;
    use Decision::{Cooperate as C, Defect as D};

    fn make_rng() -> StrategyRng {
        SeedSource::new(42).rng(0)
    }

    /// Turns as seen by side 0: (mine, theirs)
    fn turns(pairs: &[(Decision, Decision)]) -> Vec<Turn> {
        pairs.iter().map(|&(a, b)| Turn::new(a, b)).collect()
    }

    fn choose(strategy: &mut dyn Strategy, pairs: &[(Decision, Decision)]) -> Decision {
        let turns = turns(pairs);
        strategy.choose(&History::new(&turns, Side::First))
    }

    #[test]
    fn test_tit_for_tat_first_move() {
        assert_eq!(choose(&mut TitForTat, &[]), C);
    }

    #[test]
    fn test_tit_for_tat_copies() {
        assert_eq!(choose(&mut TitForTat, &[(C, C)]), C);
        assert_eq!(choose(&mut TitForTat, &[(C, D)]), D);
        assert_eq!(choose(&mut TitForTat, &[(C, D), (D, C)]), C);
    }

    #[test]
    fn test_tit_for_tat_reads_opponent_column_for_second_side() {
        // Side 1 sees the swapped view: its opponent is side 0.
        let turns = turns(&[(D, C)]);
        let view = History::new(&turns, Side::Second);
        assert_eq!(TitForTat.choose(&view), D);
    }

    #[test]
    fn test_always_defect() {
        for _ in 0..10 {
            assert_eq!(choose(&mut AlwaysDefect, &[(C, C)]), D);
        }
    }

    #[test]
    fn test_always_cooperate() {
        assert_eq!(choose(&mut AlwaysCooperate, &[]), C);
        assert_eq!(choose(&mut AlwaysCooperate, &[(C, D), (C, D)]), C);
    }

    #[test]
    fn test_grudge_holder() {
        let mut s = GrudgeHolder::default();
        assert_eq!(choose(&mut s, &[(C, C), (C, C)]), C);

        // Any defection anywhere in history triggers it
        let mut s = GrudgeHolder::default();
        assert_eq!(choose(&mut s, &[(C, D), (C, C), (C, C)]), D);
    }

    #[test]
    fn test_grudge_holder_never_forgives() {
        let mut s = GrudgeHolder::default();
        assert_eq!(choose(&mut s, &[(C, D)]), D);
        // Even shown a clean history, the triggered instance keeps defecting
        assert_eq!(choose(&mut s, &[]), D);
        // A fresh instance does not
        assert_eq!(choose(&mut GrudgeHolder::default(), &[]), C);
    }

    #[test]
    fn test_random_choice_produces_both() {
        let mut s = RandomChoice::new(make_rng());
        let picks: Vec<_> = (0..200).map(|_| choose(&mut s, &[])).collect();
        assert!(picks.contains(&C));
        assert!(picks.contains(&D));
    }

    #[test]
    fn test_random_choice_reproducible() {
        let mut a = RandomChoice::new(make_rng());
        let mut b = RandomChoice::new(make_rng());
        for _ in 0..50 {
            assert_eq!(choose(&mut a, &[]), choose(&mut b, &[]));
        }
    }

    #[test]
    fn test_joss_zero_probability_is_tit_for_tat() {
        let mut s = Joss::new(make_rng(), 0.0);
        assert_eq!(choose(&mut s, &[]), C);
        assert_eq!(choose(&mut s, &[(C, C)]), C);
        assert_eq!(choose(&mut s, &[(C, D)]), D);
    }

    #[test]
    fn test_joss_opens_with_cooperate() {
        for seed in 0..1000 {
            let mut s = Joss::new(SeedSource::new(seed).rng(0), Joss::DEFAULT_DEFECT_PROBABILITY);
            assert_eq!(choose(&mut s, &[]), C, "seed {}", seed);
        }
        let mut s = Joss::new(make_rng(), 1.0);
        assert_eq!(choose(&mut s, &[]), C);
    }

    #[test]
    fn test_joss_full_probability_always_defects() {
        let mut s = Joss::new(make_rng(), 1.0);
        for _ in 0..20 {
            assert_eq!(choose(&mut s, &[(C, C)]), D);
        }
    }

    #[test]
    fn test_joss_retaliation_is_not_random() {
        // TFT would defect here, so no draw can turn it into cooperation
        let mut s = Joss::new(make_rng(), 0.5);
        for _ in 0..50 {
            assert_eq!(choose(&mut s, &[(C, D)]), D);
        }
    }

    #[test]
    fn test_joss_default_rate_statistical() {
        let mut s = Joss::new(make_rng(), Joss::DEFAULT_DEFECT_PROBABILITY);
        let defects = (0..10_000)
            .filter(|_| choose(&mut s, &[(C, C)]) == D)
            .count();
        assert!(defects > 800 && defects < 1200, "defects = {}", defects);
    }

    #[test]
    fn test_suspicious_tft_starts_defect() {
        assert_eq!(choose(&mut SuspiciousTitForTat, &[]), D);
        assert_eq!(choose(&mut SuspiciousTitForTat, &[(D, C)]), C);
    }

    #[test]
    fn test_tit_for_two_tats() {
        assert_eq!(choose(&mut TitForTwoTats, &[(C, C), (C, D)]), C);
        assert_eq!(choose(&mut TitForTwoTats, &[(C, D), (C, D)]), D);
        assert_eq!(choose(&mut TitForTwoTats, &[(C, D)]), C);
    }

    #[test]
    fn test_pavlov_win_stay() {
        assert_eq!(choose(&mut Pavlov, &[]), C);
        // Both cooperated (3 points) - stay
        assert_eq!(choose(&mut Pavlov, &[(C, C)]), C);
        // We defected, they cooperated (5 points) - stay
        assert_eq!(choose(&mut Pavlov, &[(D, C)]), D);
    }

    #[test]
    fn test_pavlov_lose_switch() {
        // Sucker's payoff - switch to defect
        assert_eq!(choose(&mut Pavlov, &[(C, D)]), D);
        // Mutual defection - switch to cooperate
        assert_eq!(choose(&mut Pavlov, &[(D, D)]), C);
    }

    #[test]
    fn test_gradual_escalates() {
        // One opponent defection -> one retaliation owed
        assert_eq!(choose(&mut Gradual, &[(C, D)]), D);
        assert_eq!(choose(&mut Gradual, &[(C, D), (D, C)]), C);
        // Two defections -> three retaliations owed
        assert_eq!(choose(&mut Gradual, &[(C, D), (D, D), (D, C)]), D);
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("TitForTat".parse::<StrategyKind>().unwrap(), StrategyKind::TitForTat);
        assert_eq!("tit-for-tat".parse::<StrategyKind>().unwrap(), StrategyKind::TitForTat);
        assert_eq!("grudge_holder".parse::<StrategyKind>().unwrap(), StrategyKind::GrudgeHolder);
        assert_eq!("gullible".parse::<StrategyKind>().unwrap(), StrategyKind::AlwaysCooperate);
        assert_eq!("joss".parse::<StrategyKind>().unwrap(), StrategyKind::joss());
        assert_eq!(
            "joss:0.25".parse::<StrategyKind>().unwrap(),
            StrategyKind::Joss { defect_probability: 0.25 }
        );
    }

    #[test]
    fn test_kind_parsing_errors() {
        assert_eq!(
            "nonsense".parse::<StrategyKind>(),
            Err(EngineError::UnknownStrategy("nonsense".to_string()))
        );
        assert_eq!("joss:1.5".parse::<StrategyKind>(), Err(EngineError::InvalidProbability(1.5)));
        assert!("pavlov:0.5".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_kind_names_round_trip_through_parse() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.name().parse::<StrategyKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_describe_mentions_joss_rate() {
        assert!(StrategyKind::joss().describe().contains("10% chance to defect"));
        assert!(!StrategyKind::TitForTat.describe().contains('%'));
    }

    #[test]
    fn test_fn_factory() {
        let factory = FnFactory::new("Stubborn", |_rng| Box::new(AlwaysDefect) as Box<dyn Strategy>);
        assert_eq!(factory.name(), "Stubborn");
        let mut s = factory.build(make_rng());
        assert_eq!(choose(s.as_mut(), &[]), D);
    }
}
