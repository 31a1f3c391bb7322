//! Round and series outcome rules.
//!
//! Everything here is a pure function over a [`GameRecord`] and the [`GlobalSettings`] counters
//! it feeds; the only nondeterminism is the CPU throw, drawn from a [`ChoiceSource`].

use std::{collections::VecDeque, fmt, str::FromStr};

use rand::{
    Rng, SeedableRng,
    distr::{Distribution, StandardUniform},
    rngs::StdRng,
};
use thiserror::Error;
use time::OffsetDateTime;

use crate::{
    error::ServiceError,
    state::document::{GameRecord, GameWinner, GlobalSettings},
};

/// One of the three throws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Choice {
    /// Beats scissor.
    Rock,
    /// Beats rock.
    Paper,
    /// Beats paper.
    Scissor,
}

impl Choice {
    /// Every throw, in display order.
    pub const ALL: [Choice; 3] = [Choice::Rock, Choice::Paper, Choice::Scissor];

    /// The throw this one defeats.
    pub fn beats(self) -> Choice {
        match self {
            Choice::Rock => Choice::Scissor,
            Choice::Paper => Choice::Rock,
            Choice::Scissor => Choice::Paper,
        }
    }

    /// Lowercase name used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Choice::Rock => "rock",
            Choice::Paper => "paper",
            Choice::Scissor => "scissor",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text that does not name a throw.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{0}` is not one of rock, paper or scissor")]
pub struct ParseChoiceError(pub String);

impl FromStr for Choice {
    type Err = ParseChoiceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rock" | "r" => Ok(Choice::Rock),
            "paper" | "p" => Ok(Choice::Paper),
            "scissor" | "scissors" | "s" => Ok(Choice::Scissor),
            _ => Err(ParseChoiceError(value.to_owned())),
        }
    }
}

impl Distribution<Choice> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Choice {
        Choice::ALL[rng.random_range(0..Choice::ALL.len())]
    }
}

/// Result of a single round from the player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// The player's throw won.
    PlayerWin,
    /// The CPU's throw won.
    CpuWin,
    /// Both sides threw the same.
    Tie,
}

/// Decided winner of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    /// The human player.
    Player,
    /// The computer opponent.
    Cpu,
}

impl From<Winner> for GameWinner {
    fn from(value: Winner) -> Self {
        match value {
            Winner::Player => GameWinner::Player,
            Winner::Cpu => GameWinner::Cpu,
        }
    }
}

/// Judgement of a series whose last scheduled round was played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesVerdict {
    /// More round wins than losses.
    Player,
    /// More round losses than wins.
    Cpu,
    /// Wins and losses are level; the series was extended by one round.
    Tie,
}

impl SeriesVerdict {
    /// The winner, unless the series had to be extended.
    pub fn winner(self) -> Option<Winner> {
        match self {
            SeriesVerdict::Player => Some(Winner::Player),
            SeriesVerdict::Cpu => Some(Winner::Cpu),
            SeriesVerdict::Tie => None,
        }
    }
}

/// Outcome of `user` against `cpu`.
pub fn round_outcome(user: Choice, cpu: Choice) -> RoundOutcome {
    if user == cpu {
        RoundOutcome::Tie
    } else if user.beats() == cpu {
        RoundOutcome::PlayerWin
    } else {
        RoundOutcome::CpuWin
    }
}

/// Tally `outcome` on the record and the global round counters.
///
/// A tie also steps `current_round` back by one: the following advance lands on the same round
/// number, so ties never count toward completing the series.
pub fn apply_round_outcome(
    record: &mut GameRecord,
    settings: &mut GlobalSettings,
    outcome: RoundOutcome,
) -> Result<(), ServiceError> {
    if !record.is_pending() {
        return Err(ServiceError::InvariantViolation(format!(
            "game {} is already decided",
            record.name
        )));
    }

    match outcome {
        RoundOutcome::PlayerWin => {
            record.player_wins += 1;
            settings.rounds_won += 1;
        }
        RoundOutcome::CpuWin => {
            record.player_loses += 1;
            settings.rounds_lost += 1;
        }
        RoundOutcome::Tie => {
            let Some(previous) = record.current_round.checked_sub(1) else {
                return Err(ServiceError::InvariantViolation(format!(
                    "game {} has no round to replay",
                    record.name
                )));
            };
            record.player_ties += 1;
            record.current_round = previous;
            settings.rounds_tied += 1;
        }
    }
    Ok(())
}

/// Whether the last scheduled round of the series has been played.
pub fn check_series_complete(record: &GameRecord) -> bool {
    record.current_round == record.best_of
}

/// Compare round wins and losses; a level series is extended by one round.
pub fn determine_series_winner(record: &mut GameRecord) -> SeriesVerdict {
    match record.player_wins.cmp(&record.player_loses) {
        std::cmp::Ordering::Greater => SeriesVerdict::Player,
        std::cmp::Ordering::Less => SeriesVerdict::Cpu,
        std::cmp::Ordering::Equal => {
            record.best_of += 1;
            SeriesVerdict::Tie
        }
    }
}

/// Close a completed series in favour of `winner`.
pub fn finalize_series(
    record: &mut GameRecord,
    settings: &mut GlobalSettings,
    winner: Winner,
    now: OffsetDateTime,
) -> Result<(), ServiceError> {
    if !record.is_pending() {
        return Err(ServiceError::InvariantViolation(format!(
            "game {} is already decided",
            record.name
        )));
    }
    if !check_series_complete(record) {
        return Err(ServiceError::InvariantViolation(format!(
            "game {} cannot be finalized on {}",
            record.name,
            record.round_status()
        )));
    }
    let tallies_agree = match winner {
        Winner::Player => record.player_wins > record.player_loses,
        Winner::Cpu => record.player_loses > record.player_wins,
    };
    if !tallies_agree {
        return Err(ServiceError::InvariantViolation(format!(
            "game {} tallies ({} wins, {} losses) do not support a {:?} victory",
            record.name, record.player_wins, record.player_loses, winner
        )));
    }

    record.game_winner = winner.into();
    record.ended = Some(now);
    match winner {
        Winner::Player => settings.games_won += 1,
        Winner::Cpu => settings.games_lost += 1,
    }
    Ok(())
}

/// Move past a resolved round that did not end the series.
pub fn advance_to_next_round(record: &mut GameRecord) -> Result<(), ServiceError> {
    if record.current_round >= record.best_of {
        return Err(ServiceError::InvariantViolation(format!(
            "game {} cannot advance past {}",
            record.name,
            record.round_status()
        )));
    }
    record.current_round += 1;
    Ok(())
}

/// Player-facing sentence describing a round.
pub fn round_message(user: Choice, cpu: Choice) -> String {
    match round_outcome(user, cpu) {
        RoundOutcome::Tie => "Nobody won the round. Throw again!".into(),
        RoundOutcome::PlayerWin => format!(
            "You won the round! {} beats {}.",
            capitalize(user.as_str()),
            cpu
        ),
        RoundOutcome::CpuWin => format!(
            "The CPU won the round. {} beats {}.",
            capitalize(cpu.as_str()),
            user
        ),
    }
}

/// Player-facing sentence describing a series verdict.
pub fn verdict_message(record: &GameRecord, verdict: SeriesVerdict) -> String {
    match verdict {
        SeriesVerdict::Tie => "Game tie breaker round is required.".into(),
        SeriesVerdict::Player => format!(
            "You won this game with {} wins : {} losses.",
            record.player_wins, record.player_loses
        ),
        SeriesVerdict::Cpu => format!(
            "The CPU won this game with {} wins : {} losses.",
            record.player_loses, record.player_wins
        ),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Supplier of CPU throws.
pub trait ChoiceSource: Send {
    /// Throw for the next round.
    fn next_choice(&mut self) -> Choice;
}

/// Uniformly random CPU throws.
#[derive(Debug, Clone)]
pub struct RandomChoices {
    rng: StdRng,
}

impl RandomChoices {
    /// Seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomChoices {
    fn default() -> Self {
        Self::new()
    }
}

impl ChoiceSource for RandomChoices {
    fn next_choice(&mut self) -> Choice {
        self.rng.random()
    }
}

/// Replays a fixed script of throws, cycling once it runs out.
#[derive(Debug, Clone)]
pub struct ScriptedChoices {
    script: VecDeque<Choice>,
}

impl ScriptedChoices {
    /// An empty script falls back to rock.
    pub fn new(script: impl IntoIterator<Item = Choice>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }
}

impl ChoiceSource for ScriptedChoices {
    fn next_choice(&mut self) -> Choice {
        match self.script.pop_front() {
            Some(choice) => {
                self.script.push_back(choice);
                choice
            }
            None => Choice::Rock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const T0: OffsetDateTime = datetime!(2024-03-01 10:00 UTC);

    fn record(best_of: u32, current_round: u32, wins: u32, losses: u32, ties: u32) -> GameRecord {
        GameRecord {
            current_round,
            player_wins: wins,
            player_loses: losses,
            player_ties: ties,
            ..GameRecord::new(1, best_of, T0)
        }
    }

    #[test]
    fn outcome_table_covers_every_pair() {
        use Choice::*;
        use RoundOutcome::*;

        let table = [
            (Rock, Rock, Tie),
            (Rock, Paper, CpuWin),
            (Rock, Scissor, PlayerWin),
            (Paper, Rock, PlayerWin),
            (Paper, Paper, Tie),
            (Paper, Scissor, CpuWin),
            (Scissor, Rock, CpuWin),
            (Scissor, Paper, PlayerWin),
            (Scissor, Scissor, Tie),
        ];

        for (user, cpu, expected) in table {
            assert_eq!(round_outcome(user, cpu), expected, "{user} vs {cpu}");
        }
    }

    #[test]
    fn outcome_is_mirrored_when_sides_swap() {
        for user in Choice::ALL {
            for cpu in Choice::ALL {
                let mirrored = match round_outcome(cpu, user) {
                    RoundOutcome::PlayerWin => RoundOutcome::CpuWin,
                    RoundOutcome::CpuWin => RoundOutcome::PlayerWin,
                    RoundOutcome::Tie => RoundOutcome::Tie,
                };
                assert_eq!(round_outcome(user, cpu), mirrored);
            }
        }
    }

    #[test]
    fn tie_then_advance_keeps_round_number() {
        let mut game = record(3, 2, 1, 0, 0);
        let mut settings = GlobalSettings::default();

        apply_round_outcome(&mut game, &mut settings, RoundOutcome::Tie).unwrap();
        assert!(!check_series_complete(&game));
        advance_to_next_round(&mut game).unwrap();

        assert_eq!(game.current_round, 2);
        assert_eq!(game.player_ties, 1);
        assert_eq!(settings.rounds_tied, 1);
    }

    #[test]
    fn decisive_round_then_advance_moves_one_round() {
        let mut game = record(3, 1, 0, 0, 0);
        let mut settings = GlobalSettings::default();

        apply_round_outcome(&mut game, &mut settings, RoundOutcome::CpuWin).unwrap();
        advance_to_next_round(&mut game).unwrap();

        assert_eq!(game.current_round, 2);
        assert_eq!(game.player_loses, 1);
        assert_eq!(settings.rounds_lost, 1);
    }

    #[test]
    fn player_takes_a_two_to_one_series() {
        let mut game = record(3, 3, 2, 1, 0);
        let mut settings = GlobalSettings::default();

        assert!(check_series_complete(&game));
        let verdict = determine_series_winner(&mut game);
        assert_eq!(verdict, SeriesVerdict::Player);

        finalize_series(&mut game, &mut settings, Winner::Player, T0).unwrap();
        assert_eq!(game.game_winner, GameWinner::Player);
        assert_eq!(game.ended, Some(T0));
        assert_eq!(game.best_of, 3);
        assert_eq!(settings.games_won, 1);
        assert_eq!(settings.games_lost, 0);
    }

    #[test]
    fn level_series_is_extended() {
        let mut game = record(3, 3, 1, 1, 1);

        let verdict = determine_series_winner(&mut game);

        assert_eq!(verdict, SeriesVerdict::Tie);
        assert_eq!(verdict.winner(), None);
        assert_eq!(game.best_of, 4);
        assert_eq!(game.game_winner, GameWinner::Pending);
        assert!(advance_to_next_round(&mut game).is_ok());
    }

    #[test]
    fn finalize_rejects_incomplete_or_mismatched_series() {
        let mut settings = GlobalSettings::default();

        let mut early = record(3, 2, 2, 0, 0);
        assert!(matches!(
            finalize_series(&mut early, &mut settings, Winner::Player, T0),
            Err(ServiceError::InvariantViolation(_))
        ));

        let mut wrong_side = record(3, 3, 2, 1, 0);
        assert!(finalize_series(&mut wrong_side, &mut settings, Winner::Cpu, T0).is_err());
        assert!(wrong_side.is_pending());
        assert_eq!(settings.games_lost, 0);
    }

    #[test]
    fn decided_game_rejects_more_rounds() {
        let mut game = record(3, 3, 2, 1, 0);
        let mut settings = GlobalSettings::default();
        finalize_series(&mut game, &mut settings, Winner::Player, T0).unwrap();

        let err = apply_round_outcome(&mut game, &mut settings, RoundOutcome::PlayerWin);
        assert!(err.is_err());
        assert_eq!(game.player_wins, 2);
        assert_eq!(settings.rounds_won, 0);
    }

    #[test]
    fn advance_refuses_to_pass_best_of() {
        let mut game = record(3, 3, 2, 1, 0);
        assert!(advance_to_next_round(&mut game).is_err());
        assert_eq!(game.current_round, 3);
    }

    #[test]
    fn messages_name_the_winning_throw() {
        assert_eq!(
            round_message(Choice::Rock, Choice::Scissor),
            "You won the round! Rock beats scissor."
        );
        assert_eq!(
            round_message(Choice::Rock, Choice::Paper),
            "The CPU won the round. Paper beats rock."
        );
        assert_eq!(
            round_message(Choice::Paper, Choice::Paper),
            "Nobody won the round. Throw again!"
        );
        assert_eq!(
            verdict_message(&record(3, 3, 1, 2, 0), SeriesVerdict::Cpu),
            "The CPU won this game with 2 wins : 1 losses."
        );
    }

    #[test]
    fn choices_parse_loosely() {
        assert_eq!("Rock".parse::<Choice>(), Ok(Choice::Rock));
        assert_eq!(" scissors ".parse::<Choice>(), Ok(Choice::Scissor));
        assert_eq!("p".parse::<Choice>(), Ok(Choice::Paper));
        assert!("lizard".parse::<Choice>().is_err());
    }

    #[test]
    fn scripted_choices_cycle() {
        let mut cpu = ScriptedChoices::new([Choice::Paper, Choice::Rock]);
        let drawn: Vec<Choice> = (0..3).map(|_| cpu.next_choice()).collect();
        assert_eq!(drawn, vec![Choice::Paper, Choice::Rock, Choice::Paper]);
    }

    #[test]
    fn seeded_random_choices_are_reproducible() {
        let mut first = RandomChoices::seeded(7);
        let mut second = RandomChoices::seeded(7);
        for _ in 0..16 {
            assert_eq!(first.next_choice(), second.next_choice());
        }
    }
}
