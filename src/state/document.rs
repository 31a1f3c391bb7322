use std::{collections::HashSet, fmt, str::FromStr};

use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use validator::Validate;

use crate::{
    dao::models::{DocumentEntity, GameEntity, GlobalSettingsEntity, PENDING},
    dao::storage::StorageError,
    error::ServiceError,
    state::statistics::Statistics,
};

/// Contiguous numeric identifier of a game record.
pub type GameName = u32;

/// Series length used when nothing else is configured.
pub const DEFAULT_BEST_OF: u32 = 3;

/// Outcome stored on a game record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameWinner {
    /// The game is still being played (or was saved for later).
    Pending,
    /// The player won the series.
    Player,
    /// The computer won the series.
    Cpu,
}

impl GameWinner {
    /// Label used both on disk and in display strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            GameWinner::Pending => PENDING,
            GameWinner::Player => "Player",
            GameWinner::Cpu => "CPU",
        }
    }
}

impl fmt::Display for GameWinner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameWinner {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            PENDING => Ok(GameWinner::Pending),
            "Player" => Ok(GameWinner::Player),
            "CPU" => Ok(GameWinner::Cpu),
            other => Err(format!("unknown game winner `{other}`")),
        }
    }
}

/// Requested series length, validated before it reaches the document.
#[derive(Debug, Clone, Copy, Validate)]
pub struct SeriesLength {
    /// Rounds needed to decide a game.
    #[validate(range(min = 1, message = "a game needs at least one round"))]
    pub best_of: u32,
}

/// Singleton settings and lifetime counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalSettings {
    /// Series length handed to newly created games.
    pub best_of: u32,
    /// Games ever created, deleted ones included.
    pub games_initiated: u64,
    /// Games won by the player.
    pub games_won: u64,
    /// Games won by the CPU.
    pub games_lost: u64,
    /// Rounds won by the player.
    pub rounds_won: u64,
    /// Rounds won by the CPU.
    pub rounds_lost: u64,
    /// Tied rounds.
    pub rounds_tied: u64,
}

impl GlobalSettings {
    /// Fresh settings with all counters at zero.
    pub fn with_best_of(best_of: u32) -> Self {
        Self {
            best_of,
            games_initiated: 0,
            games_won: 0,
            games_lost: 0,
            rounds_won: 0,
            rounds_lost: 0,
            rounds_tied: 0,
        }
    }
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self::with_best_of(DEFAULT_BEST_OF)
    }
}

/// One play-through with its own round tally and outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    /// Position-based name, renumbered when an earlier game is deleted.
    pub name: GameName,
    /// Scheduled rounds; grows by one on each tie-break.
    pub best_of: u32,
    /// 1-based round about to be played; a tie steps it back by one until the next advance.
    pub current_round: u32,
    /// Rounds won by the player.
    pub player_wins: u32,
    /// Rounds won by the CPU.
    pub player_loses: u32,
    /// Tied rounds.
    pub player_ties: u32,
    /// When the game was created.
    pub started: OffsetDateTime,
    /// `None` until the game is decided.
    pub ended: Option<OffsetDateTime>,
    /// Series outcome, `Pending` while undecided.
    pub game_winner: GameWinner,
}

impl GameRecord {
    /// A brand-new game waiting for its first round.
    pub fn new(name: GameName, best_of: u32, started: OffsetDateTime) -> Self {
        Self {
            name,
            best_of,
            current_round: 1,
            player_wins: 0,
            player_loses: 0,
            player_ties: 0,
            started,
            ended: None,
            game_winner: GameWinner::Pending,
        }
    }

    /// Whether the outcome is still undecided.
    pub fn is_pending(&self) -> bool {
        self.game_winner == GameWinner::Pending
    }

    /// Number of rounds played, ties included.
    pub fn rounds_played(&self) -> u32 {
        self.player_wins + self.player_loses + self.player_ties
    }

    /// Whether the next step is a throw (as opposed to advancing past a resolved round).
    ///
    /// Ties never move the round counter, so before a throw `current_round` is always one past
    /// the decisive rounds; right after a throw it equals them.
    pub fn awaiting_choice(&self) -> bool {
        self.is_pending() && self.current_round == self.player_wins + self.player_loses + 1
    }

    /// `"Round 2 of 3"`.
    pub fn round_status(&self) -> String {
        format!("Round {} of {}", self.current_round, self.best_of)
    }

    /// `"Score - 2 Rounds Won : 0 Rounds Tied : 1 Round Lost"`.
    pub fn score_display(&self) -> String {
        format!(
            "Score - {} Won : {} Tied : {} Lost",
            rounds_label(self.player_wins),
            rounds_label(self.player_ties),
            rounds_label(self.player_loses),
        )
    }

    /// Multi-line statistics of this game.
    pub fn summary(&self) -> String {
        format!(
            "Best Of: {}\nRound Wins: {}\nRound Ties: {}\nRound Losses: {}\nStarted: {}\nEnded: {}\nGame Winner: {}",
            self.best_of,
            self.player_wins,
            self.player_ties,
            self.player_loses,
            format_timestamp(self.started),
            self.ended.map(format_timestamp).unwrap_or_else(|| PENDING.into()),
            self.game_winner,
        )
    }

    /// Display pair used by game listings.
    pub fn listing(&self) -> GameListing {
        GameListing {
            name: self.name,
            winner: self.game_winner,
        }
    }
}

fn rounds_label(count: u32) -> String {
    if count == 1 {
        format!("{count} Round")
    } else {
        format!("{count} Rounds")
    }
}

/// `(name, winner-or-pending)` pair shown in game lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameListing {
    /// Name of the listed game.
    pub name: GameName,
    /// Its outcome so far.
    pub winner: GameWinner,
}

impl fmt::Display for GameListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.winner {
            GameWinner::Pending => write!(f, "Game {} - Pending", self.name),
            winner => write!(f, "Game {} - {} Victory", self.name, winner),
        }
    }
}

/// Root aggregate: global settings plus every game record in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    settings: GlobalSettings,
    games: Vec<GameRecord>,
}

impl Document {
    /// Empty document carrying `settings`.
    pub fn new(settings: GlobalSettings) -> Self {
        Self {
            settings,
            games: Vec::new(),
        }
    }

    /// Global settings and lifetime counters.
    pub fn settings(&self) -> &GlobalSettings {
        &self.settings
    }

    /// Game records in insertion order.
    pub fn games(&self) -> &[GameRecord] {
        &self.games
    }

    /// Smallest positive name not currently in use.
    pub fn next_available_name(&self) -> GameName {
        let used: HashSet<GameName> = self.games.iter().map(|game| game.name).collect();
        (1..)
            .find(|candidate| !used.contains(candidate))
            .unwrap_or(GameName::MAX)
    }

    /// Append a new pending game using the current series length and count it as initiated.
    pub fn create_game(&mut self, started: OffsetDateTime) -> Result<GameName, ServiceError> {
        let name = self.next_available_name();
        if self.find_by_name(name).is_some() {
            return Err(ServiceError::InvariantViolation(format!(
                "game name {name} is already taken"
            )));
        }

        self.games
            .push(GameRecord::new(name, self.settings.best_of, started));
        self.settings.games_initiated += 1;
        Ok(name)
    }

    /// Record currently named `name`.
    pub fn find_by_name(&self, name: GameName) -> Option<&GameRecord> {
        self.games.iter().find(|game| game.name == name)
    }

    /// Split borrow of a record and the settings its round and game counters feed into.
    pub fn record_and_settings_mut(
        &mut self,
        name: GameName,
    ) -> Option<(&mut GameRecord, &mut GlobalSettings)> {
        let record = self.games.iter_mut().find(|game| game.name == name)?;
        Some((record, &mut self.settings))
    }

    /// Remove game `name` and shift every later name down by one so numbering stays contiguous.
    pub fn delete_game(&mut self, name: GameName) -> Result<GameRecord, ServiceError> {
        let index = self
            .games
            .iter()
            .position(|game| game.name == name)
            .ok_or_else(|| ServiceError::RecordNotFound(format!("game {name}")))?;

        let removed = self.games.remove(index);
        for game in self.games.iter_mut().filter(|game| game.name > name) {
            game.name -= 1;
        }
        Ok(removed)
    }

    /// Games whose winner is still pending, in document order.
    pub fn list_pending(&self) -> Vec<&GameRecord> {
        self.games.iter().filter(|game| game.is_pending()).collect()
    }

    /// Every game as a display pair, in document order.
    pub fn list_all(&self) -> Vec<GameListing> {
        self.games.iter().map(GameRecord::listing).collect()
    }

    /// Change the series length used by games created from now on.
    pub fn set_best_of(&mut self, best_of: u32) -> Result<(), ServiceError> {
        SeriesLength { best_of }.validate()?;
        self.settings.best_of = best_of;
        Ok(())
    }

    /// Aggregate statistics derived from the global counters.
    pub fn statistics(&self) -> Statistics {
        Statistics::from(&self.settings)
    }

    /// Check the structural invariants a persisted document must satisfy.
    pub fn validate(&self) -> Result<(), String> {
        if self.settings.best_of == 0 {
            return Err("global bestOf must be at least 1".into());
        }

        let mut names: Vec<GameName> = self.games.iter().map(|game| game.name).collect();
        names.sort_unstable();
        for (expected, name) in (1..).zip(&names) {
            if *name != expected {
                return Err(format!(
                    "game names must be contiguous from 1 (expected {expected}, found {name})"
                ));
            }
        }

        for game in &self.games {
            if game.best_of == 0 {
                return Err(format!("game {} has a bestOf of 0", game.name));
            }
            if game.current_round > game.best_of {
                return Err(format!(
                    "game {} is on round {} of {}",
                    game.name, game.current_round, game.best_of
                ));
            }
            let decisive = game.player_wins + game.player_loses;
            if game.current_round != decisive && game.current_round != decisive + 1 {
                return Err(format!(
                    "game {} is on round {} after {} decisive rounds",
                    game.name, game.current_round, decisive
                ));
            }
            if game.is_pending()
                && game.current_round == game.best_of
                && game.current_round == decisive
                && game.player_wins == game.player_loses
            {
                return Err(format!(
                    "game {} is level on its last round without a tie-break round",
                    game.name
                ));
            }
            if game.is_pending() != game.ended.is_none() {
                return Err(format!(
                    "game {} has winner {} but ended {:?}",
                    game.name, game.game_winner, game.ended
                ));
            }
        }

        Ok(())
    }
}

/// Timestamps are rendered as RFC 3339 both on disk and on screen.
pub fn format_timestamp(timestamp: OffsetDateTime) -> String {
    timestamp
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

fn parse_timestamp(name: GameName, field: &str, value: &str) -> Result<OffsetDateTime, StorageError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|err| {
        StorageError::malformed(format!("game {name} has an invalid {field} `{value}`: {err}"))
    })
}

impl From<&GlobalSettings> for GlobalSettingsEntity {
    fn from(value: &GlobalSettings) -> Self {
        Self {
            best_of: value.best_of,
            total_user_games_initiated: value.games_initiated,
            total_user_game_wins: value.games_won,
            total_user_game_loses: value.games_lost,
            total_user_round_wins: value.rounds_won,
            total_user_round_loses: value.rounds_lost,
            total_user_round_ties: value.rounds_tied,
        }
    }
}

impl From<GlobalSettingsEntity> for GlobalSettings {
    fn from(value: GlobalSettingsEntity) -> Self {
        Self {
            best_of: value.best_of,
            games_initiated: value.total_user_games_initiated,
            games_won: value.total_user_game_wins,
            games_lost: value.total_user_game_loses,
            rounds_won: value.total_user_round_wins,
            rounds_lost: value.total_user_round_loses,
            rounds_tied: value.total_user_round_ties,
        }
    }
}

impl From<&GameRecord> for GameEntity {
    fn from(value: &GameRecord) -> Self {
        Self {
            name: value.name,
            started: format_timestamp(value.started),
            ended: value
                .ended
                .map(format_timestamp)
                .unwrap_or_else(|| PENDING.into()),
            best_of: value.best_of,
            current_round: value.current_round,
            game_winner: value.game_winner.as_str().into(),
            player_wins: value.player_wins,
            player_loses: value.player_loses,
            player_ties: value.player_ties,
        }
    }
}

impl TryFrom<GameEntity> for GameRecord {
    type Error = StorageError;

    fn try_from(value: GameEntity) -> Result<Self, Self::Error> {
        let started = parse_timestamp(value.name, "started", &value.started)?;
        let ended = match value.ended.as_str() {
            PENDING => None,
            ended => Some(parse_timestamp(value.name, "ended", ended)?),
        };
        let game_winner = value
            .game_winner
            .parse::<GameWinner>()
            .map_err(|err| StorageError::malformed(format!("game {}: {err}", value.name)))?;

        Ok(Self {
            name: value.name,
            best_of: value.best_of,
            current_round: value.current_round,
            player_wins: value.player_wins,
            player_loses: value.player_loses,
            player_ties: value.player_ties,
            started,
            ended,
            game_winner,
        })
    }
}

impl From<&Document> for DocumentEntity {
    fn from(value: &Document) -> Self {
        Self {
            global_settings: (&value.settings).into(),
            games: value.games.iter().map(Into::into).collect(),
        }
    }
}

impl TryFrom<DocumentEntity> for Document {
    type Error = StorageError;

    fn try_from(value: DocumentEntity) -> Result<Self, Self::Error> {
        let games = value
            .games
            .into_iter()
            .map(GameRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let document = Self {
            settings: value.global_settings.into(),
            games,
        };
        document.validate().map_err(StorageError::malformed)?;
        Ok(document)
    }
}
