use serde::{Deserialize, Serialize};

/// Sentinel stored in `ended` (and `gameWinner`) while a game is undecided.
pub const PENDING: &str = "Pending";

/// Root aggregate persisted by the document backends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEntity {
    /// Singleton settings and lifetime counters.
    pub global_settings: GlobalSettingsEntity,
    /// Game records in insertion order.
    #[serde(default)]
    pub games: Vec<GameEntity>,
}

/// Persisted global settings and counters spanning every game ever played.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettingsEntity {
    /// Series length handed to newly created games.
    pub best_of: u32,
    /// Games ever created, deleted ones included.
    pub total_user_games_initiated: u64,
    /// Games won by the player.
    pub total_user_game_wins: u64,
    /// Games won by the CPU.
    pub total_user_game_loses: u64,
    /// Rounds won by the player across all games.
    pub total_user_round_wins: u64,
    /// Rounds won by the CPU across all games.
    pub total_user_round_loses: u64,
    /// Tied rounds across all games.
    pub total_user_round_ties: u64,
}

/// Persisted representation of a single game record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameEntity {
    /// Contiguous numeric identifier of the game.
    pub name: u32,
    /// RFC 3339 timestamp of the game creation.
    pub started: String,
    /// RFC 3339 timestamp of the game conclusion, or [`PENDING`].
    pub ended: String,
    /// Number of rounds deciding the game (grows on tie-breaks).
    pub best_of: u32,
    /// Round about to be played, or just played.
    pub current_round: u32,
    /// `Pending`, `Player` or `CPU`.
    pub game_winner: String,
    /// Rounds won by the player.
    pub player_wins: u32,
    /// Rounds won by the CPU.
    pub player_loses: u32,
    /// Tied rounds.
    pub player_ties: u32,
}
