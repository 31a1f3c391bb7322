use crate::state::document::GlobalSettings;

/// The eight aggregate figures shown on the statistics screen.
///
/// `games_pending` and `rounds_started` are derived; everything else mirrors a stored counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statistics {
    /// Games ever created.
    pub games_started: u64,
    /// Games won by the player.
    pub games_won: u64,
    /// Games won by the CPU.
    pub games_lost: u64,
    /// Started minus won minus lost.
    pub games_pending: u64,
    /// Won plus tied plus lost rounds.
    pub rounds_started: u64,
    /// Rounds won by the player.
    pub rounds_won: u64,
    /// Tied rounds.
    pub rounds_tied: u64,
    /// Rounds won by the CPU.
    pub rounds_lost: u64,
}

impl Statistics {
    /// Labelled lines in display order.
    pub fn lines(&self) -> [String; 8] {
        [
            format!("Games Started: {}", self.games_started),
            format!("Games Won: {}", self.games_won),
            format!("Games Lost: {}", self.games_lost),
            format!("Games Pending: {}", self.games_pending),
            format!("Rounds Started: {}", self.rounds_started),
            format!("Rounds Won: {}", self.rounds_won),
            format!("Rounds Tied: {}", self.rounds_tied),
            format!("Rounds Lost: {}", self.rounds_lost),
        ]
    }
}

impl From<&GlobalSettings> for Statistics {
    fn from(settings: &GlobalSettings) -> Self {
        Self {
            games_started: settings.games_initiated,
            games_won: settings.games_won,
            games_lost: settings.games_lost,
            games_pending: settings
                .games_initiated
                .saturating_sub(settings.games_won + settings.games_lost),
            rounds_started: settings.rounds_won + settings.rounds_tied + settings.rounds_lost,
            rounds_won: settings.rounds_won,
            rounds_tied: settings.rounds_tied,
            rounds_lost: settings.rounds_lost,
        }
    }
}
