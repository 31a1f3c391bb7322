use tracing::{debug, info};

use crate::{
    error::ServiceError,
    state::{
        SharedStore,
        document::{GameListing, GameName, GameRecord},
        scoring::{
            self, Choice, ChoiceSource, RandomChoices, RoundOutcome, SeriesVerdict, Winner,
        },
        statistics::Statistics,
    },
};

/// Everything the interactive side needs to show after a throw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundReport {
    /// The player's throw.
    pub user: Choice,
    /// The CPU's throw.
    pub cpu: Choice,
    /// Result from the player's point of view.
    pub outcome: RoundOutcome,
    /// Present when the throw completed the scheduled rounds.
    pub verdict: Option<SeriesVerdict>,
    /// The active game after the throw was applied.
    pub record: GameRecord,
}

impl RoundReport {
    /// `"You won the round! Rock beats scissor."`
    pub fn message(&self) -> String {
        scoring::round_message(self.user, self.cpu)
    }

    /// Series verdict sentence, when the throw closed the scheduled rounds.
    pub fn verdict_message(&self) -> Option<String> {
        self.verdict
            .map(|verdict| scoring::verdict_message(&self.record, verdict))
    }
}

/// What `continue_game` did with the active game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    /// The next round is ready to be played.
    NextRound(GameRecord),
    /// The series closed; the game is no longer active.
    Finished {
        /// Side that took the series.
        winner: Winner,
        /// The closed game.
        record: GameRecord,
    },
}

/// The interactive flow: the active game plus the CPU opponent, on top of the shared store.
///
/// The active game is plain session state; deleting or renumbering games keeps it pointing at
/// the same record.
pub struct Session<C = RandomChoices> {
    store: SharedStore,
    active: Option<GameName>,
    cpu: C,
}

impl Session<RandomChoices> {
    /// Session playing against a uniformly random CPU.
    pub fn new(store: SharedStore) -> Self {
        Self::with_choices(store, RandomChoices::new())
    }
}

impl<C: ChoiceSource> Session<C> {
    /// Session drawing CPU throws from `cpu`.
    pub fn with_choices(store: SharedStore, cpu: C) -> Self {
        Self {
            store,
            active: None,
            cpu,
        }
    }

    /// Name of the active game, if any.
    pub fn active_name(&self) -> Option<GameName> {
        self.active
    }

    /// Start a new game with the current series length and make it active.
    pub async fn create_game(&mut self) -> Result<GameRecord, ServiceError> {
        let now = self.store.now();
        let mut document = self.store.write().await;
        let name = document.create_game(now)?;
        let record = document
            .find_by_name(name)
            .cloned()
            .ok_or_else(|| ServiceError::InvariantViolation(format!("game {name} vanished")))?;
        drop(document);

        self.active = Some(name);
        info!(name, best_of = record.best_of, "game started");
        Ok(record)
    }

    /// Look a game up by name.
    pub async fn find_by_name(&self, name: GameName) -> Option<GameRecord> {
        self.store.read().await.find_by_name(name).cloned()
    }

    /// The active game, `None` if no game is active or it no longer exists.
    pub async fn active_record(&self) -> Option<GameRecord> {
        let name = self.active?;
        self.find_by_name(name).await
    }

    /// Make pending game `name` the active game again.
    pub async fn resume_game(&mut self, name: GameName) -> Result<GameRecord, ServiceError> {
        let record = self
            .find_by_name(name)
            .await
            .ok_or_else(|| ServiceError::RecordNotFound(format!("game {name}")))?;
        if !record.is_pending() {
            return Err(ServiceError::InvalidState(format!(
                "game {name} was already won by {}",
                record.game_winner
            )));
        }

        self.active = Some(name);
        info!(name, round = record.current_round, "game resumed");
        Ok(record)
    }

    /// Delete game `name`, renumbering later games in the same step.
    pub async fn delete_game(&mut self, name: GameName) -> Result<GameRecord, ServiceError> {
        let removed = self.store.write().await.delete_game(name)?;

        self.active = match self.active {
            Some(active) if active == name => None,
            Some(active) if active > name => Some(active - 1),
            other => other,
        };
        info!(name, "game deleted");
        Ok(removed)
    }

    /// Pending games, in document order.
    pub async fn list_pending(&self) -> Vec<GameRecord> {
        self.store
            .read()
            .await
            .list_pending()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Every game as a display pair, in document order.
    pub async fn list_all(&self) -> Vec<GameListing> {
        self.store.read().await.list_all()
    }

    /// Aggregate statistics over every game ever played.
    pub async fn statistics(&self) -> Statistics {
        self.store.read().await.statistics()
    }

    /// Change the series length of games created from now on.
    pub async fn set_best_of(&self, best_of: u32) -> Result<(), ServiceError> {
        self.store.write().await.set_best_of(best_of)?;
        info!(best_of, "series length updated");
        Ok(())
    }

    /// Throw `user` against the CPU in the active game.
    ///
    /// When the throw completes the scheduled rounds the series is judged right away: a level
    /// series is extended by one round, otherwise the verdict waits for [`Self::continue_game`].
    pub async fn play_round(&mut self, user: Choice) -> Result<RoundReport, ServiceError> {
        let name = self.require_active()?;
        let mut document = self.store.write().await;
        let (record, settings) = document
            .record_and_settings_mut(name)
            .ok_or_else(|| ServiceError::RecordNotFound(format!("active game {name}")))?;

        if !record.awaiting_choice() {
            return Err(ServiceError::InvalidState(format!(
                "game {name} is waiting to continue to the next round"
            )));
        }

        let cpu = self.cpu.next_choice();
        let outcome = scoring::round_outcome(user, cpu);
        scoring::apply_round_outcome(record, settings, outcome)?;

        let verdict = scoring::check_series_complete(record)
            .then(|| scoring::determine_series_winner(record));

        debug!(name, %user, %cpu, ?outcome, ?verdict, "round played");
        Ok(RoundReport {
            user,
            cpu,
            outcome,
            verdict,
            record: record.clone(),
        })
    }

    /// Move the active game past its resolved round: next round, or close the series.
    pub async fn continue_game(&mut self) -> Result<Continuation, ServiceError> {
        let name = self.require_active()?;
        let now = self.store.now();
        let mut document = self.store.write().await;
        let (record, settings) = document
            .record_and_settings_mut(name)
            .ok_or_else(|| ServiceError::RecordNotFound(format!("active game {name}")))?;

        if record.awaiting_choice() {
            return Err(ServiceError::InvalidState(format!(
                "game {name} has a round waiting to be played"
            )));
        }

        if record.current_round < record.best_of {
            scoring::advance_to_next_round(record)?;
            return Ok(Continuation::NextRound(record.clone()));
        }

        let winner = match record.player_wins.cmp(&record.player_loses) {
            std::cmp::Ordering::Greater => Winner::Player,
            std::cmp::Ordering::Less => Winner::Cpu,
            std::cmp::Ordering::Equal => {
                return Err(ServiceError::InvariantViolation(format!(
                    "game {name} reached its last round level"
                )));
            }
        };
        scoring::finalize_series(record, settings, winner, now)?;
        let record = record.clone();
        drop(document);

        self.active = None;
        info!(name, ?winner, "game finished");
        Ok(Continuation::Finished { winner, record })
    }

    fn require_active(&self) -> Result<GameName, ServiceError> {
        self.active
            .ok_or_else(|| ServiceError::InvalidState("no game is active".into()))
    }
}
