//! Line-oriented driver translating typed commands into session calls and display strings.

use std::str::FromStr;

use thiserror::Error;

use crate::{
    error::ServiceError,
    services::game_service::{Continuation, Session},
    state::{
        document::GameName,
        scoring::{Choice, ChoiceSource},
    },
};

/// Help text printed by the `help` command.
pub const HELP: &str = "commands: new [best-of] | rock | paper | scissor | continue | resume <game> | \
delete <game> | list | pending | show <game> | stats | best-of <rounds> | help | quit";

/// A parsed input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start a game, optionally changing the series length first.
    New(Option<u32>),
    /// Play a round in the active game.
    Throw(Choice),
    /// Move past the resolved round.
    Continue,
    /// Make a pending game active again.
    Resume(GameName),
    /// Delete a game and renumber the later ones.
    Delete(GameName),
    /// List every game.
    List,
    /// List pending games with their progress.
    Pending,
    /// Show one game's summary.
    Show(GameName),
    /// Show the aggregate statistics.
    Stats,
    /// Change the series length of new games.
    BestOf(u32),
    /// Print the command list.
    Help,
    /// Leave the console.
    Quit,
}

/// Input line that is not a known command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCommandError {
    /// Blank line.
    #[error("empty command")]
    Empty,
    /// First word is neither a command nor a throw.
    #[error("unknown command `{0}`")]
    Unknown(String),
    /// Argument is not a non-negative integer.
    #[error("`{command}` expects a number, got `{value}`")]
    NotANumber {
        /// Command the argument belongs to.
        command: &'static str,
        /// Offending text.
        value: String,
    },
    /// Required argument is missing.
    #[error("`{0}` expects an argument")]
    MissingArgument(&'static str),
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err(ParseCommandError::Empty);
        };
        let argument = words.next();

        let command = match head.to_ascii_lowercase().as_str() {
            "new" => Command::New(argument.map(|v| number("new", v)).transpose()?),
            "continue" | "c" => Command::Continue,
            "resume" => Command::Resume(required("resume", argument)?),
            "delete" => Command::Delete(required("delete", argument)?),
            "list" => Command::List,
            "pending" => Command::Pending,
            "show" => Command::Show(required("show", argument)?),
            "stats" => Command::Stats,
            "best-of" => Command::BestOf(required("best-of", argument)?),
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => match other.parse::<Choice>() {
                Ok(choice) => Command::Throw(choice),
                Err(_) => return Err(ParseCommandError::Unknown(head.to_owned())),
            },
        };
        Ok(command)
    }
}

fn number(command: &'static str, value: &str) -> Result<u32, ParseCommandError> {
    value.parse().map_err(|_| ParseCommandError::NotANumber {
        command,
        value: value.to_owned(),
    })
}

fn required(command: &'static str, value: Option<&str>) -> Result<u32, ParseCommandError> {
    let value = value.ok_or(ParseCommandError::MissingArgument(command))?;
    number(command, value)
}

/// Run `command` against the session and render the reply lines.
///
/// `Quit` renders nothing; the caller owns shutting down.
pub async fn respond<C: ChoiceSource>(
    session: &mut Session<C>,
    command: Command,
) -> Result<Vec<String>, ServiceError> {
    let lines = match command {
        Command::New(best_of) => {
            if let Some(best_of) = best_of {
                session.set_best_of(best_of).await?;
            }
            let record = session.create_game().await?;
            vec![
                format!("Game {} started.", record.name),
                record.round_status(),
                record.score_display(),
            ]
        }
        Command::Throw(choice) => {
            let report = session.play_round(choice).await?;
            let mut lines = vec![
                format!("You - {}   CPU - {}", report.user, report.cpu),
                report.message(),
            ];
            lines.extend(report.verdict_message());
            lines.push("Type `continue` to go on.".into());
            lines
        }
        Command::Continue => match session.continue_game().await? {
            Continuation::NextRound(record) => vec![record.round_status(), record.score_display()],
            Continuation::Finished { record, .. } => vec![
                format!("Game {} is over.", record.name),
                record.listing().to_string(),
            ],
        },
        Command::Resume(name) => {
            let record = session.resume_game(name).await?;
            let mut lines = vec![
                format!("Resumed game {}.", record.name),
                record.round_status(),
                record.score_display(),
            ];
            if !record.awaiting_choice() {
                lines.push("Type `continue` to go on.".into());
            }
            lines
        }
        Command::Delete(name) => {
            session.delete_game(name).await?;
            vec![format!("Deleted game {name}; later games were renumbered.")]
        }
        Command::List => session
            .list_all()
            .await
            .iter()
            .map(ToString::to_string)
            .collect(),
        Command::Pending => session
            .list_pending()
            .await
            .iter()
            .map(|record| format!("{}  ({})", record.listing(), record.round_status()))
            .collect(),
        Command::Show(name) => {
            let record = session
                .find_by_name(name)
                .await
                .ok_or_else(|| ServiceError::RecordNotFound(format!("game {name}")))?;
            record.summary().lines().map(String::from).collect()
        }
        Command::Stats => session.statistics().await.lines().to_vec(),
        Command::BestOf(best_of) => {
            session.set_best_of(best_of).await?;
            vec![format!("New games are best of {best_of}.")]
        }
        Command::Help => vec![HELP.to_owned()],
        Command::Quit => Vec::new(),
    };
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{DocumentStore, document::GlobalSettings, scoring::ScriptedChoices};

    #[test]
    fn parses_commands_and_throws() {
        assert_eq!("new".parse::<Command>(), Ok(Command::New(None)));
        assert_eq!("new 5".parse::<Command>(), Ok(Command::New(Some(5))));
        assert_eq!("  Rock ".parse::<Command>(), Ok(Command::Throw(Choice::Rock)));
        assert_eq!("s".parse::<Command>(), Ok(Command::Throw(Choice::Scissor)));
        assert_eq!("delete 2".parse::<Command>(), Ok(Command::Delete(2)));
        assert_eq!("quit".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!("".parse::<Command>(), Err(ParseCommandError::Empty));
        assert_eq!(
            "resume".parse::<Command>(),
            Err(ParseCommandError::MissingArgument("resume"))
        );
        assert!(matches!(
            "show two".parse::<Command>(),
            Err(ParseCommandError::NotANumber { .. })
        ));
        assert!(matches!(
            "lizard".parse::<Command>(),
            Err(ParseCommandError::Unknown(_))
        ));
    }

    #[tokio::test]
    async fn a_short_game_renders_every_step() {
        let store = DocumentStore::detached(GlobalSettings::default());
        let mut session = Session::with_choices(store, ScriptedChoices::new([Choice::Scissor]));

        let lines = respond(&mut session, Command::New(Some(1))).await.unwrap();
        assert_eq!(lines[0], "Game 1 started.");
        assert_eq!(lines[1], "Round 1 of 1");

        let lines = respond(&mut session, Command::Throw(Choice::Rock)).await.unwrap();
        assert_eq!(lines[1], "You won the round! Rock beats scissor.");
        assert_eq!(lines[2], "You won this game with 1 wins : 0 losses.");

        let lines = respond(&mut session, Command::Continue).await.unwrap();
        assert_eq!(lines[1], "Game 1 - Player Victory");

        let lines = respond(&mut session, Command::Stats).await.unwrap();
        assert_eq!(lines[1], "Games Won: 1");

        let err = respond(&mut session, Command::Show(4)).await.unwrap_err();
        assert!(matches!(err, ServiceError::RecordNotFound(_)));
    }
}
