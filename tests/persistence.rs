use std::{collections::BTreeSet, sync::Arc, time::Duration};

use rps_ledger::{
    dao::{
        document_store::{JsonFileBackend, MemoryBackend},
        models::DocumentEntity,
    },
    services::{autosave, game_service::Session},
    state::{
        DocumentStore,
        document::{GameWinner, GlobalSettings},
        scoring::{Choice, ScriptedChoices},
    },
};

fn names_are_contiguous(entity: &DocumentEntity) -> bool {
    entity
        .games
        .iter()
        .enumerate()
        .all(|(index, game)| game.name as usize == index + 1)
}

#[tokio::test]
async fn saved_games_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();

    let store = DocumentStore::open(
        Arc::new(JsonFileBackend::new(dir.path())),
        GlobalSettings::with_best_of(3),
    )
    .await
    .unwrap();
    let mut session = Session::with_choices(
        store.clone(),
        ScriptedChoices::new([Choice::Scissor, Choice::Rock, Choice::Scissor]),
    );

    session.create_game().await.unwrap();
    session.play_round(Choice::Rock).await.unwrap();
    session.continue_game().await.unwrap();
    session.play_round(Choice::Rock).await.unwrap();
    session.continue_game().await.unwrap();
    session.play_round(Choice::Rock).await.unwrap();
    session.create_game().await.unwrap();
    store.save().await.unwrap();

    let before = store.read().await.clone();
    drop(session);
    drop(store);

    let reopened = DocumentStore::open(
        Arc::new(JsonFileBackend::new(dir.path())),
        GlobalSettings::with_best_of(7),
    )
    .await
    .unwrap();
    let after = reopened.read().await;

    assert_eq!(*after, before);
    assert_eq!(after.settings().best_of, 3);
    assert_eq!(after.games().len(), 2);
    let first = &after.games()[0];
    assert_eq!(
        (first.player_wins, first.player_ties, first.player_loses),
        (2, 1, 0)
    );
    assert_eq!(first.game_winner, GameWinner::Pending);
}

#[tokio::test]
async fn finished_games_keep_their_winner_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let backend = JsonFileBackend::new(dir.path());

    let store = DocumentStore::open(Arc::new(backend.clone()), GlobalSettings::with_best_of(1))
        .await
        .unwrap();
    let mut session = Session::with_choices(store.clone(), ScriptedChoices::new([Choice::Paper]));
    session.create_game().await.unwrap();
    session.play_round(Choice::Scissor).await.unwrap();
    session.continue_game().await.unwrap();
    store.save().await.unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(backend.path()).unwrap()).unwrap();
    assert_eq!(raw["games"][0]["gameWinner"], "Player");
    assert_eq!(raw["globalSettings"]["totalUserGameWins"], 1);

    let reopened = DocumentStore::open(Arc::new(backend), GlobalSettings::default())
        .await
        .unwrap();
    let document = reopened.read().await;
    assert_eq!(document.games()[0].game_winner, GameWinner::Player);
    assert!(document.games()[0].ended.is_some());
    assert_eq!(document.statistics().games_won, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn autosave_never_sees_a_half_renumbered_document() {
    let backend = MemoryBackend::with_history();
    let store = DocumentStore::open(Arc::new(backend.clone()), GlobalSettings::default())
        .await
        .unwrap();
    let handle = autosave::spawn(store.clone(), Duration::from_millis(1));

    let mut session = Session::with_choices(store.clone(), ScriptedChoices::new([Choice::Rock]));
    for round in 0..40 {
        for _ in 0..5 {
            session.create_game().await.unwrap();
        }
        session.delete_game(1 + round % 3).await.unwrap();
        session.delete_game(2).await.unwrap();
        tokio::task::yield_now().await;
    }

    assert!(handle.shutdown(Duration::from_secs(5)).await);

    let snapshots = backend.snapshots();
    assert!(snapshots.len() > 1);
    for snapshot in &snapshots {
        assert!(names_are_contiguous(snapshot));
        let unique: BTreeSet<_> = snapshot.games.iter().map(|game| game.name).collect();
        assert_eq!(unique.len(), snapshot.games.len());
    }

    let last = backend.current().unwrap();
    assert_eq!(last.games.len(), 120);
    assert_eq!(last.global_settings.total_user_games_initiated, 200);
}

#[tokio::test]
async fn deleting_keeps_names_contiguous_and_the_active_game_tracked() {
    let store = DocumentStore::detached(GlobalSettings::default());
    let mut session = Session::with_choices(store.clone(), ScriptedChoices::new([Choice::Rock]));

    for _ in 0..4 {
        session.create_game().await.unwrap();
    }
    assert_eq!(session.active_name(), Some(4));

    session.delete_game(2).await.unwrap();
    assert_eq!(session.active_name(), Some(3));
    let names: Vec<_> = store.read().await.games().iter().map(|g| g.name).collect();
    assert_eq!(names, [1, 2, 3]);

    session.delete_game(3).await.unwrap();
    assert_eq!(session.active_name(), None);
    assert!(session.play_round(Choice::Paper).await.is_err());

    assert_eq!(session.create_game().await.unwrap().name, 3);
    assert_eq!(session.statistics().await.games_started, 5);
}
