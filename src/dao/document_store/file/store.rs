use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use tokio::fs;

use crate::dao::{
    document_store::DocumentBackend, models::DocumentEntity, storage::StorageResult,
};

use super::error::{FileDaoError, FileResult};

/// File name of the document inside the data directory.
pub const DOCUMENT_FILE_NAME: &str = "rps_data.json";
const TEMP_SUFFIX: &str = "tmp";

/// Stores the document as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: Arc<Path>,
}

impl JsonFileBackend {
    /// Backend writing [`DOCUMENT_FILE_NAME`] inside `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self::at_path(data_dir.as_ref().join(DOCUMENT_FILE_NAME))
    }

    /// Backend writing to an explicit file path.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::from(path.into()),
        }
    }

    /// Location of the document file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".");
        name.push(TEMP_SUFFIX);
        PathBuf::from(name)
    }

    async fn read_document(&self) -> FileResult<Option<DocumentEntity>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(FileDaoError::Read {
                    path: self.path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| FileDaoError::Decode {
                path: self.path.to_path_buf(),
                source,
            })
    }

    async fn write_document(&self, document: &DocumentEntity) -> FileResult<()> {
        let payload =
            serde_json::to_vec_pretty(document).map_err(|source| FileDaoError::Encode {
                path: self.path.to_path_buf(),
                source,
            })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| FileDaoError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        // Write beside the target and rename so a crash never leaves half a document.
        let temp = self.temp_path();
        fs::write(&temp, payload)
            .await
            .map_err(|source| FileDaoError::Write {
                path: temp.clone(),
                source,
            })?;
        fs::rename(&temp, &self.path)
            .await
            .map_err(|source| FileDaoError::Replace {
                path: self.path.to_path_buf(),
                source,
            })?;

        Ok(())
    }
}

impl DocumentBackend for JsonFileBackend {
    fn load(&self) -> BoxFuture<'static, StorageResult<Option<DocumentEntity>>> {
        let backend = self.clone();
        Box::pin(async move { backend.read_document().await.map_err(Into::into) })
    }

    fn persist(&self, document: DocumentEntity) -> BoxFuture<'static, StorageResult<()>> {
        let backend = self.clone();
        Box::pin(async move { backend.write_document(&document).await.map_err(Into::into) })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::{GameEntity, GlobalSettingsEntity};
    use crate::dao::storage::StorageError;

    fn sample() -> DocumentEntity {
        DocumentEntity {
            global_settings: GlobalSettingsEntity {
                best_of: 5,
                total_user_games_initiated: 1,
                total_user_game_wins: 0,
                total_user_game_loses: 0,
                total_user_round_wins: 1,
                total_user_round_loses: 0,
                total_user_round_ties: 0,
            },
            games: vec![GameEntity {
                name: 1,
                started: "2024-03-01T10:00:00Z".into(),
                ended: "Pending".into(),
                best_of: 5,
                current_round: 1,
                game_winner: "Pending".into(),
                player_wins: 1,
                player_loses: 0,
                player_ties: 0,
            }],
        }
    }

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path());
        assert!(backend.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn persist_then_load_returns_same_entity() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("nested"));

        backend.persist(sample()).await.unwrap();
        backend.persist(sample()).await.unwrap();

        assert_eq!(backend.load().await.unwrap(), Some(sample()));
        assert!(!backend.temp_path().exists());
    }

    #[tokio::test]
    async fn persisted_file_uses_camel_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path());
        backend.persist(sample()).await.unwrap();

        let raw = std::fs::read_to_string(backend.path()).unwrap();
        assert!(raw.contains("\"globalSettings\""));
        assert!(raw.contains("\"totalUserGamesInitiated\": 1"));
        assert!(raw.contains("\"gameWinner\": \"Pending\""));
    }

    #[tokio::test]
    async fn garbage_content_is_reported_as_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path());
        std::fs::write(backend.path(), b"<Data><globalSettings/></Data>").unwrap();

        let err = backend.load().await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable { .. }));
    }
}
