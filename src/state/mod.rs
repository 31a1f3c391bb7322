/// Document aggregate, game records and their lifecycle.
pub mod document;
/// Round and series rules.
pub mod scoring;
/// Aggregate figures derived from the global counters.
pub mod statistics;

use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard, watch};
use tracing::{debug, info};

use crate::{
    dao::{
        document_store::{DocumentBackend, MemoryBackend},
        models::DocumentEntity,
    },
    error::ServiceError,
};

use self::document::{Document, GlobalSettings};

/// Store handle shared by the session and the autosave task.
pub type SharedStore = Arc<DocumentStore>;

/// Owner of the single in-memory document and its durable copy.
///
/// Every read and write of the document goes through one reader/writer lock, so a save always
/// snapshots a document that no mutation is halfway through.
pub struct DocumentStore {
    document: RwLock<Document>,
    backend: Arc<dyn DocumentBackend>,
    save_gate: Mutex<()>,
    now: watch::Sender<OffsetDateTime>,
}

impl DocumentStore {
    fn build(document: Document, backend: Arc<dyn DocumentBackend>) -> SharedStore {
        let (now, _rx) = watch::channel(OffsetDateTime::now_utc());
        Arc::new(Self {
            document: RwLock::new(document),
            backend,
            save_gate: Mutex::new(()),
            now,
        })
    }

    /// Load the persisted document, or create and persist a fresh one built from `defaults`.
    pub async fn open(
        backend: Arc<dyn DocumentBackend>,
        defaults: GlobalSettings,
    ) -> Result<SharedStore, ServiceError> {
        let location = backend.describe();

        match backend.load().await? {
            Some(entity) => {
                let document = Document::try_from(entity)?;
                info!(
                    location = %location,
                    games = document.games().len(),
                    "loaded game document"
                );
                Ok(Self::build(document, backend))
            }
            None => {
                let document = Document::new(defaults);
                backend.persist(DocumentEntity::from(&document)).await?;
                info!(location = %location, "created new game document");
                Ok(Self::build(document, backend))
            }
        }
    }

    /// In-memory-only store for sessions whose durable medium is unusable.
    ///
    /// Nothing it saves ever reaches the file that failed to open.
    pub fn detached(defaults: GlobalSettings) -> SharedStore {
        Self::build(Document::new(defaults), Arc::new(MemoryBackend::new()))
    }

    /// Shared access to the live document.
    pub async fn read(&self) -> RwLockReadGuard<'_, Document> {
        self.document.read().await
    }

    /// Exclusive access to the live document; autosave waits until the guard is dropped.
    pub async fn write(&self) -> RwLockWriteGuard<'_, Document> {
        self.document.write().await
    }

    /// Persist the current document, replacing the previous durable copy.
    pub async fn save(&self) -> Result<(), ServiceError> {
        // Saves run one at a time so an older snapshot never lands after a newer one.
        let _gate = self.save_gate.lock().await;
        let snapshot = {
            let document = self.document.read().await;
            DocumentEntity::from(&*document)
        };
        self.backend.persist(snapshot).await?;
        debug!("document saved");
        Ok(())
    }

    /// Reference time stamped on games started or ended.
    pub fn now(&self) -> OffsetDateTime {
        *self.now.borrow()
    }

    /// Move the reference time to the current wall clock.
    pub fn refresh_clock(&self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        self.now.send_replace(now);
        now
    }

    /// Where the document is persisted, for log lines.
    pub fn location(&self) -> String {
        self.backend.describe()
    }
}
