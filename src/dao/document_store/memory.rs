use std::{
    io,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use futures::future::BoxFuture;

use crate::dao::{
    document_store::DocumentBackend,
    models::DocumentEntity,
    storage::{StorageError, StorageResult},
};

/// Volatile backend used for detached sessions and tests.
///
/// Only the latest document is retained. [`MemoryBackend::with_history`] additionally keeps every
/// persisted snapshot so tests can inspect what each save observed.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    latest: Option<DocumentEntity>,
    /// `Some` only for recording backends.
    history: Option<Vec<DocumentEntity>>,
    saves: usize,
    unavailable: bool,
}

impl MemoryBackend {
    /// Empty backend: the first load reports that nothing was stored.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty backend that also records every persisted document.
    pub fn with_history() -> Self {
        let backend = Self::new();
        backend.state().history = Some(Vec::new());
        backend
    }

    /// Backend that already holds `document`.
    pub fn with_document(document: DocumentEntity) -> Self {
        let backend = Self::new();
        backend.state().latest = Some(document);
        backend
    }

    /// Simulate the medium becoming unreadable/unwritable (or recovering).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// Most recently stored document.
    pub fn current(&self) -> Option<DocumentEntity> {
        self.state().latest.clone()
    }

    /// Every document persisted so far, oldest first; empty unless built with
    /// [`MemoryBackend::with_history`].
    pub fn snapshots(&self) -> Vec<DocumentEntity> {
        self.state().history.clone().unwrap_or_default()
    }

    /// Number of successful persists.
    pub fn save_count(&self) -> usize {
        self.state().saves
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_available(state: &MemoryState) -> StorageResult<()> {
        if state.unavailable {
            return Err(StorageError::unavailable(
                "in-memory medium marked unavailable".into(),
                io::Error::other("simulated outage"),
            ));
        }
        Ok(())
    }
}

impl DocumentBackend for MemoryBackend {
    fn load(&self) -> BoxFuture<'static, StorageResult<Option<DocumentEntity>>> {
        let result = {
            let state = self.state();
            Self::check_available(&state).map(|()| state.latest.clone())
        };
        Box::pin(async move { result })
    }

    fn persist(&self, document: DocumentEntity) -> BoxFuture<'static, StorageResult<()>> {
        let result = {
            let mut state = self.state();
            Self::check_available(&state).map(|()| {
                if let Some(history) = state.history.as_mut() {
                    history.push(document.clone());
                }
                state.latest = Some(document);
                state.saves += 1;
            })
        };
        Box::pin(async move { result })
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}
