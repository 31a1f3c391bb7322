/// Single JSON file on disk.
pub mod file;
/// Process-local backend.
pub mod memory;

use crate::dao::models::DocumentEntity;
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

pub use file::JsonFileBackend;
pub use memory::MemoryBackend;

/// Abstraction over the durable medium holding the serialized document.
pub trait DocumentBackend: Send + Sync {
    /// Read the persisted document, `None` when nothing was stored yet.
    fn load(&self) -> BoxFuture<'static, StorageResult<Option<DocumentEntity>>>;
    /// Replace the persisted document with `document`.
    fn persist(&self, document: DocumentEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Human readable location used in log lines.
    fn describe(&self) -> String;
}
