mod error;
mod store;

use crate::dao::storage::StorageError;

pub use error::FileDaoError;
pub use store::{DOCUMENT_FILE_NAME, JsonFileBackend};

impl From<FileDaoError> for StorageError {
    fn from(err: FileDaoError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}
