/// Durable backends holding the serialized document.
pub mod document_store;
/// Persisted representation of the document.
pub mod models;
/// Storage abstraction layer errors.
pub mod storage;
