//! Library crate for rps-ledger, exposing the game document store for the binary and integration tests.

/// Runtime configuration loaded from JSON.
pub mod config;
/// Line commands driving a [`services::game_service::Session`].
pub mod console;
/// Persistence layer: entities and durable backends.
pub mod dao;
/// Errors surfaced to callers of the store and the game flow.
pub mod error;
/// Game flow and background tasks.
pub mod services;
/// In-memory document, scoring rules and the shared store.
pub mod state;
