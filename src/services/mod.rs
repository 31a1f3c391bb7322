/// Periodic background save of the shared document.
pub mod autosave;
/// Game lifecycle operations driven by the interactive side.
pub mod game_service;
