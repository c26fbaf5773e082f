//! UI layer for the desktop GUI: app shell and the graph texture factory.

pub mod app;
pub mod graph_texture;

pub use app::{GraphQaApp, PersistedGuiSettings, SETTINGS_STORAGE_KEY};
