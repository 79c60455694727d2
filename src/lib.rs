//! Core of a real-time text-to-image playground.
//!
//! Prompt edits are debounced into at most one outstanding image request; results are
//! deduplicated and appended to a session history persisted through a key/value
//! storage port, with the active session addressed by a URL `session` parameter.

pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod navigation;
pub mod pipeline;
pub mod runtime;
pub mod session;
pub mod settings;
pub mod storage;
pub mod styles;

pub use app::{BlinkShot, Command, GalleryEntry};
pub use client::{ImageClient, ImageGenerator};
pub use config::{Config, DebounceConfig};
pub use error::{BlinkShotError, Result};
pub use models::*;
pub use navigation::{MemoryNavigator, Navigator};
pub use pipeline::{Effect, Event, GenerationPipeline, PipelineState};
pub use runtime::{Input, Runtime};
pub use session::SessionStore;
pub use settings::UserSettings;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
