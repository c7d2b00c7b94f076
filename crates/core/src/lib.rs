#![warn(clippy::all, missing_docs)]

//! Core domain logic for the gamedeals terminal client.
//!
//! This crate hosts the API client and envelope handling, the domain
//! services, the search page controller with its debounce/cancellation
//! machinery, and the shared state containers used by the terminal UI.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod nav;
pub mod profile;
pub mod search;
pub mod services;
pub mod slider;
pub mod state;
pub mod util;

pub use api::{ApiClient, Telemetry};
pub use config::AppConfig;
pub use error::ApiError;
pub use models::{Category, Comment, Game, ServerInfo, UserProfile};
pub use search::{SearchController, SearchPhase, SessionStore};
pub use state::AppState;
