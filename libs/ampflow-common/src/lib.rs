//! AmpFlow basic library
//!
//! Provides basic functions shared by all services, including:
//! - SQLite client with pool management
//! - configuration loading (file + environment overlay)
//! - logging initialization
//! - graceful shutdown handling

pub mod config;
pub mod logging;
pub mod shutdown;
pub mod sqlite;

pub use config::load_config_from_file;
pub use sqlite::{SqliteClient, SqlitePool};

// Re-export common dependencies
pub use anyhow;
pub use serde;
pub use serde_json;
pub use tokio;
