pub mod api;
pub mod config;
pub mod error;
pub mod mail;
pub mod models;
pub mod redis;
pub mod send;
pub mod state;
pub mod store;
pub mod tracking;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
