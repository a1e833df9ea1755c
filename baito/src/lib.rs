//! Baito library
//!
//! Shift and salary tracking core: the wage calculator, a record store that
//! runs against device-local storage for guests or a remote document store
//! for accounts, and the one-time migration between the two.

pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod identity;
pub mod models;
pub mod services;
pub mod session;
pub mod storage;

pub use app::AppState;
pub use error::{AppError, Result};
