//! Review notes: a page that appends timestamped reviews to a local SQLite
//! store and lists them newest first, with optional per-entry deletion.

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod repository;
pub mod service;
pub mod view;

pub use error::NotesError;
