//! # CRDB Common Library
//!
//! Shared code for the college rowing results database:
//! - Team categories, boat types and display helpers
//! - Race time and schedule time parsing
//! - Season ranges and participation overlap planning
//! - SQLite schema and data access
//! - School change notifications
//! - Configuration loading

pub mod categories;
pub mod changes;
pub mod config;
pub mod db;
pub mod error;
pub mod race_time;
pub mod schedule_time;
pub mod season;

pub use categories::{Gender, TeamCategory, Weight};
pub use changes::{ChangeBus, SchoolChange};
pub use error::{Error, Result};
pub use race_time::RaceTime;
pub use season::Season;
