//! Database schema, models and queries

pub mod conferences;
pub mod events;
pub mod init;
pub mod migrations;
pub mod models;
pub mod participations;
pub mod regattas;
pub mod results;
pub mod schema_sync;
pub mod schools;
pub mod seed;
pub mod table_schemas;

pub use init::*;
pub use migrations::{run_migrations, CURRENT_SCHEMA_VERSION};
pub use models::*;
pub use schema_sync::*;
pub use table_schemas::*;
