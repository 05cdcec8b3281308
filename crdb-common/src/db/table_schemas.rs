//! Declared column sets for tables that have grown since the first release
//!
//! ```rust,ignore
//! sync_all_table_schemas(&pool).await?;
//! ```

use crate::db::schema_sync::{ColumnDefinition, SchemaSync, TableSchema};
use crate::Result;
use sqlx::SqlitePool;
use tracing::debug;

/// `schools`: the display columns and timestamps were added after
/// `name`/`crr_name`
pub struct SchoolsTableSchema;

impl TableSchema for SchoolsTableSchema {
    fn table_name() -> &'static str {
        "schools"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("school_id", "INTEGER").primary_key(),
            ColumnDefinition::new("name", "TEXT").not_null(),
            ColumnDefinition::new("short_name", "TEXT"),
            ColumnDefinition::new("acronym", "TEXT"),
            // Backfilled from `name` by migration v1
            ColumnDefinition::new("crr_name", "TEXT").unique(),
            ColumnDefinition::new("color", "TEXT"),
            // ADD COLUMN rejects non-constant defaults
            ColumnDefinition::new("created_at", "DATETIME"),
            ColumnDefinition::new("updated_at", "DATETIME"),
        ]
    }
}

pub struct EventsTableSchema;

impl TableSchema for EventsTableSchema {
    fn table_name() -> &'static str {
        "events"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("event_id", "INTEGER").primary_key(),
            ColumnDefinition::new("regatta_id", "INTEGER").not_null(),
            ColumnDefinition::new("boat_type", "TEXT").not_null(),
            ColumnDefinition::new("event_boat_class", "TEXT").not_null(),
            ColumnDefinition::new("gender", "TEXT").not_null(),
            ColumnDefinition::new("weight", "TEXT").not_null(),
            ColumnDefinition::new("round", "TEXT").not_null(),
            ColumnDefinition::new("event_distance", "TEXT").default("'2k'"),
            ColumnDefinition::new("scheduled_at", "DATETIME"),
        ]
    }
}

pub struct EntriesTableSchema;

impl TableSchema for EntriesTableSchema {
    fn table_name() -> &'static str {
        "entries"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("entry_id", "INTEGER").primary_key(),
            ColumnDefinition::new("event_id", "INTEGER").not_null(),
            ColumnDefinition::new("team_id", "INTEGER").not_null(),
            ColumnDefinition::new("entry_boat_class", "TEXT"),
            ColumnDefinition::new("conference_at_time", "TEXT"),
            ColumnDefinition::new("seed", "INTEGER"),
            ColumnDefinition::new("notes", "TEXT").default("''"),
        ]
    }
}

/// Add missing columns to every declared table
///
/// Runs after `CREATE TABLE IF NOT EXISTS` and before migrations.
pub async fn sync_all_table_schemas(pool: &SqlitePool) -> Result<()> {
    debug!("Synchronizing table schemas");

    SchemaSync::sync_table::<SchoolsTableSchema>(pool).await?;
    SchemaSync::sync_table::<EventsTableSchema>(pool).await?;
    SchemaSync::sync_table::<EntriesTableSchema>(pool).await?;

    Ok(())
}
