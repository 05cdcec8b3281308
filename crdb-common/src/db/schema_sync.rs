//! Additive schema synchronization
//!
//! Databases created by older releases lack columns that later became part of
//! the schema (`entries.notes`, `events.event_distance`, the extended school
//! columns). Each table declares the columns it expects through
//! [`TableSchema`]; on startup any missing column is added with
//! `ALTER TABLE ... ADD COLUMN`.
//!
//! Only additions are automatic. Type or constraint drift is reported and left
//! alone, since SQLite cannot alter either without rebuilding the table.
//!
//! ```rust,ignore
//! SchemaSync::sync_table::<EntriesTableSchema>(&pool).await?;
//! ```

use crate::Result;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};

/// Column definition with SQL constraints
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    /// SQL type (e.g., "TEXT", "INTEGER", "REAL", "DATETIME")
    pub sql_type: String,
    pub not_null: bool,
    pub primary_key: bool,
    pub unique: bool,
    /// Literal SQL default used when the column has to be added
    pub default_value: Option<String>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            primary_key: false,
            unique: false,
            default_value: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// Column as reported by `PRAGMA table_info`
#[derive(Debug, Clone)]
pub struct ActualColumn {
    pub cid: i32,
    pub name: String,
    pub type_name: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub pk: bool,
}

/// Difference between the declared and the actual table
#[derive(Debug, Clone)]
pub enum SchemaDrift {
    MissingColumn {
        table: String,
        column: ColumnDefinition,
    },
    TypeMismatch {
        table: String,
        column: String,
        expected: String,
        actual: String,
    },
    ConstraintMismatch {
        table: String,
        column: String,
        constraint: String,
    },
}

/// Declared shape of one table
pub trait TableSchema {
    fn table_name() -> &'static str;

    fn expected_columns() -> Vec<ColumnDefinition>;
}

pub struct SchemaIntrospector;

impl SchemaIntrospector {
    /// Columns in table order
    pub async fn introspect_table(pool: &SqlitePool, table_name: &str) -> Result<Vec<ActualColumn>> {
        let query = format!("PRAGMA table_info({})", table_name);
        let rows = sqlx::query(&query).fetch_all(pool).await?;

        let mut columns: Vec<ActualColumn> = rows
            .iter()
            .map(|row| ActualColumn {
                cid: row.get("cid"),
                name: row.get("name"),
                type_name: row.get("type"),
                not_null: row.get::<i32, _>("notnull") != 0,
                default_value: row.get("dflt_value"),
                pk: row.get::<i32, _>("pk") != 0,
            })
            .collect();

        columns.sort_by_key(|c| c.cid);

        Ok(columns)
    }

    pub async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM sqlite_master
                WHERE type='table' AND name = ?
            )
            "#,
        )
        .bind(table_name)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }
}

pub struct SchemaDiff;

impl SchemaDiff {
    pub fn compare(
        table_name: &str,
        expected: &[ColumnDefinition],
        actual: &[ActualColumn],
    ) -> Vec<SchemaDrift> {
        let mut drift = Vec::new();

        for expected_col in expected {
            let Some(actual_col) = actual.iter().find(|c| c.name == expected_col.name) else {
                drift.push(SchemaDrift::MissingColumn {
                    table: table_name.to_string(),
                    column: expected_col.clone(),
                });
                continue;
            };

            if !Self::types_compatible(&expected_col.sql_type, &actual_col.type_name) {
                drift.push(SchemaDrift::TypeMismatch {
                    table: table_name.to_string(),
                    column: expected_col.name.clone(),
                    expected: expected_col.sql_type.clone(),
                    actual: actual_col.type_name.clone(),
                });
            }

            if expected_col.not_null && !actual_col.not_null {
                drift.push(SchemaDrift::ConstraintMismatch {
                    table: table_name.to_string(),
                    column: expected_col.name.clone(),
                    constraint: "NOT NULL".to_string(),
                });
            }

            if expected_col.primary_key && !actual_col.pk {
                drift.push(SchemaDrift::ConstraintMismatch {
                    table: table_name.to_string(),
                    column: expected_col.name.clone(),
                    constraint: "PRIMARY KEY".to_string(),
                });
            }
        }

        drift
    }

    /// SQLite type affinity comparison
    fn types_compatible(expected: &str, actual: &str) -> bool {
        let exp = expected.to_uppercase();
        let act = actual.to_uppercase();

        if exp == act {
            return true;
        }

        let affinity = |t: &str| {
            if t.contains("INT") {
                Some("INTEGER")
            } else if t.contains("TEXT") || t.contains("CHAR") || t.contains("CLOB") {
                Some("TEXT")
            } else if t.contains("REAL") || t.contains("FLOA") || t.contains("DOUB") {
                Some("REAL")
            } else if t.contains("DATE") || t.contains("TIME") {
                // Stored as ISO-8601 text throughout
                Some("TEXT")
            } else {
                None
            }
        };

        matches!((affinity(&exp), affinity(&act)), (Some(a), Some(b)) if a == b)
    }
}

pub struct SchemaSync;

impl SchemaSync {
    /// Add any declared column the table is missing
    pub async fn sync_table<T: TableSchema>(pool: &SqlitePool) -> Result<()> {
        let table_name = T::table_name();

        if !SchemaIntrospector::table_exists(pool, table_name).await? {
            warn!("Schema sync: table '{}' does not exist", table_name);
            return Ok(());
        }

        let actual = SchemaIntrospector::introspect_table(pool, table_name).await?;
        let drift = SchemaDiff::compare(table_name, &T::expected_columns(), &actual);

        if drift.is_empty() {
            debug!("Schema up to date for '{}'", table_name);
            return Ok(());
        }

        for change in drift {
            match change {
                SchemaDrift::MissingColumn { table, column } => {
                    Self::add_column(pool, &table, &column).await?;
                }
                SchemaDrift::TypeMismatch {
                    table,
                    column,
                    expected,
                    actual,
                } => {
                    warn!(
                        "Type mismatch in {}.{}: expected '{}', found '{}'",
                        table, column, expected, actual
                    );
                }
                SchemaDrift::ConstraintMismatch {
                    table,
                    column,
                    constraint,
                } => {
                    warn!("Constraint mismatch in {}.{}: missing '{}'", table, column, constraint);
                }
            }
        }

        Ok(())
    }

    async fn add_column(pool: &SqlitePool, table: &str, column: &ColumnDefinition) -> Result<()> {
        let mut sql = format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            table, column.name, column.sql_type
        );

        // SQLite cannot add PRIMARY KEY or UNIQUE columns, nor NOT NULL without a default
        if column.primary_key || column.unique {
            warn!(
                "Adding {}.{} without its PRIMARY KEY/UNIQUE constraint",
                table, column.name
            );
        }

        match (&column.default_value, column.not_null) {
            (Some(default), true) => sql.push_str(&format!(" NOT NULL DEFAULT {}", default)),
            (Some(default), false) => sql.push_str(&format!(" DEFAULT {}", default)),
            (None, true) => warn!("Adding {}.{} as nullable (no default)", table, column.name),
            (None, false) => {}
        }

        info!("Adding column {}.{} ({})", table, column.name, column.sql_type);

        match sqlx::query(&sql).execute(pool).await {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("duplicate column") => {
                debug!("Column {}.{} already present", table, column.name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    struct LegacyEntries;

    impl TableSchema for LegacyEntries {
        fn table_name() -> &'static str {
            "entries"
        }

        fn expected_columns() -> Vec<ColumnDefinition> {
            vec![
                ColumnDefinition::new("entry_id", "INTEGER").primary_key(),
                ColumnDefinition::new("event_id", "INTEGER").not_null(),
                ColumnDefinition::new("notes", "TEXT").default("''"),
            ]
        }
    }

    #[test]
    fn test_types_compatible() {
        assert!(SchemaDiff::types_compatible("TEXT", "text"));
        assert!(SchemaDiff::types_compatible("INTEGER", "INT"));
        assert!(SchemaDiff::types_compatible("DATETIME", "DATETIME"));
        assert!(SchemaDiff::types_compatible("DATE", "TEXT"));
        assert!(SchemaDiff::types_compatible("REAL", "DOUBLE"));
        assert!(!SchemaDiff::types_compatible("TEXT", "INTEGER"));
        assert!(!SchemaDiff::types_compatible("REAL", "TEXT"));
    }

    #[tokio::test]
    async fn test_missing_column_is_added_with_default() {
        let pool = setup_test_db().await;
        sqlx::query("CREATE TABLE entries (entry_id INTEGER PRIMARY KEY, event_id INTEGER NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO entries (event_id) VALUES (7)")
            .execute(&pool)
            .await
            .unwrap();

        SchemaSync::sync_table::<LegacyEntries>(&pool).await.unwrap();
        // Second run is a no-op
        SchemaSync::sync_table::<LegacyEntries>(&pool).await.unwrap();

        let notes: String = sqlx::query_scalar("SELECT notes FROM entries")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(notes, "");

        let columns = SchemaIntrospector::introspect_table(&pool, "entries").await.unwrap();
        assert_eq!(columns.len(), 3);
    }

    #[tokio::test]
    async fn test_constraint_drift_is_reported_not_fixed() {
        let pool = setup_test_db().await;
        sqlx::query("CREATE TABLE entries (entry_id INTEGER PRIMARY KEY, event_id INTEGER, notes TEXT)")
            .execute(&pool)
            .await
            .unwrap();

        let actual = SchemaIntrospector::introspect_table(&pool, "entries").await.unwrap();
        let drift = SchemaDiff::compare("entries", &LegacyEntries::expected_columns(), &actual);

        assert_eq!(drift.len(), 1);
        assert!(matches!(
            &drift[0],
            SchemaDrift::ConstraintMismatch { column, .. } if column == "event_id"
        ));
    }

    #[tokio::test]
    async fn test_sync_skips_missing_table() {
        let pool = setup_test_db().await;
        SchemaSync::sync_table::<LegacyEntries>(&pool).await.unwrap();
        assert!(!SchemaIntrospector::table_exists(&pool, "entries").await.unwrap());
    }
}
