//! SQLite storage implementation

use std::path::Path;
use rusqlite::{Connection, OpenFlags, OptionalExtension, types::ValueRef};
use serde::Serialize;
use crate::{Result, Error};
use crate::record::DermatologistRecord;
use super::schema;

/// Read-only handle over a provisioned dermatologist database
pub struct DermatologistStore {
    conn: Connection,
}

/// Tabular result of an ad-hoc query, with every value rendered as text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// True when more rows matched than were kept
    pub truncated: bool,
}

impl QueryOutput {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as a pipe-separated block for prompts and logs
    pub fn to_text(&self) -> String {
        let mut out = self.columns.join(" | ");
        for row in &self.rows {
            out.push('\n');
            out.push_str(&row.join(" | "));
        }
        if self.truncated {
            out.push_str("\n(more rows omitted)");
        }
        out
    }
}

impl DermatologistStore {
    /// Open an existing database file without write access
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::DatabaseMissing(path.display().to_string()));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Open an in-memory database filled with the seed rows (for testing)
    pub fn open_seeded_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])?;
        }
        for r in crate::record::seed_records() {
            conn.execute(
                schema::INSERT_DERMATOLOGIST,
                rusqlite::params![r.id, r.name, r.city, r.status, r.specialties],
            )?;
        }
        Ok(Self { conn })
    }

    /// Fail unless the dermatologists table is present
    pub fn ensure_queryable(&self) -> Result<()> {
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [schema::DERMATOLOGISTS_TABLE],
                |row| row.get(0),
            )
            .optional()?;
        match found {
            Some(_) => Ok(()),
            None => Err(Error::MissingTable(schema::DERMATOLOGISTS_TABLE.to_string())),
        }
    }

    /// User tables, sorted by name
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    /// The CREATE statements of all user tables
    pub fn schema_sql(&self) -> Result<String> {
        let mut stmt = self.conn.prepare(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND sql IS NOT NULL ORDER BY name",
        )?;
        let statements = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(statements
            .iter()
            .map(|s| s.trim().to_string())
            .collect::<Vec<_>>()
            .join(";\n\n"))
    }

    /// First `limit` rows of the dermatologists table
    pub fn sample_rows(&self, limit: usize) -> Result<QueryOutput> {
        self.run_query(
            &format!("SELECT * FROM {}", schema::DERMATOLOGISTS_TABLE),
            limit,
        )
    }

    /// Run one statement and keep at most `limit` rows
    pub fn run_query(&self, sql: &str, limit: usize) -> Result<QueryOutput> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query([])?;
        let mut kept = Vec::new();
        let mut truncated = false;
        while let Some(row) = rows.next()? {
            if kept.len() == limit {
                truncated = true;
                break;
            }
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(render_value(row.get_ref(i)?));
            }
            kept.push(values);
        }

        Ok(QueryOutput {
            columns,
            rows: kept,
            truncated,
        })
    }

    /// Count all dermatologists
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM dermatologists",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Every record, ordered by id
    pub fn all_records(&self) -> Result<Vec<DermatologistRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, city, status, specialties FROM dermatologists ORDER BY id",
        )?;
        let records = stmt
            .query_map([], |row| self.row_to_record(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Get statistics
    pub fn stats(&self) -> Result<DbStats> {
        let active: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM dermatologists WHERE status = 'Active'",
            [],
            |row| row.get(0),
        )?;
        let cities: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT city) FROM dermatologists",
            [],
            |row| row.get(0),
        )?;
        Ok(DbStats {
            records: self.count()?,
            active: active as usize,
            cities: cities as usize,
        })
    }

    /// Helper to convert a row to a record
    fn row_to_record(&self, row: &rusqlite::Row) -> rusqlite::Result<DermatologistRecord> {
        Ok(DermatologistRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            city: row.get(2)?,
            status: row.get(3)?,
            specialties: row.get(4)?,
        })
    }
}

fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

/// Database statistics
#[derive(Debug, Clone, Serialize)]
pub struct DbStats {
    pub records: usize,
    pub active: usize,
    pub cities: usize,
}
