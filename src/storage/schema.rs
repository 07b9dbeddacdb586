//! Database schema definitions

/// Name of the only table the application reads
pub const DERMATOLOGISTS_TABLE: &str = "dermatologists";

/// SQL to create the dermatologists table
pub const CREATE_DERMATOLOGISTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS dermatologists (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    city TEXT NOT NULL,
    status TEXT NOT NULL,
    specialties TEXT
)
"#;

/// SQL to insert one dermatologist row
pub const INSERT_DERMATOLOGIST: &str = r#"
INSERT INTO dermatologists (id, name, city, status, specialties)
VALUES (?1, ?2, ?3, ?4, ?5)
"#;

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    vec![CREATE_DERMATOLOGISTS_TABLE]
}
