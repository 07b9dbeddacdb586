//! Database provisioning
//!
//! Makes sure a queryable database exists at the persistent target path
//! before anything else runs. Exactly one of three things happens:
//! - the target already holds a file and is left alone
//! - a bundled seed file is copied onto the target
//! - a fresh database with the four seed rows is synthesized
//!
//! Every write goes to a temporary file in the target directory and is
//! renamed into place, so an interrupted run never leaves a truncated
//! database behind for the next run to mistake for a finished one.
//!
//! The existence check and the write are not guarded against other
//! processes. Two first runs sharing a target can both decide to write;
//! the later rename wins and the file is complete either way.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use tempfile::NamedTempFile;

use super::schema;
use crate::record::seed_records;

/// Boxed cause used where either SQLite or the filesystem can fail
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync>;

/// Fatal provisioning failures. The caller is expected to halt.
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    #[error("No seed database found at {path} and synthesis is disabled")]
    SourceMissing { path: String },

    #[error("Cannot write database at {}: {source}", path.display())]
    TargetUnwritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to copy {} to {}: {source}", from.display(), to.display())]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create database at {}: {source}", path.display())]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: BoxedCause,
    },
}

/// Decision taken by the existence check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionPlan {
    Keep,
    Copy { from: PathBuf },
    Seed,
}

/// What a provisioning run actually did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    AlreadyPresent,
    Copied { from: PathBuf },
    Seeded { rows: usize },
}

impl std::fmt::Display for ProvisionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyPresent => write!(f, "existing database kept"),
            Self::Copied { from } => write!(f, "copied from {}", from.display()),
            Self::Seeded { rows } => write!(f, "created with {} sample rows", rows),
        }
    }
}

/// Ensures the persistent database exists
#[derive(Debug, Clone)]
pub struct DatabaseProvisioner {
    source: Option<PathBuf>,
    target: PathBuf,
    synthesize: bool,
}

impl DatabaseProvisioner {
    pub fn new(source: Option<PathBuf>, target: PathBuf) -> Self {
        Self {
            source,
            target,
            synthesize: true,
        }
    }

    /// Allow or forbid creating a sample database when no source exists
    pub fn synthesize(mut self, enabled: bool) -> Self {
        self.synthesize = enabled;
        self
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Check, then write
    pub fn provision(&self) -> Result<ProvisionOutcome, ProvisioningError> {
        let plan = self.plan()?;
        let outcome = self.execute(plan)?;
        tracing::info!("Database at {}: {}", self.target.display(), outcome);
        Ok(outcome)
    }

    /// Inspect the filesystem and decide which branch applies
    pub fn plan(&self) -> Result<ProvisionPlan, ProvisioningError> {
        match fs::metadata(&self.target) {
            Ok(meta) if meta.is_file() => return Ok(ProvisionPlan::Keep),
            Ok(_) => {
                return Err(ProvisioningError::TargetUnwritable {
                    path: self.target.clone(),
                    source: io::Error::other("path exists but is not a regular file"),
                });
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ProvisioningError::TargetUnwritable {
                    path: self.target.clone(),
                    source: e,
                });
            }
        }

        if let Some(source) = self.source.as_ref().filter(|p| p.is_file()) {
            return Ok(ProvisionPlan::Copy { from: source.clone() });
        }

        if self.synthesize {
            Ok(ProvisionPlan::Seed)
        } else {
            Err(ProvisioningError::SourceMissing {
                path: self
                    .source
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(none configured)".to_string()),
            })
        }
    }

    /// Carry out a plan. Does not re-check the target.
    pub fn execute(&self, plan: ProvisionPlan) -> Result<ProvisionOutcome, ProvisioningError> {
        match plan {
            ProvisionPlan::Keep => Ok(ProvisionOutcome::AlreadyPresent),
            ProvisionPlan::Copy { from } => {
                self.ensure_parent()?;
                let copy_failed = |source| ProvisioningError::CopyFailed {
                    from: from.clone(),
                    to: self.target.clone(),
                    source,
                };
                let mut reader = fs::File::open(&from).map_err(copy_failed)?;
                let bytes = copy_atomically(&mut reader, &self.target).map_err(copy_failed)?;
                tracing::debug!("Copied {} bytes from {}", bytes, from.display());
                Ok(ProvisionOutcome::Copied { from })
            }
            ProvisionPlan::Seed => {
                let dir = self.ensure_parent()?;
                let rows = synthesize_atomically(&dir, &self.target).map_err(|source| {
                    ProvisioningError::CreateFailed {
                        path: self.target.clone(),
                        source,
                    }
                })?;
                Ok(ProvisionOutcome::Seeded { rows })
            }
        }
    }

    fn ensure_parent(&self) -> Result<PathBuf, ProvisioningError> {
        let dir = parent_dir(&self.target);
        fs::create_dir_all(&dir).map_err(|source| ProvisioningError::TargetUnwritable {
            path: self.target.clone(),
            source,
        })?;
        Ok(dir)
    }
}

/// Stream `reader` into `target` through a temporary sibling file.
///
/// On error nothing is left at `target` and the temporary file is removed.
pub fn copy_atomically<R: Read>(reader: &mut R, target: &Path) -> io::Result<u64> {
    let mut tmp = NamedTempFile::new_in(parent_dir(target))?;
    let bytes = io::copy(reader, &mut tmp)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(bytes)
}

fn synthesize_atomically(dir: &Path, target: &Path) -> Result<usize, BoxedCause> {
    let tmp = NamedTempFile::new_in(dir)?;
    let rows = write_seed_database(tmp.path())?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(rows)
}

fn write_seed_database(path: &Path) -> rusqlite::Result<usize> {
    let mut conn = Connection::open(path)?;
    for stmt in schema::all_schema_statements() {
        conn.execute(stmt, [])?;
    }

    let records = seed_records();
    let tx = conn.transaction()?;
    {
        let mut insert = tx.prepare(schema::INSERT_DERMATOLOGIST)?;
        for record in &records {
            insert.execute(params![
                record.id,
                record.name,
                record.city,
                record.status,
                record.specialties,
            ])?;
        }
    }
    tx.commit()?;
    conn.close().map_err(|(_, e)| e)?;

    Ok(records.len())
}

fn parent_dir(target: &Path) -> PathBuf {
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DermatologistRecord;
    use tempfile::TempDir;

    fn read_records(path: &Path) -> Vec<DermatologistRecord> {
        let conn = Connection::open(path).unwrap();
        let mut stmt = conn
            .prepare("SELECT id, name, city, status, specialties FROM dermatologists ORDER BY id")
            .unwrap();
        stmt.query_map([], |row| {
            Ok(DermatologistRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                city: row.get(2)?,
                status: row.get(3)?,
                specialties: row.get(4)?,
            })
        })
        .unwrap()
        .collect::<rusqlite::Result<Vec<_>>>()
        .unwrap()
    }

    fn custom_database(path: &Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute(schema::CREATE_DERMATOLOGISTS_TABLE, []).unwrap();
        conn.execute(
            schema::INSERT_DERMATOLOGIST,
            params![42, "Dr. Zed Custom", "Boston", "Active", "Melanoma"],
        )
        .unwrap();
    }

    /// Yields some bytes, then fails like a disk error mid-copy
    struct FailingReader {
        remaining: usize,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.remaining == 0 {
                return Err(io::Error::other("simulated write failure"));
            }
            let n = buf.len().min(self.remaining);
            buf[..n].fill(0xAB);
            self.remaining -= n;
            Ok(n)
        }
    }

    #[test]
    fn test_seeds_when_nothing_exists() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("x").join("doctors.db");

        let outcome = DatabaseProvisioner::new(None, target.clone()).provision().unwrap();
        assert_eq!(outcome, ProvisionOutcome::Seeded { rows: 4 });

        let conn = Connection::open(&target).unwrap();
        let count: i64 = conn
            .query_row("SELECT count(*) FROM dermatologists", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 4);
        assert_eq!(read_records(&target), seed_records());
    }

    #[test]
    fn test_second_run_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("doctors.db");
        let provisioner = DatabaseProvisioner::new(None, target.clone());

        provisioner.provision().unwrap();
        let first = fs::read(&target).unwrap();

        let outcome = provisioner.provision().unwrap();
        assert_eq!(outcome, ProvisionOutcome::AlreadyPresent);
        assert_eq!(fs::read(&target).unwrap(), first);
    }

    #[test]
    fn test_copy_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("bundled.db");
        custom_database(&source);
        let target = dir.path().join("persistent").join("doctors.db");

        let outcome = DatabaseProvisioner::new(Some(source.clone()), target.clone())
            .provision()
            .unwrap();

        assert_eq!(outcome, ProvisionOutcome::Copied { from: source.clone() });
        assert_eq!(fs::read(&target).unwrap(), fs::read(&source).unwrap());
    }

    #[test]
    fn test_existing_target_is_never_overwritten() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("doctors.db");
        custom_database(&target);
        let source = dir.path().join("bundled.db");
        fs::write(&source, b"not the file you want").unwrap();

        let outcome = DatabaseProvisioner::new(Some(source), target.clone())
            .provision()
            .unwrap();

        assert_eq!(outcome, ProvisionOutcome::AlreadyPresent);
        let records = read_records(&target);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Dr. Zed Custom");
    }

    #[test]
    fn test_creates_intermediate_directories() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a").join("b").join("c").join("doctors.db");

        DatabaseProvisioner::new(None, target.clone()).provision().unwrap();

        assert!(target.is_file());
    }

    #[test]
    fn test_interrupted_copy_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("doctors.db");
        let mut reader = FailingReader { remaining: 64 * 1024 };

        let err = copy_atomically(&mut reader, &target).unwrap_err();

        assert_eq!(err.to_string(), "simulated write failure");
        assert!(!target.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_source_falls_back_to_seed() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("nope.db");
        let target = dir.path().join("doctors.db");

        let outcome = DatabaseProvisioner::new(Some(source), target).provision().unwrap();

        assert_eq!(outcome, ProvisionOutcome::Seeded { rows: 4 });
    }

    #[test]
    fn test_source_missing_when_synthesis_disabled() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("doctors.db");

        let err = DatabaseProvisioner::new(Some(dir.path().join("nope.db")), target.clone())
            .synthesize(false)
            .provision()
            .unwrap_err();

        assert!(matches!(err, ProvisioningError::SourceMissing { .. }));
        assert!(!target.exists());
    }

    #[test]
    fn test_directory_at_target_is_unwritable() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("doctors.db");
        fs::create_dir(&target).unwrap();

        let err = DatabaseProvisioner::new(None, target).provision().unwrap_err();

        assert!(matches!(err, ProvisioningError::TargetUnwritable { .. }));
    }

    #[test]
    fn test_file_in_place_of_parent_is_unwritable() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("data");
        fs::write(&blocker, b"").unwrap();

        let err = DatabaseProvisioner::new(None, blocker.join("doctors.db"))
            .provision()
            .unwrap_err();

        assert!(matches!(err, ProvisioningError::TargetUnwritable { .. }));
    }

    #[test]
    fn test_source_vanishing_after_plan_is_copy_failed() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("bundled.db");
        custom_database(&source);
        let target = dir.path().join("persistent").join("doctors.db");
        let provisioner = DatabaseProvisioner::new(Some(source.clone()), target.clone());

        let plan = provisioner.plan().unwrap();
        fs::remove_file(&source).unwrap();
        let err = provisioner.execute(plan).unwrap_err();

        match err {
            ProvisioningError::CopyFailed { from, to, source: cause } => {
                assert_eq!(from, source);
                assert_eq!(to, target);
                assert_eq!(cause.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected CopyFailed, got {other:?}"),
        }
        assert!(!target.exists());
        assert_eq!(fs::read_dir(target.parent().unwrap()).unwrap().count(), 0);
    }

    #[test]
    fn test_seed_rename_failure_is_create_failed() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("doctors.db");
        let provisioner = DatabaseProvisioner::new(None, target.clone());

        let plan = provisioner.plan().unwrap();
        assert_eq!(plan, ProvisionPlan::Seed);
        // A non-empty directory appears at the target before the write lands
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep.txt"), b"occupied").unwrap();

        let err = provisioner.execute(plan).unwrap_err();

        assert!(matches!(err, ProvisioningError::CreateFailed { ref path, .. } if *path == target));
        assert!(target.is_dir());
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("doctors.db")]);
    }

    // Known race: nothing serializes the check and the write. Two first runs
    // both plan a write and the later rename replaces the earlier file.
    #[test]
    fn test_concurrent_first_runs_both_write() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("doctors.db");
        let source = dir.path().join("bundled.db");
        custom_database(&source);

        let seeder = DatabaseProvisioner::new(None, target.clone());
        let copier = DatabaseProvisioner::new(Some(source.clone()), target.clone());

        let seed_plan = seeder.plan().unwrap();
        let copy_plan = copier.plan().unwrap();
        assert_eq!(seed_plan, ProvisionPlan::Seed);
        assert_eq!(copy_plan, ProvisionPlan::Copy { from: source.clone() });

        seeder.execute(seed_plan).unwrap();
        copier.execute(copy_plan).unwrap();

        assert_eq!(fs::read(&target).unwrap(), fs::read(&source).unwrap());
        assert_eq!(read_records(&target)[0].id, 42);
    }
}
