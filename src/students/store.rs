//! Student Record Storage
//! Mission: Persist student records with unique roll numbers and fresh grades
//!
//! Every write runs inside an immediate transaction while holding the
//! connection mutex, so the roll number check and the write it guards are
//! atomic with respect to other writers. The `UNIQUE` constraint on
//! `roll_number` backs this up at the SQLite level.

use crate::{
    grading::Grade,
    students::models::{normalize_email, Student, StudentFields, StudentInput, ValidationError},
};
use anyhow::Context;
use parking_lot::Mutex;
use rusqlite::{
    params, types::Type, Connection, ErrorCode, OpenFlags, OptionalExtension, Row,
    TransactionBehavior,
};
use tracing::{debug, info};

const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;

CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    roll_number TEXT NOT NULL UNIQUE,
    math_marks INTEGER NOT NULL CHECK (math_marks BETWEEN 0 AND 100),
    science_marks INTEGER NOT NULL CHECK (science_marks BETWEEN 0 AND 100),
    english_marks INTEGER NOT NULL CHECK (english_marks BETWEEN 0 AND 100),
    total_marks INTEGER NOT NULL,
    percentage REAL NOT NULL,
    grade TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_students_email ON students(email, id);
"#;

const SELECT_COLUMNS: &str = "SELECT id, name, email, roll_number, math_marks, science_marks,
    english_marks, total_marks, percentage, grade FROM students";

/// Why a write was refused because of another record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    DuplicateRollNumber,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictKind::DuplicateRollNumber => write!(f, "Roll number already exists"),
        }
    }
}

/// Store operation errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Conflict(ConflictKind),
    #[error("Student not found")]
    NotFound,
    #[error("storage failure: {0:#}")]
    Storage(anyhow::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if is_unique_violation(&err) {
            return StoreError::Conflict(ConflictKind::DuplicateRollNumber);
        }
        StoreError::Storage(err.into())
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
            && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

pub type StoreResult<T> = Result<T, StoreError>;

/// SQLite-backed student record store
pub struct StudentStore {
    conn: Mutex<Connection>,
}

impl StudentStore {
    /// Open (or create) the store at `db_path` and apply the schema
    pub fn new(db_path: &str) -> anyhow::Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX; // We handle our own locking

        let conn = Connection::open_with_flags(db_path, flags)
            .with_context(|| format!("Failed to open student database at {}", db_path))?;
        let store = Self::from_connection(conn)?;

        info!(
            "📚 Student store initialized at {} ({} records)",
            db_path,
            store.count()?
        );
        Ok(store)
    }

    /// Private in-memory store, mostly for tests and demos
    pub fn in_memory() -> anyhow::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialize student schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn count(&self) -> anyhow::Result<i64> {
        let conn = self.conn.lock();
        let count = conn.query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Validate and insert a new record with a fresh id
    pub fn create(&self, input: &StudentInput) -> StoreResult<Student> {
        let fields = input.validate()?;

        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if roll_number_owner(&tx, &fields.roll_number)?.is_some() {
            debug!("Rejected duplicate roll number {}", fields.roll_number);
            return Err(StoreError::Conflict(ConflictKind::DuplicateRollNumber));
        }

        let student = fields.into_student(0);
        let now = chrono::Utc::now().to_rfc3339();
        tx.execute(
            "INSERT INTO students (name, email, roll_number, math_marks, science_marks,
                english_marks, total_marks, percentage, grade, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                student.name,
                student.email,
                student.roll_number,
                student.math_marks,
                student.science_marks,
                student.english_marks,
                student.total_marks,
                student.percentage,
                student.grade.as_str(),
                now,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!(
            "✅ Created student {} ({}) id={} grade={}",
            student.roll_number, student.email, id, student.grade
        );

        Ok(Student { id, ..student })
    }

    /// Replace every field of record `id` and recompute its derived fields
    pub fn update(&self, id: i64, input: &StudentInput) -> StoreResult<Student> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists = tx
            .query_row("SELECT 1 FROM students WHERE id = ?1", params![id], |_| Ok(()))
            .optional()?
            .is_some();
        if !exists {
            return Err(StoreError::NotFound);
        }

        let fields: StudentFields = input.validate()?;

        if let Some(owner) = roll_number_owner(&tx, &fields.roll_number)? {
            if owner != id {
                debug!(
                    "Rejected roll number {} for student {}: held by {}",
                    fields.roll_number, id, owner
                );
                return Err(StoreError::Conflict(ConflictKind::DuplicateRollNumber));
            }
        }

        let student = fields.into_student(id);
        tx.execute(
            "UPDATE students SET name = ?1, email = ?2, roll_number = ?3, math_marks = ?4,
                science_marks = ?5, english_marks = ?6, total_marks = ?7, percentage = ?8,
                grade = ?9, updated_at = ?10
             WHERE id = ?11",
            params![
                student.name,
                student.email,
                student.roll_number,
                student.math_marks,
                student.science_marks,
                student.english_marks,
                student.total_marks,
                student.percentage,
                student.grade.as_str(),
                chrono::Utc::now().to_rfc3339(),
                id,
            ],
        )?;
        tx.commit()?;

        info!(
            "✏️  Updated student {} ({}) grade={}",
            id, student.roll_number, student.grade
        );

        Ok(student)
    }

    /// Remove record `id` for good
    pub fn delete(&self, id: i64) -> StoreResult<()> {
        let conn = self.conn.lock();
        let rows_affected = conn.execute("DELETE FROM students WHERE id = ?1", params![id])?;

        if rows_affected == 0 {
            return Err(StoreError::NotFound);
        }

        info!("🗑️  Deleted student {}", id);
        Ok(())
    }

    /// All records in insertion order
    pub fn list(&self) -> StoreResult<Vec<Student>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&format!("{} ORDER BY id", SELECT_COLUMNS))?;
        let students = stmt
            .query_map([], row_to_student)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(students)
    }

    pub fn get(&self, id: i64) -> StoreResult<Student> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("{} WHERE id = ?1", SELECT_COLUMNS),
            params![id],
            row_to_student,
        )
        .optional()?
        .ok_or(StoreError::NotFound)
    }

    /// Earliest record linked to `email` (case-insensitive)
    pub fn find_by_email(&self, email: &str) -> StoreResult<Student> {
        let email = normalize_email(email);
        let conn = self.conn.lock();
        conn.query_row(
            &format!("{} WHERE email = ?1 ORDER BY id LIMIT 1", SELECT_COLUMNS),
            params![email],
            row_to_student,
        )
        .optional()?
        .ok_or(StoreError::NotFound)
    }
}

fn roll_number_owner(conn: &Connection, roll_number: &str) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM students WHERE roll_number = ?1",
        params![roll_number],
        |row| row.get(0),
    )
    .optional()
}

fn row_to_student(row: &Row<'_>) -> rusqlite::Result<Student> {
    let grade_str: String = row.get(9)?;
    let grade: Grade = grade_str
        .parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e)))?;

    Ok(Student {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        roll_number: row.get(3)?,
        math_marks: row.get(4)?,
        science_marks: row.get(5)?,
        english_marks: row.get(6)?,
        total_marks: row.get(7)?,
        percentage: row.get(8)?,
        grade,
    })
}
