//! Court Storage Layer
//!
//! Implements the [`CourtStore`] trait on SQLite and the [`BlobStore`] trait
//! on a local directory.
//!
//! # Architecture
//!
//! - SQLite for users, cases and votes
//! - `UNIQUE (case_id, juror_id)` on votes is the source of truth for the
//!   one-vote-per-juror rule
//! - Foreign keys with `ON DELETE CASCADE`; deletes run in one transaction
//!
//! # Examples
//!
//! ```no_run
//! use court_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for case operations
//! ```

#![warn(missing_docs)]

mod blob;

pub use blob::{BlobError, FsBlobStore, MemoryBlobStore};

use court_domain::traits::{CaseQuery, CourtStore, UserInsert, VoteInsert};
use court_domain::{
    BlobRef, Case, CaseId, CaseStatus, Role, User, UserId, ValidationError, Verdict, Vote, VoteId,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// How long a connection waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// SQLite-based implementation of CourtStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own
/// SqliteStore instance, or share one behind a mutex. Several instances may
/// open the same database file; uniqueness and cascade rules hold across them.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    fn id_to_bytes(value: u128) -> Vec<u8> {
        value.to_be_bytes().to_vec()
    }

    fn bytes_to_value(bytes: &[u8]) -> Result<u128, StoreError> {
        let arr: [u8; 16] = bytes.try_into().map_err(|_| {
            StoreError::InvalidData(format!("Expected 16 bytes for id, got {}", bytes.len()))
        })?;
        Ok(u128::from_be_bytes(arr))
    }

    fn column_id(row: &Row<'_>, idx: usize) -> rusqlite::Result<u128> {
        let bytes: Vec<u8> = row.get(idx)?;
        Self::bytes_to_value(&bytes).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                Type::Blob,
                Box::new(ValidationError::new(e.to_string())),
            )
        })
    }

    fn column_parsed<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
    where
        T: std::str::FromStr<Err = ValidationError>,
    {
        let text: String = row.get(idx)?;
        text.parse::<T>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    }

    fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: UserId::from_value(Self::column_id(row, 0)?),
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            role: Self::column_parsed::<Role>(row, 4)?,
            created_at: row.get::<_, i64>(5)? as u64,
        })
    }

    fn case_from_row(row: &Row<'_>) -> rusqlite::Result<Case> {
        let evidence_file: Option<String> = row.get(4)?;
        Ok(Case {
            id: CaseId::from_value(Self::column_id(row, 0)?),
            title: row.get(1)?,
            argument: row.get(2)?,
            evidence: row.get(3)?,
            evidence_file: evidence_file.map(BlobRef::new),
            submitted_by: UserId::from_value(Self::column_id(row, 5)?),
            status: Self::column_parsed::<CaseStatus>(row, 6)?,
            created_at: row.get::<_, i64>(7)? as u64,
            updated_at: row.get::<_, i64>(8)? as u64,
        })
    }

    fn vote_from_row(row: &Row<'_>) -> rusqlite::Result<Vote> {
        Ok(Vote {
            id: VoteId::from_value(Self::column_id(row, 0)?),
            case_id: CaseId::from_value(Self::column_id(row, 1)?),
            juror: UserId::from_value(Self::column_id(row, 2)?),
            verdict: Self::column_parsed::<Verdict>(row, 3)?,
            voted_at: row.get::<_, i64>(4)? as u64,
        })
    }

    /// Whether an error is a UNIQUE constraint violation
    fn is_unique_violation(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        )
    }
}

const USER_COLUMNS: &str = "id, username, email, password_hash, role, created_at";
const CASE_COLUMNS: &str =
    "id, title, argument, evidence, evidence_file, submitted_by, status, created_at, updated_at";
const VOTE_COLUMNS: &str = "id, case_id, juror_id, verdict, voted_at";

impl CourtStore for SqliteStore {
    type Error = StoreError;

    fn insert_user(&mut self, user: &User) -> Result<UserInsert, Self::Error> {
        let result = self.conn.execute(
            "INSERT INTO users (id, username, email, password_hash, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                Self::id_to_bytes(user.id.value()),
                &user.username,
                &user.email,
                &user.password_hash,
                user.role.as_str(),
                user.created_at as i64,
            ],
        );

        match result {
            Ok(_) => Ok(UserInsert::Inserted),
            Err(e) if Self::is_unique_violation(&e) => Ok(UserInsert::UsernameTaken),
            Err(e) => Err(e.into()),
        }
    }

    fn get_user(&self, id: UserId) -> Result<Option<User>, Self::Error> {
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
        let user = self
            .conn
            .query_row(&sql, params![Self::id_to_bytes(id.value())], Self::user_from_row)
            .optional()?;
        Ok(user)
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, Self::Error> {
        let sql = format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS);
        let user = self
            .conn
            .query_row(&sql, params![username], Self::user_from_row)
            .optional()?;
        Ok(user)
    }

    fn set_role(&mut self, id: UserId, role: Role) -> Result<bool, Self::Error> {
        let changed = self.conn.execute(
            "UPDATE users SET role = ?2 WHERE id = ?1",
            params![Self::id_to_bytes(id.value()), role.as_str()],
        )?;
        Ok(changed > 0)
    }

    fn insert_case(&mut self, case: &Case) -> Result<(), Self::Error> {
        self.conn.execute(
            "INSERT INTO cases (id, title, argument, evidence, evidence_file,
                                submitted_by, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                Self::id_to_bytes(case.id.value()),
                &case.title,
                &case.argument,
                &case.evidence,
                case.evidence_file.as_ref().map(|f| f.as_str()),
                Self::id_to_bytes(case.submitted_by.value()),
                case.status.as_str(),
                case.created_at as i64,
                case.updated_at as i64,
            ],
        )?;
        Ok(())
    }

    fn get_case(&self, id: CaseId) -> Result<Option<Case>, Self::Error> {
        let sql = format!("SELECT {} FROM cases WHERE id = ?1", CASE_COLUMNS);
        let case = self
            .conn
            .query_row(&sql, params![Self::id_to_bytes(id.value())], Self::case_from_row)
            .optional()?;
        Ok(case)
    }

    fn update_case(&mut self, case: &Case) -> Result<bool, Self::Error> {
        let changed = self.conn.execute(
            "UPDATE cases SET title = ?2, argument = ?3, evidence = ?4, evidence_file = ?5,
             status = ?6, updated_at = ?7
             WHERE id = ?1",
            params![
                Self::id_to_bytes(case.id.value()),
                &case.title,
                &case.argument,
                &case.evidence,
                case.evidence_file.as_ref().map(|f| f.as_str()),
                case.status.as_str(),
                case.updated_at as i64,
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete_case(&mut self, id: CaseId) -> Result<bool, Self::Error> {
        let id_bytes = Self::id_to_bytes(id.value());
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Explicit delete keeps votes consistent even if foreign keys are off
        let votes = tx.execute("DELETE FROM votes WHERE case_id = ?1", params![&id_bytes])?;
        let cases = tx.execute("DELETE FROM cases WHERE id = ?1", params![&id_bytes])?;
        tx.commit()?;

        debug!(case_id = %id, votes_removed = votes, "deleted case");
        Ok(cases > 0)
    }

    fn query_cases(&self, query: &CaseQuery) -> Result<Vec<Case>, Self::Error> {
        let mut sql = format!("SELECT {} FROM cases WHERE 1=1", CASE_COLUMNS);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            params.push(Box::new(status.as_str()));
        }

        if let Some(submitter) = query.submitted_by {
            sql.push_str(" AND submitted_by = ?");
            params.push(Box::new(Self::id_to_bytes(submitter.value())));
        }

        sql.push_str(" ORDER BY created_at, id");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let cases = stmt
            .query_map(&param_refs[..], Self::case_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(cases)
    }

    fn insert_vote(&mut self, vote: &Vote) -> Result<VoteInsert, Self::Error> {
        // IMMEDIATE takes the write lock up front so concurrent voters queue on
        // the busy timeout instead of failing a lock upgrade.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let result = tx.execute(
            "INSERT INTO votes (id, case_id, juror_id, verdict, voted_at)
             SELECT ?1, ?2, ?3, ?4, ?5
             WHERE EXISTS (SELECT 1 FROM cases WHERE id = ?2 AND status = 'approved')",
            params![
                Self::id_to_bytes(vote.id.value()),
                Self::id_to_bytes(vote.case_id.value()),
                Self::id_to_bytes(vote.juror.value()),
                vote.verdict.as_str(),
                vote.voted_at as i64,
            ],
        );

        let outcome = match result {
            Ok(0) => VoteInsert::CaseUnavailable,
            Ok(_) => VoteInsert::Inserted,
            Err(e) if Self::is_unique_violation(&e) => VoteInsert::AlreadyVoted,
            Err(e) => return Err(e.into()),
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn find_vote(&self, case_id: CaseId, juror: UserId) -> Result<Option<Vote>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM votes WHERE case_id = ?1 AND juror_id = ?2",
            VOTE_COLUMNS
        );
        let vote = self
            .conn
            .query_row(
                &sql,
                params![
                    Self::id_to_bytes(case_id.value()),
                    Self::id_to_bytes(juror.value())
                ],
                Self::vote_from_row,
            )
            .optional()?;
        Ok(vote)
    }

    fn list_votes(&self, case_id: CaseId) -> Result<Vec<Vote>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM votes WHERE case_id = ?1 ORDER BY voted_at, id",
            VOTE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let votes = stmt
            .query_map(params![Self::id_to_bytes(case_id.value())], Self::vote_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(votes)
    }
}
