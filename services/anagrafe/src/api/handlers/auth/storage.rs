//! Database helpers for the user and admin tables.

use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use sqlx::{PgPool, Row};
use tracing::{info, Instrument};

use super::password;
use super::principal::{Admin, Directory, User};
use super::state::BootstrapAdmin;

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

/// Which unique constraint an insert or update tripped over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Duplicate {
    Username,
    Email,
}

/// Outcome of a user insert/update that may hit a uniqueness constraint.
#[derive(Debug)]
pub(crate) enum UserWrite {
    Written(User),
    Duplicate(Duplicate),
}

/// Outcome of an admin insert that may hit a uniqueness constraint.
#[derive(Debug)]
pub(crate) enum AdminWrite {
    Written(Admin),
    Duplicate(Duplicate),
}

/// Directory implementation backed by the Postgres pool.
pub(crate) struct PgDirectory<'a> {
    pool: &'a PgPool,
}

impl<'a> PgDirectory<'a> {
    pub(crate) fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl Directory for PgDirectory<'_> {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        find_user_by_username(self.pool, username).await
    }

    async fn find_admin_by_username(&self, username: &str) -> Result<Option<Admin>> {
        find_admin_by_username(self.pool, username).await
    }
}

/// Apply the account schema, statement by statement. Every statement is
/// idempotent, so reapplying on boot is safe.
pub(crate) async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for (index, statement) in split_sql_statements(SCHEMA_SQL).iter().enumerate() {
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DDL",
            db.statement = statement.as_str()
        );
        sqlx::query(statement)
            .execute(pool)
            .instrument(span)
            .await
            .with_context(|| format!("failed to execute schema statement {}", index + 1))?;
    }

    Ok(())
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

/// Seed the first super admin when the admins table is empty.
///
/// Intentionally quiet when admins already exist, so the flag can stay set
/// across restarts.
pub(crate) async fn bootstrap_admin(pool: &PgPool, bootstrap: &BootstrapAdmin) -> Result<()> {
    if count_admins(pool).await? > 0 {
        info!("Admins already present, skipping bootstrap");
        return Ok(());
    }

    let password_hash = password::hash(bootstrap.password.expose_secret())?;
    match insert_admin(
        pool,
        &bootstrap.username,
        &bootstrap.email,
        &password_hash,
        true,
    )
    .await?
    {
        AdminWrite::Written(admin) => {
            info!("Created bootstrap admin account: {}", admin.username);
            Ok(())
        }
        AdminWrite::Duplicate(_) => {
            // Another replica won the race; the account exists either way.
            info!("Bootstrap admin already exists");
            Ok(())
        }
    }
}

pub(crate) async fn find_user_by_username(pool: &PgPool, username: &str) -> Result<Option<User>> {
    let query =
        "SELECT id, username, email, password_hash, is_admin FROM users WHERE username = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by username")?;

    Ok(row.map(|row| user_from_row(&row)))
}

pub(crate) async fn find_user_by_id(pool: &PgPool, user_id: i64) -> Result<Option<User>> {
    let query = "SELECT id, username, email, password_hash, is_admin FROM users WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by id")?;

    Ok(row.map(|row| user_from_row(&row)))
}

pub(crate) async fn list_users(pool: &PgPool, skip: i64, limit: i64) -> Result<Vec<User>> {
    let query = r"
        SELECT id, username, email, password_hash, is_admin
        FROM users
        ORDER BY id
        OFFSET $1 LIMIT $2
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(skip)
        .bind(limit)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list users")?;

    Ok(rows.iter().map(user_from_row).collect())
}

pub(crate) async fn insert_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
    is_admin: bool,
) -> Result<UserWrite> {
    let query = r"
        INSERT INTO users (username, email, password_hash, is_admin)
        VALUES ($1, $2, $3, $4)
        RETURNING id, username, email, password_hash, is_admin
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(is_admin)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(UserWrite::Written(user_from_row(&row))),
        Err(err) => match duplicate_field(&err) {
            Some(field) => Ok(UserWrite::Duplicate(field)),
            None => Err(err).context("failed to insert user"),
        },
    }
}

/// Partial update; absent fields keep their stored value.
pub(crate) async fn update_user(
    pool: &PgPool,
    user_id: i64,
    username: Option<&str>,
    email: Option<&str>,
    password_hash: Option<&str>,
    is_admin: Option<bool>,
) -> Result<Option<UserWrite>> {
    let query = r"
        UPDATE users
        SET
            username = COALESCE($1, username),
            email = COALESCE($2, email),
            password_hash = COALESCE($3, password_hash),
            is_admin = COALESCE($4, is_admin)
        WHERE id = $5
        RETURNING id, username, email, password_hash, is_admin
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(is_admin)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(row.map(|row| UserWrite::Written(user_from_row(&row)))),
        Err(err) => match duplicate_field(&err) {
            Some(field) => Ok(Some(UserWrite::Duplicate(field))),
            None => Err(err).context("failed to update user"),
        },
    }
}

pub(crate) async fn delete_user(pool: &PgPool, user_id: i64) -> Result<bool> {
    let query = "DELETE FROM users WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(user_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete user")?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn find_admin_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<Admin>> {
    let query =
        "SELECT id, username, email, password_hash, is_super_admin FROM admins WHERE username = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup admin by username")?;

    Ok(row.map(|row| admin_from_row(&row)))
}

pub(crate) async fn insert_admin(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
    is_super_admin: bool,
) -> Result<AdminWrite> {
    let query = r"
        INSERT INTO admins (username, email, password_hash, is_super_admin)
        VALUES ($1, $2, $3, $4)
        RETURNING id, username, email, password_hash, is_super_admin
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(is_super_admin)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(AdminWrite::Written(admin_from_row(&row))),
        Err(err) => match duplicate_field(&err) {
            Some(field) => Ok(AdminWrite::Duplicate(field)),
            None => Err(err).context("failed to insert admin"),
        },
    }
}

pub(crate) async fn count_admins(pool: &PgPool) -> Result<i64> {
    let query = "SELECT COUNT(*) AS total FROM admins";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to count admins")?;

    Ok(row.get("total"))
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        is_admin: row.get("is_admin"),
    }
}

fn admin_from_row(row: &sqlx::postgres::PgRow) -> Admin {
    Admin {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        is_super_admin: row.get("is_super_admin"),
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

/// Map a unique violation to the column family it protects. The constraint
/// names come from the schema's UNIQUE clauses.
fn duplicate_field(err: &sqlx::Error) -> Option<Duplicate> {
    if !is_unique_violation(err) {
        return None;
    }
    let constraint = match err {
        sqlx::Error::Database(db_err) => db_err.constraint().map(str::to_string),
        _ => None,
    };
    match constraint.as_deref() {
        Some(name) if name.contains("email") => Some(Duplicate::Email),
        _ => Some(Duplicate::Username),
    }
}

#[cfg(test)]
mod tests {
    use super::{split_sql_statements, Duplicate};
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[test]
    fn schema_splits_into_idempotent_statements() {
        let statements = split_sql_statements(super::SCHEMA_SQL);
        assert_eq!(statements.len(), 2);
        for statement in &statements {
            assert!(statement.starts_with("CREATE TABLE IF NOT EXISTS"));
            assert!(statement.ends_with(';'));
        }
    }

    #[test]
    fn split_handles_comments_and_trailing_statement() {
        let sql = "-- comment\nSELECT 1;\nSELECT 2";
        let statements = split_sql_statements(sql);
        assert_eq!(statements, vec!["SELECT 1;", "SELECT 2"]);
    }

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
        constraint: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn is_unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
            constraint: None,
        }));
        assert!(super::is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
            constraint: None,
        }));
        assert!(!super::is_unique_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!super::is_unique_violation(&err));
    }

    #[test]
    fn duplicate_field_maps_constraint_names() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
            constraint: Some("users_email_key"),
        }));
        assert_eq!(super::duplicate_field(&err), Some(Duplicate::Email));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
            constraint: Some("users_username_key"),
        }));
        assert_eq!(super::duplicate_field(&err), Some(Duplicate::Username));

        let err = sqlx::Error::RowNotFound;
        assert_eq!(super::duplicate_field(&err), None);
    }
}
