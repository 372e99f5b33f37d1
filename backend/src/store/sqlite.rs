use std::path::Path;
use std::sync::Mutex;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::models::{NewUser, Role, User, UserRole};

/// SQLite-backed store for users, roles and role assignments.
pub struct AccountStore {
    conn: Mutex<Connection>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("User not found: {0}")]
    UserNotFound(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}

const USER_COLUMNS: &str =
    "id, username, password, first_name, last_name, enabled, created_at, last_login_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let created_at: String = row.get(6)?;
    let last_login_at: Option<String> = row.get(7)?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        enabled: row.get::<_, i32>(5)? != 0,
        created_at: parse_timestamp(&created_at).unwrap_or_else(Utc::now),
        last_login_at: last_login_at.as_deref().and_then(parse_timestamp),
        roles: Vec::new(),
    })
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

impl AccountStore {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        // Parse sqlite: prefix if present
        let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

        // Create parent directories if needed
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::IoError(e.to_string()))?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS roles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                first_name TEXT,
                last_name TEXT,
                enabled INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                last_login_at TEXT
            );

            CREATE TABLE IF NOT EXISTS user_roles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                role_id INTEGER NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id),
                FOREIGN KEY (role_id) REFERENCES roles(id),
                UNIQUE (user_id, role_id)
            );

            CREATE INDEX IF NOT EXISTS idx_user_roles_user_id ON user_roles(user_id);",
        )?;

        tracing::info!("Account store initialized with database: {}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))
    }

    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS),
                params![username],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        let conn = self.lock()?;
        let role = conn
            .query_row(
                "SELECT id, name FROM roles WHERE name = ?1",
                params![name],
                |row| Ok(Role { id: row.get(0)?, name: row.get(1)? }),
            )
            .optional()?;
        Ok(role)
    }

    /// Create the role if it does not exist yet. Returns the stored role.
    pub fn ensure_role(&self, name: &str) -> Result<Role, StoreError> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO roles (name) VALUES (?1)",
            params![name],
        )?;
        if inserted > 0 {
            tracing::info!("Seeded role: {}", name);
        }
        let role = conn.query_row(
            "SELECT id, name FROM roles WHERE name = ?1",
            params![name],
            |row| Ok(Role { id: row.get(0)?, name: row.get(1)? }),
        )?;
        Ok(role)
    }

    /// Insert the user and link it to `role` in a single transaction.
    ///
    /// If a user with the same username already exists the existing record is
    /// returned untouched, so concurrent first logins provision at most once.
    pub fn create_user_with_role(&self, new_user: &NewUser, role: &Role) -> Result<User, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let existing = tx
            .query_row(
                &format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS),
                params![new_user.username],
                user_from_row,
            )
            .optional()?;

        if let Some(user) = existing {
            tx.commit()?;
            tracing::debug!("User {} already provisioned", user.username);
            return Ok(user);
        }

        let now = Utc::now();
        tx.execute(
            "INSERT INTO users (username, password, first_name, last_name, enabled, created_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            params![
                new_user.username,
                new_user.password,
                new_user.first_name,
                new_user.last_name,
                now.to_rfc3339(),
            ],
        )?;
        let user_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO user_roles (user_id, role_id) VALUES (?1, ?2)",
            params![user_id, role.id],
        )?;

        tx.commit()?;

        tracing::info!("Created new user: {} with role {}", new_user.username, role.name);

        let mut user = User {
            id: user_id,
            username: new_user.username.clone(),
            password: new_user.password.clone(),
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            enabled: true,
            created_at: now,
            last_login_at: None,
            roles: Vec::new(),
        };
        user.add_role(role.clone());
        Ok(user)
    }

    /// Persist the mutable fields of an existing user.
    pub fn save_user(&self, user: &User) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE users SET password = ?1, first_name = ?2, last_name = ?3, enabled = ?4, last_login_at = ?5
             WHERE id = ?6",
            params![
                user.password,
                user.first_name,
                user.last_name,
                user.enabled as i32,
                user.last_login_at.map(|t| t.to_rfc3339()),
                user.id,
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::UserNotFound(user.username.clone()));
        }
        Ok(())
    }

    pub fn save_user_role(&self, user_id: i64, role_id: i64) -> Result<UserRole, StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO user_roles (user_id, role_id) VALUES (?1, ?2)",
            params![user_id, role_id],
        )?;
        Ok(UserRole {
            id: conn.last_insert_rowid(),
            user_id,
            role_id,
        })
    }

    pub fn roles_for_user(&self, user_id: i64) -> Result<Vec<Role>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT r.id, r.name FROM roles r
             JOIN user_roles ur ON ur.role_id = r.id
             WHERE ur.user_id = ?1
             ORDER BY r.name",
        )?;
        let roles = stmt
            .query_map(params![user_id], |row| Ok(Role { id: row.get(0)?, name: row.get(1)? }))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(roles)
    }

    pub fn count_users(&self) -> Result<i64, StoreError> {
        let conn = self.lock()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
    }

    pub fn count_user_roles(&self) -> Result<i64, StoreError> {
        let conn = self.lock()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM user_roles", [], |row| row.get(0))?)
    }
}
