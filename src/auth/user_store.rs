//! User Storage
//! Mission: Securely store user accounts and check their credentials

use crate::auth::models::{User, UserRole};
use crate::students::models::normalize_email;
use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{info, warn};
use uuid::Uuid;

/// Account provisioned at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedAccount {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl SeedAccount {
    /// Created on first start when no admin exists
    pub fn default_admin() -> Self {
        Self {
            name: "Administrator".to_string(),
            email: "admin@edutrack.com".to_string(),
            password: "admin123".to_string(),
        }
    }

    /// Student login for demos, only seeded when enabled in config
    pub fn demo_student() -> Self {
        Self {
            name: "Karthik".to_string(),
            email: "karthik@student.com".to_string(),
            password: "student123".to_string(),
        }
    }
}

/// User storage with SQLite backend
pub struct UserStore {
    conn: Mutex<Connection>,
    cost: u32,
    // Verified against when the email is unknown, so both failure paths cost the same
    dummy_hash: String,
}

impl UserStore {
    /// Create a new user store and initialize database
    pub fn new(db_path: &str) -> Result<Self> {
        Self::with_cost(db_path, DEFAULT_COST)
    }

    /// Same as [`UserStore::new`] with an explicit bcrypt cost
    pub fn with_cost(db_path: &str, cost: u32) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open auth database at {}", db_path))?;
        let dummy_hash = hash("not-a-real-password", cost).context("Failed to hash password")?;

        let store = Self {
            conn: Mutex::new(conn),
            cost,
            dummy_hash,
        };
        store.init_db()?;
        Ok(store)
    }

    /// Initialize database schema
    fn init_db(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Create the default admin user if no admin exists yet
    pub fn ensure_default_admin(&self, admin: &SeedAccount) -> Result<()> {
        let count: i64 = self
            .conn
            .lock()
            .query_row(
                "SELECT COUNT(*) FROM users WHERE role = 'ADMIN'",
                [],
                |row| row.get(0),
            )
            .context("Failed to check for admin users")?;

        if count == 0 {
            self.create_user(&admin.name, &admin.email, &admin.password, UserRole::Admin)?;
            info!("🔐 Default admin user created ({})", admin.email);
            warn!("⚠️  CHANGE DEFAULT PASSWORD IN PRODUCTION!");
        }

        Ok(())
    }

    /// Create `account` with `role` unless its email is already registered.
    /// Returns whether an account was created.
    pub fn ensure_user(&self, account: &SeedAccount, role: UserRole) -> Result<bool> {
        if self.get_user_by_email(&account.email)?.is_some() {
            return Ok(false);
        }

        self.create_user(&account.name, &account.email, &account.password, role)?;
        warn!("⚠️  Seeded {} account {}, not for production", role, account.email);
        Ok(true)
    }

    /// Get user by email
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn.lock();

        let user = conn
            .query_row(
                "SELECT id, name, email, password_hash, role, created_at
                 FROM users WHERE email = ?1",
                params![normalize_email(email)],
                row_to_user,
            )
            .optional()?;

        Ok(user)
    }

    /// Look up `email` and check `password` against its hash. Unknown users
    /// and wrong passwords both yield `None`.
    pub fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        match self.get_user_by_email(email)? {
            Some(user) => {
                let valid =
                    verify(password, &user.password_hash).context("Failed to verify password")?;
                Ok(valid.then_some(user))
            }
            None => {
                let _ = verify(password, &self.dummy_hash);
                Ok(None)
            }
        }
    }

    /// Create a new user
    pub fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User> {
        let email = normalize_email(email);
        if email.is_empty() || !email.contains('@') {
            anyhow::bail!("Invalid email address: {:?}", email);
        }
        if name.trim().is_empty() {
            anyhow::bail!("User name is required");
        }

        let password_hash = hash(password, self.cost).context("Failed to hash password")?;

        let user = User {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            email,
            password_hash,
            role,
            created_at: Utc::now().to_rfc3339(),
        };

        self.conn
            .lock()
            .execute(
                "INSERT INTO users (id, name, email, password_hash, role, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user.id.to_string(),
                    user.name,
                    user.email,
                    user.password_hash,
                    user.role.as_str(),
                    user.created_at,
                ],
            )
            .with_context(|| format!("Failed to insert user {}", user.email))?;

        info!("✅ Created user: {} ({})", user.email, user.role.as_str());

        Ok(user)
    }

    /// List all users
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            "SELECT id, name, email, password_hash, role, created_at
             FROM users ORDER BY created_at",
        )?;

        let users = stmt
            .query_map([], row_to_user)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let id_str: String = row.get(0)?;
    let role_str: String = row.get(4)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let role: UserRole = role_str.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(User {
        id,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role,
        created_at: row.get(5)?,
    })
}
