use std::collections::BTreeMap;

use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio::sync::RwLock;
use tokio_postgres::{error::SqlState, types::FromSql, Row};

use crate::{
    error::{AppError, Result, StorageError},
    models::user::{Identity, NewUser, Role, User},
};

/// Which accounts a lookup may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Active and deactivated accounts.
    Any,
    /// Only accounts whose `is_active` flag is set.
    ActiveOnly,
}

/// Resolves subject ids to identities and stores credentials.
///
/// The auth middleware only ever reads through this trait.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Finds the identity for `id`.
    async fn find_by_id(&self, id: i64, lookup: Lookup) -> Result<Option<Identity>>;

    /// Finds a user together with the password hash.
    async fn find_user(&self, id: i64) -> Result<Option<User>>;

    /// Finds a user by email (case-insensitive) together with the password hash.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Inserts a new user. Duplicate emails fail with a unique-violation storage error.
    async fn create(&self, user: NewUser) -> Result<Identity>;

    /// Replaces a user's password hash.
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<()>;
}

const USER_COLUMNS: &str = "id, email, password, first_name, last_name, phone, role, is_active";

fn column<'a, T: FromSql<'a>>(row: &'a Row, name: &str) -> Result<T> {
    row.try_get(name)
        .map_err(|e| AppError::Internal(format!("users.{}: {}", name, e)))
}

/// A helper function to map a `tokio_postgres::Row` to a `User`.
fn row_to_user(row: &Row) -> Result<User> {
    let role: Option<String> = column(row, "role")?;
    let role = role
        .map(|r| r.parse::<Role>())
        .transpose()
        .map_err(AppError::Internal)?;

    Ok(User {
        id: column(row, "id")?,
        email: column(row, "email")?,
        password_hash: column(row, "password")?,
        first_name: column(row, "first_name")?,
        last_name: column(row, "last_name")?,
        phone: column(row, "phone")?,
        role,
        is_active: column(row, "is_active")?,
    })
}

/// PostgreSQL-backed identity store.
#[derive(Clone)]
pub struct PgIdentityStore {
    pool: Pool,
}

impl PgIdentityStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn find_by_id(&self, id: i64, lookup: Lookup) -> Result<Option<Identity>> {
        let client = self.pool.get().await?;
        let sql = match lookup {
            Lookup::Any => format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS),
            Lookup::ActiveOnly => format!(
                "SELECT {} FROM users WHERE id = $1 AND is_active = true",
                USER_COLUMNS
            ),
        };
        let row = client.query_opt(sql.as_str(), &[&id]).await?;
        row.map(|r| row_to_user(&r).map(Identity::from)).transpose()
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>> {
        let client = self.pool.get().await?;
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = client.query_opt(sql.as_str(), &[&id]).await?;
        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let client = self.pool.get().await?;
        let sql = format!(
            "SELECT {} FROM users WHERE lower(email) = lower($1)",
            USER_COLUMNS
        );
        let row = client.query_opt(sql.as_str(), &[&email]).await?;
        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn create(&self, user: NewUser) -> Result<Identity> {
        let client = self.pool.get().await?;
        let sql = format!(
            r#"
            INSERT INTO users (email, password, first_name, last_name, phone, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let role = user.role.as_str();
        let row = client
            .query_one(
                sql.as_str(),
                &[
                    &user.email,
                    &user.password_hash,
                    &user.first_name,
                    &user.last_name,
                    &user.phone,
                    &role,
                ],
            )
            .await?;
        row_to_user(&row).map(Identity::from)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                r#"
                UPDATE users
                SET password = $1, updated_at = NOW()
                WHERE id = $2
                "#,
                &[&password_hash, &id],
            )
            .await?;
        Ok(())
    }
}

#[derive(Default)]
struct MemoryUsers {
    last_id: i64,
    rows: BTreeMap<i64, User>,
}

/// In-process identity store, used without `DATABASE_URL` and in tests.
#[derive(Default)]
pub struct MemoryIdentityStore {
    users: RwLock<MemoryUsers>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `user` as given, keeping its id and flags.
    pub async fn insert(&self, user: User) {
        let mut users = self.users.write().await;
        users.last_id = users.last_id.max(user.id);
        users.rows.insert(user.id, user);
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_by_id(&self, id: i64, lookup: Lookup) -> Result<Option<Identity>> {
        let users = self.users.read().await;
        Ok(users
            .rows
            .get(&id)
            .filter(|u| lookup == Lookup::Any || u.is_active)
            .map(User::identity))
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>> {
        Ok(self.users.read().await.rows.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .rows
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<Identity> {
        let mut users = self.users.write().await;
        if users
            .rows
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StorageError::with_code(
                SqlState::UNIQUE_VIOLATION.code(),
                "duplicate key value violates unique constraint \"users_email_key\"",
            )
            .into());
        }

        users.last_id += 1;
        let stored = User {
            id: users.last_id,
            email: user.email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            role: Some(user.role),
            is_active: true,
        };
        let identity = stored.identity();
        users.rows.insert(stored.id, stored);
        Ok(identity)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<()> {
        let mut users = self.users.write().await;
        match users.rows.get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(())
            }
            None => Err(StorageError::uncoded(format!("no user with id {}", id)).into()),
        }
    }
}
