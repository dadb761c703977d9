//! User repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use faqbase_core::{Email, Login, UserId, UserRole, UserStatus};

use super::RepositoryError;
use crate::models::User;

const USER_COLUMNS: &str =
    "id, login, display_name, email, status, role, created_at, updated_at, last_login";

/// Raw `faq.user` row before validation.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    login: String,
    display_name: String,
    email: String,
    status: UserStatus,
    role: UserRole,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let login = Login::parse(&row.login).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid login in database: {e}"))
        })?;
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Self {
            id: row.id,
            login,
            display_name: row.display_name,
            email,
            status: row.status,
            role: row.role,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_login: row.last_login,
        })
    }
}

/// Fields of a new account.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub login: &'a Login,
    pub display_name: &'a str,
    pub email: &'a Email,
    pub status: UserStatus,
    pub role: UserRole,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by login name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_login(&self, login: &Login) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM faq.user WHERE login = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(login.as_str())
            .fetch_optional(self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM faq.user WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    /// Create a user together with a password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the login or email is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        user: &NewUser<'_>,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO faq.user (login, display_name, email, status, role)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.login.as_str())
            .bind(user.display_name.trim())
            .bind(user.email.as_str())
            .bind(user.status)
            .bind(user.role)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| RepositoryError::unique(e, "login or email already registered"))?;
        let created = User::try_from(row)?;

        sqlx::query("INSERT INTO faq.user_password (user_id, password_hash) VALUES ($1, $2)")
            .bind(created.id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    /// Get a user together with their password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        login: &Login,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let Some(user) = self.get_by_login(login).await? else {
            return Ok(None);
        };
        let hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM faq.user_password WHERE user_id = $1")
                .bind(user.id)
                .fetch_optional(self.pool)
                .await?;
        Ok(hash.map(|h| (user, h)))
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO faq.user_password (user_id, password_hash) VALUES ($1, $2)
             ON CONFLICT (user_id) DO UPDATE SET password_hash = $2, updated_at = NOW()",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// All users, by login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM faq.user ORDER BY login");
        sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    /// Number of accounts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM faq.user")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Change account status. Protected accounts are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no mutable user has this id.
    pub async fn set_status(&self, id: UserId, status: UserStatus) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE faq.user SET status = $2, updated_at = NOW()
             WHERE id = $1 AND status <> 'protected'",
        )
        .bind(id)
        .bind(status)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Change a user's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn set_role(&self, id: UserId, role: UserRole) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE faq.user SET role = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(role)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete an account. Protected accounts cannot be deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no mutable user has this id.
    pub async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM faq.user WHERE id = $1 AND status <> 'protected'")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Record a successful login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn touch_last_login(&self, id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE faq.user SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
