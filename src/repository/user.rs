use sqlx::{PgConnection, PgPool};
use tracing::debug;

use crate::auth::password::hash_password;
use crate::error::{RepoError, RepoResult};
use crate::model::user::{NewUser, User, UserUpdate};

const BASE_QUERY: &str = "SELECT ers_user_id AS id, username, password, first_name, last_name, \
     email, role_name AS role FROM full_user_info";

/// Fixed set of columns a user may be looked up by. Closed on purpose:
/// the lookup key is interpolated into SQL and must never come from the
/// request untranslated.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UserKey {
    Id,
    Username,
    Email,
}

impl UserKey {
    pub fn column(self) -> &'static str {
        match self {
            UserKey::Id => "ers_user_id",
            UserKey::Username => "username",
            UserKey::Email => "email",
        }
    }
}

/// Resolves a role name to its surrogate id inside the caller's transaction.
async fn resolve_role_id(conn: &mut PgConnection, name: &str) -> RepoResult<i32> {
    sqlx::query_scalar::<_, i32>("SELECT role_id FROM ers_user_roles WHERE role_name = $1")
        .bind(name)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| RepoError::UnknownEnum {
            domain: "role",
            value: name.to_owned(),
        })
}

fn map_insert_error(e: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db_err) = &e {
        // 23505: unique_violation (username/email)
        if db_err.code().as_deref() == Some("23505") {
            return RepoError::Duplicate("username or email");
        }
    }
    RepoError::Database(e)
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_all(&self) -> RepoResult<Vec<User>> {
        let sql = format!("{BASE_QUERY} ORDER BY ers_user_id");
        Ok(sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn get_all_by_role(&self, role: &str) -> RepoResult<Vec<User>> {
        let sql = format!("{BASE_QUERY} WHERE role_name = $1 ORDER BY ers_user_id");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(role)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn get_by_id(&self, id: i64) -> RepoResult<Option<User>> {
        let sql = format!("{BASE_QUERY} WHERE ers_user_id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn get_by_unique_key(&self, key: UserKey, value: &str) -> RepoResult<Option<User>> {
        let sql = format!("{BASE_QUERY} WHERE {} = $1", key.column());

        let user = match key {
            UserKey::Id => {
                let id: i64 = value
                    .parse()
                    .map_err(|_| RepoError::Invalid(format!("invalid user id: {value}")))?;
                sqlx::query_as::<_, User>(&sql)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            UserKey::Username | UserKey::Email => {
                sqlx::query_as::<_, User>(&sql)
                    .bind(value)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };

        Ok(user)
    }

    /// Fetches by username and verifies the argon2 hash in-process. The
    /// plaintext password is never compared inside SQL.
    pub async fn get_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> RepoResult<Option<User>> {
        let user = self.get_by_unique_key(UserKey::Username, username).await?;

        match user {
            Some(u) if crate::auth::password::verify_password(password, &u.password) => {
                Ok(Some(u))
            }
            _ => Ok(None),
        }
    }

    /// Resolves the role name, hashes the password and inserts, all in one
    /// transaction. Returns the record with its freshly assigned id.
    pub async fn save(&self, new_user: NewUser) -> RepoResult<User> {
        let mut tx = self.pool.begin().await?;

        let role_id = resolve_role_id(&mut *tx, new_user.role.as_str()).await?;
        let hashed = hash_password(&new_user.password)?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO ers_users (username, password, first_name, last_name, email, user_role_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING ers_user_id",
        )
        .bind(&new_user.username)
        .bind(&hashed)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.email)
        .bind(role_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_insert_error)?;

        tx.commit().await?;

        debug!(user_id = id, username = %new_user.username, "user saved");

        Ok(User {
            id,
            username: new_user.username,
            password: hashed,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email: new_user.email,
            role: new_user.role.as_str().to_owned(),
        })
    }

    /// Unconditional overwrite of the mutable columns; last write wins.
    /// Returns false when no row carries the given id.
    pub async fn update(&self, id: i64, changes: UserUpdate) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;

        let role_id = resolve_role_id(&mut *tx, changes.role.as_str()).await?;

        let result = match &changes.password {
            Some(plaintext) => {
                let hashed = hash_password(plaintext)?;
                sqlx::query(
                    "UPDATE ers_users SET username = $2, password = $3, first_name = $4, \
                     last_name = $5, email = $6, user_role_id = $7 WHERE ers_user_id = $1",
                )
                .bind(id)
                .bind(&changes.username)
                .bind(&hashed)
                .bind(&changes.first_name)
                .bind(&changes.last_name)
                .bind(&changes.email)
                .bind(role_id)
                .execute(&mut *tx)
                .await
                .map_err(map_insert_error)?
            }
            None => {
                sqlx::query(
                    "UPDATE ers_users SET username = $2, first_name = $3, last_name = $4, \
                     email = $5, user_role_id = $6 WHERE ers_user_id = $1",
                )
                .bind(id)
                .bind(&changes.username)
                .bind(&changes.first_name)
                .bind(&changes.last_name)
                .bind(&changes.email)
                .bind(role_id)
                .execute(&mut *tx)
                .await
                .map_err(map_insert_error)?
            }
        };

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    /// No cascade: a user referenced by reimbursements fails the foreign key
    /// check and surfaces as a database error.
    pub async fn delete_by_id(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM ers_users WHERE ers_user_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_keys_map_to_fixed_columns() {
        assert_eq!(UserKey::Id.column(), "ers_user_id");
        assert_eq!(UserKey::Username.column(), "username");
        assert_eq!(UserKey::Email.column(), "email");
    }
}
