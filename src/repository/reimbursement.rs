use sqlx::{PgConnection, PgPool};
use tracing::debug;

use crate::error::{RepoError, RepoResult};
use crate::model::reimbursement::{NewReimbursement, Reimbursement, ReimbStatus};

const BASE_QUERY: &str = "SELECT reimb_id AS id, amount, submitted, resolved, description, \
     author_id, resolver_id, reimb_status AS status, reimb_type FROM full_reimbursements_info";

/// Fixed set of columns a reimbursement may be looked up by.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ReimbKey {
    Id,
    AuthorId,
    ResolverId,
}

impl ReimbKey {
    pub fn column(self) -> &'static str {
        match self {
            ReimbKey::Id => "reimb_id",
            ReimbKey::AuthorId => "author_id",
            ReimbKey::ResolverId => "resolver_id",
        }
    }
}

async fn resolve_type_id(conn: &mut PgConnection, name: &str) -> RepoResult<i32> {
    sqlx::query_scalar::<_, i32>(
        "SELECT reimb_type_id FROM ers_reimbursement_types WHERE reimb_type = $1",
    )
    .bind(name)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| RepoError::UnknownEnum {
        domain: "reimbursement type",
        value: name.to_owned(),
    })
}

async fn resolve_status_id(conn: &mut PgConnection, name: &str) -> RepoResult<i32> {
    sqlx::query_scalar::<_, i32>(
        "SELECT reimb_status_id FROM ers_reimbursement_statuses WHERE reimb_status = $1",
    )
    .bind(name)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| RepoError::UnknownEnum {
        domain: "reimbursement status",
        value: name.to_owned(),
    })
}

#[derive(Clone)]
pub struct ReimbRepository {
    pool: PgPool,
}

impl ReimbRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_all(&self) -> RepoResult<Vec<Reimbursement>> {
        let sql = format!("{BASE_QUERY} ORDER BY submitted DESC");
        Ok(sqlx::query_as::<_, Reimbursement>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn get_by_id(&self, id: i64) -> RepoResult<Option<Reimbursement>> {
        let sql = format!("{BASE_QUERY} WHERE reimb_id = $1");
        Ok(sqlx::query_as::<_, Reimbursement>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn get_by_unique_key(
        &self,
        key: ReimbKey,
        value: &str,
    ) -> RepoResult<Option<Reimbursement>> {
        let id: i64 = value
            .parse()
            .map_err(|_| RepoError::Invalid(format!("invalid {}: {value}", key.column())))?;

        let sql = format!("{BASE_QUERY} WHERE {} = $1", key.column());
        Ok(sqlx::query_as::<_, Reimbursement>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn get_all_by_author(&self, author_id: i64) -> RepoResult<Vec<Reimbursement>> {
        let sql = format!("{BASE_QUERY} WHERE author_id = $1 ORDER BY submitted DESC");
        Ok(sqlx::query_as::<_, Reimbursement>(&sql)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn get_all_by_type(&self, reimb_type: &str) -> RepoResult<Vec<Reimbursement>> {
        let sql = format!("{BASE_QUERY} WHERE reimb_type = $1 ORDER BY submitted DESC");
        Ok(sqlx::query_as::<_, Reimbursement>(&sql)
            .bind(reimb_type)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn get_all_by_status(&self, status: &str) -> RepoResult<Vec<Reimbursement>> {
        let sql = format!("{BASE_QUERY} WHERE reimb_status = $1 ORDER BY submitted DESC");
        Ok(sqlx::query_as::<_, Reimbursement>(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Inserts a new reimbursement. Status is forced to Pending and both
    /// resolver and resolved stay null, whatever the caller intended; the
    /// submitted timestamp is assigned server-side.
    pub async fn save(&self, new_reimb: NewReimbursement) -> RepoResult<Reimbursement> {
        let mut tx = self.pool.begin().await?;

        let type_id = resolve_type_id(&mut *tx, new_reimb.reimb_type.as_str()).await?;
        let pending_id = resolve_status_id(&mut *tx, ReimbStatus::Pending.as_str()).await?;

        let (id, submitted): (i64, chrono::DateTime<chrono::Utc>) = sqlx::query_as(
            "INSERT INTO ers_reimbursements \
             (amount, description, author_id, reimb_status_id, reimb_type_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING reimb_id, submitted",
        )
        .bind(new_reimb.amount)
        .bind(&new_reimb.description)
        .bind(new_reimb.author_id)
        .bind(pending_id)
        .bind(type_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(reimb_id = id, author_id = new_reimb.author_id, "reimbursement saved");

        Ok(Reimbursement {
            id,
            amount: new_reimb.amount,
            submitted,
            resolved: None,
            description: new_reimb.description,
            author_id: new_reimb.author_id,
            resolver_id: None,
            status: ReimbStatus::Pending.as_str().to_owned(),
            reimb_type: new_reimb.reimb_type.as_str().to_owned(),
        })
    }

    /// Financial-edit path: touches amount, description and type only.
    /// Status, resolver and resolved are never written here.
    pub async fn update_fields(
        &self,
        id: i64,
        amount: f64,
        description: &str,
        reimb_type: &str,
    ) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;

        let type_id = resolve_type_id(&mut *tx, reimb_type).await?;

        let result = sqlx::query(
            "UPDATE ers_reimbursements SET amount = $2, description = $3, reimb_type_id = $4 \
             WHERE reimb_id = $1",
        )
        .bind(id)
        .bind(amount)
        .bind(description)
        .bind(type_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    /// Moves a Pending reimbursement to a terminal status, stamping resolver
    /// and resolution time in the same statement. The `reimb_status_id =
    /// pending` guard serializes concurrent resolvers: the loser sees zero
    /// rows affected and gets a conflict instead of silently overwriting.
    pub async fn resolve_status(
        &self,
        id: i64,
        status: &str,
        resolver_id: i64,
    ) -> RepoResult<()> {
        let target: ReimbStatus = status.parse().map_err(|_| RepoError::UnknownEnum {
            domain: "reimbursement status",
            value: status.to_owned(),
        })?;

        if !target.is_terminal() {
            return Err(RepoError::Invalid(
                "a reimbursement cannot be resolved back to Pending".to_owned(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let target_id = resolve_status_id(&mut *tx, target.as_str()).await?;
        let pending_id = resolve_status_id(&mut *tx, ReimbStatus::Pending.as_str()).await?;

        let result = sqlx::query(
            "UPDATE ers_reimbursements \
             SET resolved = now(), resolver_id = $2, reimb_status_id = $3 \
             WHERE reimb_id = $1 AND reimb_status_id = $4",
        )
        .bind(id)
        .bind(resolver_id)
        .bind(target_id)
        .bind(pending_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM ers_reimbursements WHERE reimb_id = $1)",
            )
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

            return Err(if exists {
                RepoError::AlreadyResolved
            } else {
                RepoError::NotFound("reimbursement")
            });
        }

        tx.commit().await?;

        debug!(reimb_id = id, resolver_id, status = %target, "reimbursement resolved");

        Ok(())
    }

    pub async fn delete_by_id(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM ers_reimbursements WHERE reimb_id = $1")
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
        assert_eq!(ReimbKey::Id.column(), "reimb_id");
        assert_eq!(ReimbKey::AuthorId.column(), "author_id");
        assert_eq!(ReimbKey::ResolverId.column(), "resolver_id");
    }
}
