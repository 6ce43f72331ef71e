use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Closed error set for the repository layer. The underlying sqlx cause is
/// preserved for logging instead of being collapsed into a generic failure.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A name-to-id lookup found no row in the role/type/status tables.
    #[error("unknown {domain}: {value}")]
    UnknownEnum { domain: &'static str, value: String },

    /// Status resolution attempted on a reimbursement that is no longer Pending.
    #[error("reimbursement has already been resolved")]
    AlreadyResolved,

    #[error("{0} already exists")]
    Duplicate(&'static str),

    #[error("{0}")]
    Invalid(String),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

impl actix_web::ResponseError for RepoError {
    fn status_code(&self) -> StatusCode {
        match self {
            RepoError::NotFound(_) => StatusCode::NOT_FOUND,
            RepoError::UnknownEnum { .. } | RepoError::Invalid(_) => StatusCode::BAD_REQUEST,
            RepoError::AlreadyResolved | RepoError::Duplicate(_) => StatusCode::CONFLICT,
            RepoError::PasswordHash(_) | RepoError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            RepoError::Database(e) => {
                error!(error = %e, "database failure");
                HttpResponse::InternalServerError().json(json!({
                    "message": "Internal Server Error"
                }))
            }
            RepoError::PasswordHash(detail) => {
                error!(detail = %detail, "password hashing failure");
                HttpResponse::InternalServerError().json(json!({
                    "message": "Internal Server Error"
                }))
            }
            other => HttpResponse::build(other.status_code()).json(json!({
                "message": other.to_string()
            })),
        }
    }
}
