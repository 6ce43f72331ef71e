use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::auth::extractor::AuthUser;
use crate::model::reimbursement::{NewReimbursement, Reimbursement, ReimbStatus, ReimbType};
use crate::model::role::Role;
use crate::repository::ReimbRepository;

#[derive(Deserialize, ToSchema)]
pub struct CreateReimb {
    #[schema(example = 42.5)]
    pub amount: f64,
    #[schema(example = "Train ticket to client site")]
    pub description: String,
    #[serde(rename = "type")]
    #[schema(example = "Travel")]
    pub reimb_type: ReimbType,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateReimb {
    #[schema(example = 55.0)]
    pub amount: f64,
    #[schema(example = "Train ticket, corrected fare")]
    pub description: String,
    #[serde(rename = "type")]
    #[schema(example = "Travel")]
    pub reimb_type: ReimbType,
}

#[derive(Deserialize, IntoParams)]
pub struct ReimbFilter {
    /// Filter by status name
    #[param(example = "Pending")]
    pub status: Option<String>,
    /// Filter by type name
    #[param(example = "Travel")]
    #[serde(rename = "type")]
    pub reimb_type: Option<String>,
    /// Filter by author id
    #[param(example = 3)]
    pub author_id: Option<i64>,
}

/// Managers and admins see everything (optionally filtered); employees always
/// get their own submissions, whatever the filter says.
#[utoipa::path(
    get,
    path = "/api/reimbursements",
    params(ReimbFilter),
    responses(
        (status = 200, description = "Reimbursement list", body = [Reimbursement]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Reimbursements"
)]
pub async fn list_reimbursements(
    auth: AuthUser,
    reimbs: web::Data<ReimbRepository>,
    query: web::Query<ReimbFilter>,
) -> actix_web::Result<impl Responder> {
    let result = if auth.is_employee() {
        reimbs.get_all_by_author(auth.user_id).await?
    } else if let Some(author_id) = query.author_id {
        reimbs.get_all_by_author(author_id).await?
    } else if let Some(status) = query.status.as_deref() {
        reimbs.get_all_by_status(status).await?
    } else if let Some(reimb_type) = query.reimb_type.as_deref() {
        reimbs.get_all_by_type(reimb_type).await?
    } else {
        reimbs.get_all().await?
    };

    Ok(HttpResponse::Ok().json(result))
}

#[utoipa::path(
    get,
    path = "/api/reimbursements/{reimb_id}",
    params(("reimb_id" = i64, Path, description = "Reimbursement ID")),
    responses(
        (status = 200, description = "Reimbursement found", body = Reimbursement),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Reimbursement not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Reimbursements"
)]
pub async fn get_reimbursement(
    auth: AuthUser,
    reimbs: web::Data<ReimbRepository>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let reimb_id = path.into_inner();

    let reimb = match reimbs.get_by_id(reimb_id).await? {
        Some(r) => r,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Reimbursement not found"
            })));
        }
    };

    if auth.is_employee() && reimb.author_id != auth.user_id {
        return Err(actix_web::error::ErrorForbidden(
            "Not the author of this reimbursement",
        ));
    }

    Ok(HttpResponse::Ok().json(reimb))
}

/// Submit a new expense claim. The caller is the author; status always
/// starts Pending.
#[utoipa::path(
    post,
    path = "/api/reimbursements",
    request_body = CreateReimb,
    responses(
        (status = 201, description = "Reimbursement submitted", body = Reimbursement),
        (status = 400, description = "Invalid amount or unknown type"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Reimbursements"
)]
pub async fn create_reimbursement(
    auth: AuthUser,
    reimbs: web::Data<ReimbRepository>,
    body: web::Json<CreateReimb>,
) -> actix_web::Result<impl Responder> {
    let body = body.into_inner();

    if body.amount <= 0.0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Amount must be positive"
        })));
    }

    let reimb = reimbs
        .save(NewReimbursement {
            amount: body.amount,
            description: body.description,
            reimb_type: body.reimb_type,
            author_id: auth.user_id,
        })
        .await?;

    info!(reimb_id = reimb.id, author_id = auth.user_id, "reimbursement submitted");

    Ok(HttpResponse::Created().json(reimb))
}

/// Financial-edit path: amount, description and type only. Lifecycle fields
/// are out of reach here.
#[utoipa::path(
    put,
    path = "/api/reimbursements/{reimb_id}",
    params(("reimb_id" = i64, Path, description = "Reimbursement ID")),
    request_body = UpdateReimb,
    responses(
        (status = 200, description = "Reimbursement updated"),
        (status = 400, description = "Invalid amount or unknown type"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Reimbursement not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Reimbursements"
)]
pub async fn update_reimbursement(
    auth: AuthUser,
    reimbs: web::Data<ReimbRepository>,
    path: web::Path<i64>,
    body: web::Json<UpdateReimb>,
) -> actix_web::Result<impl Responder> {
    let reimb_id = path.into_inner();
    let body = body.into_inner();

    if body.amount <= 0.0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Amount must be positive"
        })));
    }

    let existing = match reimbs.get_by_id(reimb_id).await? {
        Some(r) => r,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Reimbursement not found"
            })));
        }
    };

    if auth.role != Role::Admin && existing.author_id != auth.user_id {
        return Err(actix_web::error::ErrorForbidden(
            "Not the author of this reimbursement",
        ));
    }

    reimbs
        .update_fields(
            reimb_id,
            body.amount,
            &body.description,
            body.reimb_type.as_str(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Reimbursement updated successfully"
    })))
}

async fn resolve(
    auth: AuthUser,
    reimbs: web::Data<ReimbRepository>,
    reimb_id: i64,
    status: ReimbStatus,
) -> actix_web::Result<HttpResponse> {
    auth.require_manager_or_admin()?;

    reimbs
        .resolve_status(reimb_id, status.as_str(), auth.user_id)
        .await?;

    info!(reimb_id, resolver_id = auth.user_id, status = %status, "reimbursement resolved");

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Reimbursement {}", status.as_str().to_lowercase())
    })))
}

/// Approve a pending reimbursement. The caller becomes the resolver; a
/// request that is already resolved comes back as a conflict.
#[utoipa::path(
    put,
    path = "/api/reimbursements/{reimb_id}/approve",
    params(("reimb_id" = i64, Path, description = "Reimbursement ID")),
    responses(
        (status = 200, description = "Reimbursement approved"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Reimbursement not found"),
        (status = 409, description = "Already resolved")
    ),
    security(("bearer_auth" = [])),
    tag = "Reimbursements"
)]
pub async fn approve_reimbursement(
    auth: AuthUser,
    reimbs: web::Data<ReimbRepository>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    resolve(auth, reimbs, path.into_inner(), ReimbStatus::Approved).await
}

/// Deny a pending reimbursement; same lifecycle rules as approval.
#[utoipa::path(
    put,
    path = "/api/reimbursements/{reimb_id}/deny",
    params(("reimb_id" = i64, Path, description = "Reimbursement ID")),
    responses(
        (status = 200, description = "Reimbursement denied"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Reimbursement not found"),
        (status = 409, description = "Already resolved")
    ),
    security(("bearer_auth" = [])),
    tag = "Reimbursements"
)]
pub async fn deny_reimbursement(
    auth: AuthUser,
    reimbs: web::Data<ReimbRepository>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    resolve(auth, reimbs, path.into_inner(), ReimbStatus::Denied).await
}

#[utoipa::path(
    delete,
    path = "/api/reimbursements/{reimb_id}",
    params(("reimb_id" = i64, Path, description = "Reimbursement ID")),
    responses(
        (status = 200, description = "Reimbursement deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Reimbursement not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Reimbursements"
)]
pub async fn delete_reimbursement(
    auth: AuthUser,
    reimbs: web::Data<ReimbRepository>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let reimb_id = path.into_inner();

    if !reimbs.delete_by_id(reimb_id).await? {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Reimbursement not found"
        })));
    }

    info!(reimb_id, deleted_by = auth.user_id, "reimbursement deleted");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}
