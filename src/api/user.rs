use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::auth::extractor::AuthUser;
use crate::model::role::Role;
use crate::model::user::{NewUser, User, UserUpdate};
use crate::repository::UserRepository;

#[derive(Deserialize, ToSchema)]
pub struct CreateUser {
    #[schema(example = "bjones")]
    pub username: String,
    #[schema(example = "hunter2")]
    pub password: String,
    #[schema(example = "Bob")]
    pub first_name: String,
    #[schema(example = "Jones")]
    pub last_name: String,
    #[schema(example = "bob.jones@company.com", format = "email")]
    pub email: String,
    #[schema(example = "Manager", value_type = String)]
    pub role: Role,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateUser {
    pub username: String,
    /// Omit to keep the current password.
    pub password: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[schema(example = "Employee", value_type = String)]
    pub role: Role,
}

#[derive(Deserialize, IntoParams)]
pub struct UserFilter {
    /// Filter by role name
    #[param(example = "Employee")]
    pub role: Option<String>,
}

/// List users, optionally narrowed to one role.
#[utoipa::path(
    get,
    path = "/api/users",
    params(UserFilter),
    responses(
        (status = 200, description = "User list", body = [User]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_users(
    auth: AuthUser,
    users: web::Data<UserRepository>,
    query: web::Query<UserFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let result = match query.role.as_deref() {
        Some(role) => users.get_all_by_role(role).await?,
        None => users.get_all().await?,
    };

    Ok(HttpResponse::Ok().json(result))
}

/// Admins may fetch anyone; everyone else only themselves.
#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    params(("user_id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_user(
    auth: AuthUser,
    users: web::Data<UserRepository>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();

    if auth.role != Role::Admin && auth.user_id != user_id {
        return Err(actix_web::error::ErrorForbidden("Admin only"));
    }

    match users.get_by_id(user_id).await? {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "User not found"
        }))),
    }
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Unknown role name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Username or email already taken")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn create_user(
    auth: AuthUser,
    users: web::Data<UserRepository>,
    body: web::Json<CreateUser>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let body = body.into_inner();

    if body.username.trim().is_empty() || body.password.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Username and password must not be empty"
        })));
    }

    let user = users
        .save(NewUser {
            username: body.username.trim().to_owned(),
            password: body.password,
            first_name: body.first_name,
            last_name: body.last_name,
            email: body.email,
            role: body.role,
        })
        .await?;

    info!(user_id = user.id, created_by = auth.user_id, "user created");

    Ok(HttpResponse::Created().json(user))
}

#[utoipa::path(
    put,
    path = "/api/users/{user_id}",
    params(("user_id" = i64, Path, description = "User ID")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated"),
        (status = 400, description = "Unknown role name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_user(
    auth: AuthUser,
    users: web::Data<UserRepository>,
    path: web::Path<i64>,
    body: web::Json<UpdateUser>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();
    let body = body.into_inner();

    let updated = users
        .update(
            user_id,
            UserUpdate {
                username: body.username,
                password: body.password,
                first_name: body.first_name,
                last_name: body.last_name,
                email: body.email,
                role: body.role,
            },
        )
        .await?;

    if !updated {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "User not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "User updated successfully"
    })))
}

#[utoipa::path(
    delete,
    path = "/api/users/{user_id}",
    params(("user_id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn delete_user(
    auth: AuthUser,
    users: web::Data<UserRepository>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();

    if !users.delete_by_id(user_id).await? {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "User not found"
        })));
    }

    info!(user_id, deleted_by = auth.user_id, "user deleted");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}
