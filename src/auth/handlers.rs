use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::auth::jwt::{TokenType, generate_access_token, generate_refresh_token, verify_token};
use crate::config::Config;
use crate::model::role::Role;
use crate::model::user::NewUser;
use crate::repository::UserRepository;

#[derive(Deserialize, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "asmith")]
    pub username: String,
    #[schema(example = "hunter2")]
    pub password: String,
    #[schema(example = "Alice")]
    pub first_name: String,
    #[schema(example = "Smith")]
    pub last_name: String,
    #[schema(example = "alice.smith@company.com", format = "email")]
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReq {
    #[schema(example = "asmith")]
    pub username: String,
    #[schema(example = "hunter2")]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Self-registration always lands in the Employee role; managers and admins
/// are provisioned through the user admin endpoints.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "User registered"),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "Username or email already taken")
    ),
    tag = "Auth"
)]
pub async fn register(
    body: web::Json<RegisterReq>,
    users: web::Data<UserRepository>,
) -> actix_web::Result<impl Responder> {
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
            role: Role::Employee,
        })
        .await?;

    info!(user_id = user.id, "user registered");

    Ok(HttpResponse::Created().json(user))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Token pair issued", body = TokenPair),
        (status = 400, description = "Missing credentials"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(users, config, body), fields(username = %body.username))]
pub async fn login(
    body: web::Json<LoginReq>,
    users: web::Data<UserRepository>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    if body.username.trim().is_empty() || body.password.is_empty() {
        info!("Validation failed: empty username or password");
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Username or password required"
        })));
    }

    debug!("Fetching user by credentials");

    let user = match users
        .get_by_credentials(&body.username, &body.password)
        .await?
    {
        Some(u) => u,
        None => {
            info!("Invalid credentials");
            return Ok(HttpResponse::Unauthorized().json(json!({
                "message": "Invalid credentials"
            })));
        }
    };

    let role_id = user
        .role
        .parse::<Role>()
        .map(Role::as_id)
        .map_err(|_| actix_web::error::ErrorInternalServerError("Unknown role in database"))?;

    let access_token = generate_access_token(
        user.id,
        user.username.clone(),
        role_id,
        &config.jwt_secret,
        config.access_token_ttl,
    );
    let refresh_token = generate_refresh_token(
        user.id,
        user.username.clone(),
        role_id,
        &config.jwt_secret,
        config.refresh_token_ttl,
    );

    info!(user_id = user.id, "login successful");

    Ok(HttpResponse::Ok().json(TokenPair {
        access_token,
        refresh_token,
    }))
}

/// Exchanges a valid refresh token for a fresh pair. Stateless: the refresh
/// token is validated by signature and type only.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "Token pair issued", body = TokenPair),
        (status = 401, description = "Missing, invalid or non-refresh token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(req: HttpRequest, config: web::Data<Config>) -> impl Responder {
    let header = match req.headers().get("Authorization") {
        Some(h) => h.to_str().unwrap_or(""),
        None => return HttpResponse::Unauthorized().json(json!({"message": "No token"})),
    };

    let token = match header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return HttpResponse::Unauthorized().json(json!({"message": "Invalid token"})),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::Unauthorized().finish(),
    };

    if claims.token_type != TokenType::Refresh {
        return HttpResponse::Unauthorized().finish();
    }

    let access_token = generate_access_token(
        claims.user_id,
        claims.sub.clone(),
        claims.role,
        &config.jwt_secret,
        config.access_token_ttl,
    );
    let refresh_token = generate_refresh_token(
        claims.user_id,
        claims.sub,
        claims.role,
        &config.jwt_secret,
        config.refresh_token_ttl,
    );

    HttpResponse::Ok().json(TokenPair {
        access_token,
        refresh_token,
    })
}
