use crate::api::reimbursement::{CreateReimb, UpdateReimb};
use crate::api::user::{CreateUser, UpdateUser};
use crate::auth::handlers::{LoginReq, RegisterReq, TokenPair};
use crate::model::reimbursement::{Reimbursement, ReimbStatus, ReimbType};
use crate::model::user::User;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Employee Reimbursement System API",
        version = "1.0.0",
        description = r#"
## Employee Reimbursement System (ERS)

REST API for submitting and resolving expense reimbursement requests.

### Key Features
- **Reimbursements**: employees submit expense claims (Lodging, Travel, Food,
  Other); every claim starts **Pending**
- **Resolution**: managers and admins approve or deny pending claims exactly
  once; the resolver and resolution time are recorded atomically
- **Users**: admin-managed accounts with Admin / Manager / Employee roles

### Security
JWT Bearer authentication on all `/api` endpoints; self-registration and login
are public (rate limited).
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,

        crate::api::user::list_users,
        crate::api::user::get_user,
        crate::api::user::create_user,
        crate::api::user::update_user,
        crate::api::user::delete_user,

        crate::api::reimbursement::list_reimbursements,
        crate::api::reimbursement::get_reimbursement,
        crate::api::reimbursement::create_reimbursement,
        crate::api::reimbursement::update_reimbursement,
        crate::api::reimbursement::approve_reimbursement,
        crate::api::reimbursement::deny_reimbursement,
        crate::api::reimbursement::delete_reimbursement
    ),
    components(
        schemas(
            RegisterReq,
            LoginReq,
            TokenPair,
            User,
            CreateUser,
            UpdateUser,
            Reimbursement,
            CreateReimb,
            UpdateReimb,
            ReimbStatus,
            ReimbType
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and token refresh"),
        (name = "Users", description = "User administration APIs"),
        (name = "Reimbursements", description = "Expense claim lifecycle APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
