use crate::{
    api::{reimbursement, user},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = build_limiter(config.rate_login_per_min);
    let register_limiter = build_limiter(config.rate_register_per_min);
    let refresh_limiter = build_limiter(config.rate_refresh_per_min);
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter)
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter)
                    .route(web::post().to(handlers::refresh_token)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/users")
                    // /users
                    .service(
                        web::resource("")
                            .route(web::post().to(user::create_user))
                            .route(web::get().to(user::list_users)),
                    )
                    // /users/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(user::get_user))
                            .route(web::put().to(user::update_user))
                            .route(web::delete().to(user::delete_user)),
                    ),
            )
            .service(
                web::scope("/reimbursements")
                    // /reimbursements
                    .service(
                        web::resource("")
                            .route(web::get().to(reimbursement::list_reimbursements))
                            .route(web::post().to(reimbursement::create_reimbursement)),
                    )
                    // /reimbursements/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(reimbursement::get_reimbursement))
                            .route(web::put().to(reimbursement::update_reimbursement))
                            .route(web::delete().to(reimbursement::delete_reimbursement)),
                    )
                    // /reimbursements/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(reimbursement::approve_reimbursement)),
                    )
                    // /reimbursements/{id}/deny
                    .service(
                        web::resource("/{id}/deny")
                            .route(web::put().to(reimbursement::deny_reimbursement)),
                    ),
            ),
    );
}
