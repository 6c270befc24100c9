use crate::{
    api::{leave_balance, leave_policy, leave_request},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // fixed segments go before /leave/{id}
                    .service(
                        web::resource("/duration")
                            .route(web::get().to(leave_request::leave_duration)),
                    )
                    .service(
                        web::resource("/policy")
                            .route(web::get().to(leave_policy::get_policy))
                            .route(web::put().to(leave_policy::update_policy)),
                    )
                    .service(
                        web::resource("/balances")
                            .route(web::get().to(leave_balance::my_balances)),
                    )
                    .service(
                        web::resource("/balances/{employee_id}")
                            .route(web::get().to(leave_balance::employee_balances)),
                    )
                    .service(
                        web::resource("/balances/{employee_id}/adjust")
                            .route(web::post().to(leave_balance::adjust_balance)),
                    )
                    .service(
                        web::resource("/balances/{employee_id}/accrue")
                            .route(web::post().to(leave_balance::accrue_month)),
                    )
                    .service(
                        web::resource("/balances/{employee_id}/close-year")
                            .route(web::post().to(leave_balance::close_fiscal_year)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            ),
    );
}
