use crate::{
    api::{balance, dashboard, leave},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

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

    let api_limiter = Arc::new(build_limiter(config.rate_api_per_min));
    let admin_limiter = Arc::new(build_limiter(config.rate_admin_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            .service(
                web::scope("/leave")
                    .wrap(api_limiter.clone())
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave::leave_list))
                            .route(web::post().to(leave::create_leave)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave::get_leave)))
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve").route(web::put().to(leave::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject").route(web::put().to(leave::reject_leave)),
                    ),
            )
            .service(
                web::scope("/balance")
                    .wrap(admin_limiter)
                    // /balance
                    .service(
                        web::resource("").route(web::post().to(balance::provision_balance)),
                    )
                    // /balance/{employee_id}
                    .service(
                        web::resource("/{employee_id}")
                            .route(web::get().to(balance::get_balances)),
                    )
                    // /balance/{employee_id}/{leave_type}
                    .service(
                        web::resource("/{employee_id}/{leave_type}")
                            .route(web::put().to(balance::adjust_balance)),
                    ),
            )
            .service(
                web::scope("/dashboard")
                    .wrap(api_limiter)
                    .service(
                        web::resource("/summary").route(web::get().to(dashboard::status_summary)),
                    )
                    .service(
                        web::resource("/employee/{employee_id}")
                            .route(web::get().to(dashboard::employee_dashboard)),
                    ),
            ),
    );
}
