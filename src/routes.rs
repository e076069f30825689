use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use anyhow::anyhow;

use crate::api::{self, attendance, employee, leave_request};

pub type LimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter allowing `requests_per_min` with an equal burst.
pub fn build_limiter(requests_per_min: u32) -> anyhow::Result<LimiterConfig> {
    if requests_per_min == 0 {
        return Err(anyhow!("rate limit must be greater than 0"));
    }
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);

    GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limiter configuration"))
}

pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str, limiter: &LimiterConfig) {
    // Public routes
    cfg.service(
        web::resource(format!("{api_prefix}/health")).route(web::get().to(api::health)),
    );

    // Protected routes: every handler below takes the `AuthUser` extractor
    cfg.service(
        web::scope(api_prefix)
            .wrap(Governor::new(limiter)) // rate limiting
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employees/me
                    .service(web::resource("/me").route(web::get().to(employee::me)))
                    // /employees/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("/check-in").route(web::post().to(attendance::check_in)),
                    )
                    .service(
                        web::resource("/check-out/{attendance_id}")
                            .route(web::put().to(attendance::check_out)),
                    )
                    .service(
                        web::resource("/absent").route(web::post().to(attendance::mark_absent)),
                    )
                    .service(web::resource("/daily").route(web::get().to(attendance::daily)))
                    .service(web::resource("/report").route(web::get().to(attendance::report)))
                    // must stay last: matches any single segment
                    .service(
                        web::resource("/{employee_id}").route(web::get().to(attendance::history)),
                    ),
            )
            .service(
                web::scope("/leaves")
                    .service(
                        web::resource("/request")
                            .route(web::post().to(leave_request::request_leave)),
                    )
                    .service(
                        web::resource("/my-leaves/{employee_id}")
                            .route(web::get().to(leave_request::my_leaves)),
                    )
                    .service(
                        web::resource("/pending").route(web::get().to(leave_request::pending)),
                    )
                    .service(
                        web::resource("/balance/{employee_id}")
                            .route(web::get().to(leave_request::balance)),
                    )
                    .service(
                        web::resource("/status/{leave_id}")
                            .route(web::put().to(leave_request::update_status)),
                    )
                    .service(
                        web::resource("/report").route(web::get().to(leave_request::report)),
                    ),
            ),
    );
}
