// Route exports
pub mod recommend;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api/v1").configure(recommend::configure))
        // The frontend probes /health without the API prefix
        .route("/health", web::get().to(recommend::health_check));
}
