/// Route table for feed-service
///
/// Authentication is attached per handler through the `UserId` extractor,
/// since public and protected methods share the same paths.
use actix_cors::Cors;
use actix_web::http::{header, Method};
use actix_web::middleware::DefaultHeaders;
use actix_web::{web, HttpResponse};

use crate::handlers;
use crate::metrics::serve_metrics;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health_check))
        .route("/health/ready", web::get().to(handlers::readiness_check))
        .route("/metrics", web::get().to(serve_metrics))
        .service(
            web::scope("/feed")
                .route("/posts", web::get().to(handlers::get_posts))
                .service(
                    web::resource("/post/create").route(web::post().to(handlers::create_post)),
                )
                .service(
                    web::resource("/post/comment/{post_id}")
                        .route(web::patch().to(handlers::add_comment)),
                )
                .service(
                    web::resource("/post/{post_id}")
                        .route(web::get().to(handlers::get_post))
                        .route(web::put().to(handlers::update_post))
                        .route(web::patch().to(handlers::like_dislike))
                        .route(web::delete().to(handlers::delete_post)),
                ),
        );
}

/// Fallback for unmatched routes
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "status": false,
        "message": "Not found"
    }))
}

/// CORS policy from a comma-separated origin list. `*` answers with a
/// literal wildcard rather than echoing the caller's origin.
pub fn cors(allowed_origins: &str) -> Cors {
    let mut cors = Cors::default();
    for origin in allowed_origins.split(',') {
        let origin = origin.trim();
        if origin.is_empty() {
            continue;
        }
        if origin == "*" {
            cors = cors.allow_any_origin().send_wildcard();
        } else {
            cors = cors.allowed_origin(origin);
        }
    }
    cors.allowed_methods(vec![
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
    ])
    .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
    .max_age(3600)
}

/// Hardening headers added to every response
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "SAMEORIGIN"))
        .add(("X-DNS-Prefetch-Control", "off"))
        .add(("X-Download-Options", "noopen"))
        .add(("X-Permitted-Cross-Domain-Policies", "none"))
        .add(("X-XSS-Protection", "0"))
        .add(("Referrer-Policy", "no-referrer"))
        .add((
            "Strict-Transport-Security",
            "max-age=15552000; includeSubDomains",
        ))
        .add(("Cross-Origin-Opener-Policy", "same-origin"))
        .add(("Origin-Agent-Cluster", "?1"))
}
