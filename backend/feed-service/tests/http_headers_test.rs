//! Response headers shared by every route: CORS and hardening headers

mod common;

use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use common::TestContext;
use feed_service::routes;

fn header_value<'a, B: MessageBody>(resp: &'a ServiceResponse<B>, name: &str) -> Option<&'a str> {
    resp.headers().get(name).and_then(|v| v.to_str().ok())
}

#[actix_web::test]
async fn test_security_headers_on_every_response() {
    let ctx = TestContext::new();
    let app = common::init_app(&ctx).await;

    for uri in ["/feed/posts", "/nowhere"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(header_value(&resp, "x-content-type-options"), Some("nosniff"));
        assert_eq!(header_value(&resp, "x-frame-options"), Some("SAMEORIGIN"));
        assert_eq!(header_value(&resp, "x-dns-prefetch-control"), Some("off"));
        assert_eq!(header_value(&resp, "referrer-policy"), Some("no-referrer"));
        assert!(header_value(&resp, "strict-transport-security")
            .unwrap()
            .starts_with("max-age="));
    }
}

#[actix_web::test]
async fn test_wildcard_cors_sends_literal_star() {
    let app = test::init_service(
        App::new()
            .wrap(routes::cors("*"))
            .configure(routes::configure)
            .default_service(web::to(routes::not_found)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header((header::ORIGIN, "https://client.example"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        header_value(&resp, "access-control-allow-origin"),
        Some("*")
    );
}

#[actix_web::test]
async fn test_preflight_lists_methods_and_headers() {
    let app = test::init_service(
        App::new()
            .wrap(routes::cors("*"))
            .configure(routes::configure)
            .default_service(web::to(routes::not_found)),
    )
    .await;

    let req = test::TestRequest::default()
        .method(actix_web::http::Method::OPTIONS)
        .uri("/feed/post/create")
        .insert_header((header::ORIGIN, "https://client.example"))
        .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
        .insert_header((
            header::ACCESS_CONTROL_REQUEST_HEADERS,
            "content-type, authorization",
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        header_value(&resp, "access-control-allow-origin"),
        Some("*")
    );

    let methods = header_value(&resp, "access-control-allow-methods").unwrap();
    for method in ["GET", "POST", "PUT", "PATCH", "DELETE"] {
        assert!(methods.contains(method), "missing {} in {}", method, methods);
    }

    let headers = header_value(&resp, "access-control-allow-headers")
        .unwrap()
        .to_ascii_lowercase();
    assert!(headers.contains("content-type"));
    assert!(headers.contains("authorization"));
}

#[actix_web::test]
async fn test_listed_origin_is_echoed_and_others_refused() {
    let app = test::init_service(
        App::new()
            .wrap(routes::cors("https://app.example, https://admin.example"))
            .configure(routes::configure)
            .default_service(web::to(routes::not_found)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header((header::ORIGIN, "https://admin.example"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(
        header_value(&resp, "access-control-allow-origin"),
        Some("https://admin.example")
    );

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header((header::ORIGIN, "https://evil.example"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(header_value(&resp, "access-control-allow-origin").is_none());
}
