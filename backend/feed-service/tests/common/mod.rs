//! Shared fixtures for feed-service integration tests

#![allow(dead_code)]

use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App};
use feed_service::db::{FeedStore, InMemoryFeedStore};
use feed_service::middleware::{Claims, TokenVerifier};
use feed_service::models::User;
use feed_service::routes;
use feed_service::services::PostService;
use feed_service::uploads::ImageStore;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

pub const SECRET: &str = "feed-integration-secret-0123456789abcdef";
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024;
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n0000";

pub struct TestContext {
    pub store: Arc<InMemoryFeedStore>,
    pub upload_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryFeedStore::new()),
            upload_dir: tempfile::tempdir().expect("create upload dir"),
        }
    }

    pub fn images_dir(&self) -> PathBuf {
        self.upload_dir.path().join("images")
    }

    /// Files currently present in the upload directory
    pub fn stored_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(self.images_dir()) {
            Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub async fn seed_user(&self, firstname: &str) -> User {
        let user = User::new(
            Uuid::new_v4(),
            firstname,
            format!("{}@example.com", firstname.to_lowercase()),
        );
        self.store.save_user(&user).await.expect("seed user");
        user
    }

    pub async fn user(&self, id: Uuid) -> User {
        self.store
            .find_user(id)
            .await
            .expect("store lookup")
            .expect("user exists")
    }
}

pub async fn init_app(
    ctx: &TestContext,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    let store: Arc<dyn FeedStore> = ctx.store.clone();
    let images = ImageStore::new(ctx.images_dir(), MAX_UPLOAD_BYTES);
    let service = web::Data::new(PostService::new(store, images));
    let verifier = web::Data::new(TokenVerifier::new(SECRET));

    test::init_service(
        App::new()
            .wrap(routes::security_headers())
            .app_data(service)
            .app_data(verifier)
            .configure(routes::configure)
            .default_service(web::to(routes::not_found)),
    )
    .await
}

pub fn token_for(user_id: Uuid) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        email: None,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("encode token")
}

pub fn bearer(user_id: Uuid) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token_for(user_id)))
}

pub fn long_description() -> String {
    "A long enough description for the feed post body. ".repeat(4)
}

/// Hand-built `multipart/form-data` body
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: format!("----feedtest{}", Uuid::new_v4().simple()),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary, name, filename, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn post_fields(self, title: &str, description: &str) -> Self {
        self.text("title", title).text("description", description)
    }

    pub fn png(self) -> Self {
        self.file("image", "photo.png", "image/png", PNG_BYTES)
    }

    /// `(content-type header value, body)`
    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}
