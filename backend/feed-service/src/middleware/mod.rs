/// HTTP authentication for feed-service
///
/// Tokens are issued elsewhere; this service only verifies the HS256
/// signature and reads the user id out of the claims.
use actix_web::{web, FromRequest, HttpRequest};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::error::AppError;

/// Claims this service understands. Older tokens carry the user id as
/// `userId` instead of `sub`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(alias = "userId")]
    pub sub: String,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    Missing,
    Invalid,
}

impl AuthFailure {
    fn message(self) -> &'static str {
        match self {
            AuthFailure::Missing => "Not authenticated",
            AuthFailure::Invalid => "Invalid or expired token",
        }
    }
}

/// Verifies bearer tokens against the shared secret
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.key, &self.validation).map(|data| data.claims)
    }

    /// Check a raw `Authorization` header value. The `Bearer ` prefix is
    /// optional; some clients send the bare token.
    pub fn verify_header(&self, header: Option<&str>) -> Result<Uuid, AuthFailure> {
        let raw = header
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(AuthFailure::Missing)?;
        let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();

        let claims = self.verify(token).map_err(|e| {
            tracing::debug!("JWT validation failed: {}", e);
            AuthFailure::Invalid
        })?;

        Uuid::parse_str(&claims.sub).map_err(|_| AuthFailure::Invalid)
    }
}

/// Raw `Authorization` header, if any
pub fn authorization_header(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
}

/// Authenticated user. Extracting it is the authentication gate: handlers
/// that take a `UserId` reject requests without a valid bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub Uuid);

impl FromRequest for UserId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let verifier = match req.app_data::<web::Data<TokenVerifier>>() {
            Some(v) => v,
            None => {
                return ready(Err(AppError::Internal(
                    "token verifier not configured".to_string(),
                )))
            }
        };

        ready(
            verifier
                .verify_header(authorization_header(req))
                .map(UserId)
                .map_err(|failure| AppError::Unauthorized(failure.message().to_string())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "unit-test-secret-unit-test-secret";

    fn token(sub: &str, secret: &str, ttl: i64) -> String {
        let exp = (chrono::Utc::now().timestamp() + ttl) as usize;
        encode(
            &Header::new(Algorithm::HS256),
            &Claims {
                sub: sub.to_string(),
                exp,
                email: None,
            },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn accepts_with_and_without_bearer_prefix() {
        let verifier = TokenVerifier::new(SECRET);
        let user = Uuid::new_v4();
        let t = token(&user.to_string(), SECRET, 3600);

        assert_eq!(verifier.verify_header(Some(&t)), Ok(user));
        assert_eq!(
            verifier.verify_header(Some(&format!("Bearer {}", t))),
            Ok(user)
        );
    }

    #[test]
    fn rejects_missing_tampered_and_expired() {
        let verifier = TokenVerifier::new(SECRET);
        let user = Uuid::new_v4().to_string();

        assert_eq!(verifier.verify_header(None), Err(AuthFailure::Missing));
        assert_eq!(verifier.verify_header(Some("  ")), Err(AuthFailure::Missing));

        let wrong_key = token(&user, "another-secret-another-secret-xx", 3600);
        assert_eq!(
            verifier.verify_header(Some(&wrong_key)),
            Err(AuthFailure::Invalid)
        );

        let expired = token(&user, SECRET, -3600);
        assert_eq!(
            verifier.verify_header(Some(&expired)),
            Err(AuthFailure::Invalid)
        );
    }

    #[test]
    fn non_uuid_subject_is_invalid() {
        let verifier = TokenVerifier::new(SECRET);
        let t = token("user-123", SECRET, 3600);
        assert_eq!(verifier.verify_header(Some(&t)), Err(AuthFailure::Invalid));
    }

    #[test]
    fn legacy_user_id_claim_is_accepted() {
        let claims: Claims =
            serde_json::from_str(r#"{"userId":"abc","exp":1}"#).unwrap();
        assert_eq!(claims.sub, "abc");
    }
}
