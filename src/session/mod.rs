use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// User record surfaced by the session provider. The auth system owning it
/// is external; this crate only reads the email field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionUser {
    pub id: Option<Uuid>,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Provider-level failures only. An absent or invalid session is not an
/// error; it resolves to no user.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("SESSION_SECRET is not configured")]
    SecretMissing,
}

/// Seam to the external session/auth system. One suspending call per request.
#[async_trait]
pub trait SessionProvider: Sync {
    async fn session(&self) -> Result<Option<SessionUser>, SessionError>;
}

/// Claims carried by a bearer session token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Session provider reading `Authorization: Bearer <jwt>` from request headers.
pub struct BearerSession<'a> {
    headers: &'a HeaderMap,
    secret: &'a str,
}

impl<'a> BearerSession<'a> {
    pub fn new(headers: &'a HeaderMap, secret: &'a str) -> Self {
        Self { headers, secret }
    }

    fn bearer_token(&self) -> Option<&str> {
        let auth_str = self.headers.get("authorization")?.to_str().ok()?;
        let token = auth_str.strip_prefix("Bearer ")?.trim();
        if token.is_empty() {
            None
        } else {
            Some(token)
        }
    }
}

#[async_trait]
impl SessionProvider for BearerSession<'_> {
    async fn session(&self) -> Result<Option<SessionUser>, SessionError> {
        let Some(token) = self.bearer_token() else {
            return Ok(None);
        };

        if self.secret.is_empty() {
            return Err(SessionError::SecretMissing);
        }

        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let validation = Validation::default();

        match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(data) => Ok(Some(SessionUser {
                id: Uuid::parse_str(&data.claims.sub).ok(),
                email: data.claims.email,
                name: data.claims.name,
            })),
            Err(e) => {
                // Expired or malformed tokens mean "not signed in", not failure
                tracing::debug!("rejected bearer token: {}", e);
                Ok(None)
            }
        }
    }
}

/// Mint a session token for a user. Used by tests and local tooling; the
/// production issuer is the external auth system.
pub fn issue_token(
    user: &SessionUser,
    secret: &str,
    ttl_hours: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.unwrap_or_else(Uuid::new_v4).to_string(),
        email: user.email.clone(),
        name: user.name.clone(),
        exp: (now + Duration::hours(ttl_hours)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}
