use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::AppConfig, error::ServiceError, repository::RepositoryState};

/// Claims
///
/// Payload structure of the JWTs this server issues and validates.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the member's id, used to load the identity row on every
    /// authenticated request.
    pub sub: i64,
    /// Expiration time. Tokens past this timestamp are rejected.
    pub exp: usize,
    /// Issued at.
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request: the actor. Handlers
/// take this as an argument and pass it on to the access policy, so the
/// authenticated identity is resolved exactly once per request and flows
/// explicitly instead of living in ambient state.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    /// 'user' or 'admin'. Loaded fresh from the database, not from the
    /// token, so a role change takes effect without reissuing tokens.
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// Signs a token for the given member id. Used by tests and by whatever
/// out-of-band process issues tokens; there is no login endpoint here.
pub fn create_token(
    secret: &str,
    member_id: i64,
    expire_seconds: u64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let iat = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: member_id,
        exp: iat + expire_seconds as usize,
        iat,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

fn unauthorized() -> ServiceError {
    ServiceError::Unauthorized("잘못된 인증키입니다.".to_string())
}

/// The shared validation flow behind both extractor forms:
/// 1. Bearer token extraction from the Authorization header.
/// 2. JWT decoding against the configured secret (expiry enforced).
/// 3. Database lookup of the member, so a deleted member's still-valid
///    token stops working immediately.
async fn authenticate(
    parts: &Parts,
    repo: &RepositoryState,
    config: &AppConfig,
) -> Result<AuthUser, ServiceError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(unauthorized)?;

    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    let token_data =
        decode::<Claims>(token, &decoding_key, &validation).map_err(|_| unauthorized())?;

    let member = repo
        .get_member(token_data.claims.sub)
        .await?
        .ok_or_else(unauthorized)?;

    Ok(AuthUser {
        id: member.id,
        role: member.role,
    })
}

/// Required-auth extractor. Any failure rejects the request with
/// 401-1 before the handler runs.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);
        authenticate(parts, &repo, &config).await
    }
}

/// Optional-auth extractor, used where a token is only needed for private
/// resources (GET /posts/{id}). No Authorization header resolves to `None`;
/// a header that is present but invalid is still a hard 401, so a broken
/// token never silently downgrades to anonymous access.
impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        if !parts.headers.contains_key(header::AUTHORIZATION) {
            return Ok(None);
        }

        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);
        authenticate(parts, &repo, &config).await.map(Some)
    }
}
