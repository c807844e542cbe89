use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::main_lib::AppState;

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

/// Verifies the bearer tokens the external auth service issues. Issuance is
/// kept as a helper for operators and tests; the server itself only ever
/// validates.
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: String,
    iat: usize,
    exp: usize,
}

/// Authenticated caller, injected as a request extension by `require_jwt`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

impl AuthManager {
    pub fn new(secret: &[u8], token_ttl: Duration) -> Self {
        let encoding_key = EncodingKey::from_secret(secret);
        let decoding_key = DecodingKey::from_secret(secret);
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            encoding_key,
            decoding_key,
            validation,
            token_ttl,
        }
    }

    pub fn issue_token(&self, user_id: &str, role: &str) -> Result<String, ApiError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| ApiError::Internal("System clock is before UNIX_EPOCH".into()))?;
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            iat: now.as_secs() as usize,
            exp: (now + self.token_ttl).as_secs() as usize,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("Failed to sign token: {e}")))
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthUser, ApiError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature
                | jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature
                | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_) => {
                    ApiError::Unauthorized("Invalid or expired token".to_string())
                }
                other => ApiError::Internal(format!("Failed to validate token: {other:?}")),
            })?;
        if data.claims.role != ROLE_USER && data.claims.role != ROLE_ADMIN {
            return Err(ApiError::Unauthorized(format!(
                "Unknown role '{}'",
                data.claims.role
            )));
        }
        Ok(AuthUser {
            user_id: data.claims.sub,
            role: data.claims.role,
        })
    }
}

pub async fn require_jwt(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    let mut parts = header.splitn(2, ' ');
    let (Some(scheme), Some(token)) = (parts.next(), parts.next()) else {
        return Err(ApiError::Unauthorized("Malformed Authorization header".to_string()));
    };
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(ApiError::Unauthorized("Expected a Bearer token".to_string()));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(ApiError::Unauthorized("Empty bearer token".to_string()));
    }

    let user = state.auth.validate_token(token)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> AuthManager {
        AuthManager::new(b"0123456789abcdef0123456789abcdef", Duration::from_secs(3600))
    }

    #[test]
    fn issued_tokens_round_trip() {
        let auth = manager();
        let token = auth.issue_token("user-42", ROLE_USER).unwrap();
        let user = auth.validate_token(&token).unwrap();
        assert_eq!(user.user_id, "user-42");
        assert_eq!(user.role, ROLE_USER);
        assert!(!user.is_admin());
    }

    #[test]
    fn admin_role_is_carried_in_the_token() {
        let auth = manager();
        let token = auth.issue_token("ops-1", ROLE_ADMIN).unwrap();
        assert!(auth.validate_token(&token).unwrap().is_admin());
    }

    #[test]
    fn unknown_roles_are_rejected() {
        let auth = manager();
        let token = auth.issue_token("user-1", "superuser").unwrap();
        assert!(auth.validate_token(&token).is_err());
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        let auth = manager();
        assert!(auth.validate_token("not-a-jwt").is_err());
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let token = manager().issue_token("user-42", ROLE_USER).unwrap();
        let other = AuthManager::new(b"ffffffffffffffffffffffffffffffff", Duration::from_secs(3600));
        assert!(other.validate_token(&token).is_err());
    }
}
