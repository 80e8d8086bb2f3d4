use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::HeaderMap};

use crate::auth::{decode_token, TokenScope};
use crate::context::SharedContext;
use crate::error::ApiError;

/// Authenticated user context extracted from a bearer JWT.
///
/// Used as an extractor on protected handlers: the token is verified
/// (signature, expiry, scope) and rejected with 401 before the handler body
/// runs. Identity is the `sub` claim; services re-check that the account
/// still exists and is active where it matters.
#[derive(Clone, Copy, Debug)]
pub struct AuthUser {
    pub user_id: uuid::Uuid,
}

#[async_trait]
impl FromRequestParts<SharedContext> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &SharedContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;
        let claims = decode_token(&ctx.config.security, &token).map_err(ApiError::from)?;

        if claims.scope != TokenScope::Access {
            return Err(ApiError::unauthorized("Token not valid for API access"));
        }

        Ok(AuthUser {
            user_id: claims.sub,
        })
    }
}

/// Optional variant for endpoints that behave differently for signed-in
/// callers. No Authorization header yields `None`; a present-but-invalid
/// token is still a 401 rather than silent anonymity.
#[derive(Clone, Copy, Debug)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

#[async_trait]
impl FromRequestParts<SharedContext> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &SharedContext,
    ) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key("authorization") {
            return Ok(MaybeAuthUser(None));
        }
        let user = AuthUser::from_request_parts(parts, ctx).await?;
        Ok(MaybeAuthUser(Some(user)))
    }
}

/// Extract the JWT from the Authorization header.
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))?;

    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(ApiError::unauthorized(
            "Authorization header must use Bearer token format",
        ));
    };

    if token.trim().is_empty() {
        return Err(ApiError::unauthorized("Empty bearer token"));
    }

    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(v) = value {
            headers.insert("authorization", HeaderValue::from_str(v).unwrap());
        }
        headers
    }

    #[test]
    fn missing_header_is_rejected() {
        assert!(extract_bearer_token(&headers(None)).is_err());
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        assert!(extract_bearer_token(&headers(Some("Basic abc"))).is_err());
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(extract_bearer_token(&headers(Some("Bearer "))).is_err());
    }

    #[test]
    fn bearer_token_is_extracted() {
        let token = extract_bearer_token(&headers(Some("Bearer abc.def.ghi"))).unwrap();
        assert_eq!(token, "abc.def.ghi");
    }
}
