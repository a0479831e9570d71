use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;

use crate::app::AppState;
use crate::auth::VerifiedIdentity;
use crate::database::User;
use crate::error::ApiError;

/// The authenticated caller of a request: the verified token plus its user row.
///
/// Take `Principal` as a handler argument to require authentication, or
/// `Option<Principal>` to allow anonymous callers; any verification or store
/// failure then yields `None`.
#[derive(Clone, Debug)]
pub struct Principal {
    pub identity: VerifiedIdentity,
    pub user: User,
}

#[async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers).map_err(ApiError::unauthorized)?;

        let identity = state.verifier.verify(&token).await.map_err(|e| {
            warn!(error = %e, "token verification failed");
            ApiError::from(e)
        })?;

        let user = state.users.upsert(&identity).await.map_err(|e| {
            warn!(subject = %identity.subject, error = %e, "could not get user");
            ApiError::from(e)
        })?;

        Ok(Principal { identity, user })
    }
}

/// Extract the token from `Authorization: Bearer <token>`
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| "no Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    // The scheme name is case-insensitive
    let (scheme, token) = auth_str.trim().split_once(' ').unwrap_or((auth_str.trim(), ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err("Authorization header must use Bearer token format".to_string());
    }

    match token.trim() {
        "" => Err("Empty bearer token".to_string()),
        token => Ok(token.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: Option<&'static str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = value {
            headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(extract_bearer_token(&headers(Some("Bearer abc.def.ghi"))).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert_eq!(extract_bearer_token(&headers(Some("bearer abc.def.ghi"))).unwrap(), "abc.def.ghi");
        assert_eq!(extract_bearer_token(&headers(Some("BEARER abc.def.ghi"))).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn rejects_missing_or_malformed_headers() {
        assert_eq!(extract_bearer_token(&headers(None)).unwrap_err(), "no Authorization header");
        assert!(extract_bearer_token(&headers(Some("Bearer   "))).is_err());
        assert!(extract_bearer_token(&headers(Some("Bearer"))).is_err());
        assert!(extract_bearer_token(&headers(Some("Bearerabc.def.ghi"))).is_err());
        assert!(extract_bearer_token(&headers(Some("Basic dXNlcjpwYXNz"))).is_err());
    }
}
