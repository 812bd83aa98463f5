// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication gate for Axum.
//!
//! Applied once to the whole router. For each call the route matcher decides
//! whether the gate runs; when it does, the call either carries a verified
//! [`Identity`](super::Identity) into the handler or is rejected with 401
//! before any handler code runs.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .nest("/v1", v1_routes)
//!     .layer(axum::middleware::from_fn_with_state(state.clone(), auth_gate));
//! ```

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::AuthError;
use crate::state::AppState;

/// Route prefixes served without authentication.
///
/// `/v1/users/` is the identity service (register, login).
const PUBLIC_PREFIXES: &[&str] = &["/v1/users/", "/health", "/docs", "/api-doc"];

/// Whether a call to `path` must present a verified identity.
pub fn requires_auth(path: &str) -> bool {
    !PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Extract the bearer token from the `authorization` header.
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(token)
}

/// Authentication middleware function.
pub async fn auth_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    if !requires_auth(request.uri().path()) {
        return next.run(request).await;
    }

    let verified = bearer_token(request.headers()).and_then(|token| state.tokens.verify(token));
    match verified {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(
                path = %request.uri().path(),
                error_code = e.error_code(),
                "Rejected unauthenticated call"
            );
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn identity_service_bypasses_gate() {
        assert!(!requires_auth("/v1/users/register"));
        assert!(!requires_auth("/v1/users/login"));
        assert!(!requires_auth("/health/ready"));
        assert!(!requires_auth("/docs/"));
    }

    #[test]
    fn storage_service_requires_gate() {
        assert!(requires_auth("/v1/records"));
        assert!(requires_auth("/v1/records/12"));
        assert!(requires_auth("/v1/users"));
        assert!(requires_auth("/"));
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(bearer_token(&headers_with("bearer abc")).unwrap(), "abc");
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingAuthHeader)
        ));
        assert!(matches!(
            bearer_token(&headers_with("Basic dXNlcjpwdw==")),
            Err(AuthError::InvalidAuthHeader)
        ));
        assert!(matches!(
            bearer_token(&headers_with("Bearer")),
            Err(AuthError::InvalidAuthHeader)
        ));
        assert!(matches!(
            bearer_token(&headers_with("Bearer   ")),
            Err(AuthError::InvalidAuthHeader)
        ));
    }
}
