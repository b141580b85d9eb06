//! Caller identity.
//!
//! Authentication happens upstream. The proxy in front of this server puts
//! the authenticated user's id in a header (see
//! [`ServerConfig::identity_header`](crate::config::ServerConfig)); this
//! module only reads it back.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use murmur_shared::UserId;

use crate::api::AppState;
use crate::error::ServerError;

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity(pub UserId);

#[async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        identity_from_headers(&parts.headers, &state.config.identity_header).map(Identity)
    }
}

pub(crate) fn identity_from_headers(headers: &HeaderMap, header: &str) -> Result<UserId, ServerError> {
    let raw = headers
        .get(header)
        .ok_or_else(|| ServerError::Unauthorized(format!("missing {header} header")))?
        .to_str()
        .map_err(|_| ServerError::Unauthorized(format!("malformed {header} header")))?;

    raw.parse::<UserId>()
        .map_err(|_| ServerError::Unauthorized(format!("malformed {header} header")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_reads_configured_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_static(" 17 "));
        assert_eq!(identity_from_headers(&headers, "x-user-id").unwrap(), UserId(17));
    }

    #[test]
    fn test_missing_or_garbage_is_unauthorized() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            identity_from_headers(&headers, "x-user-id"),
            Err(ServerError::Unauthorized(_))
        ));

        headers.insert("x-user-id", HeaderValue::from_static("bob"));
        assert!(matches!(
            identity_from_headers(&headers, "x-user-id"),
            Err(ServerError::Unauthorized(_))
        ));
    }
}
