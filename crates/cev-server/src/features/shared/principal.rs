//! Authenticated principal supplied by the upstream auth layer
//!
//! Authentication happens before requests reach this service. The verified
//! identity arrives in the `x-user-id` header, with an optional display name
//! in `x-username`. Requests without an id are rejected.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use cev_common::Principal;
use thiserror::Error;

use crate::api::response::ErrorResponse;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USERNAME_HEADER: &str = "x-username";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrincipalRejection {
    #[error("Authentication credentials were not provided")]
    Missing,

    #[error("Header '{0}' is not valid text")]
    Invalid(&'static str),
}

impl IntoResponse for PrincipalRejection {
    fn into_response(self) -> Response {
        ErrorResponse::new("UNAUTHORIZED", self.to_string()).with_status(StatusCode::UNAUTHORIZED)
    }
}

fn header_text<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<Option<&'a str>, PrincipalRejection> {
    headers
        .get(name)
        .map(|value| {
            value
                .to_str()
                .map(str::trim)
                .map_err(|_| PrincipalRejection::Invalid(name))
        })
        .transpose()
}

/// Read the principal from request headers. The username defaults to the id.
pub fn principal_from_headers(headers: &HeaderMap) -> Result<Principal, PrincipalRejection> {
    let id = header_text(headers, USER_ID_HEADER)?
        .filter(|id| !id.is_empty())
        .ok_or(PrincipalRejection::Missing)?;

    let username = header_text(headers, USERNAME_HEADER)?
        .filter(|name| !name.is_empty())
        .unwrap_or(id);

    Ok(Principal::new(id, username))
}

/// Extractor for the caller's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedPrincipal(pub Principal);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedPrincipal
where
    S: Send + Sync,
{
    type Rejection = PrincipalRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        principal_from_headers(&parts.headers).map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_id_and_username() {
        let principal =
            principal_from_headers(&headers(&[(USER_ID_HEADER, "42"), (USERNAME_HEADER, "alice")])).unwrap();
        assert_eq!(principal, Principal::new("42", "alice"));
    }

    #[test]
    fn test_username_defaults_to_id() {
        let principal = principal_from_headers(&headers(&[(USER_ID_HEADER, "42")])).unwrap();
        assert_eq!(principal.username, "42");
    }

    #[test]
    fn test_missing_or_blank_id_is_rejected() {
        assert_eq!(principal_from_headers(&HeaderMap::new()), Err(PrincipalRejection::Missing));
        assert_eq!(
            principal_from_headers(&headers(&[(USER_ID_HEADER, "  ")])),
            Err(PrincipalRejection::Missing)
        );
    }

    #[test]
    fn test_non_text_header_is_rejected() {
        let mut map = HeaderMap::new();
        map.insert(USER_ID_HEADER, HeaderValue::from_bytes(b"\xff").unwrap());
        assert_eq!(
            principal_from_headers(&map),
            Err(PrincipalRejection::Invalid(USER_ID_HEADER))
        );
    }
}
