//! Extractor for the authenticated user.
//!
//! Resolves `Authorization: Bearer <access token>` into a [`CurrentUser`]:
//! cryptographic verification of the access token, then a store lookup of the
//! identity it names. Any failure along the way - missing header, malformed
//! or expired token, deleted account - is a single generic 401; the response
//! never says which step failed.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{debug, instrument, trace};

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::tokens::{self, TokenKind},
    db::store::UserStore as _,
    errors::{Error, Result},
};

/// Pull the bearer token out of the Authorization header, if present.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = match bearer_token(parts) {
            Some(token) => token,
            None => {
                trace!("No bearer token in request");
                return Err(Error::Unauthenticated { message: None });
            }
        };

        let user_id = tokens::verify_token(token, TokenKind::Access, &state.config).map_err(|e| match e {
            // Key-level faults stay 500; everything else collapses to a generic 401
            Error::Internal { .. } => e,
            _ => Error::Unauthenticated { message: None },
        })?;

        let record = state
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(Error::Unauthenticated { message: None })?;

        debug!("Authenticated user: {}", record.id);
        Ok(CurrentUser::from(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::auth::tokens;
    use crate::test_utils::{create_test_state, insert_test_user};
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("http://localhost/test");
        if let Some(value) = value {
            builder = builder.header("authorization", value);
        }
        let (parts, _body) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn test_valid_access_token_resolves_user() {
        let state = create_test_state();
        let user = insert_test_user(&state, "auth@example.com", "5550001111", Role::User).await;

        let token = tokens::create_access_token(user.id, &state.config).unwrap();
        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));

        let current = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(current.id, user.id);
        assert_eq!(current.email, "auth@example.com");
        assert_eq!(current.role, Role::User);
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthenticated() {
        let state = create_test_state();
        let mut parts = parts_with_auth(None);

        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbled_token_is_unauthenticated() {
        let state = create_test_state();
        let mut parts = parts_with_auth(Some("Bearer not.a.real.token"));

        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let state = create_test_state();
        let user = insert_test_user(&state, "kind@example.com", "5550002222", Role::User).await;

        let refresh = tokens::create_refresh_token(user.id, &state.config).unwrap();
        let mut parts = parts_with_auth(Some(&format!("Bearer {refresh}")));

        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_deleted_user_is_unauthenticated() {
        let state = create_test_state();
        let user = insert_test_user(&state, "gone@example.com", "5550003333", Role::User).await;
        state.store.delete(user.id).await.unwrap();

        let token = tokens::create_access_token(user.id, &state.config).unwrap();
        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));

        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
