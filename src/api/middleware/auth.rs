//! Bearer-token authentication and the staff gate.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::access::{Caller, Capability};
use crate::error::AppError;
use crate::state::AppState;

/// Resolves `Authorization: Bearer <access token>` to a [`Caller`] and puts
/// it in the request extensions.
///
/// The token only names the user; role and block assignment are read fresh
/// from storage, so an unapproved or deleted account is refused at once.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)?;
    let caller = state.services.accounts.authenticate(token).await?;

    tracing::debug!(user_id = caller.user_id, role = %caller.role, "Authenticated");
    request.extensions_mut().insert(caller);

    Ok(next.run(request).await)
}

/// Refuses callers without administrative access (farmer accounts) before
/// any handler runs. Must sit inside [`auth_middleware`].
pub async fn staff_middleware(request: Request, next: Next) -> Result<Response, AppError> {
    let caller = request
        .extensions()
        .get::<Caller>()
        .ok_or_else(|| AppError::unauthorized("Authentication credentials were not provided."))?;
    caller.require(Capability::AdministrativeAccess)?;

    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Result<&str, AppError> {
    let value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Authentication credentials were not provided."))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::unauthorized("Invalid authorization header format. Expected: Bearer <token>")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use axum::{Extension, Router, body::Body, http::StatusCode, middleware, routing::get};
    use tower::ServiceExt;

    fn request(authorization: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/protected");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn caller(role: Role) -> Caller {
        Caller {
            user_id: 3,
            username: "someone".to_string(),
            role,
            block_id: None,
            section_id: None,
        }
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&request(Some("Bearer abc.def"))).unwrap(), "abc.def");
        for bad in [None, Some("Token abc"), Some("Bearer "), Some("bearer abc")] {
            assert!(
                matches!(bearer_token(&request(bad)), Err(AppError::Unauthorized { .. })),
                "{bad:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_missing_or_invalid_token_is_401() {
        let state = AppState::detached();
        let app = Router::new()
            .route("/protected", get(|| async { "ok" }))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state);

        for header in [None, Some("Bearer not-a-jwt")] {
            let response = app.clone().oneshot(request(header)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{header:?}");
        }
    }

    async fn staff_status(role: Role) -> StatusCode {
        let app = Router::new()
            .route("/protected", get(|| async { "ok" }))
            .route_layer(middleware::from_fn(staff_middleware))
            .layer(Extension(caller(role)));
        app.oneshot(request(None)).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_staff_gate_turns_away_farmers() {
        assert_eq!(staff_status(Role::Farmer).await, StatusCode::FORBIDDEN);
        assert_eq!(staff_status(Role::BlockChair).await, StatusCode::OK);
        assert_eq!(staff_status(Role::Treasurer).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_staff_gate_without_caller_is_401() {
        let app = Router::new()
            .route("/protected", get(|| async { "ok" }))
            .route_layer(middleware::from_fn(staff_middleware));
        let response = app.oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
