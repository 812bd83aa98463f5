// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity service: account registration and login. Not gated.

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::{
    error::ApiError,
    models::{CredentialsRequest, Reply, TokenResponse},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/v1/users/register",
    request_body = CredentialsRequest,
    tag = "Users",
    responses(
        (status = 200, description = "Token on success, or a business error", body = Reply<TokenResponse>),
        (status = 400, description = "Malformed request body")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<Reply<TokenResponse>>, ApiError> {
    let Json(request) = payload?;
    let outcome = state
        .service
        .register(&request.login, &request.password)
        .await;
    Ok(Json(outcome.into()))
}

#[utoipa::path(
    post,
    path = "/v1/users/login",
    request_body = CredentialsRequest,
    tag = "Users",
    responses(
        (status = 200, description = "Token on success, or a business error", body = Reply<TokenResponse>),
        (status = 400, description = "Malformed request body")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<Reply<TokenResponse>>, ApiError> {
    let Json(request) = payload?;
    let outcome = state
        .service
        .login(&request.login, &request.password)
        .await;
    Ok(Json(outcome.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::test_state;

    fn credentials(login: &str, password: &str) -> Result<Json<CredentialsRequest>, JsonRejection> {
        Ok(Json(CredentialsRequest {
            login: login.into(),
            password: password.into(),
        }))
    }

    #[tokio::test]
    async fn register_then_login() {
        let state = test_state();

        let Json(registered) = register(State(state.clone()), credentials("alice", "pw1"))
            .await
            .unwrap();
        let token = registered.into_result().unwrap().token;
        assert_eq!(state.tokens.verify(&token).unwrap().login, "alice");

        let Json(logged_in) = login(State(state.clone()), credentials("alice", "pw1"))
            .await
            .unwrap();
        assert!(logged_in.into_result().is_ok());
    }

    #[tokio::test]
    async fn business_errors_are_replies() {
        let state = test_state();
        register(State(state.clone()), credentials("alice", "pw1"))
            .await
            .unwrap();

        let Json(duplicate) = register(State(state.clone()), credentials("alice", "pw2"))
            .await
            .unwrap();
        assert_eq!(duplicate, Reply::Error("this user exists".into()));

        let Json(wrong) = login(State(state.clone()), credentials("alice", "pw2"))
            .await
            .unwrap();
        assert_eq!(wrong, Reply::Error("login or password incorrect".into()));

        let Json(unknown) = login(State(state), credentials("bob", "pw1")).await.unwrap();
        assert_eq!(unknown, Reply::Error("user not found".into()));
    }
}
