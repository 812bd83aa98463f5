// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Storage service: owner-scoped record operations. Gated.

use axum::{
    body::Body,
    extract::{Path, State},
    Json,
};

use crate::{
    api::ndjson,
    auth::Caller,
    models::{DeleteResponse, RecordContent, Reply, WriteResponse},
    pipeline::WriteChunk,
    state::AppState,
    storage::{RecordId, RecordSummary},
};

#[utoipa::path(
    get,
    path = "/v1/records",
    tag = "Records",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Summaries of the caller's records", body = Reply<Vec<RecordSummary>>),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn list_records(
    Caller(identity): Caller,
    State(state): State<AppState>,
) -> Json<Reply<Vec<RecordSummary>>> {
    Json(state.service.read_all_records(identity.as_ref()).into())
}

#[utoipa::path(
    get,
    path = "/v1/records/{id}",
    params(("id" = u64, Path, description = "Record identifier")),
    tag = "Records",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Decrypted record, or a business error", body = Reply<RecordContent>),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn read_record(
    Caller(identity): Caller,
    Path(id): Path<RecordId>,
    State(state): State<AppState>,
) -> Json<Reply<RecordContent>> {
    Json(state.service.read_record(identity.as_ref(), id).into())
}

/// Streaming upload. The body is NDJSON, one [`WriteChunk`] per line; the
/// record is stored only after the whole body has been received.
#[utoipa::path(
    post,
    path = "/v1/records",
    request_body(content = WriteChunk, content_type = "application/x-ndjson", description = "One JSON frame per line"),
    tag = "Records",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Id of the new record, or a business error", body = Reply<WriteResponse>),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn write_record(
    Caller(identity): Caller,
    State(state): State<AppState>,
    body: Body,
) -> Json<Reply<WriteResponse>> {
    let outcome = state
        .service
        .write_record(identity.as_ref(), ndjson::frames(body))
        .await;
    Json(outcome.into())
}

#[utoipa::path(
    delete,
    path = "/v1/records/{id}",
    params(("id" = u64, Path, description = "Record identifier")),
    tag = "Records",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Rows removed, or a business error", body = Reply<DeleteResponse>),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn delete_record(
    Caller(identity): Caller,
    Path(id): Path<RecordId>,
    State(state): State<AppState>,
) -> Json<Reply<DeleteResponse>> {
    Json(state.service.delete_record(identity.as_ref(), id).into())
}
