use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::{PathRejection, QueryRejection}},
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use serde::Deserialize;
use serde_json::json;

use super::service;
use crate::{
    ApiState,
    auth::AccessToken,
    endaoment::UpstreamResponse,
    error::ApiError,
    validation::{require, validate_path_id},
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/get-fund-collaborators", get(get_fund_collaborators))
        .route(
            "/remove-collaborator/{fund_id}/{user_id}",
            delete(remove_collaborator),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FundQuery {
    fund_id: Option<String>,
}

async fn get_fund_collaborators(
    token: AccessToken,
    State(state): State<ApiState>,
    query: Result<Query<FundQuery>, QueryRejection>,
) -> Result<UpstreamResponse, ApiError> {
    let Query(query) = query?;
    let fund_id = require("fundId", query.fund_id)?;
    validate_path_id("fundId", &fund_id)?;

    state
        .endaoment
        .get(
            "collaborators.list",
            &format!("/v1/funds/{fund_id}/collaborators"),
            Some(token.bearer()),
        )
        .await
}

async fn remove_collaborator(
    token: AccessToken,
    State(state): State<ApiState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path((fund_id, user_id)) = path?;
    validate_path_id("userId", &user_id)?;

    let response =
        service::remove_collaborator_from_fund(&state, &fund_id, token.bearer(), Some(&user_id))
            .await?;

    if !response.is_success() {
        return Ok(response.into_response());
    }

    Ok(Json(json!({
        "status": response.status.as_u16(),
        "statusText": response.status.canonical_reason().unwrap_or_default(),
    }))
    .into_response())
}
