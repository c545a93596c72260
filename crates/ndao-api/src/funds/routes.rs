use axum::{
    Json, Router,
    extract::{Query, State, rejection::{JsonRejection, QueryRejection}},
    routing::{get, post},
};
use serde_json::Value;
use uuid::Uuid;

use super::model::{CreateDafBody, FundActivityQuery, GrantBody};
use crate::{
    ApiState,
    auth::AccessToken,
    collaborators::service::add_collaborator_to_fund,
    endaoment::{
        UpstreamResponse,
        models::{AsyncGrantRequest, CreateFundRequest, FundAdvisor, FundInput},
    },
    error::ApiError,
    validation::{require, validate_email, validate_path_id},
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/get-dafs", get(get_dafs))
        .route("/create-daf", post(create_daf))
        .route("/grant", post(grant))
        .route("/get-daf-activity", get(get_daf_activity))
}

/// Funds the signed-in user is a member of
async fn get_dafs(
    token: AccessToken,
    State(state): State<ApiState>,
) -> Result<UpstreamResponse, ApiError> {
    state
        .endaoment
        .get("funds.mine", "/v1/funds/mine", Some(token.bearer()))
        .await
}

fn validate_advisor(advisor: Option<FundAdvisor>) -> Result<FundAdvisor, ApiError> {
    let mut advisor = advisor
        .ok_or_else(|| ApiError::Validation("Missing required field: fundAdvisor".to_string()))?;

    advisor.first_name = require("fundAdvisor.firstName", Some(advisor.first_name))?;
    advisor.last_name = require("fundAdvisor.lastName", Some(advisor.last_name))?;
    advisor.email = require("fundAdvisor.email", Some(advisor.email))?;
    validate_email(&advisor.email)?;

    Ok(advisor)
}

/// Create a fund, optionally adding the user's wealth advisor as a collaborator
async fn create_daf(
    token: AccessToken,
    State(state): State<ApiState>,
    body: Result<Json<CreateDafBody>, JsonRejection>,
) -> Result<UpstreamResponse, ApiError> {
    let Json(body) = body?;

    let request = CreateFundRequest {
        fund_input: FundInput {
            name: require("name", body.name)?,
            description: require("description", body.description)?,
            advisor: validate_advisor(body.fund_advisor)?,
        },
    };

    let response = state
        .endaoment
        .post_json("funds.create", "/v1/funds", token.bearer(), &request)
        .await?;

    if !response.is_success() {
        tracing::error!(status = %response.status, body = %response.body, "Failed to create fund");
        return Ok(response);
    }

    tracing::info!(fund_id = ?response.body.get("id"), "Fund created");

    if body.add_my_advisor_to_daf == Some(true) {
        match response.body.get("id").and_then(Value::as_str) {
            Some(fund_id) => {
                // The fund exists regardless of what happens here.
                if let Err(e) = add_collaborator_to_fund(&state, fund_id, token.bearer(), None).await
                {
                    tracing::error!(fund_id, "Failed to add advisor to new fund: {e}");
                }
            }
            None => tracing::warn!("Fund creation response has no id; skipping advisor"),
        }
    }

    Ok(response)
}

/// Recommend a grant from one of the user's funds to an organization
async fn grant(
    token: AccessToken,
    State(state): State<ApiState>,
    body: Result<Json<GrantBody>, JsonRejection>,
) -> Result<UpstreamResponse, ApiError> {
    let Json(body) = body?;

    let amount = body
        .amount
        .ok_or_else(|| ApiError::Validation("Missing required field: amount".to_string()))?;

    let request = AsyncGrantRequest {
        origin_fund_id: require("fundId", body.fund_id)?,
        destination_org_id: require("orgId", body.org_id)?,
        requested_amount: amount.to_micro_dollars("amount")?,
        purpose: require("purpose", body.purpose)?,
        idempotency_key: Uuid::new_v4().to_string(),
    };

    state
        .endaoment
        .post_json(
            "transfers.grant",
            "/v1/transfers/async-grants",
            token.bearer(),
            &request,
        )
        .await
}

async fn get_daf_activity(
    token: AccessToken,
    State(state): State<ApiState>,
    query: Result<Query<FundActivityQuery>, QueryRejection>,
) -> Result<UpstreamResponse, ApiError> {
    let Query(query) = query?;
    let fund_id = require("fundId", query.fund_id)?;
    validate_path_id("fundId", &fund_id)?;

    state
        .endaoment
        .get(
            "activity.fund",
            &format!("/v1/activity/fund/{fund_id}"),
            Some(token.bearer()),
        )
        .await
}
