//! Fund collaborator management on behalf of the signed-in user.

use crate::{
    ApiState,
    endaoment::{UpstreamResponse, models::CreateFundCollaboratorBody},
    error::ApiError,
    validation::validate_path_id,
};

/// Endaoment user id of the wealth advisor responsible for `fund_id`.
///
/// Stand-in for the platform's own advisor directory: every fund maps to the
/// advisor configured through `ENDAOMENT_WEALTH_ADVISOR_ID`.
pub fn wealth_advisor_for_fund<'a>(state: &'a ApiState, fund_id: &str) -> Option<&'a str> {
    tracing::debug!(fund_id, "Looking up wealth advisor");
    state.wealth_advisor_id.as_deref()
}

/// Grant the fund's wealth advisor (or `advisor_override`) collaborator access.
///
/// Upstream rejections are logged and returned, not raised.
pub async fn add_collaborator_to_fund(
    state: &ApiState,
    fund_id: &str,
    bearer: &str,
    advisor_override: Option<&str>,
) -> Result<UpstreamResponse, ApiError> {
    validate_path_id("fundId", fund_id)?;

    let user_id = advisor_override
        .or_else(|| wealth_advisor_for_fund(state, fund_id))
        .ok_or_else(|| {
            ApiError::Collaborator("No Endaoment ID found for wealth advisor".to_string())
        })?;

    let api_key = state.api_key.as_deref().ok_or_else(|| {
        ApiError::Collaborator(
            "ENDAOMENT_API_KEY is not set; collaborator management requires the API key issued by Endaoment"
                .to_string(),
        )
    })?;

    let request = state
        .endaoment
        .request(
            reqwest::Method::POST,
            &format!("/v1/funds/{fund_id}/collaborators/trust"),
            Some(bearer),
        )
        .header("x-api-key", api_key)
        .json(&CreateFundCollaboratorBody::wealth_advisor(user_id));

    let response = state.endaoment.send("collaborators.add", request).await?;

    if response.is_success() {
        tracing::info!(fund_id, user_id, "Collaborator added to fund");
    } else {
        tracing::error!(
            fund_id,
            user_id,
            status = %response.status,
            body = %response.body,
            "Failed to add collaborator to fund"
        );
    }

    Ok(response)
}

/// Revoke `user_id`'s access to `fund_id`, defaulting to the fund's wealth advisor.
pub async fn remove_collaborator_from_fund(
    state: &ApiState,
    fund_id: &str,
    bearer: &str,
    user_id: Option<&str>,
) -> Result<UpstreamResponse, ApiError> {
    validate_path_id("fundId", fund_id)?;

    let user_id = user_id
        .or_else(|| wealth_advisor_for_fund(state, fund_id))
        .ok_or_else(|| {
            ApiError::Collaborator(
                "No Endaoment ID found for wealth advisor to remove".to_string(),
            )
        })?;
    validate_path_id("userId", user_id)?;

    let response = state
        .endaoment
        .delete(
            "collaborators.remove",
            &format!("/v1/funds/{fund_id}/collaborators/{user_id}"),
            bearer,
        )
        .await?;

    if response.is_success() {
        tracing::info!(fund_id, user_id, "Collaborator removed from fund");
    } else {
        tracing::error!(
            fund_id,
            user_id,
            status = %response.status,
            "Failed to remove collaborator from fund"
        );
    }

    Ok(response)
}
