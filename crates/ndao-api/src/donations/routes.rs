use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};

use super::model::{CryptoPledgeBody, WireDonationBody};
use crate::{
    ApiState,
    auth::AccessToken,
    endaoment::{
        UpstreamResponse,
        models::{CryptoGiven, CryptoPledgeRequest, WirePledgeRequest},
    },
    error::ApiError,
    validation::require,
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route(
            "/wire-donation",
            get(get_wire_instructions).post(wire_donation),
        )
        .route("/get-tokens", get(get_tokens))
        .route("/create-crypto-pledge", post(create_crypto_pledge))
}

/// Domestic wire instructions for donating into a fund
async fn get_wire_instructions(
    token: AccessToken,
    State(state): State<ApiState>,
) -> Result<UpstreamResponse, ApiError> {
    state
        .endaoment
        .get(
            "pledges.wire_details",
            "/v1/donation-pledges/wire/details/domestic",
            Some(token.bearer()),
        )
        .await
}

/// Pledge a wire donation into a fund
async fn wire_donation(
    token: AccessToken,
    State(state): State<ApiState>,
    body: Result<Json<WireDonationBody>, JsonRejection>,
) -> Result<UpstreamResponse, ApiError> {
    let Json(body) = body?;

    let receiving_fund_id = require("fundId", body.fund_id)?;
    let amount = body
        .amount
        .ok_or_else(|| ApiError::Validation("Missing required field: amount".to_string()))?;

    let request = WirePledgeRequest {
        pledged_amount_micro_dollars: amount.to_micro_dollars("amount")?,
        receiving_fund_id,
        idempotency_key: uuid::Uuid::new_v4().to_string(),
    };

    state
        .endaoment
        .post_json(
            "pledges.wire",
            "/v1/donation-pledges/wire",
            token.bearer(),
            &request,
        )
        .await
}

/// Tokens Endaoment accepts for crypto donations. Public, no session needed.
async fn get_tokens(State(state): State<ApiState>) -> Result<UpstreamResponse, ApiError> {
    state.endaoment.get("tokens.list", "/v2/tokens", None).await
}

async fn create_crypto_pledge(
    token: AccessToken,
    State(state): State<ApiState>,
    body: Result<Json<CryptoPledgeBody>, JsonRejection>,
) -> Result<UpstreamResponse, ApiError> {
    let Json(body) = body?;

    let token_id = body
        .token_id
        .ok_or_else(|| ApiError::Validation("Missing required field: tokenId".to_string()))?
        .parse()?;
    let input_amount = body
        .input_amount
        .map(|amount| amount.as_string())
        .filter(|amount| !amount.is_empty())
        .ok_or_else(|| {
            ApiError::Validation("Missing required field: inputAmount".to_string())
        })?;

    let request = CryptoPledgeRequest {
        crypto_given: CryptoGiven {
            token_id,
            input_amount,
        },
        otc_donation_transaction_hash: require(
            "otcDonationTransactionHash",
            body.otc_donation_transaction_hash,
        )?,
        receiving_entity_type: require("receivingEntityType", body.receiving_entity_type)?,
        receiving_entity_id: require("receivingFundId", body.receiving_fund_id)?,
    };

    state
        .endaoment
        .post_json(
            "pledges.crypto",
            "/v1/donation-pledges/crypto",
            token.bearer(),
            &request,
        )
        .await
}
