//! Request bodies sent to the Endaoment API.

use serde::{Deserialize, Serialize};

/// Company name recorded on advisor collaborations.
pub const WEALTH_COMPANY_NAME: &str = "Endaoment Wealth";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorAddress {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub country: String,
}

/// Person listed as the advisor of a new fund.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundAdvisor {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: AdvisorAddress,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundInput {
    pub name: String,
    pub description: String,
    pub advisor: FundAdvisor,
}

/// `POST /v1/funds`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFundRequest {
    pub fund_input: FundInput,
}

/// `POST /v1/transfers/async-grants`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AsyncGrantRequest {
    pub origin_fund_id: String,
    pub destination_org_id: String,
    /// Micro-dollars.
    pub requested_amount: String,
    pub purpose: String,
    pub idempotency_key: String,
}

/// `POST /v1/donation-pledges/wire`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePledgeRequest {
    pub pledged_amount_micro_dollars: String,
    pub receiving_fund_id: String,
    pub idempotency_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoGiven {
    pub token_id: i64,
    pub input_amount: String,
}

/// `POST /v1/donation-pledges/crypto`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoPledgeRequest {
    pub crypto_given: CryptoGiven,
    pub otc_donation_transaction_hash: String,
    pub receiving_entity_type: String,
    pub receiving_entity_id: String,
}

/// `POST /v1/funds/{id}/collaborators/trust`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFundCollaboratorBody {
    pub company_name: String,
    pub user_id: String,
}

impl CreateFundCollaboratorBody {
    pub fn wealth_advisor(user_id: impl Into<String>) -> Self {
        Self {
            company_name: WEALTH_COMPANY_NAME.to_string(),
            user_id: user_id.into(),
        }
    }
}
