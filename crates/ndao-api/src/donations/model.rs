use serde::Deserialize;

use crate::{error::ApiError, validation::UsdAmount};

/// Body of `POST /wire-donation`
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WireDonationBody {
    pub fund_id: Option<String>,
    /// USD
    pub amount: Option<UsdAmount>,
}

/// Token id as sent by the frontend: `7` or `"7"`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TokenId {
    Number(i64),
    Text(String),
}

impl TokenId {
    pub fn parse(&self) -> Result<i64, ApiError> {
        let id = match self {
            Self::Number(id) => *id,
            Self::Text(text) => text.trim().parse().map_err(|_| {
                ApiError::Validation(format!("Invalid tokenId: '{text}'. Must be a number"))
            })?,
        };

        if id <= 0 {
            return Err(ApiError::Validation(format!(
                "Invalid tokenId: {id}. Must be positive"
            )));
        }

        Ok(id)
    }
}

/// Crypto amount, forwarded to Endaoment as a string.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum InputAmount {
    Number(serde_json::Number),
    Text(String),
}

impl InputAmount {
    pub fn as_string(&self) -> String {
        match self {
            Self::Number(number) => number.to_string(),
            Self::Text(text) => text.trim().to_string(),
        }
    }
}

/// Body of `POST /create-crypto-pledge`
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CryptoPledgeBody {
    pub token_id: Option<TokenId>,
    pub input_amount: Option<InputAmount>,
    pub otc_donation_transaction_hash: Option<String>,
    pub receiving_fund_id: Option<String>,
    pub receiving_entity_type: Option<String>,
}
