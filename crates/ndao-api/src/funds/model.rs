use serde::Deserialize;

use crate::{endaoment::models::FundAdvisor, validation::UsdAmount};

/// Body of `POST /create-daf`
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateDafBody {
    pub name: Option<String>,
    pub description: Option<String>,
    pub fund_advisor: Option<FundAdvisor>,
    /// Also grant the user's wealth advisor access to the new fund.
    pub add_my_advisor_to_daf: Option<bool>,
}

/// Body of `POST /grant`
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GrantBody {
    /// Fund the grant is paid from
    pub fund_id: Option<String>,
    /// Receiving organization
    pub org_id: Option<String>,
    /// USD
    pub amount: Option<UsdAmount>,
    pub purpose: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundActivityQuery {
    pub fund_id: Option<String>,
}
