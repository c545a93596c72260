use serde::Deserialize;
use validator::ValidateEmail;

use crate::error::ApiError;

/// Longest identifier accepted in an upstream URL path segment.
const MAX_PATH_ID_LEN: usize = 128;

/// Decimal places a USD amount may carry (one micro-dollar).
const MICRO_DOLLAR_DIGITS: usize = 6;

/// USD amount as sent by the frontend, either `"12.50"` or `12.5`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UsdAmount {
    Number(serde_json::Number),
    Text(String),
}

impl UsdAmount {
    /// Convert to an integer number of micro-dollars, as a decimal string.
    pub fn to_micro_dollars(&self, field: &str) -> Result<String, ApiError> {
        match self {
            Self::Number(number) => usd_to_micro_dollars(field, &number.to_string()),
            Self::Text(text) => usd_to_micro_dollars(field, text),
        }
    }
}

/// Trimmed value of a required field, rejecting absent or blank input.
pub fn require(field: &str, value: Option<String>) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Validation(format!("Missing required field: {field}")))
}

/// Validate email format using the validator crate
pub fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.is_empty() {
        return Err(ApiError::Validation("Email cannot be empty".to_string()));
    }

    if !email.validate_email() {
        return Err(ApiError::Validation("Invalid email format".to_string()));
    }

    Ok(())
}

/// Identifiers interpolated into upstream URL paths.
///
/// # Examples
/// ```
/// use ndao_api::validation::validate_path_id;
///
/// assert!(validate_path_id("fundId", "3f1c6a2e-9b1d-4c1e-8a55-0d2f7c9e4b11").is_ok());
/// assert!(validate_path_id("fundId", "../admin").is_err());
/// ```
pub fn validate_path_id(field: &str, value: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::Validation(format!(
            "Missing required field: {field}"
        )));
    }

    if value.len() > MAX_PATH_ID_LEN
        || !value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(ApiError::Validation(format!("Invalid {field}: '{value}'")));
    }

    Ok(())
}

/// Convert a positive USD decimal (`"100"`, `"12.5"`, `"0.000001"`) to micro-dollars.
///
/// # Examples
/// ```
/// use ndao_api::validation::usd_to_micro_dollars;
///
/// assert_eq!(usd_to_micro_dollars("amount", "12.5").unwrap(), "12500000");
/// assert!(usd_to_micro_dollars("amount", "-1").is_err());
/// ```
pub fn usd_to_micro_dollars(field: &str, amount: &str) -> Result<String, ApiError> {
    let invalid = || {
        ApiError::Validation(format!(
            "Invalid {field}: '{amount}'. Must be a positive USD amount with at most {MICRO_DOLLAR_DIGITS} decimal places"
        ))
    };

    let amount = amount.trim();
    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b.is_ascii_digit())
        || fraction.len() > MICRO_DOLLAR_DIGITS
    {
        return Err(invalid());
    }

    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let fraction: u64 = format!("{fraction:0<width$}", width = MICRO_DOLLAR_DIGITS)
        .parse()
        .map_err(|_| invalid())?;

    let micro = whole
        .checked_mul(1_000_000)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(invalid)?;

    if micro == 0 {
        return Err(ApiError::Validation(format!(
            "Invalid {field}: amount must be greater than zero"
        )));
    }

    Ok(micro.to_string())
}
