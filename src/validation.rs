use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static ETH_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^0x[a-fA-F0-9]{40}$").expect("static address pattern")
});

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid action: {0}. Must be 'add' or 'remove'")]
    InvalidAction(String),

    #[error("Invalid Ethereum address format: {0}")]
    InvalidEthereumAddress(String),
}

pub fn validate_action(action: &str) -> Result<(), ValidationError> {
    match action {
        "add" | "remove" => Ok(()),
        _ => Err(ValidationError::InvalidAction(action.to_string())),
    }
}

pub fn is_valid_eth_address(address: &str) -> bool {
    ETH_ADDRESS.is_match(address)
}

/// Lowercase form used for storage and membership checks.
pub fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

/// Validates a `0x` + 40 hex address and returns its normalized form.
pub fn validate_eth_address(address: &str) -> Result<String, ValidationError> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingParameter("address".to_string()));
    }

    if !is_valid_eth_address(trimmed) {
        return Err(ValidationError::InvalidEthereumAddress(trimmed.to_string()));
    }

    Ok(normalize_address(trimmed))
}

pub fn validate_address_action(address: &str, action: &str) -> Result<String, ValidationError> {
    if action.trim().is_empty() {
        return Err(ValidationError::MissingParameter("action".to_string()));
    }

    validate_action(action)?;
    validate_eth_address(address)
}
