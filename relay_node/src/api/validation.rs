//! Request validation for relay endpoints

use ethers::types::Address;

use super::errors::ApiError;

/// Validate an EVM address path parameter and parse it
pub fn validate_address(address: &str) -> Result<Address, ApiError> {
    if address.is_empty() {
        return Err(ApiError::invalid_address(address, "Address cannot be empty"));
    }

    if !address.starts_with("0x") {
        return Err(ApiError::invalid_address(address, "Address must start with '0x'"));
    }

    if address.len() != 42 {
        return Err(ApiError::invalid_address(
            address,
            "Address must be 42 characters long (including '0x')",
        ));
    }

    if !address[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ApiError::invalid_address(
            address,
            "Address contains invalid hex characters",
        ));
    }

    address
        .parse::<Address>()
        .map_err(|e| ApiError::invalid_address(address, &e.to_string()))
}
