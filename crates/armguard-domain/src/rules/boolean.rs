use super::TokenError;
use super::utils::as_bool;
use armguard_types::VerificationResult;
use serde_json::Value;

pub fn decide(expected: bool, actual: &Value) -> Result<VerificationResult, TokenError> {
    Ok(if as_bool(actual)? == expected {
        VerificationResult::Passed
    } else {
        VerificationResult::Failed
    })
}
