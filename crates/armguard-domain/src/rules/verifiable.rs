use super::TokenError;
use super::utils::{as_bool, loose_eq};
use crate::catalog::VerifiableData;
use armguard_types::VerificationResult;
use serde_json::Value;

/// A value matching the desired state takes the configured outcome; anything else needs review.
pub fn single_token(data: &VerifiableData, actual: &Value) -> Result<VerificationResult, TokenError> {
    Ok(match &data.desired {
        Some(desired) if loose_eq(actual, desired) => data.if_desired_state,
        _ => VerificationResult::NeedsReview,
    })
}

pub fn boolean(data: &VerifiableData, actual: &Value) -> Result<VerificationResult, TokenError> {
    let actual = as_bool(actual)?;
    let desired = data.desired.as_ref().map(as_bool).transpose()?;
    Ok(match desired {
        Some(d) if d == actual => data.if_desired_state,
        _ => VerificationResult::NeedsReview,
    })
}
