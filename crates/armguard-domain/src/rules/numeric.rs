use super::TokenError;
use super::utils::{as_i64, as_version};
use crate::catalog::Comparator;
use crate::version::DottedVersion;
use armguard_types::VerificationResult;
use serde_json::Value;

fn verdict(holds: bool) -> VerificationResult {
    if holds {
        VerificationResult::Passed
    } else {
        VerificationResult::Failed
    }
}

pub fn integer(
    comparator: Comparator,
    expected: i64,
    actual: &Value,
) -> Result<VerificationResult, TokenError> {
    Ok(verdict(comparator.holds(&as_i64(actual)?, &expected)))
}

pub fn version(
    comparator: Comparator,
    expected: &DottedVersion,
    actual: &Value,
) -> Result<VerificationResult, TokenError> {
    Ok(verdict(comparator.holds(&as_version(actual)?, expected)))
}
