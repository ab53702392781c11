use super::TokenError;
use super::utils::{as_text, text_eq};
use crate::catalog::{StringMode, StringTokenData};
use armguard_types::VerificationResult;
use regex::Regex;
use serde_json::Value;

pub fn whitespace(blank: bool, actual: &Value) -> Result<VerificationResult, TokenError> {
    let is_blank = as_text(actual)?.trim().is_empty();
    Ok(if is_blank == blank {
        VerificationResult::Passed
    } else {
        VerificationResult::Failed
    })
}

pub fn single_token(
    data: &StringTokenData,
    actual: &Value,
) -> Result<VerificationResult, TokenError> {
    let equal = text_eq(&as_text(actual)?, &data.value, data.case_sensitive);
    Ok(match (data.mode, equal) {
        (StringMode::Allow, true) | (StringMode::NotAllow, false) => VerificationResult::Passed,
        (StringMode::Allow, false) | (StringMode::NotAllow, true) => VerificationResult::Failed,
        (StringMode::StringMatched, true) => VerificationResult::Passed,
        (StringMode::StringMatched, false) => VerificationResult::NeedsReview,
    })
}

/// An equal value is never a pass here: it needs a reviewer's eye.
pub fn match_single_token(
    data: &StringTokenData,
    actual: &Value,
) -> Result<VerificationResult, TokenError> {
    let equal = text_eq(&as_text(actual)?, &data.value, data.case_sensitive);
    Ok(match (data.mode, equal) {
        (_, true) => VerificationResult::NeedsReview,
        (StringMode::NotAllow, false) => VerificationResult::Passed,
        (StringMode::Allow | StringMode::StringMatched, false) => VerificationResult::Failed,
    })
}

pub fn regex(allow: bool, pattern: &Regex, actual: &Value) -> Result<VerificationResult, TokenError> {
    let matched = pattern.is_match(&as_text(actual)?);
    Ok(if matched == allow {
        VerificationResult::Passed
    } else {
        VerificationResult::Failed
    })
}
