//! Control rule evaluation: one control against the values found on one resource.
//!
//! `lookup` picks the matched tokens, `evaluate_control` turns them into an outcome:
//! not found, not valid (resolution or coercion failed), or a per-kind decision.

use crate::catalog::{Control, ControlData, CountMode, SetMode};
use crate::expression::{ExpressionResolver, ResolveError};
use crate::json::{Match, plain_string};
use armguard_types::VerificationResult;
use serde_json::Value;
use thiserror::Error;

mod boolean;
mod items;
mod numeric;
mod secure_param;
mod strings;
mod utils;
mod verifiable;


/// Why a matched token could not be judged.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("expected {expected}, found {found}")]
    Coercion { expected: &'static str, found: String },
}

impl TokenError {
    fn coercion(expected: &'static str, found: &Value) -> Self {
        TokenError::Coercion {
            expected,
            found: plain_string(found),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleOutcome {
    pub result: VerificationResult,
    pub expected_value: String,
    pub is_token_not_found: bool,
    pub is_token_not_valid: bool,
    pub message: Option<String>,
}

impl RuleOutcome {
    fn decided(result: VerificationResult, expected_value: String) -> Self {
        Self {
            result,
            expected_value,
            is_token_not_found: false,
            is_token_not_valid: false,
            message: None,
        }
    }
}

/// Values for the first selector that matches anything on `resource`.
pub fn lookup<'r>(control: &Control, resource: &'r Value, pointer: &str) -> Vec<Match<'r>> {
    control
        .selectors
        .iter()
        .map(|s| s.select(resource, pointer))
        .find(|found| !found.is_empty())
        .unwrap_or_default()
}

pub fn evaluate_control(
    control: &Control,
    found: &[Match<'_>],
    resolver: &ExpressionResolver<'_>,
) -> RuleOutcome {
    let data = &control.data;
    let expected = expected_value(data);

    if let ControlData::Unsupported { kind } = data {
        let mut outcome = RuleOutcome::decided(VerificationResult::NotApplicable, expected);
        outcome.message = Some(format!("match kind '{kind}' is not evaluated"));
        return outcome;
    }

    if found.is_empty() {
        let mut outcome = RuleOutcome::decided(not_found_result(data), expected);
        outcome.is_token_not_found = true;
        return outcome;
    }

    match decide(data, found, resolver) {
        Ok(result) => RuleOutcome::decided(result, expected),
        Err(e) => {
            tracing::debug!(control = %control.id, error = %e, "token not valid");
            RuleOutcome {
                result: VerificationResult::Failed,
                expected_value: expected,
                is_token_not_found: false,
                is_token_not_valid: true,
                message: Some(e.to_string()),
            }
        }
    }
}

fn not_found_result(data: &ControlData) -> VerificationResult {
    match data {
        ControlData::NullableSingleToken => VerificationResult::Passed,
        ControlData::VerifiableSingleToken(v) | ControlData::VerifiableBooleanSingleToken(v) => {
            v.if_not_found.unwrap_or(VerificationResult::NotApplicable)
        }
        _ => VerificationResult::NotApplicable,
    }
}

fn decide(
    data: &ControlData,
    found: &[Match<'_>],
    resolver: &ExpressionResolver<'_>,
) -> Result<VerificationResult, TokenError> {
    if data.is_collection() {
        let items = utils::resolve_items(found, resolver)?;
        return items::decide(data, &items);
    }

    let raw = found[0].value;
    match data {
        ControlData::SecureParam { secure_type } => {
            Ok(secure_param::decide(secure_type, raw, resolver))
        }
        ControlData::NullableSingleToken => Ok(VerificationResult::NeedsReview),
        _ => {
            let actual = utils::resolve(raw, resolver)?;
            match data {
                ControlData::Boolean { value } => boolean::decide(*value, &actual),
                ControlData::IntegerValue { comparator, value } => {
                    numeric::integer(*comparator, *value, &actual)
                }
                ControlData::VersionSingleToken { comparator, value } => {
                    numeric::version(*comparator, value, &actual)
                }
                ControlData::StringWhitespace { blank } => strings::whitespace(*blank, &actual),
                ControlData::StringSingleToken(d) => strings::single_token(d, &actual),
                ControlData::MatchStringSingleToken(d) => strings::match_single_token(d, &actual),
                ControlData::RegExpressionSingleToken { allow, pattern } => {
                    strings::regex(*allow, pattern, &actual)
                }
                ControlData::VerifiableSingleToken(d) => verifiable::single_token(d, &actual),
                ControlData::VerifiableBooleanSingleToken(d) => verifiable::boolean(d, &actual),
                _ => Ok(VerificationResult::NotApplicable),
            }
        }
    }
}

/// Human-readable description of what the control expects.
pub fn expected_value(data: &ControlData) -> String {
    match data {
        ControlData::Boolean { value } => format!("'{value}'"),
        ControlData::IntegerValue { comparator, value } => {
            format!("{} {value}", comparator.as_str())
        }
        ControlData::ItemCount { comparator, value } => {
            format!("Count {} {value}", comparator.as_str())
        }
        ControlData::ItemProperties { key, value } => {
            format!("Item with '{key}' = '{}'", plain_string(value))
        }
        ControlData::SecureParam { secure_type } => format!("Parameter of type '{secure_type}'"),
        ControlData::StringWhitespace { blank: true } => "Null string".to_string(),
        ControlData::StringWhitespace { blank: false } => "Non-null string".to_string(),
        ControlData::StringSingleToken(d) | ControlData::MatchStringSingleToken(d) => {
            format!("{} '{}'", d.mode.as_str(), d.value)
        }
        ControlData::RegExpressionSingleToken { allow, pattern } => {
            let mode = if *allow { "Allow" } else { "NotAllow" };
            format!("{mode} pattern '{}'", pattern.as_str())
        }
        ControlData::VerifiableSingleToken(_) | ControlData::VerifiableBooleanSingleToken(_) => {
            "Verify current value".to_string()
        }
        ControlData::NullableSingleToken => "Property not set".to_string(),
        ControlData::VersionSingleToken { comparator, value } => {
            format!("{} {value}", comparator.as_str())
        }
        ControlData::VerifiableItemCount { mode, limit, .. } => match mode {
            CountMode::Limit => format!("Verify count up to {limit}"),
            CountMode::All => format!("Verify count above {limit} is not a wildcard"),
        },
        ControlData::StringMultiToken { mode, values, .. } => {
            let mode = match mode {
                SetMode::Contains => "Contains",
                SetMode::NotContains => "NotContains",
                SetMode::Equals => "Equals",
            };
            let quoted: Vec<String> = values.iter().map(|v| format!("'{v}'")).collect();
            format!("{mode} [{}]", quoted.join(", "))
        }
        ControlData::Unsupported { .. } => "Not evaluated".to_string(),
    }
}
