use super::TokenError;
use super::utils::{as_text, loose_eq, text_eq};
use crate::catalog::{ControlData, CountMode, SetMode};
use crate::json::get_ci;
use armguard_types::VerificationResult;
use serde_json::Value;
use std::collections::BTreeSet;

pub fn decide(data: &ControlData, items: &[Value]) -> Result<VerificationResult, TokenError> {
    match data {
        ControlData::ItemCount { comparator, value } => {
            let count = items.len() as i64;
            Ok(pass_fail(comparator.holds(&count, value)))
        }
        ControlData::ItemProperties { key, value } => {
            let any = items
                .iter()
                .filter_map(|item| get_ci(item, key))
                .any(|v| loose_eq(v, value));
            Ok(pass_fail(any))
        }
        ControlData::VerifiableItemCount {
            mode,
            limit,
            marker,
        } => Ok(verifiable_count(*mode, *limit, marker, items)),
        ControlData::StringMultiToken {
            mode,
            values,
            case_sensitive,
        } => multi_token(*mode, values, *case_sensitive, items),
        _ => Ok(VerificationResult::NotApplicable),
    }
}

fn pass_fail(passed: bool) -> VerificationResult {
    if passed {
        VerificationResult::Passed
    } else {
        VerificationResult::Failed
    }
}

fn verifiable_count(
    mode: CountMode,
    limit: i64,
    marker: &str,
    items: &[Value],
) -> VerificationResult {
    let count = items.len() as i64;
    match mode {
        CountMode::Limit if (0..=limit).contains(&count) => VerificationResult::NeedsReview,
        CountMode::Limit => VerificationResult::Failed,
        CountMode::All => {
            let wildcard = items
                .first()
                .and_then(Value::as_str)
                .is_some_and(|s| s.trim() == marker);
            if count > limit && wildcard {
                VerificationResult::Failed
            } else {
                VerificationResult::NeedsReview
            }
        }
    }
}

fn multi_token(
    mode: SetMode,
    expected: &[String],
    case_sensitive: bool,
    items: &[Value],
) -> Result<VerificationResult, TokenError> {
    let actual = items
        .iter()
        .map(as_text)
        .collect::<Result<Vec<_>, _>>()?;
    let present = |want: &String| actual.iter().any(|a| text_eq(a, want, case_sensitive));

    let passed = match mode {
        SetMode::Contains => expected.iter().all(present),
        SetMode::NotContains => !expected.iter().any(present),
        SetMode::Equals => {
            let norm = |s: &String| {
                if case_sensitive {
                    s.clone()
                } else {
                    s.to_ascii_lowercase()
                }
            };
            let want: BTreeSet<String> = expected.iter().map(norm).collect();
            let have: BTreeSet<String> = actual.iter().map(norm).collect();
            want == have
        }
    };
    Ok(pass_fail(passed))
}
