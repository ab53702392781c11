use crate::expression::ExpressionResolver;
use armguard_types::VerificationResult;
use serde_json::Value;

/// The raw value must be a `[parameters('k')]` reference to a parameter of the secure type.
///
/// Literals and other expressions cannot be judged statically and need review.
pub fn decide(secure_type: &str, raw: &Value, resolver: &ExpressionResolver<'_>) -> VerificationResult {
    let Some(text) = raw.as_str() else {
        return VerificationResult::NeedsReview;
    };
    match resolver.parameter_reference(text) {
        None => VerificationResult::NeedsReview,
        Some(Err(e)) => {
            tracing::debug!(value = %text, error = %e, "parameter reference not resolvable");
            VerificationResult::Failed
        }
        Some(Ok(key)) => match resolver.parameter_type(&key) {
            Some(ty) if ty.eq_ignore_ascii_case(secure_type) => VerificationResult::Passed,
            _ => VerificationResult::Failed,
        },
    }
}
