//! Explain registry for match kinds.
//!
//! Maps a catalog `matchType` name to a description of its decision rule and an example payload.

use crate::ids;

/// Explanation entry for a match kind.
#[derive(Debug, Clone)]
pub struct Explanation {
    /// Canonical match kind name as written in the catalog.
    pub kind: &'static str,
    /// Short description of the match kind.
    pub title: &'static str,
    /// How the resolved property value is turned into an outcome.
    pub decision: &'static str,
    /// Example `data` payload for a control using this kind.
    pub example: &'static str,
}

/// Look up an explanation by match kind name (case-insensitive).
///
/// Returns `None` if the identifier is not recognized.
pub fn lookup_explanation(identifier: &str) -> Option<Explanation> {
    let kind = all_match_kinds()
        .iter()
        .find(|k| k.eq_ignore_ascii_case(identifier))?;

    let (title, decision, example) = match *kind {
        ids::KIND_BOOLEAN => (
            "Boolean",
            "Passed when the property equals the expected boolean, otherwise Failed.",
            r#"{ "value": true }"#,
        ),
        ids::KIND_INTEGER_VALUE => (
            "Integer comparison",
            "Passed when the property compares to the expected integer with the configured \
comparator (GreaterThan, LesserThan, Equals), otherwise Failed.",
            r#"{ "type": "GreaterThan", "value": 10 }"#,
        ),
        ids::KIND_ITEM_COUNT => (
            "Item count",
            "Passed when the number of matched items compares to the expected integer with the \
configured comparator, otherwise Failed.",
            r#"{ "type": "LesserThan", "value": 3 }"#,
        ),
        ids::KIND_ITEM_PROPERTIES => (
            "Item properties",
            "Passed when any matched object carries the expected key with the expected value.",
            r#"{ "key": "name", "value": "AllowAzureServices" }"#,
        ),
        ids::KIND_SECURE_PARAM => (
            "Secure parameter",
            "Passed when the property is a parameters('name') reference whose declared type is a \
secure string. A literal value (not a parameter reference) needs manual review.",
            r#"{ "value": "securestring" }"#,
        ),
        ids::KIND_STRING_WHITESPACE => (
            "Blank string",
            "Passed when \"the value is blank\" equals the expected boolean.",
            r#"{ "value": false }"#,
        ),
        ids::KIND_STRING_SINGLE_TOKEN => (
            "Single string",
            "Allow: Passed when equal. NotAllow: Passed when not equal. StringMatched: Passed when \
equal, NeedsReview otherwise. Case sensitivity is configurable.",
            r#"{ "type": "Allow", "value": "TLS1_2", "isCaseSensitive": false }"#,
        ),
        ids::KIND_MATCH_STRING_SINGLE_TOKEN => (
            "Single string requiring review on match",
            "Allow: NeedsReview when equal, Failed otherwise. NotAllow: NeedsReview when equal, \
Passed otherwise.",
            r#"{ "type": "Allow", "value": "Enabled" }"#,
        ),
        ids::KIND_REGEX_SINGLE_TOKEN => (
            "Regular expression",
            "Allow: Passed when the pattern matches. NotAllow: Passed when it does not. The other \
branch is Failed.",
            r#"{ "type": "NotAllow", "pattern": "^0\\.0\\.0\\.0$" }"#,
        ),
        ids::KIND_VERIFIABLE_SINGLE_TOKEN => (
            "Verifiable value",
            "NeedsReview whenever the property is present, unless it equals the configured desired \
value, in which case the desired-state outcome applies. A missing property uses the configured \
not-found policy.",
            r#"{ "value": "Enabled", "ifDesiredState": "Passed", "ifNoPropertyFound": "VerifyIfPropertyNotFound" }"#,
        ),
        ids::KIND_VERIFIABLE_BOOLEAN_SINGLE_TOKEN => (
            "Verifiable boolean",
            "Like the verifiable value, but the property must be a boolean and is compared to the \
desired boolean.",
            r#"{ "value": true, "ifDesiredState": "Passed", "ifNoPropertyFound": "FailIfPropertyNotFound" }"#,
        ),
        ids::KIND_NULLABLE_SINGLE_TOKEN => (
            "Absent property",
            "Passed when the property is absent, NeedsReview when present.",
            "{}",
        ),
        ids::KIND_VERSION_SINGLE_TOKEN => (
            "Version comparison",
            "Both sides are parsed as dotted version numbers and compared with the configured \
comparator (GreaterThan, LesserThan, Equals, GreaterThanOrEqual, LesserThanOrEqual).",
            r#"{ "type": "GreaterThanOrEqual", "value": "1.2" }"#,
        ),
        ids::KIND_VERIFIABLE_ITEM_COUNT => (
            "Verifiable item count",
            "Limit: NeedsReview when the item count is within [0, limit], Failed otherwise. All: \
Failed when the count exceeds the limit and the first item is the wildcard marker, NeedsReview \
otherwise.",
            r#"{ "type": "All", "value": 0, "marker": "*" }"#,
        ),
        ids::KIND_STRING_MULTI_TOKEN => (
            "String set",
            "Contains: Passed when every expected literal is present. NotContains: Passed when none \
is present. Equals: Passed when both sides hold the same strings in any order.",
            r#"{ "type": "Equals", "value": ["a", "b"], "isCaseSensitive": true }"#,
        ),
        _ => (
            "Not evaluated",
            "Recognized for catalog compatibility; always NotApplicable.",
            "{}",
        ),
    };

    Some(Explanation {
        kind,
        title,
        decision,
        example,
    })
}

/// List all known match kinds.
pub fn all_match_kinds() -> &'static [&'static str] {
    &[
        ids::KIND_BOOLEAN,
        ids::KIND_INTEGER_VALUE,
        ids::KIND_ITEM_COUNT,
        ids::KIND_ITEM_PROPERTIES,
        ids::KIND_SECURE_PARAM,
        ids::KIND_STRING_WHITESPACE,
        ids::KIND_STRING_SINGLE_TOKEN,
        ids::KIND_MATCH_STRING_SINGLE_TOKEN,
        ids::KIND_REGEX_SINGLE_TOKEN,
        ids::KIND_VERIFIABLE_SINGLE_TOKEN,
        ids::KIND_VERIFIABLE_BOOLEAN_SINGLE_TOKEN,
        ids::KIND_NULLABLE_SINGLE_TOKEN,
        ids::KIND_VERSION_SINGLE_TOKEN,
        ids::KIND_VERIFIABLE_ITEM_COUNT,
        ids::KIND_STRING_MULTI_TOKEN,
        ids::KIND_NULL,
        ids::KIND_STRING_LENGTH,
        ids::KIND_REGEX_MULTI_TOKEN,
        ids::KIND_VERIFIABLE_MULTI_TOKEN,
        ids::KIND_CUSTOM,
    ]
}
