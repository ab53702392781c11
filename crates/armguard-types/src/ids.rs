//! Stable identifiers for match kinds and synthetic results.
//!
//! Match kind names are the exact strings accepted in the control catalog's `matchType` field.

// Evaluated match kinds
pub const KIND_BOOLEAN: &str = "Boolean";
pub const KIND_INTEGER_VALUE: &str = "IntegerValue";
pub const KIND_ITEM_COUNT: &str = "ItemCount";
pub const KIND_ITEM_PROPERTIES: &str = "ItemProperties";
pub const KIND_SECURE_PARAM: &str = "SecureParam";
pub const KIND_STRING_WHITESPACE: &str = "StringWhitespace";
pub const KIND_STRING_SINGLE_TOKEN: &str = "StringSingleToken";
pub const KIND_MATCH_STRING_SINGLE_TOKEN: &str = "MatchStringSingleToken";
pub const KIND_REGEX_SINGLE_TOKEN: &str = "RegExpressionSingleToken";
pub const KIND_VERIFIABLE_SINGLE_TOKEN: &str = "VerifiableSingleToken";
pub const KIND_VERIFIABLE_BOOLEAN_SINGLE_TOKEN: &str = "VerifiableBooleanSingleToken";
pub const KIND_NULLABLE_SINGLE_TOKEN: &str = "NullableSingleToken";
pub const KIND_VERSION_SINGLE_TOKEN: &str = "VersionSingleToken";
pub const KIND_VERIFIABLE_ITEM_COUNT: &str = "VerifiableItemCount";
pub const KIND_STRING_MULTI_TOKEN: &str = "StringMultiToken";

// Recognized but never evaluated (always NotApplicable)
pub const KIND_NULL: &str = "Null";
pub const KIND_STRING_LENGTH: &str = "StringLength";
pub const KIND_REGEX_MULTI_TOKEN: &str = "RegExpressionMultiToken";
pub const KIND_VERIFIABLE_MULTI_TOKEN: &str = "VerifiableMultiToken";
pub const KIND_CUSTOM: &str = "Custom";

// Synthetic results
pub const CONTROL_NOT_SUPPORTED: &str = "NotSupported";

/// Parameter type that satisfies `SecureParam` when the payload does not name one.
pub const SECURE_STRING_TYPE: &str = "securestring";
