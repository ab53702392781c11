//! Typed control catalog.
//!
//! The catalog is built once (see `armguard-settings`) and is read-only afterwards, so one
//! instance can be shared by concurrent evaluations of different templates.

use crate::error::CatalogError;
use crate::json::PropertySelector;
use crate::version::DottedVersion;
use armguard_types::{ids, ControlSeverity, VerificationResult};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparator {
    GreaterThan,
    LesserThan,
    Equals,
    GreaterThanOrEqual,
    LesserThanOrEqual,
}

impl Comparator {
    pub fn holds<T: PartialOrd>(self, actual: &T, expected: &T) -> bool {
        match self {
            Comparator::GreaterThan => actual > expected,
            Comparator::LesserThan => actual < expected,
            Comparator::Equals => actual == expected,
            Comparator::GreaterThanOrEqual => actual >= expected,
            Comparator::LesserThanOrEqual => actual <= expected,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Comparator::GreaterThan => "GreaterThan",
            Comparator::LesserThan => "LesserThan",
            Comparator::Equals => "Equals",
            Comparator::GreaterThanOrEqual => "GreaterThanOrEqual",
            Comparator::LesserThanOrEqual => "LesserThanOrEqual",
        }
    }
}

/// How a single string is judged against the expected literal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StringMode {
    Allow,
    NotAllow,
    /// Equal passes; a mismatch needs review instead of failing.
    StringMatched,
}

impl StringMode {
    pub fn as_str(self) -> &'static str {
        match self {
            StringMode::Allow => "Allow",
            StringMode::NotAllow => "NotAllow",
            StringMode::StringMatched => "StringMatched",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetMode {
    Contains,
    NotContains,
    Equals,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountMode {
    Limit,
    All,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringTokenData {
    pub mode: StringMode,
    pub value: String,
    pub case_sensitive: bool,
}

/// Shared payload of the verifiable kinds.
#[derive(Clone, Debug, PartialEq)]
pub struct VerifiableData {
    /// When the property equals this value, `if_desired_state` applies instead of NeedsReview.
    pub desired: Option<Value>,
    pub if_desired_state: VerificationResult,
    /// Outcome for a missing property; `None` keeps the default NotApplicable.
    pub if_not_found: Option<VerificationResult>,
}

/// Expected-value payload, one variant per match kind.
#[derive(Clone, Debug)]
pub enum ControlData {
    Boolean {
        value: bool,
    },
    IntegerValue {
        comparator: Comparator,
        value: i64,
    },
    ItemCount {
        comparator: Comparator,
        value: i64,
    },
    ItemProperties {
        key: String,
        value: Value,
    },
    SecureParam {
        secure_type: String,
    },
    StringWhitespace {
        blank: bool,
    },
    StringSingleToken(StringTokenData),
    MatchStringSingleToken(StringTokenData),
    RegExpressionSingleToken {
        allow: bool,
        pattern: Regex,
    },
    VerifiableSingleToken(VerifiableData),
    VerifiableBooleanSingleToken(VerifiableData),
    NullableSingleToken,
    VersionSingleToken {
        comparator: Comparator,
        value: DottedVersion,
    },
    VerifiableItemCount {
        mode: CountMode,
        limit: i64,
        marker: String,
    },
    StringMultiToken {
        mode: SetMode,
        values: Vec<String>,
        case_sensitive: bool,
    },
    /// A recognized kind that is never evaluated.
    Unsupported {
        kind: &'static str,
    },
}

impl ControlData {
    pub fn kind(&self) -> &'static str {
        match self {
            ControlData::Boolean { .. } => ids::KIND_BOOLEAN,
            ControlData::IntegerValue { .. } => ids::KIND_INTEGER_VALUE,
            ControlData::ItemCount { .. } => ids::KIND_ITEM_COUNT,
            ControlData::ItemProperties { .. } => ids::KIND_ITEM_PROPERTIES,
            ControlData::SecureParam { .. } => ids::KIND_SECURE_PARAM,
            ControlData::StringWhitespace { .. } => ids::KIND_STRING_WHITESPACE,
            ControlData::StringSingleToken(_) => ids::KIND_STRING_SINGLE_TOKEN,
            ControlData::MatchStringSingleToken(_) => ids::KIND_MATCH_STRING_SINGLE_TOKEN,
            ControlData::RegExpressionSingleToken { .. } => ids::KIND_REGEX_SINGLE_TOKEN,
            ControlData::VerifiableSingleToken(_) => ids::KIND_VERIFIABLE_SINGLE_TOKEN,
            ControlData::VerifiableBooleanSingleToken(_) => {
                ids::KIND_VERIFIABLE_BOOLEAN_SINGLE_TOKEN
            }
            ControlData::NullableSingleToken => ids::KIND_NULLABLE_SINGLE_TOKEN,
            ControlData::VersionSingleToken { .. } => ids::KIND_VERSION_SINGLE_TOKEN,
            ControlData::VerifiableItemCount { .. } => ids::KIND_VERIFIABLE_ITEM_COUNT,
            ControlData::StringMultiToken { .. } => ids::KIND_STRING_MULTI_TOKEN,
            ControlData::Unsupported { kind } => kind,
        }
    }

    /// Kinds that inspect every matched value rather than the first one.
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            ControlData::ItemCount { .. }
                | ControlData::ItemProperties { .. }
                | ControlData::VerifiableItemCount { .. }
                | ControlData::StringMultiToken { .. }
        )
    }
}

#[derive(Clone, Debug)]
pub struct Control {
    pub id: String,
    pub control_id: String,
    pub description: String,
    pub rationale: String,
    pub recommendation: String,
    pub severity: ControlSeverity,
    pub enabled: bool,
    /// Tried in order; the first selector that matches wins.
    pub selectors: Vec<PropertySelector>,
    pub data: ControlData,
}

impl Control {
    pub fn expected_property(&self) -> String {
        self.selectors
            .iter()
            .map(PropertySelector::as_str)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Controls for one feature: a named group of resource types evaluated as a unit.
#[derive(Clone, Debug)]
pub struct FeatureControlSet {
    pub feature_name: String,
    /// Resource-type prefixes, matched case-insensitively.
    pub supported_resources: Vec<String>,
    pub controls: Vec<Control>,
    /// Control sets for child resources declared inline under a resource of this feature.
    pub nested: Vec<FeatureControlSet>,
}

impl FeatureControlSet {
    pub fn new(
        feature_name: impl Into<String>,
        supported_resources: Vec<String>,
        controls: Vec<Control>,
        nested: Vec<FeatureControlSet>,
    ) -> Result<Self, CatalogError> {
        let feature_name = feature_name.into();
        if supported_resources.iter().all(|t| t.trim().is_empty()) {
            return Err(CatalogError::EmptySupportedTypes {
                feature: feature_name,
            });
        }
        for control in &controls {
            if control.selectors.is_empty() {
                return Err(CatalogError::NoSelectors {
                    control: control.id.clone(),
                });
            }
        }
        Ok(Self {
            feature_name,
            supported_resources,
            controls,
            nested,
        })
    }

    /// Index of the supported-type entry that best matches `resource_type` (longest prefix).
    pub fn matching_type(&self, resource_type: &str) -> Option<usize> {
        let lowered = resource_type.to_ascii_lowercase();
        self.supported_resources
            .iter()
            .enumerate()
            .filter(|(_, prefix)| {
                let prefix = prefix.trim();
                !prefix.is_empty() && lowered.starts_with(&prefix.to_ascii_lowercase())
            })
            .max_by(|(ia, a), (ib, b)| a.len().cmp(&b.len()).then(ib.cmp(ia)))
            .map(|(i, _)| i)
    }

    pub fn supports(&self, resource_type: &str) -> bool {
        self.matching_type(resource_type).is_some()
    }
}

/// Ordered set of feature control sets.
#[derive(Clone, Debug, Default)]
pub struct ControlCatalog {
    features: Vec<FeatureControlSet>,
}

impl ControlCatalog {
    pub fn new(features: Vec<FeatureControlSet>) -> Result<Self, CatalogError> {
        let mut seen = BTreeSet::new();
        for feature in &features {
            if !seen.insert(feature.feature_name.to_ascii_lowercase()) {
                return Err(CatalogError::DuplicateFeature {
                    feature: feature.feature_name.clone(),
                });
            }
        }
        Ok(Self { features })
    }

    pub fn features(&self) -> &[FeatureControlSet] {
        &self.features
    }

    pub fn feature(&self, index: usize) -> &FeatureControlSet {
        &self.features[index]
    }

    /// First feature (in declaration order) supporting `resource_type`.
    pub fn classify(&self, resource_type: &str) -> Option<usize> {
        classify_in(&self.features, resource_type)
    }

    pub fn control_count(&self) -> usize {
        fn count(sets: &[FeatureControlSet]) -> usize {
            sets.iter()
                .map(|s| s.controls.len() + count(&s.nested))
                .sum()
        }
        count(&self.features)
    }
}

pub fn classify_in(sets: &[FeatureControlSet], resource_type: &str) -> Option<usize> {
    if resource_type.is_empty() {
        return None;
    }
    sets.iter().position(|s| s.supports(resource_type))
}
