//! Resolution of the catalog file into the typed domain catalog.
//!
//! Every payload is decoded here, once; the domain never sees the string-typed model.

use crate::model::{CatalogFileV1, ControlDataFile, ControlFile, FeatureFile};
use crate::resolve::ResolvedConfig;
use anyhow::Context;
use armguard_domain::catalog::{
    Comparator, Control, ControlCatalog, ControlData, CountMode, FeatureControlSet, SetMode,
    StringMode, StringTokenData, VerifiableData,
};
use armguard_domain::json::PropertySelector;
use armguard_domain::version::DottedVersion;
use armguard_types::{ControlSeverity, VerificationResult, ids};
use regex::RegexBuilder;
use serde_json::Value;

pub fn resolve_catalog(
    file: CatalogFileV1,
    config: &ResolvedConfig,
) -> anyhow::Result<ControlCatalog> {
    let features = file
        .features
        .into_iter()
        .map(|f| resolve_feature(f, config))
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(ControlCatalog::new(features)?)
}

fn resolve_feature(file: FeatureFile, config: &ResolvedConfig) -> anyhow::Result<FeatureControlSet> {
    let name = file.feature_name;
    let mut controls = Vec::with_capacity(file.controls.len());
    for control in file.controls {
        let id = control.id.clone();
        controls.push(
            resolve_control(control, config)
                .with_context(|| format!("feature '{name}': control '{id}'"))?,
        );
    }
    let nested = file
        .nested_resources
        .into_iter()
        .map(|n| resolve_feature(n, config))
        .collect::<anyhow::Result<Vec<_>>>()
        .with_context(|| format!("feature '{name}': nested resources"))?;

    Ok(FeatureControlSet::new(
        name,
        file.supported_resources,
        controls,
        nested,
    )?)
}

fn resolve_control(file: ControlFile, config: &ResolvedConfig) -> anyhow::Result<Control> {
    let control_id = file.control_id.unwrap_or_else(|| file.id.clone());
    let excluded = config.is_excluded(&file.id) || config.is_excluded(&control_id);

    let selectors = file
        .json_path
        .iter()
        .map(|p| PropertySelector::parse(p))
        .collect::<Result<Vec<_>, _>>()?;

    let severity = match file.severity.as_deref() {
        Some(s) => parse_severity(s)?,
        None => ControlSeverity::Medium,
    };

    Ok(Control {
        id: file.id,
        control_id,
        description: file.description,
        rationale: file.rationale,
        recommendation: file.recommendation,
        severity,
        enabled: file.is_enabled.unwrap_or(true) && !excluded,
        selectors,
        data: decode_payload(&file.match_type, &file.data)
            .with_context(|| format!("matchType {}", file.match_type))?,
    })
}

/// Decode the payload for one match kind.
pub fn decode_payload(kind: &str, data: &ControlDataFile) -> anyhow::Result<ControlData> {
    let decoded = match kind {
        ids::KIND_BOOLEAN => ControlData::Boolean {
            value: bool_value(data)?,
        },
        ids::KIND_INTEGER_VALUE => ControlData::IntegerValue {
            comparator: comparator(data)?,
            value: int_value(data)?,
        },
        ids::KIND_ITEM_COUNT => ControlData::ItemCount {
            comparator: comparator(data)?,
            value: int_value(data)?,
        },
        ids::KIND_ITEM_PROPERTIES => ControlData::ItemProperties {
            key: data.key.clone().context("missing data.key")?,
            value: data.value.clone().context("missing data.value")?,
        },
        ids::KIND_SECURE_PARAM => ControlData::SecureParam {
            secure_type: match &data.value {
                Some(v) => string_value(v)?,
                None => ids::SECURE_STRING_TYPE.to_string(),
            },
        },
        ids::KIND_STRING_WHITESPACE => ControlData::StringWhitespace {
            blank: bool_value(data)?,
        },
        ids::KIND_STRING_SINGLE_TOKEN => ControlData::StringSingleToken(string_token(data)?),
        ids::KIND_MATCH_STRING_SINGLE_TOKEN => {
            ControlData::MatchStringSingleToken(string_token(data)?)
        }
        ids::KIND_REGEX_SINGLE_TOKEN => {
            let allow = match string_mode(data)? {
                StringMode::Allow => true,
                StringMode::NotAllow => false,
                StringMode::StringMatched => {
                    anyhow::bail!("data.type must be Allow or NotAllow for a regular expression")
                }
            };
            let source = match (&data.pattern, &data.value) {
                (Some(p), _) => p.clone(),
                (None, Some(v)) => string_value(v)?,
                (None, None) => anyhow::bail!("missing data.pattern"),
            };
            let pattern = RegexBuilder::new(&source)
                .case_insensitive(!data.is_case_sensitive.unwrap_or(false))
                .build()
                .with_context(|| format!("invalid regular expression: {source}"))?;
            ControlData::RegExpressionSingleToken { allow, pattern }
        }
        ids::KIND_VERIFIABLE_SINGLE_TOKEN => ControlData::VerifiableSingleToken(verifiable(data)?),
        ids::KIND_VERIFIABLE_BOOLEAN_SINGLE_TOKEN => {
            ControlData::VerifiableBooleanSingleToken(verifiable(data)?)
        }
        ids::KIND_NULLABLE_SINGLE_TOKEN => ControlData::NullableSingleToken,
        ids::KIND_VERSION_SINGLE_TOKEN => {
            let raw = string_value(data.value.as_ref().context("missing data.value")?)?;
            let value = raw
                .parse::<DottedVersion>()
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            ControlData::VersionSingleToken {
                comparator: comparator(data)?,
                value,
            }
        }
        ids::KIND_VERIFIABLE_ITEM_COUNT => ControlData::VerifiableItemCount {
            mode: match data.match_type.as_deref() {
                Some("Limit") | None => CountMode::Limit,
                Some("All") => CountMode::All,
                Some(other) => anyhow::bail!("unknown data.type: {other} (expected Limit|All)"),
            },
            limit: int_value(data)?,
            marker: data.marker.clone().unwrap_or_else(|| "*".to_string()),
        },
        ids::KIND_STRING_MULTI_TOKEN => ControlData::StringMultiToken {
            mode: match data.match_type.as_deref() {
                Some("Contains") => SetMode::Contains,
                Some("NotContains") => SetMode::NotContains,
                Some("Equals") => SetMode::Equals,
                other => anyhow::bail!(
                    "unknown data.type: {} (expected Contains|NotContains|Equals)",
                    other.unwrap_or("<missing>")
                ),
            },
            values: match data.value.as_ref() {
                Some(Value::Array(items)) => items
                    .iter()
                    .map(string_value)
                    .collect::<anyhow::Result<Vec<_>>>()?,
                Some(single) => vec![string_value(single)?],
                None => anyhow::bail!("missing data.value"),
            },
            case_sensitive: data.is_case_sensitive.unwrap_or(false),
        },
        ids::KIND_NULL
        | ids::KIND_STRING_LENGTH
        | ids::KIND_REGEX_MULTI_TOKEN
        | ids::KIND_VERIFIABLE_MULTI_TOKEN
        | ids::KIND_CUSTOM => ControlData::Unsupported {
            kind: unevaluated_kind(kind),
        },
        other => anyhow::bail!("unknown matchType: {other}"),
    };
    Ok(decoded)
}

fn unevaluated_kind(kind: &str) -> &'static str {
    [
        ids::KIND_NULL,
        ids::KIND_STRING_LENGTH,
        ids::KIND_REGEX_MULTI_TOKEN,
        ids::KIND_VERIFIABLE_MULTI_TOKEN,
        ids::KIND_CUSTOM,
    ]
    .into_iter()
    .find(|k| *k == kind)
    .unwrap_or(ids::KIND_CUSTOM)
}

fn string_value(v: &Value) -> anyhow::Result<String> {
    match v {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => anyhow::bail!("expected a string, found {other}"),
    }
}

fn bool_value(data: &ControlDataFile) -> anyhow::Result<bool> {
    match data.value.as_ref().context("missing data.value")? {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        other => anyhow::bail!("expected a boolean data.value, found {other}"),
    }
}

fn int_value(data: &ControlDataFile) -> anyhow::Result<i64> {
    match data.value.as_ref().context("missing data.value")? {
        Value::Number(n) => n
            .as_i64()
            .with_context(|| format!("expected an integer data.value, found {n}")),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .with_context(|| format!("expected an integer data.value, found {s}")),
        other => anyhow::bail!("expected an integer data.value, found {other}"),
    }
}

fn comparator(data: &ControlDataFile) -> anyhow::Result<Comparator> {
    match data.match_type.as_deref() {
        Some("GreaterThan") => Ok(Comparator::GreaterThan),
        Some("LesserThan") => Ok(Comparator::LesserThan),
        Some("Equals") => Ok(Comparator::Equals),
        Some("GreaterThanOrEqual") => Ok(Comparator::GreaterThanOrEqual),
        Some("LesserThanOrEqual") => Ok(Comparator::LesserThanOrEqual),
        other => anyhow::bail!(
            "unknown data.type: {} (expected GreaterThan|LesserThan|Equals|GreaterThanOrEqual|LesserThanOrEqual)",
            other.unwrap_or("<missing>")
        ),
    }
}

fn string_mode(data: &ControlDataFile) -> anyhow::Result<StringMode> {
    match data.match_type.as_deref() {
        Some("Allow") => Ok(StringMode::Allow),
        Some("NotAllow") => Ok(StringMode::NotAllow),
        Some("StringMatched") => Ok(StringMode::StringMatched),
        other => anyhow::bail!(
            "unknown data.type: {} (expected Allow|NotAllow|StringMatched)",
            other.unwrap_or("<missing>")
        ),
    }
}

fn string_token(data: &ControlDataFile) -> anyhow::Result<StringTokenData> {
    Ok(StringTokenData {
        mode: string_mode(data)?,
        value: string_value(data.value.as_ref().context("missing data.value")?)?,
        case_sensitive: data.is_case_sensitive.unwrap_or(false),
    })
}

fn verifiable(data: &ControlDataFile) -> anyhow::Result<VerifiableData> {
    let if_desired_state = match data.if_desired_state.as_deref() {
        Some(s) => parse_outcome(s)?,
        None => VerificationResult::Passed,
    };
    let if_not_found = match data.if_no_property_found.as_deref() {
        None => None,
        Some("PassIfPropertyNotFound") => Some(VerificationResult::Passed),
        Some("FailIfPropertyNotFound") => Some(VerificationResult::Failed),
        Some("VerifyIfPropertyNotFound") => Some(VerificationResult::NeedsReview),
        Some(other) => anyhow::bail!(
            "unknown data.ifNoPropertyFound: {other} (expected PassIfPropertyNotFound|FailIfPropertyNotFound|VerifyIfPropertyNotFound)"
        ),
    };
    Ok(VerifiableData {
        desired: data.value.clone(),
        if_desired_state,
        if_not_found,
    })
}

fn parse_outcome(v: &str) -> anyhow::Result<VerificationResult> {
    match v {
        "Passed" | "Pass" => Ok(VerificationResult::Passed),
        "Failed" | "Fail" => Ok(VerificationResult::Failed),
        "NeedsReview" | "Verify" => Ok(VerificationResult::NeedsReview),
        other => anyhow::bail!("unknown outcome: {other} (expected Passed|Failed|Verify)"),
    }
}

fn parse_severity(v: &str) -> anyhow::Result<ControlSeverity> {
    match v.to_ascii_lowercase().as_str() {
        "critical" => Ok(ControlSeverity::Critical),
        "high" => Ok(ControlSeverity::High),
        "medium" => Ok(ControlSeverity::Medium),
        "low" => Ok(ControlSeverity::Low),
        _ => anyhow::bail!("unknown severity: {v} (expected Critical|High|Medium|Low)"),
    }
}
