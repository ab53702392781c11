use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Stable schema identifier for armguard reports.
pub const SCHEMA_REPORT_V1: &str = "armguard.report.v1";

/// Outcome of evaluating one control against one resource group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
pub enum VerificationResult {
    Passed,
    Failed,
    NeedsReview,
    NotApplicable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ControlSeverity {
    Critical,
    High,
    Medium,
    Low,
}

/// Pointer into the template that produced a result, plus a bounded snippet of the JSON found there.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DataMarker {
    /// 1-based source line; absent when the source text was not available or the path was not found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// JSON pointer (RFC 6901) into the template document.
    pub pointer: String,
    pub snippet: String,
}

impl DataMarker {
    /// Marker for a path that was attempted but matched nothing.
    pub fn missing(path: impl Into<String>) -> Self {
        Self {
            line: None,
            pointer: path.into(),
            snippet: String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ControlResult {
    pub id: String,
    pub control_id: String,
    pub description: String,
    pub rationale: String,
    pub recommendation: String,
    pub severity: ControlSeverity,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_resources: Vec<String>,

    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,

    pub verification_result: VerificationResult,
    pub is_token_not_found: bool,
    pub is_token_not_valid: bool,

    /// Selectors joined with ` | `.
    pub expected_property: String,
    /// Human-readable description of the expected value.
    pub expected_value: String,

    /// Every `resource-pointer + selector` combination tried when nothing matched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attempted_paths: Vec<String>,

    pub resource_data_marker: DataMarker,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub result_data_markers: Vec<DataMarker>,

    /// Diagnostic detail, e.g. why a property value could not be resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Stable hash of control id, resource type and resource pointer.
    pub fingerprint: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OutcomeCounts {
    pub passed: u32,
    pub failed: u32,
    pub needs_review: u32,
    pub not_applicable: u32,
}

impl OutcomeCounts {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a ControlResult>) -> Self {
        let mut counts = OutcomeCounts::default();
        for r in results {
            counts.add(r.verification_result);
        }
        counts
    }

    pub fn add(&mut self, outcome: VerificationResult) {
        match outcome {
            VerificationResult::Passed => self.passed += 1,
            VerificationResult::Failed => self.failed += 1,
            VerificationResult::NeedsReview => self.needs_review += 1,
            VerificationResult::NotApplicable => self.not_applicable += 1,
        }
    }

    pub fn merge(&mut self, other: &OutcomeCounts) {
        self.passed += other.passed;
        self.failed += other.failed;
        self.needs_review += other.needs_review;
        self.not_applicable += other.not_applicable;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Warn,
    Fail,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

/// Results for one scanned template file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TemplateScan {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters_path: Option<String>,
    pub counts: OutcomeCounts,
    pub results: Vec<ControlResult>,
}

/// Scan summary payload for the report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct ScanData {
    pub templates_scanned: u32,
    pub resources_scanned: u32,

    pub results_total: u32,
    pub results_emitted: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportEnvelope {
    /// Versioned schema identifier for the envelope shape.
    pub schema: String,
    pub tool: ToolMeta,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
    pub verdict: Verdict,
    pub counts: OutcomeCounts,
    pub templates: Vec<TemplateScan>,
    pub data: ScanData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_track_each_outcome() {
        let mut counts = OutcomeCounts::default();
        counts.add(VerificationResult::Passed);
        counts.add(VerificationResult::Failed);
        counts.add(VerificationResult::Failed);
        counts.add(VerificationResult::NotApplicable);
        assert_eq!(counts.passed, 1);
        assert_eq!(counts.failed, 2);
        assert_eq!(counts.needs_review, 0);
        assert_eq!(counts.not_applicable, 1);
    }

    #[test]
    fn missing_marker_omits_line() {
        let marker = DataMarker::missing("$.properties.x");
        let json = serde_json::to_value(&marker).expect("serialize marker");
        assert!(json.get("line").is_none());
        assert_eq!(json["pointer"], "$.properties.x");
    }

    #[test]
    fn verification_result_serializes_by_name() {
        let json = serde_json::to_string(&VerificationResult::NeedsReview).expect("serialize");
        assert_eq!(json, "\"NeedsReview\"");
    }
}
