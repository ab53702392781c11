use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `armguard.toml` schema v1.
///
/// This is a *user-facing* config model: it is intentionally permissive so forward-compat is easy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ArmguardConfigV1 {
    /// Optional schema string for tooling (`armguard.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// When to fail the scan: `failed` (default) or `review`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_on: Option<String>,

    /// How many results to emit before truncating the list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,

    /// Glob patterns over control ids; matching controls are not evaluated.
    #[serde(default)]
    pub exclude_controls: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<DeploymentConfig>,
}

/// Values substituted for `resourceGroup()` and `subscription()` lookups.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DeploymentConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_location: Option<String>,
}

/// Control catalog file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFileV1 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default, alias = "resourceControlSets")]
    pub features: Vec<FeatureFile>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFile {
    pub feature_name: String,

    /// Resource-type prefixes handled by this feature.
    #[serde(default)]
    pub supported_resources: Vec<String>,

    #[serde(default)]
    pub controls: Vec<ControlFile>,

    /// Control sets for child resources declared inline.
    #[serde(default, alias = "nestedResourcesControlSet")]
    pub nested_resources: Vec<FeatureFile>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ControlFile {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_id: Option<String>,

    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub recommendation: String,

    /// `Critical`, `High`, `Medium` (default) or `Low`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,

    /// Property selectors, tried in order.
    #[serde(default)]
    pub json_path: Vec<String>,

    pub match_type: String,

    #[serde(default)]
    pub data: ControlDataFile,
}

/// Expected-value payload. Which fields matter depends on the control's `matchType`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ControlDataFile {
    /// Comparator or mode, e.g. `GreaterThan`, `Allow`, `Contains`, `Limit`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub match_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_case_sensitive: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_desired_state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_no_property_found: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
}
