use crate::catalog::{
    Control, ControlCatalog, ControlData, FeatureControlSet, StringMode, StringTokenData,
};
use crate::json::PropertySelector;
use armguard_types::ControlSeverity;
use serde_json::{Value, json};

pub fn control(id: &str, selectors: &[&str], data: ControlData) -> Control {
    Control {
        id: id.to_string(),
        control_id: id.to_string(),
        description: format!("{id} description"),
        rationale: String::new(),
        recommendation: String::new(),
        severity: ControlSeverity::High,
        enabled: true,
        selectors: selectors
            .iter()
            .map(|s| PropertySelector::parse(s).expect("valid selector"))
            .collect(),
        data,
    }
}

pub fn feature(name: &str, types: &[&str], controls: Vec<Control>) -> FeatureControlSet {
    nested_feature(name, types, controls, Vec::new())
}

pub fn nested_feature(
    name: &str,
    types: &[&str],
    controls: Vec<Control>,
    nested: Vec<FeatureControlSet>,
) -> FeatureControlSet {
    FeatureControlSet::new(
        name,
        types.iter().map(|t| t.to_string()).collect(),
        controls,
        nested,
    )
    .expect("valid feature")
}

pub fn catalog(features: Vec<FeatureControlSet>) -> ControlCatalog {
    ControlCatalog::new(features).expect("valid catalog")
}

pub fn string_token(mode: StringMode, value: &str) -> StringTokenData {
    StringTokenData {
        mode,
        value: value.to_string(),
        case_sensitive: false,
    }
}

/// A resource object with an empty `properties` block.
pub fn resource(resource_type: &str, name: &str, depends_on: &[&str]) -> Value {
    json!({
        "type": resource_type,
        "name": name,
        "dependsOn": depends_on,
        "properties": {}
    })
}
