//! Config and control-catalog parsing and resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves inputs provided as strings.

#![forbid(unsafe_code)]

mod catalog;
mod model;
mod resolve;

pub use catalog::decode_payload;
pub use model::{
    ArmguardConfigV1, CatalogFileV1, ControlDataFile, ControlFile, DeploymentConfig, FeatureFile,
};
pub use resolve::{DEFAULT_MAX_RESULTS, FailOn, Overrides, ResolvedConfig};

use armguard_domain::catalog::ControlCatalog;

/// Parse `armguard.toml` (or equivalent) into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<ArmguardConfigV1> {
    let cfg: ArmguardConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the effective config (file values, then overrides).
pub fn resolve_config(
    cfg: ArmguardConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}

/// Parse a control catalog JSON document.
pub fn parse_catalog_json(input: &str) -> anyhow::Result<CatalogFileV1> {
    let file: CatalogFileV1 = serde_json::from_str(input)?;
    Ok(file)
}

/// Decode every control payload and build the typed catalog.
///
/// Controls matched by the config's exclusions stay in the catalog but are disabled.
pub fn resolve_catalog(
    file: CatalogFileV1,
    config: &ResolvedConfig,
) -> anyhow::Result<ControlCatalog> {
    catalog::resolve_catalog(file, config)
}

/// JSON Schema for the catalog file, for editor tooling.
pub fn catalog_schema_json() -> anyhow::Result<String> {
    let schema = schemars::schema_for!(CatalogFileV1);
    Ok(serde_json::to_string_pretty(&schema)?)
}

/// JSON Schema for `armguard.toml`.
pub fn config_schema_json() -> anyhow::Result<String> {
    let schema = schemars::schema_for!(ArmguardConfigV1);
    Ok(serde_json::to_string_pretty(&schema)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_toml_parses() {
        let cfg = parse_config_toml(
            r#"
fail_on = "review"
max_results = 25
exclude_controls = ["Storage_*"]

[deployment]
resource_group_name = "prod-rg"
"#,
        )
        .unwrap();
        assert_eq!(cfg.fail_on.as_deref(), Some("review"));
        assert_eq!(cfg.max_results, Some(25));
        assert_eq!(
            cfg.deployment.and_then(|d| d.resource_group_name).as_deref(),
            Some("prod-rg")
        );
    }

    #[test]
    fn catalog_accepts_legacy_field_names() {
        let file = parse_catalog_json(
            r#"{ "resourceControlSets": [{ "featureName": "KeyVault", "supportedResources": ["Microsoft.KeyVault"] }] }"#,
        )
        .unwrap();
        assert_eq!(file.features[0].feature_name, "KeyVault");
    }

    #[test]
    fn resource_type_is_not_a_feature_name() {
        let err = parse_catalog_json(r#"{ "features": [{ "resourceType": "KeyVault" }] }"#)
            .unwrap_err();
        assert!(format!("{err:#}").contains("featureName"), "{err:#}");
    }

    #[test]
    fn schemas_name_their_root_types() {
        assert!(catalog_schema_json().unwrap().contains("CatalogFileV1"));
        assert!(config_schema_json().unwrap().contains("ArmguardConfigV1"));
    }
}
