//! The `scan` use case: evaluate templates against a control catalog and produce a report.

use crate::discover::{discover_templates, sibling_parameters};
use crate::locate::LineIndex;
use anyhow::Context;
use armguard_domain::catalog::ControlCatalog;
use armguard_domain::{EvaluationInput, evaluate};
use armguard_settings::{ArmguardConfigV1, FailOn, Overrides, ResolvedConfig};
use armguard_types::{
    OutcomeCounts, ReportEnvelope, SCHEMA_REPORT_V1, ScanData, TemplateScan, ToolMeta, Verdict,
};
use camino::Utf8Path;
use serde_json::Value;
use time::OffsetDateTime;

/// Input for the scan use case.
#[derive(Clone, Debug)]
pub struct ScanInput<'a> {
    /// A template file, or a directory to search for templates.
    pub template: &'a Utf8Path,
    /// Parameters applied to every template. Without it, `<name>.parameters.json` next to each
    /// template is used when present.
    pub parameters: Option<&'a Utf8Path>,
    pub catalog: &'a Utf8Path,
    /// Config file contents (empty string if not found).
    pub config_text: &'a str,
    pub overrides: Overrides,
}

#[derive(Clone, Debug)]
pub struct ScanOutput {
    pub report: ReportEnvelope,
    pub resolved_config: ResolvedConfig,
}

/// Run the scan use case: resolve config and catalog, evaluate every template, build the report.
pub fn run_scan(input: ScanInput<'_>) -> anyhow::Result<ScanOutput> {
    let started_at = OffsetDateTime::now_utc();

    // Empty config is allowed, defaults apply.
    let cfg = if input.config_text.trim().is_empty() {
        ArmguardConfigV1::default()
    } else {
        armguard_settings::parse_config_toml(input.config_text).context("parse config")?
    };
    let resolved =
        armguard_settings::resolve_config(cfg, input.overrides.clone()).context("resolve config")?;

    let catalog_text = std::fs::read_to_string(input.catalog)
        .with_context(|| format!("read catalog: {}", input.catalog))?;
    let catalog_file = armguard_settings::parse_catalog_json(&catalog_text)
        .with_context(|| format!("parse catalog: {}", input.catalog))?;
    let catalog = armguard_settings::resolve_catalog(catalog_file, &resolved)
        .with_context(|| format!("resolve catalog: {}", input.catalog))?;

    let shared_parameters = match input.parameters {
        Some(path) => Some(read_json(path, "parameters")?),
        None => None,
    };

    let mut templates = Vec::new();
    let mut resources_scanned = 0u32;
    for path in discover_templates(input.template)? {
        let (parameters_path, parameters) = match (input.parameters, &shared_parameters) {
            (Some(p), Some(v)) => (Some(p.to_string()), Some(v.clone())),
            _ => match sibling_parameters(&path) {
                Some(p) => {
                    let v = read_json(&p, "parameters")?;
                    (Some(p.to_string()), Some(v))
                }
                None => (None, None),
            },
        };
        let (scan, resources) =
            scan_template(&path, parameters_path, parameters.as_ref(), &catalog, &resolved)?;
        resources_scanned += resources;
        templates.push(scan);
    }

    let mut counts = OutcomeCounts::default();
    for t in &templates {
        counts.merge(&t.counts);
    }
    let verdict = verdict_for(&counts, resolved.fail_on);
    let results_total: usize = templates.iter().map(|t| t.results.len()).sum();
    let results_emitted = truncate_results(&mut templates, resolved.max_results);
    let truncated_reason = (results_emitted < results_total).then(|| {
        format!(
            "emitted the first {results_emitted} of {results_total} results (max_results = {})",
            resolved.max_results
        )
    });

    tracing::info!(
        templates = templates.len(),
        resources = resources_scanned,
        results = results_total,
        failed = counts.failed,
        needs_review = counts.needs_review,
        verdict = ?verdict,
        "scan finished"
    );

    let report = ReportEnvelope {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: ToolMeta {
            name: "armguard".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        started_at,
        finished_at: OffsetDateTime::now_utc(),
        verdict,
        counts,
        data: ScanData {
            templates_scanned: templates.len() as u32,
            resources_scanned,
            results_total: results_total as u32,
            results_emitted: results_emitted as u32,
            truncated_reason,
        },
        templates,
    };

    Ok(ScanOutput {
        report,
        resolved_config: resolved,
    })
}

fn scan_template(
    path: &Utf8Path,
    parameters_path: Option<String>,
    parameters: Option<&Value>,
    catalog: &ControlCatalog,
    config: &ResolvedConfig,
) -> anyhow::Result<(TemplateScan, u32)> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read template: {path}"))?;
    let template: Value =
        serde_json::from_str(&text).with_context(|| format!("parse template: {path}"))?;

    let input = EvaluationInput {
        template: &template,
        parameters,
        deployment: &config.deployment,
    };
    let report = evaluate(&input, catalog).with_context(|| format!("evaluate template: {path}"))?;

    let lines = LineIndex::build(&text);
    let mut results = report.results;
    for r in &mut results {
        lines.annotate(r);
    }

    tracing::debug!(
        template = %path,
        resources = report.resources_scanned,
        results = results.len(),
        "template evaluated"
    );

    Ok((
        TemplateScan {
            path: path.to_string(),
            parameters_path,
            counts: report.counts,
            results,
        },
        report.resources_scanned,
    ))
}

fn read_json(path: &Utf8Path, what: &str) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {what}: {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parse {what}: {path}"))
}

/// Keep at most `max` results across all templates, in report order. Returns how many were kept.
fn truncate_results(templates: &mut [TemplateScan], max: usize) -> usize {
    let mut remaining = max;
    let mut kept = 0;
    for t in templates {
        t.results.truncate(remaining);
        remaining -= t.results.len();
        kept += t.results.len();
    }
    kept
}

/// Fail on any Failed result (or NeedsReview with `fail_on = "review"`), warn on NeedsReview.
pub fn verdict_for(counts: &OutcomeCounts, fail_on: FailOn) -> Verdict {
    if counts.failed > 0 || (fail_on == FailOn::Review && counts.needs_review > 0) {
        Verdict::Fail
    } else if counts.needs_review > 0 {
        Verdict::Warn
    } else {
        Verdict::Pass
    }
}

/// Map verdict to exit code: 0 = pass/warn, 2 = fail.
pub fn verdict_exit_code(verdict: Verdict) -> i32 {
    match verdict {
        Verdict::Pass => 0,
        Verdict::Warn => 0,
        Verdict::Fail => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use armguard_types::VerificationResult;
    use camino::Utf8PathBuf;

    const CATALOG: &str = r#"{
  "features": [{
    "featureName": "Storage",
    "supportedResources": ["Microsoft.Storage/storageAccounts"],
    "controls": [
      {
        "id": "Storage_HTTPS",
        "controlId": "Azure_Storage_DP_Encrypt_In_Transit",
        "description": "Use HTTPS for storage endpoints",
        "severity": "High",
        "jsonPath": ["$.properties.supportsHttpsTrafficOnly"],
        "matchType": "Boolean",
        "data": { "value": true }
      },
      {
        "id": "Storage_Tier",
        "jsonPath": ["$.properties.accessTier"],
        "matchType": "StringSingleToken",
        "data": { "type": "StringMatched", "value": "Hot" }
      }
    ]
  }]
}"#;

    const TEMPLATE: &str = r#"{
  "parameters": { "https": { "type": "bool" } },
  "resources": [
    {
      "type": "Microsoft.Storage/storageAccounts",
      "name": "store1",
      "properties": {
        "supportsHttpsTrafficOnly": "[parameters('https')]",
        "accessTier": "Hot"
      }
    }
  ]
}"#;

    struct Fixture {
        _tmp: tempfile::TempDir,
        root: Utf8PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = tempfile::tempdir().expect("temp dir");
            let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8");
            std::fs::write(root.join("catalog.json"), CATALOG).expect("write catalog");
            std::fs::create_dir_all(root.join("templates")).expect("mkdir");
            std::fs::write(root.join("templates/storage.json"), TEMPLATE).expect("write template");
            Self { _tmp: tmp, root }
        }

        fn parameters(&self, https: bool) {
            std::fs::write(
                self.root.join("templates/storage.parameters.json"),
                format!(r#"{{ "parameters": {{ "https": {{ "value": {https} }} }} }}"#),
            )
            .expect("write parameters");
        }

        fn scan(&self, config_text: &str, overrides: Overrides) -> ScanOutput {
            let template = self.root.join("templates");
            let catalog = self.root.join("catalog.json");
            run_scan(ScanInput {
                template: &template,
                parameters: None,
                catalog: &catalog,
                config_text,
                overrides,
            })
            .expect("run_scan")
        }
    }

    #[test]
    fn sibling_parameters_drive_the_outcome() {
        let fx = Fixture::new();
        fx.parameters(false);
        let report = fx.scan("", Overrides::default()).report;

        assert_eq!(report.verdict, Verdict::Fail);
        assert_eq!(report.data.templates_scanned, 1);
        assert_eq!(report.data.resources_scanned, 1);
        let t = &report.templates[0];
        assert!(t.path.ends_with("storage.json"));
        assert!(t.parameters_path.as_deref().is_some_and(|p| p.ends_with("storage.parameters.json")));

        let https = &t.results[0];
        assert_eq!(https.control_id, "Azure_Storage_DP_Encrypt_In_Transit");
        assert_eq!(https.verification_result, VerificationResult::Failed);
        assert_eq!(https.resource_data_marker.line, Some(4));
        assert_eq!(https.result_data_markers[0].line, Some(8));

        fx.parameters(true);
        let report = fx.scan("", Overrides::default()).report;
        assert_eq!(report.verdict, Verdict::Pass);
        assert_eq!(report.counts.passed, 2);
    }

    #[test]
    fn missing_parameter_value_fails_as_not_valid() {
        let fx = Fixture::new();
        let report = fx.scan("", Overrides::default()).report;
        assert_eq!(report.verdict, Verdict::Fail);
        let https = &report.templates[0].results[0];
        assert_eq!(https.verification_result, VerificationResult::Failed);
        assert!(https.is_token_not_valid);
        assert!(https.message.as_deref().is_some_and(|m| m.contains("https")));
    }

    #[test]
    fn review_results_warn_unless_fail_on_review() {
        let fx = Fixture::new();
        fx.parameters(true);
        std::fs::write(
            fx.root.join("templates/storage.json"),
            TEMPLATE.replace("\"Hot\"", "\"Cool\""),
        )
        .expect("write template");

        let report = fx.scan("", Overrides::default()).report;
        assert_eq!(report.verdict, Verdict::Warn);
        assert_eq!(report.counts.needs_review, 1);

        let report = fx.scan("fail_on = \"review\"\n", Overrides::default()).report;
        assert_eq!(report.verdict, Verdict::Fail);

        let report = fx
            .scan(
                "fail_on = \"review\"\n",
                Overrides {
                    fail_on: Some("failed".to_string()),
                    ..Overrides::default()
                },
            )
            .report;
        assert_eq!(report.verdict, Verdict::Warn);
    }

    #[test]
    fn excluded_controls_and_truncation_are_reported() {
        let fx = Fixture::new();
        fx.parameters(true);
        let output = fx.scan(
            "",
            Overrides {
                max_results: Some(1),
                ..Overrides::default()
            },
        );
        let report = output.report;
        assert_eq!(report.data.results_total, 2);
        assert_eq!(report.data.results_emitted, 1);
        assert!(report.data.truncated_reason.is_some());
        assert_eq!(report.templates[0].results.len(), 1);
        assert_eq!(report.counts.passed, 2);

        let report = fx
            .scan("exclude_controls = [\"Storage_Tier\"]\n", Overrides::default())
            .report;
        assert_eq!(report.data.results_total, 1);
        assert_eq!(report.templates[0].results[0].id, "Storage_HTTPS");
    }

    #[test]
    fn broken_template_names_the_file() {
        let fx = Fixture::new();
        std::fs::write(fx.root.join("templates/storage.json"), "{ \"resources\": 3 }")
            .expect("write");
        let template = fx.root.join("templates");
        let catalog = fx.root.join("catalog.json");
        let err = run_scan(ScanInput {
            template: &template,
            parameters: None,
            catalog: &catalog,
            config_text: "",
            overrides: Overrides::default(),
        })
        .unwrap_err();
        assert!(format!("{err:#}").contains("evaluate template"));
    }

    #[test]
    fn verdicts_follow_counts() {
        let mut counts = OutcomeCounts::default();
        assert_eq!(verdict_for(&counts, FailOn::Failed), Verdict::Pass);
        counts.needs_review = 1;
        assert_eq!(verdict_for(&counts, FailOn::Failed), Verdict::Warn);
        assert_eq!(verdict_for(&counts, FailOn::Review), Verdict::Fail);
        counts.needs_review = 0;
        counts.failed = 1;
        assert_eq!(verdict_for(&counts, FailOn::Failed), Verdict::Fail);
    }

    #[test]
    fn verdict_exit_codes() {
        assert_eq!(verdict_exit_code(Verdict::Pass), 0);
        assert_eq!(verdict_exit_code(Verdict::Warn), 0);
        assert_eq!(verdict_exit_code(Verdict::Fail), 2);
    }
}
