use crate::model::ArmguardConfigV1;
use anyhow::Context;
use armguard_domain::expression::DeploymentContext;
use globset::{Glob, GlobSet, GlobSetBuilder};

pub const DEFAULT_MAX_RESULTS: usize = 1000;

/// Which outcomes turn the verdict into a failure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailOn {
    /// Only Failed results fail the scan.
    #[default]
    Failed,
    /// NeedsReview results fail the scan as well.
    Review,
}

#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub fail_on: Option<String>,
    pub max_results: Option<u32>,
    pub exclude_controls: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub fail_on: FailOn,
    pub max_results: usize,
    pub deployment: DeploymentContext,
    excluded: Option<GlobSet>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            fail_on: FailOn::Failed,
            max_results: DEFAULT_MAX_RESULTS,
            deployment: DeploymentContext::default(),
            excluded: None,
        }
    }
}

impl ResolvedConfig {
    pub fn is_excluded(&self, control_id: &str) -> bool {
        self.excluded
            .as_ref()
            .map(|set| set.is_match(control_id))
            .unwrap_or(false)
    }
}

pub fn resolve_config(
    cfg: ArmguardConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    let mut resolved = ResolvedConfig::default();

    if let Some(fail_on) = overrides.fail_on.as_deref().or(cfg.fail_on.as_deref()) {
        resolved.fail_on = parse_fail_on(fail_on)?;
    }

    if let Some(max) = overrides.max_results.or(cfg.max_results) {
        resolved.max_results = max as usize;
    }

    let patterns: Vec<String> = cfg
        .exclude_controls
        .iter()
        .chain(overrides.exclude_controls.iter())
        .cloned()
        .collect();
    resolved.excluded = build_exclusions(&patterns)?;

    if let Some(dep) = cfg.deployment {
        let ctx = &mut resolved.deployment;
        if let Some(v) = dep.subscription_id {
            ctx.subscription_id = v;
        }
        if let Some(v) = dep.resource_group_name {
            ctx.resource_group_name = v;
        }
        if let Some(v) = dep.resource_group_location {
            ctx.resource_group_location = v;
        }
    }

    Ok(resolved)
}

fn build_exclusions(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .with_context(|| format!("invalid exclude_controls glob: {pattern}"))?;
        builder.add(glob);
    }
    Ok(Some(builder.build().context("build exclude_controls globset")?))
}

fn parse_fail_on(v: &str) -> anyhow::Result<FailOn> {
    match v {
        "failed" | "fail" => Ok(FailOn::Failed),
        "review" | "needs_review" => Ok(FailOn::Review),
        other => anyhow::bail!("unknown fail_on: {other} (expected failed|review)"),
    }
}
