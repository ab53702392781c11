use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use walkdir::WalkDir;

const PARAMETERS_SUFFIX: &str = ".parameters.json";

/// Templates to scan under `root`.
///
/// A file is returned as-is. A directory is walked for `*.json` files, skipping parameter files,
/// in sorted path order.
pub fn discover_templates(root: &Utf8Path) -> anyhow::Result<Vec<Utf8PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    if !root.is_dir() {
        anyhow::bail!("template path does not exist: {root}");
    }

    let mut out = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walk {root}"))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = Utf8PathBuf::from_path_buf(entry.into_path())
            .map_err(|p| anyhow::anyhow!("non-UTF-8 path: {}", p.display()))?;
        let name = path.file_name().unwrap_or_default();
        if path.extension() == Some("json") && !name.ends_with(PARAMETERS_SUFFIX) {
            out.push(path);
        }
    }
    out.sort();
    tracing::debug!(root = %root, templates = out.len(), "discovered templates");
    Ok(out)
}

/// `foo.parameters.json` next to `foo.json`, when it exists.
pub fn sibling_parameters(template: &Utf8Path) -> Option<Utf8PathBuf> {
    let stem = template.file_stem()?;
    let candidate = template.with_file_name(format!("{stem}{PARAMETERS_SUFFIX}"));
    candidate.is_file().then_some(candidate)
}
