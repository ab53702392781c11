//! The `explain` use case: describe how a match kind decides its outcome.

use armguard_types::explain::{self, Explanation};

#[derive(Clone, Debug)]
pub enum ExplainOutput {
    Found(Explanation),
    /// Unknown match kind; carries the known ones.
    NotFound {
        identifier: String,
        available_kinds: &'static [&'static str],
    },
}

pub fn run_explain(identifier: &str) -> ExplainOutput {
    match explain::lookup_explanation(identifier) {
        Some(exp) => ExplainOutput::Found(exp),
        None => ExplainOutput::NotFound {
            identifier: identifier.to_string(),
            available_kinds: explain::all_match_kinds(),
        },
    }
}

/// Format an explanation for terminal display.
pub fn format_explanation(exp: &Explanation) -> String {
    let mut out = String::new();

    let heading = format!("{} ({})", exp.title, exp.kind);
    out.push_str(&heading);
    out.push('\n');
    out.push_str(&"=".repeat(heading.len()));
    out.push_str("\n\n");
    out.push_str(exp.decision);
    out.push_str("\n\n");
    out.push_str("Example payload\n");
    out.push_str("---------------\n\n");
    out.push_str("```json\n");
    out.push_str(exp.example);
    out.push('\n');
    out.push_str("```\n");

    out
}

pub fn format_not_found(identifier: &str, kinds: &[&'static str]) -> String {
    let mut out = String::new();

    out.push_str(&format!("Unknown match kind: {}\n\n", identifier));
    out.push_str("Available match kinds:\n");
    for kind in kinds {
        out.push_str(&format!("  - {}\n", kind));
    }

    out
}
