use armguard_types::{ControlResult, ControlSeverity, ReportEnvelope, Verdict, VerificationResult};
use std::fmt::Write;

/// Render a report as Markdown.
///
/// Only Failed and NeedsReview results are listed; the other outcomes appear in the counts.
pub fn render_markdown(report: &ReportEnvelope) -> String {
    let mut out = String::new();

    out.push_str("# Armguard report\n\n");
    let verdict = match report.verdict {
        Verdict::Pass => "PASS",
        Verdict::Warn => "WARN",
        Verdict::Fail => "FAIL",
    };
    let c = &report.counts;
    let _ = write!(
        out,
        "- Verdict: **{}**\n- Templates: {}, resources: {}\n- Results: {} passed, {} failed, {} needs review, {} not applicable\n- Emitted: {} / {}\n\n",
        verdict,
        report.data.templates_scanned,
        report.data.resources_scanned,
        c.passed,
        c.failed,
        c.needs_review,
        c.not_applicable,
        report.data.results_emitted,
        report.data.results_total,
    );

    if let Some(r) = &report.data.truncated_reason {
        let _ = write!(out, "> Note: {}\n\n", r);
    }

    if report.templates.is_empty() {
        out.push_str("No templates scanned.\n");
        return out;
    }

    for template in &report.templates {
        let _ = write!(out, "## `{}`\n\n", template.path);
        let mut listed = template
            .results
            .iter()
            .filter(|r| {
                matches!(
                    r.verification_result,
                    VerificationResult::Failed | VerificationResult::NeedsReview
                )
            })
            .peekable();

        if listed.peek().is_none() {
            out.push_str("No failed or review results.\n\n");
            continue;
        }
        for r in listed {
            render_result(&mut out, r);
        }
        out.push('\n');
    }

    out
}

fn render_result(out: &mut String, r: &ControlResult) {
    let outcome = match r.verification_result {
        VerificationResult::Failed => "FAILED",
        VerificationResult::NeedsReview => "REVIEW",
        VerificationResult::Passed => "PASSED",
        VerificationResult::NotApplicable => "N/A",
    };
    let severity = match r.severity {
        ControlSeverity::Critical => "Critical",
        ControlSeverity::High => "High",
        ControlSeverity::Medium => "Medium",
        ControlSeverity::Low => "Low",
    };
    let _ = writeln!(
        out,
        "- [{}] `{}` ({}): {}",
        outcome, r.control_id, severity, r.description
    );

    let _ = write!(out, "  - resource: `{}`", r.resource_type);
    if let Some(name) = &r.resource_name {
        let _ = write!(out, " `{}`", name);
    }
    if let Some(line) = r.resource_data_marker.line {
        let _ = write!(out, " (line {})", line);
    }
    out.push('\n');

    let _ = writeln!(
        out,
        "  - expected: `{}` = {}",
        r.expected_property, r.expected_value
    );
    if r.is_token_not_found {
        out.push_str("  - property not found\n");
    }
    if let Some(msg) = &r.message {
        let _ = writeln!(out, "  - note: {}", msg);
    }
    if !r.recommendation.is_empty() {
        let _ = writeln!(out, "  - recommendation: {}", r.recommendation);
    }
}
