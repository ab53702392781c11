//! Use case orchestration for armguard.
//!
//! This crate provides the application layer: use cases that coordinate the settings, domain,
//! and render layers. It owns file access so that the layers below stay IO-free.
//!
//! The CLI crate depends on this; it only handles argument parsing and process concerns.

#![forbid(unsafe_code)]

mod discover;
mod explain;
mod locate;
mod report;
mod scan;

pub use discover::{discover_templates, sibling_parameters};
pub use explain::{ExplainOutput, format_explanation, format_not_found, run_explain};
pub use locate::LineIndex;
pub use report::{parse_report_json, render_markdown, serialize_report, write_report, write_text};
pub use scan::{ScanInput, ScanOutput, run_scan, verdict_exit_code, verdict_for};
